//! Journal entries and the index that enumerates them

pub mod entries;
pub mod index;
pub mod model;

pub use entries::EntryService;
pub use index::{IndexStore, INDEX_FILENAME};
pub use model::{entry_file_name, Entry, IndexRecord};
