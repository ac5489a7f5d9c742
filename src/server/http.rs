//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Request bodies are
//! collected up front so routing works on `Request<Bytes>`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ALLOW, AUTHORIZATION,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::AuthGateway;
use crate::config::Args;
use crate::journal::{EntryService, IndexStore};
use crate::routes::{self, text_response, MAX_BODY_BYTES};
use crate::storage::{BlobStore, InMemoryBlobStore, RemoteBlobClient};
use crate::types::Result;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub auth: AuthGateway,
    pub entries: EntryService,
    /// Value of Access-Control-Allow-Origin on every response
    pub cors_origin: HeaderValue,
    /// False when dev mode fell back to the in-memory store
    pub remote_storage: bool,
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration, connecting the configured blob store
    pub fn from_args(args: Args) -> Result<Self> {
        if args.uses_remote_storage() {
            let client = RemoteBlobClient::new(args.storage_config())?;
            info!("Blob storage: {}", client.base_url());
            Self::with_store(args, Arc::new(client), true)
        } else {
            warn!("FILESS_API_KEY not set - using in-memory storage (dev mode, data is lost on exit)");
            Self::with_store(args, Arc::new(InMemoryBlobStore::new()), false)
        }
    }

    /// Build state around an existing blob store
    pub fn with_store(args: Args, store: Arc<dyn BlobStore>, remote_storage: bool) -> Result<Self> {
        if args.dev_mode && args.jwt_secret.is_none() {
            warn!("JWT_SECRET not set - using insecure dev secret");
        }
        if args.dev_mode && args.admin_pass.is_none() && args.admin_pass_hash.is_none() {
            warn!("ADMIN_PASS not set - using dev password");
        }

        let auth = AuthGateway::new(args.admin_credentials()?, args.jwt_validator()?);

        let index = IndexStore::new(Arc::clone(&store), args.index_ref())
            .with_pruning(args.storage.prune_index_versions);
        let entries = EntryService::new(store, index);

        let cors_origin = args.cors_header()?;

        Ok(Self {
            args,
            auth,
            entries,
            cors_origin,
            remote_storage,
            started_at: Instant::now(),
        })
    }
}

/// Serve until Ctrl+C or SIGTERM
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let addr = state.args.listen_addr();
    let listener = TcpListener::bind(addr).await?;

    info!("Pib Journal listening on {}", addr);

    if state.args.dev_mode {
        warn!("Development mode enabled - insecure defaults may be active");
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutting down, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Collect the body and dispatch
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    info!("[{}] {} {}", addr, req.method(), req.uri().path());

    let (parts, body) = req.into_parts();
    let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("[{}] Failed to read request body: {}", addr, e);
            let response = with_cors(&state, body_read_failure(e.as_ref()));
            return Ok(to_boxed(response));
        }
    };

    let response = route(&state, Request::from_parts(parts, body)).await;
    Ok(to_boxed(response))
}

/// Route a request with a fully collected body
pub async fn route(state: &AppState, req: Request<Bytes>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (method, path.as_str()) {
        (Method::OPTIONS, _) => cors_preflight(),

        (Method::GET, "/") => routes::root_banner(),
        (Method::GET, "/health") => routes::health_check(state),
        (Method::GET, "/version") => routes::version_info(),

        (Method::POST, "/api/login") => routes::handle_login(state, req.body()),

        (Method::GET, "/api/entries") => routes::handle_list_entries(state).await,
        (Method::POST, "/api/entries") => {
            let auth = get_auth_header(&req);
            routes::handle_create_entry(state, auth, req.body()).await
        }

        (_, "/" | "/health" | "/version" | "/api/login" | "/api/entries") => {
            method_not_allowed()
        }

        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    with_cors(state, response)
}

/// 413 when the body hit the size cap, 400 for any other read failure
fn body_read_failure(err: &(dyn std::error::Error + Send + Sync + 'static)) -> Response<Full<Bytes>> {
    if err.downcast_ref::<LengthLimitError>().is_some() {
        text_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else {
        text_response(StatusCode::BAD_REQUEST, "Failed to read request body")
    }
}

fn get_auth_header<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

fn with_cors(state: &AppState, mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, state.cors_origin.clone());
    response
}

/// CORS preflight response
fn cors_preflight() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}
