//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::schemas::{StaffUserDoc, STAFF_USER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::registry::{RegistryClient, RegistryGateway};
use crate::routes::{self, BoxBody};
use crate::safety::{AuditRecorder, InMemoryIncidentStore, IncidentStore, MongoIncidentStore, SafetyCheck};
use crate::services::SafetyPipeline;
use crate::types::GatewayError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Registry client for patient proxying and AI actions
    pub registry: Arc<RegistryClient>,
    /// Post-encounter safety check and audit
    pub safety: SafetyPipeline,
    /// Staff accounts (None without MongoDB)
    pub users: Option<MongoCollection<StaffUserDoc>>,
    /// Token signing/verification (None when no secret is configured)
    pub jwt: Option<JwtValidator>,
}

impl AppState {
    /// Build state, using MongoDB for users and incidents when connected
    pub async fn new(args: Args, mongo: Option<MongoClient>) -> Result<Self, GatewayError> {
        let Some(mongo) = mongo else {
            warn!("No MongoDB - safety incidents are kept in memory only");
            return Self::with_stores(args, None, Arc::new(InMemoryIncidentStore::new()));
        };

        let users = mongo.collection::<StaffUserDoc>(STAFF_USER_COLLECTION).await?;
        let incidents = Arc::new(MongoIncidentStore::open(&mongo).await?);
        Self::with_stores(args, Some(users), incidents)
    }

    /// Build state over explicit stores
    pub fn with_stores(
        args: Args,
        users: Option<MongoCollection<StaffUserDoc>>,
        incidents: Arc<dyn IncidentStore>,
    ) -> Result<Self, GatewayError> {
        let registry = Arc::new(RegistryClient::new(&args.registry_config())?);
        let gateway: Arc<dyn RegistryGateway> = registry.clone();
        let check = SafetyCheck::new(gateway, args.safety_config());
        let safety = SafetyPipeline::new(check, AuditRecorder::new(incidents));

        let jwt = match args.jwt_secret() {
            Some(secret) => Some(JwtValidator::new(secret, args.jwt_expiry_seconds)?),
            None => None,
        };

        Ok(Self {
            args,
            registry,
            safety,
            users,
            jwt,
        })
    }
}

/// Start the HTTP server on the configured address
pub async fn run(state: Arc<AppState>) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(state.args.listen).await?;
    serve(listener, state).await
}

/// Serve connections from an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), GatewayError> {
    info!("pharmagate listening on {}", listener.local_addr()?);

    if state.args.dev_mode {
        warn!("Development mode enabled - relaxed login, do not use with real patients");
    }

    info!(
        audit_store = state.safety.recorder().store().backend(),
        settle_ms = state.safety.check().settle_delay().as_millis() as u64,
        "Safety pipeline ready"
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
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
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(routes::cors_preflight());
    }

    if let Some(patient_id) = routes::parse_patient_file_path(&path) {
        let response = match method {
            Method::GET => routes::handle_patient_file(req, state, patient_id).await,
            Method::DELETE => routes::handle_delete_patient(req, state, patient_id).await,
            _ => routes::not_found_response(&path),
        };
        return Ok(response);
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::handle_health(&state),

        (Method::POST, "/api/login") | (Method::POST, "/api/login/") => {
            routes::handle_login(req, state).await
        }

        (Method::GET, "/api/me") | (Method::GET, "/api/me/") => routes::handle_me(req, state).await,

        (Method::GET, "/api/patients") | (Method::GET, "/api/patients/") => {
            routes::handle_list_patients(req, state).await
        }

        (Method::POST, "/api/ai/action") | (Method::POST, "/api/ai/action/") => {
            routes::handle_ai_action(req, state).await
        }

        (Method::GET, "/api/safety/incidents") | (Method::GET, "/api/safety/incidents/") => {
            routes::handle_list_incidents(req, state).await
        }

        _ => routes::not_found_response(&path),
    };

    Ok(response)
}
