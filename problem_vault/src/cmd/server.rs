use crate::modules::{
    auth::API_KEY_HEADER,
    handlers::{
        api_index, fallback,
        problem::{get_problem, list_problems, upsert_problem},
        root,
        stats::{count_problems, problem_stats},
        ApiError,
    },
    middleware::{access_log, rate_limit, RateLimiter},
    settings::ServerConfig,
    store::{MemoryProblemStore, PgProblemStore, SharedStore},
};
use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{self, HeaderName, HeaderValue},
        Method,
    },
    middleware,
    response::{IntoResponse, Response},
    routing, Router, Server,
};
use clap::Args;
use sqlx::postgres::PgPoolOptions;
use std::{any::Any, env, net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

const DEFAULT_PORT: u16 = 3000;
const BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Port to listen on. Falls back to $PORT, then 3000.
    #[arg(long)]
    port: Option<u16>,
    /// Keep records in process memory instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,
    /// Maximum number of database connections.
    #[arg(long, default_value_t = 8)]
    max_connections: u32,
}

pub async fn run(args: ServerArgs) -> Result<()> {
    let config = Arc::new(ServerConfig::from_env());

    let store: SharedStore = if args.in_memory {
        tracing::warn!("records are kept in memory and will be lost on shutdown");
        Arc::new(MemoryProblemStore::new())
    } else {
        let database_url = env::var("DATABASE_URL").with_context(|| {
            let message = "DATABASE_URL environment variable must be set";
            tracing::error!(message);
            format!("{}", message)
        })?;
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&database_url)
            .await
            .with_context(|| {
                let message = "couldn't connect to the database. check your database status and value of DATABASE_URL environment variable.";
                tracing::error!(message);
                format!("{}", message)
            })?;

        let store = PgProblemStore::new(pool);
        store.migrate().await.with_context(|| {
            let message = "failed to apply database migrations";
            tracing::error!(message);
            format!("{}", message)
        })?;
        Arc::new(store)
    };

    let port = match args.port {
        Some(port) => port,
        None => match env::var("PORT").ok().and_then(|port| port.parse().ok()) {
            Some(port) => port,
            None => {
                tracing::warn!("API server will be launched at default port number {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        },
    };

    let app = create_router(store, config);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server start at port {}", port);
    Server::try_bind(&addr)
        .with_context(|| format!("failed to bind port {}", port))?
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated abnormally")?;

    Ok(())
}

pub fn create_router(store: SharedStore, config: Arc<ServerConfig>) -> Router {
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max,
        config.rate_limit_window,
    ));
    let development = config.development;

    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ]);

    Router::new()
        .route("/", routing::get(root).fallback(fallback))
        .route("/api", routing::get(api_index).fallback(fallback))
        .route("/api/", routing::get(api_index).fallback(fallback))
        .route(
            "/api/problems",
            routing::get(list_problems)
                .post(upsert_problem)
                .fallback(fallback),
        )
        .route(
            "/api/problems/:id",
            routing::get(get_problem).fallback(fallback),
        )
        .route("/api/count", routing::get(count_problems).fallback(fallback))
        .route("/api/stats", routing::get(problem_stats).fallback(fallback))
        // A known path with an unsupported method is answered like an unknown route.
        .fallback(fallback)
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic, development)
        }))
        .layer(Extension(store))
        .layer(Extension(config))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn_with_state(limiter, rate_limit))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(middleware::from_fn(access_log))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, development: bool) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        String::from("unknown panic")
    };

    ApiError::internal("Internal server error", detail, development).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler.");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("SIGINT signal received, starting graceful shutdown.");
}
