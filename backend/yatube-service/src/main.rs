use actix_cors::Cors;
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_service::config::{Config, LogFormat};
use yatube_service::db::PgStore;
use yatube_service::fixtures::Fixtures;
use yatube_service::{middleware, routes, AppState};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log.filter.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn build_state(config: &Config) -> io::Result<AppState> {
    let Some(db) = &config.database else {
        tracing::warn!("DATABASE_URL not set; using the in-memory store, data is lost on exit");
        return Ok(AppState::in_memory());
    };

    let store = PgStore::connect(&db.url, db.max_connections)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("database connect: {e}")))?;
    store
        .migrate()
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("database migrate: {e}")))?;
    tracing::info!(max_connections = db.max_connections, "connected to PostgreSQL");

    let store = Arc::new(store);
    Ok(AppState::new(store.clone(), store))
}

/// Yatube API service
///
/// # Routes
///
/// - `/api/v1/api-token-auth/` - token exchange
/// - `/api/v1/posts/*` - posts and their nested comments
/// - `/api/v1/groups/*` - read-only groups
/// - `/api/v1/health*`, `/metrics` - probes and Prometheus metrics
#[actix_web::main]
async fn main() -> io::Result<()> {
    // Container healthcheck: `yatube-service healthcheck`
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" {
                let port = std::env::var("YATUBE_PORT").unwrap_or_else(|_| "8000".to_string());
                let url = format!("http://127.0.0.1:{}/api/v1/health", port);
                match reqwest::Client::new().get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => return Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"));
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"));
                    }
                }
            }
        }
    }

    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    tracing::info!("Starting yatube-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let state = build_state(&config).await?;

    if let Some(path) = &config.fixtures_path {
        let report = Fixtures::load(path)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{e:#}")))?
            .apply(&state.auth(), state.content.as_ref())
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e:#}")))?;
        tracing::info!(
            users = report.users,
            groups = report.groups,
            skipped = report.skipped,
            "fixtures applied"
        );
    }

    let bind_address = config.bind_address();
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let state_data = web::Data::new(state);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state_data.clone())
            .wrap(middleware::MetricsMiddleware)
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .workers(config.app.workers)
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            return match result {
                Ok(result) => result,
                Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
            };
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    server_task
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))??;

    tracing::info!("yatube-service shut down");
    Ok(())
}
