// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DreamWall

use std::env;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dreamwall_server::{
    api::router,
    auth::{hash_password, AuthKeys, Role},
    config::Config,
    mailer::Mailer,
    state::AppState,
    storage::{BillingLedger, FileStorage, StoragePaths, StoredUser, UserRepository},
};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::load();

    let mut storage = FileStorage::new(StoragePaths::new(&config.data_dir));
    storage
        .initialize()
        .expect("Failed to initialize storage directories");

    let billing = BillingLedger::open(&storage.paths().billing_ledger())
        .expect("Failed to open billing ledger");

    let auth = AuthKeys::from_secret(config.jwt_secret.as_bytes());
    let mailer = Mailer::from_env().expect("Failed to build mailer");

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(storage, billing, auth, mailer, config);

    seed_admin(&state);

    let app = router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");

    info!("DreamWall server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    if env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Create the admin account named by `SEED_ADMIN_EMAIL`/`SEED_ADMIN_PASSWORD`
/// if it does not exist yet. Useful for first boot of a fresh deployment.
fn seed_admin(state: &AppState) {
    let (Ok(email), Ok(password)) = (
        env::var("SEED_ADMIN_EMAIL"),
        env::var("SEED_ADMIN_PASSWORD"),
    ) else {
        return;
    };
    if email.is_empty() || password.is_empty() {
        return;
    }

    let repo = UserRepository::new(&state.storage);
    match repo.get_by_email(&email) {
        Ok(Some(_)) => info!("seed admin {email} already exists"),
        Ok(None) => {
            let username = email.split('@').next().unwrap_or("admin").to_string();
            let password_hash = hash_password(&password).expect("Failed to hash seed password");
            let admin = StoredUser::new(username, email.clone(), password_hash, Role::Admin);
            repo.create(&admin).expect("Failed to seed admin account");
            info!("seeded admin account {email}");
        }
        Err(e) => panic!("Failed to look up seed admin: {e}"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}
