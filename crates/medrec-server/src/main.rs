//! medrec-server binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use medrec_core::{Database, LabResultStore, MedicalRecords, PasswordHasher, TokenService};
use medrec_server::api::router::cors_layer;
use medrec_server::config::{AppConfig, ConfigLoader};
use medrec_server::{build_router, logging, AppState};

#[derive(Parser, Debug)]
#[command(name = "medrec-server", version, about = "Role-based medical records API")]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./medrec.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

fn build_records(config: &AppConfig) -> anyhow::Result<MedicalRecords> {
    let db = Database::open(&config.database.path).with_context(|| {
        format!("failed to open database {}", config.database.path.display())
    })?;
    let lab_results = LabResultStore::open(&config.storage.lab_results_dir).with_context(|| {
        format!(
            "failed to open lab result directory {}",
            config.storage.lab_results_dir.display()
        )
    })?;
    let tokens = TokenService::new(config.auth.jwt_secret.as_bytes(), config.auth.token_ttl());
    let passwords = PasswordHasher::new(config.auth.bcrypt_cost);
    info!(
        database = %config.database.path.display(),
        lab_results = %lab_results.root().display(),
        token_ttl_secs = tokens.lifetime().as_secs(),
        bcrypt_cost = passwords.cost(),
        "records components ready"
    );

    let records = MedicalRecords::new(db, tokens, passwords, lab_results);
    if let Some(admin) = &config.auth.bootstrap_admin {
        let user = records
            .ensure_admin(&admin.email, &admin.password)
            .context("failed to provision bootstrap admin")?;
        info!(user_id = user.id, email = %user.email, "bootstrap admin ready");
    }
    Ok(records)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let mut config = loader.load().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init_logging(&config.logging)?;
    info!(?config, "configuration loaded");

    let records = tokio::task::spawn_blocking({
        let config = config.clone();
        move || build_records(&config)
    })
    .await??;

    let state = AppState::new(records, config.storage.max_upload_bytes);
    let app = build_router(state).layer(cors_layer(&config.server.cors_origins));

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "medrec-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("medrec-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
