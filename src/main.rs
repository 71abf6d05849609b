use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lotus_core::cli::{Cli, Commands};
use lotus_core::config::Config;
use lotus_core::gateway::Dispatcher;
use lotus_core::razorpay::RazorpayClient;
use lotus_core::store::Stores;
use lotus_core::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_info = Config::from_env()?;
    let mut config = config_info.config;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Some(Commands::Config) => {
            println!("profile: {}", config_info.profile.as_str());
            println!("server_port: {}", config.server_port);
            println!("courses_table: {}", config.courses_table);
            println!("transactions_table: {}", config.transactions_table);
            println!("videos_table: {}", config.videos_table);
            println!("users_table: {}", config.users_table);
            println!("user_tenant_table: {}", config.user_tenant_table);
            println!("razorpay_url: {}", config.razorpay_url);
            println!(
                "razorpay_credentials: {}",
                if config.razorpay_key_id.is_some() && config.razorpay_key_secret.is_some() {
                    "configured"
                } else {
                    "absent"
                }
            );
            println!("default_tenant: {}", config.default_tenant);
            if !config_info.overrides.is_empty() {
                println!("env overrides: {}", config_info.overrides.join(", "));
            }
            return Ok(());
        }
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.server_port = port;
            }
        }
        None => {}
    }

    let razorpay = match (&config.razorpay_key_id, &config.razorpay_key_secret) {
        (Some(key_id), Some(key_secret)) => Some(RazorpayClient::new(
            config.razorpay_url.clone(),
            key_id,
            key_secret,
        )),
        _ => {
            tracing::warn!("Razorpay credentials not configured; order creation is disabled");
            None
        }
    };

    let stores = Stores::in_memory();
    tracing::info!(
        courses_table = %config.courses_table,
        transactions_table = %config.transactions_table,
        "store capabilities initialized"
    );

    let dispatcher = Dispatcher::new(stores, razorpay, config.default_tenant.clone());
    let app_state = AppState::new(dispatcher, config.cors_allowed_origin.clone());
    let app = create_app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
