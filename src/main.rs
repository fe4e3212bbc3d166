use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::{net::SocketAddr, sync::Arc};

use dv_checkout_api::{
    config::AppConfig, processor::StripeClient, routes::create_app, state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dv_checkout_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    if config.stripe_secret_key.is_empty() {
        tracing::warn!("STRIPE_SECRET_KEY is not set; payment calls will be rejected");
    }
    tracing::info!(
        directory = %config.directory_path.display(),
        data_dir = %config.data_dir.display(),
        upload_dir = %config.upload_dir.display(),
        "storage locations"
    );

    let processor = Arc::new(StripeClient::new(
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
    ));
    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let state = AppState::new(config, processor);

    let app = create_app(state);

    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
