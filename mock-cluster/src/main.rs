use mock_cluster::ClusterConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "9200".to_string());
    let addr = format!("127.0.0.1:{port}");
    let config = ClusterConfig::from_env();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, cluster = %config.cluster_name, auth = config.credentials.is_some(), "listening");
    mock_cluster::run(listener, config).await
}
