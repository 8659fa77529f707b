use hivequiz::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<(), HivequizError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("HIVEQUIZ_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let offline = std::env::var("HIVEQUIZ_OFFLINE").is_ok_and(|v| v == "1");

    let builder = HivequizServer::builder().bind(&bind);

    if offline {
        tracing::info!("offline mode: serving backup questions only");
        builder.build(OfflineSource).await?.run().await
    } else {
        let config = SupplyConfig::default();
        let source = ResilientSource::with_config(OpenTdbSource::new(config.clone())?, &config);
        builder.build(source).await?.run().await
    }
}
