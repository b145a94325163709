use anyhow::{Context, Result};
use clap::Parser;
use gopro_sync::{Collaborators, Config, Orchestrator, SavePath};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gopro-sync")]
#[command(about = "Download and clear a GoPro's media, then resume timelapse recording")]
struct Args {
    /// Config file (extension optional); GOPRO_SYNC__* variables override it
    #[arg(short, long, default_value = "config/gopro-sync")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,btleplug=warn")),
        )
        .init();

    let args = Args::parse();

    info!("gopro-sync v{}", env!("CARGO_PKG_VERSION"));
    info!("DATE: {}", chrono::Local::now().to_rfc3339());
    info!("PATH: {}", std::env::var("PATH").unwrap_or_default());

    info!("CONFIG: {}", args.config);
    let cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    info!("WIFI: {} on {}", cfg.wifi.networksetup_path, cfg.wifi.interface);

    let save_path = SavePath::resolve(&cfg.storage, chrono::Local::now().date_naive())
        .context("Failed to prepare save path")?;

    let collaborators = Collaborators::system(&cfg)
        .await
        .context("Failed to set up device access")?;

    let mut orchestrator = Orchestrator::new(cfg, collaborators, save_path);
    let report = orchestrator.run().await.context("Sync run failed")?;

    info!("Run report: {}", serde_json::to_string(&report)?);
    if let Some(secs) = report.duration_secs() {
        info!("Done in {:.1}s", secs);
    }

    Ok(())
}
