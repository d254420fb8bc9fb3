use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

mod context;
mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "paintbot")]
#[command(author, version, about = "PaintBot - Twitch go-live announcements for Discord")]
pub struct Args {
    /// Path to the JSON store (secrets, webhook settings, tracked channels).
    #[arg(long, default_value = "paintbot.json")]
    pub config: PathBuf,

    /// Address the webhook listener binds to. Overrides `webhook.listen_addr`.
    #[arg(long)]
    pub listen: Option<String>,

    /// Start the listener without touching EventSub subscriptions.
    #[arg(long, default_value = "false")]
    pub skip_register: bool,

    /// Timeout for every outbound Twitch/Discord call, in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_log::LogTracer::init()?;
    let filter = EnvFilter::from_default_env().add_directive("paintbot=info".parse()?);
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    if let Err(e) = init_tracing() {
        eprintln!("Failed to set up logging: {e:#}");
        return ExitCode::FAILURE;
    }

    let args = Args::parse();
    info!(
        "PaintBot starting. config={}, skip_register={}",
        args.config.display(),
        args.skip_register
    );

    match server::run_server(args).await {
        Ok(()) => {
            info!("PaintBot stopped.");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_fatal() => {
            error!("Fatal startup error: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
