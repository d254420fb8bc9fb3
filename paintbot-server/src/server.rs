use std::time::Duration;

use tracing::{info, warn};

use paintbot_core::Error;
use paintbot_core::platforms::twitch_eventsub::{CallbackServerState, start_callback_server};

use crate::Args;
use crate::context::ServerContext;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Startup order: store, token, listener, then subscriptions. The listener
/// must be up before registering so verification challenges get answered.
pub async fn run_server(args: Args) -> Result<(), Error> {
    let ctx = ServerContext::new(&args).await?;
    info!(
        "Tracking {} channel(s); callback {}",
        ctx.store.channel_count(),
        ctx.store.webhook().callback_url
    );

    let state = CallbackServerState::new(ctx.store.webhook().secret.clone(), ctx.reconciler.clone());
    let server = start_callback_server(ctx.listen_addr, state).await?;

    if args.skip_register {
        info!("--skip-register set, leaving EventSub subscriptions alone.");
    } else {
        tokio::select! {
            summary = ctx.registrar.register_all() => {
                if summary.failed > 0 {
                    warn!("{} subscription(s) could not be registered; see log above.", summary.failed);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C during registration, shutting down.");
                server.shutdown(SHUTDOWN_GRACE).await;
                return Ok(());
            }
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down.");
    server.shutdown(SHUTDOWN_GRACE).await;
    Ok(())
}
