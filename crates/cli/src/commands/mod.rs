//! Command implementations.

mod info;
mod monitor;
mod produce;
mod run;
mod validate;

pub use info::run_info;
pub use monitor::run_monitor;
pub use produce::run_produce;
pub use run::run_hub;
pub use validate::run_validate;

use contracts::HubBlueprint;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};

/// Load the blueprint named by `args`, or the built-in defaults, and apply
/// the address override
pub(crate) fn load_blueprint(args: &ConfigArgs) -> Result<HubBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)?
        }
        None => {
            info!("No configuration file given, using built-in defaults");
            HubBlueprint::default()
        }
    };

    if let Some(address) = args.address {
        info!(%address, "Overriding endpoint address from CLI");
        blueprint.network.address = address;
    }

    config_loader::ConfigLoader::validate(&blueprint)?;
    Ok(blueprint)
}

/// Cancel `token` on Ctrl+C or SIGTERM
pub(crate) fn cancel_on_shutdown_signal(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => {
                warn!("Received shutdown signal, stopping...");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
