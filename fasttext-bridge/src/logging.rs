//! Log sink setup
//!
//! The library logs through the `log` facade. Hosts that have no logger of
//! their own (C callers, the CLI) install a stderr subscriber here.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config;
use crate::error::{BridgeError, Result};

/// Install a stderr subscriber.
///
/// `filter` takes `EnvFilter` directives; without it `FASTTEXT_BRIDGE_LOG` is
/// read, falling back to `fasttext_bridge=info`. Calling this again once a
/// subscriber is installed is a no-op.
pub fn init_logging(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).map_err(|e| {
            BridgeError::invalid_argument(format!("invalid log filter `{}`: {}", directives, e))
        })?,
        None => EnvFilter::try_from_env(config::logging::FILTER_ENV)
            .unwrap_or_else(|_| EnvFilter::new(config::logging::DEFAULT_FILTER)),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = installed {
        log::debug!("Logging already initialized: {}", e);
    }
    Ok(())
}
