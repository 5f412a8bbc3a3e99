//! Core of the evalview operator dashboard.
//!
//! Relays a remote shell over a duplex channel, gates the results view behind
//! a cloud credential check, and retrieves evaluation result sets by job id.
//! All shared state is owned by [`dashboard::Dashboard`]; the other modules
//! are building blocks it drives.

pub mod api;
pub mod config;
pub mod credentials;
pub mod dashboard;
pub mod detail;
pub mod error;
pub mod results;
pub mod session;

pub use error::{EvalviewError, Result, ValidationError};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Output goes to stderr so the relayed terminal can own stdout. Filtering
/// follows `RUST_LOG` (default `warn`); `EVALVIEW_LOG_FORMAT=json` switches to
/// JSON lines. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("EVALVIEW_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
