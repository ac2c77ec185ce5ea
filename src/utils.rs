// (C) Coralbits SL 2025
// This file is part of Psqache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub fn setup_logging(debug: bool) {
    let log_level = if debug { Level::DEBUG } else { Level::INFO };

    // RUST_LOG wins over the debug flag when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        // trace to stderr
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("Logging already set up");
    }
}
