//! Process-wide tracing subscriber.

// crates.io
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::_prelude::*;

/// Installs a compact fmt subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) -> Result<()> {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_target(true).with_thread_ids(false).compact())
		.try_init()?;

	Ok(())
}
