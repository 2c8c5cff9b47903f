//! Process-wide table of configured providers.

// self
use crate::{
	_prelude::*,
	provider::{ProviderConfig, ProviderKind},
};

/// Configured providers keyed by [`ProviderKind`].
///
/// Built once at startup and read concurrently afterwards.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
	providers: HashMap<ProviderKind, Arc<ProviderConfig>>,
}
impl ProviderRegistry {
	/// Creates a registry from validated configurations. Later entries replace earlier ones.
	pub fn new(configs: impl IntoIterator<Item = ProviderConfig>) -> Self {
		Self { providers: configs.into_iter().map(|cfg| (cfg.kind, Arc::new(cfg))).collect() }
	}

	/// Returns the configuration for `kind`.
	pub fn get(&self, kind: ProviderKind) -> Result<&ProviderConfig> {
		self.providers
			.get(&kind)
			.map(AsRef::as_ref)
			.ok_or(Error::ProviderNotConfigured { provider: kind })
	}

	/// Returns `true` when `kind` has a configuration.
	pub fn contains(&self, kind: ProviderKind) -> bool {
		self.providers.contains_key(&kind)
	}

	/// Configured providers in [`ProviderKind::ALL`] order.
	pub fn kinds(&self) -> Vec<ProviderKind> {
		ProviderKind::ALL.into_iter().filter(|kind| self.contains(*kind)).collect()
	}

	/// Number of configured providers.
	pub fn len(&self) -> usize {
		self.providers.len()
	}

	/// Returns `true` when nothing is configured.
	pub fn is_empty(&self) -> bool {
		self.providers.is_empty()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn github() -> ProviderConfig {
		ProviderConfig::builder(ProviderKind::GitHub)
			.client_id("gh")
			.redirect_url(Url::parse("https://app.example.com/cb").expect("URL should parse."))
			.build()
			.expect("GitHub config should build.")
	}

	#[test]
	fn lookups_report_missing_providers() {
		let registry = ProviderRegistry::new([github()]);

		assert_eq!(registry.kinds(), vec![ProviderKind::GitHub]);
		assert!(registry.get(ProviderKind::GitHub).is_ok());
		assert!(matches!(
			registry.get(ProviderKind::Google),
			Err(Error::ProviderNotConfigured { provider: ProviderKind::Google })
		));
	}
}
