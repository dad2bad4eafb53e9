pub mod aggregator;
pub mod marketplace;
pub mod specialty;

pub use aggregator::AggregatorAdapter;
pub use marketplace::MarketplaceAdapter;
pub use specialty::SpecialtyAdapter;

use std::sync::Arc;

use prowl_config::Catalogs;
use prowl_domain::Platform;

use crate::{AdapterError, AdapterRegistry, CatalogPage, Credential, StrategyAdvisor};

/// One adapter per configured catalog, sharing `advisor`.
pub fn build_registry(catalogs: &Catalogs, advisor: &StrategyAdvisor) -> AdapterRegistry {
	let mut registry = AdapterRegistry::new();

	if let Some(cfg) = &catalogs.general_marketplace {
		registry.insert(
			Platform::GeneralMarketplace,
			Arc::new(MarketplaceAdapter::new(cfg.clone(), advisor.clone())),
		);
	}
	if let Some(cfg) = &catalogs.shopping_aggregator {
		registry.insert(
			Platform::ShoppingAggregator,
			Arc::new(AggregatorAdapter::new(cfg.clone(), advisor.clone())),
		);
	}
	if let Some(cfg) = &catalogs.specialty_retailer {
		registry.insert(
			Platform::SpecialtyRetailer,
			Arc::new(SpecialtyAdapter::new(cfg.clone(), advisor.clone())),
		);
	}

	registry
}

fn require_credential(
	platform: Platform,
	credential: Option<&Credential>,
) -> Result<&Credential, AdapterError> {
	credential.ok_or_else(|| AdapterError::MissingCredential {
		message: format!("No credential is resolved for {platform}."),
	})
}

fn into_page(
	result: prowl_providers::Result<Vec<serde_json::Value>>,
) -> Result<CatalogPage, AdapterError> {
	let items = result?;

	if items.is_empty() {
		return Err(AdapterError::Empty);
	}

	Ok(CatalogPage { items })
}
