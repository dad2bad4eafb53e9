use serde_json::Value;

use prowl_config::CatalogProviderConfig;
use prowl_domain::{Platform, taxonomy};
use prowl_providers::catalog;

use crate::{
	AdapterError, BoxFuture, CatalogAdapter, CatalogPage, Credential, InitialQuery,
	KeywordRequest, StrategyAdvisor,
};

/// The specialty retailer takes no platform config; only keywords vary.
pub struct SpecialtyAdapter {
	cfg: CatalogProviderConfig,
	advisor: StrategyAdvisor,
}
impl SpecialtyAdapter {
	pub fn new(cfg: CatalogProviderConfig, advisor: StrategyAdvisor) -> Self {
		Self { cfg, advisor }
	}

	async fn initial_query(&self, request: &KeywordRequest<'_>) -> InitialQuery {
		let keywords = self.advisor.generate_keywords(request).await;

		InitialQuery { keywords, config: taxonomy::broadest_config(Platform::SpecialtyRetailer) }
	}

	async fn search(
		&self,
		keywords: &str,
		credential: Option<&Credential>,
	) -> Result<CatalogPage, AdapterError> {
		let credential = super::require_credential(Platform::SpecialtyRetailer, credential)?;

		super::into_page(catalog::search_specialty(&self.cfg, keywords, &credential.fields).await)
	}
}
impl CatalogAdapter for SpecialtyAdapter {
	fn platform(&self) -> Platform {
		Platform::SpecialtyRetailer
	}

	fn advisor(&self) -> &StrategyAdvisor {
		&self.advisor
	}

	fn generate_initial_query<'a>(
		&'a self,
		request: &'a KeywordRequest<'a>,
	) -> BoxFuture<'a, InitialQuery> {
		Box::pin(self.initial_query(request))
	}

	fn execute<'a>(
		&'a self,
		keywords: &'a str,
		_config: &'a Value,
		credential: Option<&'a Credential>,
	) -> BoxFuture<'a, Result<CatalogPage, AdapterError>> {
		Box::pin(self.search(keywords, credential))
	}
}
