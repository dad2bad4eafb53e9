use serde_json::Value;

use prowl_config::CatalogProviderConfig;
use prowl_domain::{Platform, taxonomy};
use prowl_providers::catalog;

use crate::{
	AdapterError, BoxFuture, CatalogAdapter, CatalogPage, ConfigRequest, Credential, InitialQuery,
	KeywordRequest, StrategyAdvisor,
};

pub struct MarketplaceAdapter {
	cfg: CatalogProviderConfig,
	advisor: StrategyAdvisor,
}
impl MarketplaceAdapter {
	pub fn new(cfg: CatalogProviderConfig, advisor: StrategyAdvisor) -> Self {
		Self { cfg, advisor }
	}

	async fn initial_query(&self, request: &KeywordRequest<'_>) -> InitialQuery {
		let keywords = self.advisor.generate_keywords(request).await;
		let selection = self
			.advisor
			.select_config(&ConfigRequest {
				platform: Platform::GeneralMarketplace,
				keywords: &keywords,
				feedback: request.feedback,
			})
			.await;
		let config = match selection {
			Ok(answer) => {
				let raw = answer.get("searchIndex").and_then(Value::as_str);

				if raw.and_then(taxonomy::search_index).is_none() {
					tracing::warn!(
						search_index = raw.unwrap_or_default(),
						"Unknown search index. Using All."
					);
				}

				taxonomy::coerce_marketplace_config(&answer)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Search index selection failed. Using All.");

				taxonomy::broadest_config(Platform::GeneralMarketplace)
			},
		};

		InitialQuery { keywords, config }
	}

	/// Asks for a narrower search index when the stored one is `All`.
	async fn refine(&self, keywords: &str, config: &Value) -> Value {
		let current = config.get("searchIndex").and_then(Value::as_str);

		if current != Some(taxonomy::BROADEST_SEARCH_INDEX) {
			return config.clone();
		}

		let request =
			ConfigRequest { platform: Platform::GeneralMarketplace, keywords, feedback: None };

		match self.advisor.select_config(&request).await {
			Ok(answer) => {
				let refined = taxonomy::coerce_marketplace_config(&answer);

				if &refined != config {
					tracing::info!(
						keywords,
						search_index = refined["searchIndex"].as_str().unwrap_or_default(),
						"Narrowed the search index for a rerun."
					);
				}

				refined
			},
			Err(err) => {
				tracing::warn!(error = %err, "Search index refinement failed. Keeping All.");

				config.clone()
			},
		}
	}

	async fn search(
		&self,
		keywords: &str,
		config: &Value,
		credential: Option<&Credential>,
	) -> Result<CatalogPage, AdapterError> {
		let credential = super::require_credential(Platform::GeneralMarketplace, credential)?;

		super::into_page(
			catalog::search_marketplace(&self.cfg, keywords, config, &credential.fields).await,
		)
	}
}
impl CatalogAdapter for MarketplaceAdapter {
	fn platform(&self) -> Platform {
		Platform::GeneralMarketplace
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

	fn refine_config<'a>(&'a self, keywords: &'a str, config: &'a Value) -> BoxFuture<'a, Value> {
		Box::pin(self.refine(keywords, config))
	}

	fn execute<'a>(
		&'a self,
		keywords: &'a str,
		config: &'a Value,
		credential: Option<&'a Credential>,
	) -> BoxFuture<'a, Result<CatalogPage, AdapterError>> {
		Box::pin(self.search(keywords, config, credential))
	}
}
