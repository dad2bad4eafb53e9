use serde_json::Value;

use prowl_config::CatalogProviderConfig;
use prowl_domain::{Platform, taxonomy};
use prowl_providers::catalog;

use crate::{
	AdapterError, BoxFuture, CatalogAdapter, CatalogPage, ConfigRequest, Credential, InitialQuery,
	KeywordRequest, StrategyAdvisor,
};

pub struct AggregatorAdapter {
	cfg: CatalogProviderConfig,
	advisor: StrategyAdvisor,
}
impl AggregatorAdapter {
	pub fn new(cfg: CatalogProviderConfig, advisor: StrategyAdvisor) -> Self {
		Self { cfg, advisor }
	}

	async fn initial_query(&self, request: &KeywordRequest<'_>) -> InitialQuery {
		let keywords = self.advisor.generate_keywords(request).await;
		let config = match self
			.advisor
			.select_config(&ConfigRequest {
				platform: Platform::ShoppingAggregator,
				keywords: &keywords,
				feedback: request.feedback,
			})
			.await
		{
			Ok(answer) => taxonomy::coerce_aggregator_config(&answer),
			Err(err) => {
				tracing::warn!(error = %err, "Locale selection failed. Using defaults.");

				taxonomy::broadest_config(Platform::ShoppingAggregator)
			},
		};

		InitialQuery { keywords, config }
	}

	async fn search(
		&self,
		keywords: &str,
		config: &Value,
		credential: Option<&Credential>,
	) -> Result<CatalogPage, AdapterError> {
		let credential = super::require_credential(Platform::ShoppingAggregator, credential)?;

		super::into_page(
			catalog::search_aggregator(&self.cfg, keywords, config, &credential.fields).await,
		)
	}
}
impl CatalogAdapter for AggregatorAdapter {
	fn platform(&self) -> Platform {
		Platform::ShoppingAggregator
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
		config: &'a Value,
		credential: Option<&'a Credential>,
	) -> BoxFuture<'a, Result<CatalogPage, AdapterError>> {
		Box::pin(self.search(keywords, config, credential))
	}
}
