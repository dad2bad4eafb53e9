use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub catalogs: Catalogs,
	#[serde(default)]
	pub search: Search,
	pub routing: Routing,
	/// Keyed by credential id, then by platform name.
	#[serde(default)]
	pub credentials: HashMap<String, HashMap<String, Map<String, Value>>>,
	#[serde(default)]
	pub publish: Publish,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub advisory: LlmProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Catalogs {
	pub general_marketplace: Option<CatalogProviderConfig>,
	pub shopping_aggregator: Option<CatalogProviderConfig>,
	pub specialty_retailer: Option<CatalogProviderConfig>,
}
impl Catalogs {
	/// Configured catalogs as `(platform_name, config)` pairs.
	pub fn configured(&self) -> Vec<(&'static str, &CatalogProviderConfig)> {
		[
			("general_marketplace", self.general_marketplace.as_ref()),
			("shopping_aggregator", self.shopping_aggregator.as_ref()),
			("specialty_retailer", self.specialty_retailer.as_ref()),
		]
		.into_iter()
		.filter_map(|(name, cfg)| cfg.map(|cfg| (name, cfg)))
		.collect()
	}

	pub fn is_configured(&self, platform: &str) -> bool {
		self.configured().iter().any(|(name, _)| *name == platform)
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogProviderConfig {
	pub api_base: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub max_attempts: u32,
	pub target_product_count: u32,
	pub ideal_product_count: u32,
	/// Distinct keyword/config combinations after which the fallback policy gives up.
	pub max_combinations: u32,
	pub max_keyword_words: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			max_attempts: 5,
			target_product_count: 20,
			ideal_product_count: 40,
			max_combinations: 8,
			max_keyword_words: 5,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Routing {
	pub default_platform: String,
	/// Keys are the last two labels of a hostname, e.g. "example.com".
	#[serde(default)]
	pub domain_overrides: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Publish {
	pub root: Option<String>,
}

fn default_page_size() -> u32 {
	50
}

fn default_max_retries() -> u32 {
	3
}
