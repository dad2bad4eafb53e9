pub mod adapters;
pub mod advisor;
pub mod credentials;
pub mod orchestrate;
pub mod progressive;
pub mod publish;
pub mod race;
pub mod store;
pub mod strategy;

mod error;

pub use error::{AdapterError, AdvisoryError, Error, Result};
pub use orchestrate::SearchReport;
pub use progressive::{
	AttemptOutcome, AttemptTrace, BestAttempt, ProgressiveOutcome, SearchPolicy, SearchSeed,
	StopReason,
};
pub use strategy::{
	ConfigRequest, KeywordRequest, StrategyAdvisor, StrategyContext, TriedSearch,
};

use std::{collections::BTreeMap, future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};
use uuid::Uuid;

use prowl_config::Config;
use prowl_domain::{
	ContentSearchStatus, ContentTarget, NewSearchAttempt, NormalizedProduct, Platform,
	PlatformRouter, SearchAttempt, StrategySuggestion, normalize_items, taxonomy,
};
use prowl_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Registered catalog adapters, keyed by the platform they serve.
pub type AdapterRegistry = BTreeMap<Platform, Arc<dyn CatalogAdapter>>;

/// The black-box capability behind keyword, config, scoring and strategy suggestions.
pub trait Advisor
where
	Self: Send + Sync,
{
	fn propose_keywords<'a>(
		&'a self,
		request: &'a KeywordRequest<'a>,
	) -> BoxFuture<'a, Result<String, AdvisoryError>>;

	fn select_config<'a>(
		&'a self,
		request: &'a ConfigRequest<'a>,
	) -> BoxFuture<'a, Result<Value, AdvisoryError>>;

	fn score_results<'a>(
		&'a self,
		keywords: &'a str,
		products: &'a [NormalizedProduct],
	) -> BoxFuture<'a, Result<f32, AdvisoryError>>;

	fn suggest_strategy<'a>(
		&'a self,
		context: &'a StrategyContext<'a>,
	) -> BoxFuture<'a, Result<StrategySuggestion, AdvisoryError>>;
}

/// One catalog back end.
pub trait CatalogAdapter
where
	Self: Send + Sync,
{
	fn platform(&self) -> Platform;

	fn advisor(&self) -> &StrategyAdvisor;

	fn broadest_config(&self) -> Value {
		taxonomy::broadest_config(self.platform())
	}

	fn generate_initial_query<'a>(
		&'a self,
		request: &'a KeywordRequest<'a>,
	) -> BoxFuture<'a, InitialQuery>;

	fn execute<'a>(
		&'a self,
		keywords: &'a str,
		config: &'a Value,
		credential: Option<&'a Credential>,
	) -> BoxFuture<'a, Result<CatalogPage, AdapterError>>;

	/// Config for re-running a stored attempt. The stored config is kept unless overridden.
	fn refine_config<'a>(&'a self, _keywords: &'a str, config: &'a Value) -> BoxFuture<'a, Value> {
		Box::pin(async move { config.clone() })
	}

	/// Maps a suggested config onto values this catalog accepts.
	fn coerce_config(&self, proposed: &Value) -> Value {
		taxonomy::coerce_config(self.platform(), proposed)
	}

	fn normalize(&self, page: &CatalogPage) -> Vec<NormalizedProduct> {
		normalize_items(self.platform(), &page.items)
	}

	fn assess_quality<'a>(
		&'a self,
		products: &'a [NormalizedProduct],
		keywords: &'a str,
	) -> BoxFuture<'a, f32> {
		Box::pin(self.advisor().assess_quality(keywords, products))
	}

	fn suggest_next_strategy<'a>(
		&'a self,
		context: &'a StrategyContext<'a>,
	) -> BoxFuture<'a, StrategySuggestion> {
		Box::pin(self.advisor().suggest_next(context))
	}
}

/// Durable record of every attempt, deduplicated by fingerprint.
pub trait SearchRecordStore
where
	Self: Send + Sync,
{
	fn find_or_create<'a>(
		&'a self,
		new: &'a NewSearchAttempt,
	) -> BoxFuture<'a, Result<SearchAttempt>>;

	fn get(&self, attempt_id: Uuid) -> BoxFuture<'_, Result<Option<SearchAttempt>>>;

	fn mark_searching(&self, attempt_id: Uuid) -> BoxFuture<'_, Result<()>>;

	fn complete(
		&self,
		attempt_id: Uuid,
		product_count: u32,
		quality_score: f32,
	) -> BoxFuture<'_, Result<()>>;

	fn fail<'a>(&'a self, attempt_id: Uuid, error_message: &'a str) -> BoxFuture<'a, Result<()>>;

	fn list_by_platform(
		&self,
		platform: Platform,
		limit: u32,
	) -> BoxFuture<'_, Result<Vec<SearchAttempt>>>;

	/// Records `attempt_ids` as tried for `content_id`. Already linked ids are ignored.
	fn link_to_content<'a>(
		&'a self,
		content_id: Uuid,
		attempt_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<()>>;

	/// Attempts linked to `content_id`, highest quality first.
	fn list_by_content(&self, content_id: Uuid) -> BoxFuture<'_, Result<Vec<SearchAttempt>>>;
}

/// The parts of a content target the search core reads and writes.
pub trait ContentStore
where
	Self: Send + Sync,
{
	fn get(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<ContentTarget>>>;

	fn set_status(
		&self,
		content_id: Uuid,
		status: ContentSearchStatus,
	) -> BoxFuture<'_, Result<()>>;

	fn set_best_attempt(&self, content_id: Uuid, attempt_id: Uuid) -> BoxFuture<'_, Result<()>>;

	fn set_feedback<'a>(
		&'a self,
		content_id: Uuid,
		feedback: &'a str,
	) -> BoxFuture<'a, Result<()>>;
}

pub trait ResultPublisher
where
	Self: Send + Sync,
{
	fn publish<'a>(
		&'a self,
		attempt: &'a SearchAttempt,
		products: &'a [NormalizedProduct],
	) -> BoxFuture<'a, Result<()>>;
}

pub trait CredentialResolver
where
	Self: Send + Sync,
{
	fn resolve<'a>(
		&'a self,
		credential_id: &'a str,
		platform: Platform,
	) -> BoxFuture<'a, Option<Credential>>;
}

/// A resolved credential handle. The core never inspects `fields`.
#[derive(Clone, Debug, PartialEq)]
pub struct Credential {
	pub id: String,
	pub fields: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InitialQuery {
	pub keywords: String,
	pub config: Value,
}

/// Raw items of one catalog call, in the order the catalog returned them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogPage {
	pub items: Vec<Value>,
}
impl CatalogPage {
	pub fn count(&self) -> u32 {
		self.items.len() as u32
	}
}

#[derive(Clone)]
pub struct Collaborators {
	pub adapters: AdapterRegistry,
	pub records: Arc<dyn SearchRecordStore>,
	pub contents: Arc<dyn ContentStore>,
	pub credentials: Arc<dyn CredentialResolver>,
	pub publisher: Arc<dyn ResultPublisher>,
}
impl Collaborators {
	pub fn new(
		adapters: AdapterRegistry,
		records: Arc<dyn SearchRecordStore>,
		contents: Arc<dyn ContentStore>,
		credentials: Arc<dyn CredentialResolver>,
		publisher: Arc<dyn ResultPublisher>,
	) -> Self {
		Self { adapters, records, contents, credentials, publisher }
	}

	/// Postgres stores, config-backed adapters and credentials, and the configured publisher.
	pub fn from_config(cfg: &Config, db: Db) -> Self {
		let advisor = StrategyAdvisor::new(Arc::new(advisor::LlmAdvisor::new(
			cfg.providers.advisory.clone(),
		)));
		let publisher: Arc<dyn ResultPublisher> = match cfg.publish.root.as_deref() {
			Some(root) => Arc::new(publish::DirPublisher::new(root)),
			None => Arc::new(publish::LogPublisher),
		};

		Self {
			adapters: adapters::build_registry(&cfg.catalogs, &advisor),
			records: Arc::new(store::PgRecordStore::new(db.clone())),
			contents: Arc::new(store::PgContentStore::new(db)),
			credentials: Arc::new(credentials::ConfigCredentials::from_config(cfg)),
			publisher,
		}
	}
}

pub struct SearchService {
	pub policy: SearchPolicy,
	pub router: PlatformRouter,
	pub collaborators: Collaborators,
}
impl SearchService {
	pub fn new(policy: SearchPolicy, router: PlatformRouter, collaborators: Collaborators) -> Self {
		Self { policy, router, collaborators }
	}

	pub fn from_config(cfg: &Config, db: Db) -> Result<Self> {
		Ok(Self {
			policy: SearchPolicy::from(&cfg.search),
			router: router_from_config(cfg)?,
			collaborators: Collaborators::from_config(cfg, db),
		})
	}
}

pub fn router_from_config(cfg: &Config) -> Result<PlatformRouter> {
	let default = parse_platform(&cfg.routing.default_platform)?;
	let mut router = PlatformRouter::new(default);

	for (domain, platform) in &cfg.routing.domain_overrides {
		router = router.with_override(domain, parse_platform(platform)?);
	}

	Ok(router)
}

fn parse_platform(raw: &str) -> Result<Platform> {
	raw.parse().map_err(|err: prowl_domain::ParseEnumError| Error::InvalidRequest {
		message: err.to_string(),
	})
}
