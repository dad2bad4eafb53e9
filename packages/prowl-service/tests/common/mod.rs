#![allow(dead_code)]

use std::{
	collections::{HashMap, VecDeque},
	sync::{Arc, Mutex},
};

use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use uuid::Uuid;

use prowl_domain::{
	ContentSearchStatus, ContentTarget, NewSearchAttempt, NormalizedProduct, Platform,
	PlatformRouter, SearchAttempt, SearchStatus, StrategySuggestion, normalize_items, taxonomy,
};
use prowl_service::{
	AdapterError, AdapterRegistry, Advisor, AdvisoryError, BoxFuture, CatalogAdapter, CatalogPage,
	Collaborators, ConfigRequest, ContentStore, Credential, CredentialResolver, InitialQuery,
	KeywordRequest, ResultPublisher, Result, SearchPolicy, SearchRecordStore, SearchService,
	StrategyAdvisor, StrategyContext,
};

pub const CREDENTIAL_ID: &str = "default";

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().expect("Test mutex poisoned.")
}

/// Advisor whose every call fails as unreachable.
pub struct UnavailableAdvisor;
impl Advisor for UnavailableAdvisor {
	fn propose_keywords<'a>(
		&'a self,
		_request: &'a KeywordRequest<'a>,
	) -> BoxFuture<'a, std::result::Result<String, AdvisoryError>> {
		Box::pin(async { Err(unavailable()) })
	}

	fn select_config<'a>(
		&'a self,
		_request: &'a ConfigRequest<'a>,
	) -> BoxFuture<'a, std::result::Result<Value, AdvisoryError>> {
		Box::pin(async { Err(unavailable()) })
	}

	fn score_results<'a>(
		&'a self,
		_keywords: &'a str,
		_products: &'a [NormalizedProduct],
	) -> BoxFuture<'a, std::result::Result<f32, AdvisoryError>> {
		Box::pin(async { Err(unavailable()) })
	}

	fn suggest_strategy<'a>(
		&'a self,
		_context: &'a StrategyContext<'a>,
	) -> BoxFuture<'a, std::result::Result<StrategySuggestion, AdvisoryError>> {
		Box::pin(async { Err(unavailable()) })
	}
}

fn unavailable() -> AdvisoryError {
	AdvisoryError::Unavailable { message: "advisor offline".to_string() }
}

/// Advisor that answers from a script.
///
/// Suggestions are served in order; once the queue is empty `repeat` is served forever.
pub struct ScriptedAdvisor {
	pub keywords: Option<String>,
	pub config: Option<Value>,
	suggestions: Mutex<VecDeque<StrategySuggestion>>,
	repeat: StrategySuggestion,
	pub keyword_requests: Mutex<Vec<(Option<String>, Option<String>)>>,
	pub strategy_calls: Mutex<usize>,
}
impl ScriptedAdvisor {
	pub fn new(suggestions: Vec<StrategySuggestion>, repeat: StrategySuggestion) -> Self {
		Self {
			keywords: None,
			config: None,
			suggestions: Mutex::new(suggestions.into()),
			repeat,
			keyword_requests: Mutex::new(Vec::new()),
			strategy_calls: Mutex::new(0),
		}
	}

	pub fn with_keywords(mut self, keywords: &str) -> Self {
		self.keywords = Some(keywords.to_string());

		self
	}

	pub fn with_config(mut self, config: Value) -> Self {
		self.config = Some(config);

		self
	}
}
impl Advisor for ScriptedAdvisor {
	fn propose_keywords<'a>(
		&'a self,
		request: &'a KeywordRequest<'a>,
	) -> BoxFuture<'a, std::result::Result<String, AdvisoryError>> {
		Box::pin(async move {
			lock(&self.keyword_requests).push((
				request.previous_keywords.map(str::to_string),
				request.feedback.map(str::to_string),
			));

			self.keywords.clone().ok_or_else(unavailable)
		})
	}

	fn select_config<'a>(
		&'a self,
		_request: &'a ConfigRequest<'a>,
	) -> BoxFuture<'a, std::result::Result<Value, AdvisoryError>> {
		Box::pin(async move { self.config.clone().ok_or_else(unavailable) })
	}

	fn score_results<'a>(
		&'a self,
		_keywords: &'a str,
		_products: &'a [NormalizedProduct],
	) -> BoxFuture<'a, std::result::Result<f32, AdvisoryError>> {
		Box::pin(async { Err(unavailable()) })
	}

	fn suggest_strategy<'a>(
		&'a self,
		_context: &'a StrategyContext<'a>,
	) -> BoxFuture<'a, std::result::Result<StrategySuggestion, AdvisoryError>> {
		Box::pin(async move {
			*lock(&self.strategy_calls) += 1;

			Ok(lock(&self.suggestions).pop_front().unwrap_or_else(|| self.repeat.clone()))
		})
	}
}

/// One scripted catalog response.
#[derive(Clone, Debug)]
pub enum Step {
	Items(usize),
	ItemsScored(usize, f32),
	Fail(AdapterError),
}

/// Catalog adapter that answers from a script of steps, one per `execute` call.
///
/// Items use the shopping-aggregator raw shape regardless of the reported platform. An exhausted
/// script answers with an empty page.
pub struct ScriptedCatalog {
	platform: Platform,
	advisor: StrategyAdvisor,
	steps: Mutex<VecDeque<Step>>,
	scores: Mutex<VecDeque<Option<f32>>>,
	refined: Option<Value>,
	pub calls: Mutex<Vec<(String, Value, Option<String>)>>,
}
impl ScriptedCatalog {
	pub fn new(platform: Platform, advisor: Arc<dyn Advisor>, steps: Vec<Step>) -> Self {
		Self {
			platform,
			advisor: StrategyAdvisor::new(advisor),
			steps: Mutex::new(steps.into()),
			scores: Mutex::new(VecDeque::new()),
			refined: None,
			calls: Mutex::new(Vec::new()),
		}
	}

	/// Config returned when a stored attempt is rerun.
	pub fn with_refined_config(mut self, config: Value) -> Self {
		self.refined = Some(config);

		self
	}

	pub fn calls(&self) -> Vec<(String, Value, Option<String>)> {
		lock(&self.calls).clone()
	}

	pub fn executed_keywords(&self) -> Vec<String> {
		self.calls().into_iter().map(|(keywords, _, _)| keywords).collect()
	}
}
impl CatalogAdapter for ScriptedCatalog {
	fn platform(&self) -> Platform {
		self.platform
	}

	fn advisor(&self) -> &StrategyAdvisor {
		&self.advisor
	}

	fn generate_initial_query<'a>(
		&'a self,
		request: &'a KeywordRequest<'a>,
	) -> BoxFuture<'a, InitialQuery> {
		Box::pin(async move {
			let keywords = self.advisor.generate_keywords(request).await;

			InitialQuery { keywords, config: taxonomy::broadest_config(self.platform) }
		})
	}

	fn refine_config<'a>(&'a self, _keywords: &'a str, config: &'a Value) -> BoxFuture<'a, Value> {
		Box::pin(async move { self.refined.clone().unwrap_or_else(|| config.clone()) })
	}

	fn execute<'a>(
		&'a self,
		keywords: &'a str,
		config: &'a Value,
		credential: Option<&'a Credential>,
	) -> BoxFuture<'a, std::result::Result<CatalogPage, AdapterError>> {
		Box::pin(async move {
			lock(&self.calls).push((
				keywords.to_string(),
				config.clone(),
				credential.map(|credential| credential.id.clone()),
			));

			let step = lock(&self.steps).pop_front().unwrap_or(Step::Items(0));
			let (count, score) = match step {
				Step::Items(count) => (count, None),
				Step::ItemsScored(count, score) => (count, Some(score)),
				Step::Fail(err) => return Err(err),
			};

			if count == 0 {
				return Err(AdapterError::Empty);
			}

			lock(&self.scores).push_back(score);

			Ok(CatalogPage { items: items(keywords, count) })
		})
	}

	fn normalize(&self, page: &CatalogPage) -> Vec<NormalizedProduct> {
		normalize_items(Platform::ShoppingAggregator, &page.items)
	}

	fn assess_quality<'a>(
		&'a self,
		products: &'a [NormalizedProduct],
		keywords: &'a str,
	) -> BoxFuture<'a, f32> {
		Box::pin(async move {
			let scripted = lock(&self.scores).pop_front().flatten();

			match scripted {
				Some(score) => score,
				None => self.advisor.assess_quality(keywords, products).await,
			}
		})
	}
}

pub fn items(keywords: &str, count: usize) -> Vec<Value> {
	(0..count)
		.map(|idx| {
			json!({
				"title": format!("{keywords} #{idx}"),
				"link": format!("https://shop.example.com/items/{idx}"),
				"price": "$10.00",
				"source": "Example Shop",
			})
		})
		.collect()
}

/// In-memory record store with fingerprint deduplication.
#[derive(Default)]
pub struct MemoryRecordStore {
	pub attempts: Mutex<Vec<SearchAttempt>>,
	pub links: Mutex<Vec<(Uuid, Uuid)>>,
}
impl MemoryRecordStore {
	pub fn all(&self) -> Vec<SearchAttempt> {
		lock(&self.attempts).clone()
	}

	pub fn by_id(&self, attempt_id: Uuid) -> Option<SearchAttempt> {
		lock(&self.attempts).iter().find(|attempt| attempt.id == attempt_id).cloned()
	}

	pub fn insert(&self, attempt: SearchAttempt) {
		lock(&self.attempts).push(attempt);
	}

	fn update(&self, attempt_id: Uuid, apply: impl FnOnce(&mut SearchAttempt)) -> Result<()> {
		let mut attempts = lock(&self.attempts);
		let attempt = attempts.iter_mut().find(|attempt| attempt.id == attempt_id).ok_or_else(
			|| prowl_service::Error::NotFound { message: format!("Search {attempt_id}.") },
		)?;

		apply(attempt);

		attempt.updated_at = OffsetDateTime::now_utc();

		Ok(())
	}
}
impl SearchRecordStore for MemoryRecordStore {
	fn find_or_create<'a>(
		&'a self,
		new: &'a NewSearchAttempt,
	) -> BoxFuture<'a, Result<SearchAttempt>> {
		Box::pin(async move {
			let mut attempts = lock(&self.attempts);

			if let Some(existing) =
				attempts.iter_mut().find(|attempt| attempt.fingerprint == new.fingerprint)
			{
				existing.status = SearchStatus::Pending;

				return Ok(existing.clone());
			}

			let attempt = new_attempt(new);

			attempts.push(attempt.clone());

			Ok(attempt)
		})
	}

	fn get(&self, attempt_id: Uuid) -> BoxFuture<'_, Result<Option<SearchAttempt>>> {
		Box::pin(async move { Ok(self.by_id(attempt_id)) })
	}

	fn mark_searching(&self, attempt_id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.update(attempt_id, |attempt| attempt.status = SearchStatus::Searching)
		})
	}

	fn complete(
		&self,
		attempt_id: Uuid,
		product_count: u32,
		quality_score: f32,
	) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.update(attempt_id, |attempt| {
				attempt.status = SearchStatus::Completed;
				attempt.product_count = product_count;
				attempt.quality_score = Some(quality_score);
				attempt.error_message = None;
				attempt.executed_at = Some(OffsetDateTime::now_utc());
			})
		})
	}

	fn fail<'a>(&'a self, attempt_id: Uuid, error_message: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.update(attempt_id, |attempt| {
				attempt.status = SearchStatus::Failed;
				attempt.product_count = 0;
				attempt.quality_score = None;
				attempt.error_message = Some(error_message.to_string());
				attempt.executed_at = Some(OffsetDateTime::now_utc());
			})
		})
	}

	fn list_by_platform(
		&self,
		platform: Platform,
		limit: u32,
	) -> BoxFuture<'_, Result<Vec<SearchAttempt>>> {
		Box::pin(async move {
			Ok(lock(&self.attempts)
				.iter()
				.rev()
				.filter(|attempt| attempt.platform == platform)
				.take(limit as usize)
				.cloned()
				.collect())
		})
	}

	fn link_to_content<'a>(
		&'a self,
		content_id: Uuid,
		attempt_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut links = lock(&self.links);

			for attempt_id in attempt_ids {
				if !links.contains(&(content_id, *attempt_id)) {
					links.push((content_id, *attempt_id));
				}
			}

			Ok(())
		})
	}

	fn list_by_content(&self, content_id: Uuid) -> BoxFuture<'_, Result<Vec<SearchAttempt>>> {
		Box::pin(async move {
			let linked: Vec<Uuid> = lock(&self.links)
				.iter()
				.filter(|(id, _)| *id == content_id)
				.map(|(_, attempt_id)| *attempt_id)
				.collect();
			let mut attempts: Vec<SearchAttempt> = lock(&self.attempts)
				.iter()
				.filter(|attempt| linked.contains(&attempt.id))
				.cloned()
				.collect();

			attempts.sort_by(|a, b| {
				b.quality_score
					.is_some()
					.cmp(&a.quality_score.is_some())
					.then(b.quality().total_cmp(&a.quality()))
					.then(b.created_at.cmp(&a.created_at))
			});

			Ok(attempts)
		})
	}
}

pub fn new_attempt(new: &NewSearchAttempt) -> SearchAttempt {
	let now = OffsetDateTime::now_utc();

	SearchAttempt {
		id: Uuid::new_v4(),
		fingerprint: new.fingerprint.clone(),
		keywords: new.keywords.clone(),
		platform: new.platform,
		platform_config: new.platform_config.clone(),
		credential_id: new.credential_id.clone(),
		status: SearchStatus::Pending,
		product_count: 0,
		quality_score: None,
		error_message: None,
		executed_at: None,
		created_at: now,
		updated_at: now,
	}
}

#[derive(Default)]
pub struct MemoryContentStore {
	pub contents: Mutex<HashMap<Uuid, ContentTarget>>,
	pub status_history: Mutex<Vec<(Uuid, ContentSearchStatus)>>,
}
impl MemoryContentStore {
	pub fn insert(&self, content: ContentTarget) {
		lock(&self.contents).insert(content.content_id, content);
	}

	pub fn set_best(&self, content_id: Uuid, attempt_id: Uuid) {
		if let Some(content) = lock(&self.contents).get_mut(&content_id) {
			content.best_attempt_id = Some(attempt_id);
		}
	}

	pub fn put_feedback(&self, content_id: Uuid, feedback: &str) {
		if let Some(content) = lock(&self.contents).get_mut(&content_id) {
			content.feedback = Some(feedback.to_string());
		}
	}

	pub fn content(&self, content_id: Uuid) -> Option<ContentTarget> {
		lock(&self.contents).get(&content_id).cloned()
	}

	pub fn statuses(&self, content_id: Uuid) -> Vec<ContentSearchStatus> {
		lock(&self.status_history)
			.iter()
			.filter(|(id, _)| *id == content_id)
			.map(|(_, status)| *status)
			.collect()
	}
}
impl ContentStore for MemoryContentStore {
	fn get(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<ContentTarget>>> {
		Box::pin(async move { Ok(self.content(content_id)) })
	}

	fn set_status(
		&self,
		content_id: Uuid,
		status: ContentSearchStatus,
	) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let mut contents = lock(&self.contents);
			let content = contents.get_mut(&content_id).ok_or_else(|| {
				prowl_service::Error::NotFound { message: format!("Content {content_id}.") }
			})?;

			content.search_status = Some(status);

			lock(&self.status_history).push((content_id, status));

			Ok(())
		})
	}

	fn set_best_attempt(&self, content_id: Uuid, attempt_id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let mut contents = lock(&self.contents);
			let content = contents.get_mut(&content_id).ok_or_else(|| {
				prowl_service::Error::NotFound { message: format!("Content {content_id}.") }
			})?;

			content.best_attempt_id = Some(attempt_id);

			Ok(())
		})
	}

	fn set_feedback<'a>(
		&'a self,
		content_id: Uuid,
		feedback: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut contents = lock(&self.contents);
			let content = contents.get_mut(&content_id).ok_or_else(|| {
				prowl_service::Error::NotFound { message: format!("Content {content_id}.") }
			})?;

			content.feedback = Some(feedback.to_string());

			Ok(())
		})
	}
}

/// Resolves any credential id to an empty field set.
pub struct StaticCredentials;
impl CredentialResolver for StaticCredentials {
	fn resolve<'a>(
		&'a self,
		credential_id: &'a str,
		_platform: Platform,
	) -> BoxFuture<'a, Option<Credential>> {
		Box::pin(async move {
			Some(Credential { id: credential_id.to_string(), fields: Map::new() })
		})
	}
}

#[derive(Default)]
pub struct RecordingPublisher {
	pub published: Mutex<Vec<(Uuid, usize)>>,
}
impl RecordingPublisher {
	pub fn published(&self) -> Vec<(Uuid, usize)> {
		lock(&self.published).clone()
	}
}
impl ResultPublisher for RecordingPublisher {
	fn publish<'a>(
		&'a self,
		attempt: &'a SearchAttempt,
		products: &'a [NormalizedProduct],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			lock(&self.published).push((attempt.id, products.len()));

			Ok(())
		})
	}
}

/// A service wired to in-memory fakes.
pub struct Harness {
	pub service: SearchService,
	pub records: Arc<MemoryRecordStore>,
	pub contents: Arc<MemoryContentStore>,
	pub publisher: Arc<RecordingPublisher>,
}
impl Harness {
	pub fn new(adapters: Vec<Arc<dyn CatalogAdapter>>, policy: SearchPolicy) -> Self {
		let records = Arc::new(MemoryRecordStore::default());
		let contents = Arc::new(MemoryContentStore::default());
		let publisher = Arc::new(RecordingPublisher::default());
		let mut registry = AdapterRegistry::new();

		for adapter in adapters {
			registry.insert(adapter.platform(), adapter);
		}

		let router = PlatformRouter::new(Platform::ShoppingAggregator)
			.with_override("on3.com", Platform::SpecialtyRetailer);
		let collaborators = Collaborators::new(
			registry,
			records.clone(),
			contents.clone(),
			Arc::new(StaticCredentials),
			publisher.clone(),
		);

		let service = SearchService::new(policy, router, collaborators);

		Self { service, records, contents, publisher }
	}

	pub fn add_content(&self, url: &str, text: &str) -> Uuid {
		let content_id = Uuid::new_v4();

		self.contents.insert(ContentTarget {
			content_id,
			url: url.to_string(),
			text: text.to_string(),
			feedback: None,
			best_attempt_id: None,
			search_status: None,
		});

		content_id
	}
}
