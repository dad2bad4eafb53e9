use serde::Serialize;
use uuid::Uuid;

use prowl_domain::{
	ContentSearchStatus, ContentTarget, NewSearchAttempt, Platform, SearchAttempt, SearchStatus,
};

use crate::{
	AttemptTrace, BestAttempt, CatalogAdapter, Error, KeywordRequest, ProgressiveOutcome, Result,
	SearchSeed, SearchService, StopReason, progressive, race,
};

/// What a façade entry point reports back to its caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchReport {
	pub best_attempt_id: Uuid,
	pub platform: Platform,
	pub keywords: String,
	pub product_count: u32,
	pub quality_score: f32,
	pub excellent: bool,
	pub stop_reason: Option<StopReason>,
	pub attempts: Vec<AttemptTrace>,
}
impl SearchReport {
	fn new(attempt: &SearchAttempt, excellent: bool) -> Self {
		Self {
			best_attempt_id: attempt.id,
			platform: attempt.platform,
			keywords: attempt.keywords.clone(),
			product_count: attempt.product_count,
			quality_score: attempt.quality(),
			excellent,
			stop_reason: None,
			attempts: Vec::new(),
		}
	}
}

struct RunSummary {
	best: Option<BestAttempt>,
	trail: Vec<AttemptTrace>,
	stop_reason: Option<StopReason>,
	last_error: Option<String>,
}
impl From<ProgressiveOutcome> for RunSummary {
	fn from(outcome: ProgressiveOutcome) -> Self {
		let last_error = outcome.last_error().map(str::to_string);

		Self {
			best: outcome.best,
			trail: outcome.trail,
			stop_reason: Some(outcome.stop_reason),
			last_error,
		}
	}
}

impl SearchService {
	/// One attempt on the platform routed from `domain`, or from the content URL when absent.
	pub async fn run_single_search(
		&self,
		content_id: Uuid,
		domain: Option<&str>,
		credential_id: &str,
	) -> Result<SearchReport> {
		let credential_id = require_credential_id(credential_id)?;
		let content = self.load_content(content_id).await?;
		let (domain, adapter) = self.route(&content, domain)?;

		self.collaborators.contents.set_status(content_id, ContentSearchStatus::Searching).await?;

		let result = async {
			let platform = adapter.platform();
			let credential = self.collaborators.credentials.resolve(credential_id, platform).await;
			let seed = self.seed(adapter, &content, &domain, true).await?;
			let new = NewSearchAttempt::new(seed.keywords, platform, seed.config, credential_id);
			let run = progressive::execute_attempt(
				adapter,
				self.collaborators.records.as_ref(),
				&new,
				credential.as_ref(),
			)
			.await?;
			let trail = vec![run.trace()];
			let last_error = run.error.clone();
			let best = run.is_success().then(|| run.into_best());

			Ok(RunSummary { best, trail, stop_reason: None, last_error })
		}
		.await;

		self.conclude(content_id, result).await
	}

	/// The bounded adaptive search on the platform routed from `domain`.
	pub async fn run_progressive_search(
		&self,
		content_id: Uuid,
		domain: Option<&str>,
		credential_id: &str,
	) -> Result<SearchReport> {
		self.progressive_search(content_id, domain, credential_id, true).await
	}

	/// Stores reader feedback on the content and reruns the progressive search with it.
	///
	/// The credential id comes from the content's current best attempt. Keywords are always
	/// regenerated, seeing the feedback and the best attempt's keywords.
	pub async fn resubmit_with_feedback(
		&self,
		content_id: Uuid,
		feedback: &str,
	) -> Result<SearchReport> {
		let feedback = feedback.trim();

		if feedback.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Feedback must not be empty.".to_string(),
			});
		}

		let content = self.load_content(content_id).await?;
		let best_id = content.best_attempt_id.ok_or(Error::MissingCredentialId)?;
		let best = self.load_attempt(best_id).await?;
		let credential_id = require_credential_id(&best.credential_id)?;
		let contents = &self.collaborators.contents;

		contents.set_feedback(content_id, feedback).await?;
		contents.set_status(content_id, ContentSearchStatus::Pending).await?;

		tracing::info!(
			%content_id,
			previous_attempt_id = %best_id,
			"Rerunning search with feedback."
		);

		self.progressive_search(content_id, None, credential_id, false).await
	}

	async fn progressive_search(
		&self,
		content_id: Uuid,
		domain: Option<&str>,
		credential_id: &str,
		reuse_best: bool,
	) -> Result<SearchReport> {
		let credential_id = require_credential_id(credential_id)?;
		let content = self.load_content(content_id).await?;
		let (domain, adapter) = self.route(&content, domain)?;

		self.collaborators.contents.set_status(content_id, ContentSearchStatus::Searching).await?;

		let result = async {
			let platform = adapter.platform();
			let credential = self.collaborators.credentials.resolve(credential_id, platform).await;
			let seed = self.seed(adapter, &content, &domain, reuse_best).await?;

			tracing::info!(
				%content_id,
				%platform,
				keywords = seed.keywords.as_str(),
				"Starting progressive search."
			);

			let outcome = progressive::run_progressive(
				adapter,
				self.collaborators.records.as_ref(),
				&self.policy,
				credential_id,
				credential.as_ref(),
				seed,
			)
			.await?;

			Ok(RunSummary::from(outcome))
		}
		.await;

		self.conclude(content_id, result).await
	}

	/// One single search per registered platform; the highest-quality success becomes the best
	/// attempt. Failed platforms are left out of the comparison.
	pub async fn run_multi_platform_search(
		&self,
		content_id: Uuid,
		credential_id: &str,
	) -> Result<SearchReport> {
		let credential_id = require_credential_id(credential_id)?;
		let content = self.load_content(content_id).await?;

		self.collaborators.contents.set_status(content_id, ContentSearchStatus::Searching).await?;

		let entries = race::run_race(self, &content, credential_id).await;
		let mut runs = Vec::new();
		let mut last_error = None;

		for entry in entries {
			match entry.result {
				Ok(run) => {
					if let Some(error) = &run.error {
						last_error = Some(error.clone());
					}

					runs.push(run);
				},
				Err(err) => {
					tracing::warn!(
						platform = %entry.platform,
						error = %err,
						"Platform excluded from the race."
					);

					last_error = Some(err.to_string());
				},
			}
		}

		let trail = runs.iter().map(|run| run.trace()).collect();
		let winner = race::pick_best(&runs.iter().collect::<Vec<_>>());
		let best = winner.map(|index| runs.swap_remove(index).into_best());

		self.conclude(content_id, Ok(RunSummary { best, trail, stop_reason: None, last_error }))
			.await
	}

	/// Re-executes a stored attempt's keywords and config, letting the adapter narrow the config
	/// first. Used for retries; the content status is left alone.
	pub async fn process_existing_attempt(&self, attempt_id: Uuid) -> Result<SearchReport> {
		let stored = self.load_attempt(attempt_id).await?;
		let credential_id = require_credential_id(&stored.credential_id)?;
		let adapter = self.adapter(stored.platform)?;
		let credential =
			self.collaborators.credentials.resolve(credential_id, stored.platform).await;
		let config = adapter.refine_config(&stored.keywords, &stored.platform_config).await;
		let new =
			NewSearchAttempt::new(stored.keywords.clone(), stored.platform, config, credential_id);
		let run = progressive::execute_attempt(
			adapter,
			self.collaborators.records.as_ref(),
			&new,
			credential.as_ref(),
		)
		.await?;

		if !run.is_success() {
			return Err(Error::NoSuccessfulAttempt { attempts: 1, last_error: run.error });
		}

		let trace = run.trace();
		let best = run.into_best();

		self.publish(&best).await;

		let mut report =
			SearchReport::new(&best.attempt, self.is_excellent(best.attempt.product_count));

		report.attempts.push(trace);

		Ok(report)
	}

	/// Manual override: repoints the content's best attempt without re-running anything.
	pub async fn select_best_attempt(
		&self,
		content_id: Uuid,
		attempt_id: Uuid,
	) -> Result<SearchReport> {
		let attempt = self.load_attempt(attempt_id).await?;

		require_credential_id(&attempt.credential_id)?;
		self.load_content(content_id).await?;

		let contents = &self.collaborators.contents;

		self.collaborators.records.link_to_content(content_id, &[attempt_id]).await?;
		contents.set_best_attempt(content_id, attempt_id).await?;
		contents.set_status(content_id, ContentSearchStatus::Completed).await?;

		tracing::info!(%content_id, %attempt_id, "Best attempt selected manually.");

		Ok(SearchReport::new(&attempt, self.is_excellent(attempt.product_count)))
	}

	/// Most recent attempts on `platform`.
	pub async fn list_attempts(
		&self,
		platform: Platform,
		limit: u32,
	) -> Result<Vec<SearchAttempt>> {
		self.collaborators.records.list_by_platform(platform, limit).await
	}

	/// Every attempt run or selected for the content, highest quality first.
	pub async fn list_content_attempts(&self, content_id: Uuid) -> Result<Vec<SearchAttempt>> {
		self.load_content(content_id).await?;

		self.collaborators.records.list_by_content(content_id).await
	}

	/// Starting keywords and config for `adapter`.
	///
	/// With `reuse_best`, a best attempt on the same platform that has not been rejected is reused
	/// as is. Otherwise the adapter generates a fresh query, seeing the previous keywords and the
	/// content feedback.
	pub(crate) async fn seed(
		&self,
		adapter: &dyn CatalogAdapter,
		content: &ContentTarget,
		domain: &str,
		reuse_best: bool,
	) -> Result<SearchSeed> {
		let mut previous_keywords = None;

		let prior = match content.best_attempt_id {
			Some(best_id) => self.collaborators.records.get(best_id).await?,
			None => None,
		};

		if let Some(prior) = prior {
			if reuse_best
				&& prior.platform == adapter.platform()
				&& prior.status != SearchStatus::Rejected
			{
				tracing::info!(
					content_id = %content.content_id,
					attempt_id = %prior.id,
					"Seeding from the current best attempt."
				);

				return Ok(SearchSeed::new(prior.keywords, prior.platform_config));
			}

			previous_keywords = Some(prior.keywords);
		}

		let request = KeywordRequest {
			content: &content.text,
			domain,
			feedback: content.feedback.as_deref(),
			previous_keywords: previous_keywords.as_deref(),
			max_words: self.policy.max_keyword_words,
		};
		let query = adapter.generate_initial_query(&request).await;

		Ok(SearchSeed::new(query.keywords, query.config))
	}

	pub(crate) async fn seed_for(
		&self,
		adapter: &dyn CatalogAdapter,
		content: &ContentTarget,
	) -> Result<SearchSeed> {
		let domain = content.domain().unwrap_or_default();

		self.seed(adapter, content, &domain, true).await
	}

	fn route(
		&self,
		content: &ContentTarget,
		domain: Option<&str>,
	) -> Result<(String, &dyn CatalogAdapter)> {
		let domain = match domain {
			Some(domain) if !domain.trim().is_empty() => domain.trim().to_string(),
			_ => content.domain().unwrap_or_default(),
		};
		let platform = if domain.is_empty() {
			self.router.default_platform()
		} else {
			self.router.route(&domain)
		};

		Ok((domain, self.adapter(platform)?))
	}

	fn adapter(&self, platform: Platform) -> Result<&dyn CatalogAdapter> {
		self.collaborators
			.adapters
			.get(&platform)
			.map(|adapter| adapter.as_ref())
			.ok_or(Error::UnsupportedPlatform { platform })
	}

	async fn load_content(&self, content_id: Uuid) -> Result<ContentTarget> {
		self.collaborators.contents.get(content_id).await?.ok_or_else(|| Error::NotFound {
			message: format!("Content {content_id} does not exist."),
		})
	}

	async fn load_attempt(&self, attempt_id: Uuid) -> Result<SearchAttempt> {
		self.collaborators.records.get(attempt_id).await?.ok_or_else(|| Error::NotFound {
			message: format!("Search attempt {attempt_id} does not exist."),
		})
	}

	fn is_excellent(&self, product_count: u32) -> bool {
		product_count >= self.policy.ideal_product_count
	}

	/// Records the run on the content target and publishes the best attempt.
	async fn conclude(
		&self,
		content_id: Uuid,
		result: Result<RunSummary>,
	) -> Result<SearchReport> {
		let contents = &self.collaborators.contents;
		let summary = match result {
			Ok(summary) => summary,
			Err(err) => {
				if let Err(status_err) =
					contents.set_status(content_id, ContentSearchStatus::Failed).await
				{
					tracing::error!(
						%content_id,
						error = %status_err,
						"Failed to mark content search as failed."
					);
				}

				return Err(err);
			},
		};
		let mut attempt_ids = Vec::new();

		for trace in &summary.trail {
			if !attempt_ids.contains(&trace.attempt_id) {
				attempt_ids.push(trace.attempt_id);
			}
		}

		self.collaborators.records.link_to_content(content_id, &attempt_ids).await?;

		let Some(best) = summary.best else {
			contents.set_status(content_id, ContentSearchStatus::Failed).await?;

			tracing::warn!(
				%content_id,
				attempts = summary.trail.len(),
				"No attempt produced products."
			);

			return Err(Error::NoSuccessfulAttempt {
				attempts: summary.trail.len(),
				last_error: summary.last_error,
			});
		};

		contents.set_best_attempt(content_id, best.attempt.id).await?;
		contents.set_status(content_id, ContentSearchStatus::Completed).await?;

		self.publish(&best).await;

		let mut report =
			SearchReport::new(&best.attempt, self.is_excellent(best.attempt.product_count));

		report.stop_reason = summary.stop_reason;
		report.attempts = summary.trail;

		tracing::info!(
			%content_id,
			best_attempt_id = %report.best_attempt_id,
			platform = %report.platform,
			product_count = report.product_count,
			quality_score = report.quality_score,
			"Search concluded."
		);

		Ok(report)
	}

	async fn publish(&self, best: &BestAttempt) {
		if let Err(err) = self.collaborators.publisher.publish(&best.attempt, &best.products).await
		{
			tracing::warn!(
				attempt_id = %best.attempt.id,
				error = %err,
				"Failed to publish search results."
			);
		}
	}
}

fn require_credential_id(credential_id: &str) -> Result<&str> {
	let credential_id = credential_id.trim();

	if credential_id.is_empty() {
		return Err(Error::MissingCredentialId);
	}

	Ok(credential_id)
}
