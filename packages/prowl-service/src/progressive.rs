//! Bounded, adaptive search over one platform.
//!
//! Each attempt executes one `(keywords, config)` combination, keeps the best-scoring completed
//! attempt, and asks the adapter how to mutate the search next. The loop stops when an attempt
//! reaches the target product count, when the attempt budget is spent, or when the advisor says
//! stop or answers with something unusable. Duplicate combinations consume budget without a
//! catalog call, so the loop always terminates within `max_attempts`.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use prowl_domain::{
	Mutation, NewSearchAttempt, NormalizedProduct, SearchAttempt, SearchStatus,
	keywords::sanitize_keywords,
};

use crate::{
	AdapterError, CatalogAdapter, Credential, Result, SearchRecordStore, StrategyContext,
	TriedSearch,
};

#[derive(Clone, Debug, PartialEq)]
pub struct SearchPolicy {
	pub max_attempts: u32,
	pub target_product_count: u32,
	pub ideal_product_count: u32,
	pub max_combinations: u32,
	pub max_keyword_words: u32,
}
impl Default for SearchPolicy {
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
impl From<&prowl_config::Search> for SearchPolicy {
	fn from(cfg: &prowl_config::Search) -> Self {
		Self {
			max_attempts: cfg.max_attempts,
			target_product_count: cfg.target_product_count,
			ideal_product_count: cfg.ideal_product_count,
			max_combinations: cfg.max_combinations,
			max_keyword_words: cfg.max_keyword_words,
		}
	}
}

/// Starting point of a progressive search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchSeed {
	pub keywords: String,
	pub config: Value,
	/// Keywords the run started from; broadening falls back to these.
	pub base_keywords: String,
}
impl SearchSeed {
	pub fn new(keywords: impl Into<String>, config: Value) -> Self {
		let keywords = keywords.into();

		Self { base_keywords: keywords.clone(), keywords, config }
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
	TargetReached,
	AttemptsExhausted,
	AdvisorStopped,
	InvalidSuggestion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
	Completed,
	Failed,
	Duplicate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttemptTrace {
	/// The stored attempt; a duplicate points at the attempt it repeats.
	pub attempt_id: Uuid,
	pub keywords: String,
	pub config: Value,
	pub fingerprint: String,
	pub outcome: AttemptOutcome,
	pub product_count: u32,
	pub quality_score: Option<f32>,
	pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BestAttempt {
	pub attempt: SearchAttempt,
	pub products: Vec<NormalizedProduct>,
}
impl BestAttempt {
	pub fn quality(&self) -> f32 {
		self.attempt.quality()
	}
}

#[derive(Clone, Debug)]
pub struct ProgressiveOutcome {
	pub best: Option<BestAttempt>,
	pub trail: Vec<AttemptTrace>,
	pub stop_reason: StopReason,
	/// The returned attempt reached the ideal product count.
	pub excellent: bool,
}
impl ProgressiveOutcome {
	/// Attempts consumed, duplicates included.
	pub fn attempts(&self) -> usize {
		self.trail.len()
	}

	pub fn last_error(&self) -> Option<&str> {
		self.trail.iter().rev().find_map(|trace| trace.error.as_deref())
	}
}

/// Result of executing one combination.
#[derive(Clone, Debug)]
pub(crate) struct AttemptRun {
	pub(crate) attempt: SearchAttempt,
	pub(crate) products: Vec<NormalizedProduct>,
	pub(crate) error: Option<String>,
}
impl AttemptRun {
	/// Completed with at least one product.
	pub(crate) fn is_success(&self) -> bool {
		self.attempt.is_completed() && self.attempt.product_count > 0
	}

	pub(crate) fn trace(&self) -> AttemptTrace {
		AttemptTrace {
			attempt_id: self.attempt.id,
			keywords: self.attempt.keywords.clone(),
			config: self.attempt.platform_config.clone(),
			fingerprint: self.attempt.fingerprint.clone(),
			outcome: if self.attempt.is_completed() {
				AttemptOutcome::Completed
			} else {
				AttemptOutcome::Failed
			},
			product_count: self.attempt.product_count,
			quality_score: self.attempt.quality_score,
			error: self.error.clone(),
		}
	}

	pub(crate) fn into_best(self) -> BestAttempt {
		BestAttempt { attempt: self.attempt, products: self.products }
	}
}

/// Loop state threaded through every attempt.
struct SearchState {
	keywords: String,
	config: Value,
	base_keywords: String,
	attempted: HashMap<String, Uuid>,
	tried: Vec<TriedSearch>,
	trail: Vec<AttemptTrace>,
	best: Option<BestAttempt>,
	last_count: u32,
}
impl SearchState {
	fn new(seed: SearchSeed) -> Self {
		Self {
			keywords: seed.keywords,
			config: seed.config,
			base_keywords: seed.base_keywords,
			attempted: HashMap::new(),
			tried: Vec::new(),
			trail: Vec::new(),
			best: None,
			last_count: 0,
		}
	}

	fn consumed(&self) -> u32 {
		self.trail.len() as u32
	}

	/// Keeps the first successful attempt, then only strictly better ones.
	fn offer(&mut self, run: &AttemptRun) {
		if !run.is_success() {
			return;
		}

		let better = match &self.best {
			Some(best) => run.attempt.quality() > best.quality(),
			None => true,
		};

		if better {
			self.best = Some(run.clone().into_best());
		}
	}

	fn finish(self, stop_reason: StopReason) -> ProgressiveOutcome {
		ProgressiveOutcome { best: self.best, trail: self.trail, stop_reason, excellent: false }
	}
}

/// Runs the progressive search for one platform.
///
/// Only record-store failures abort the run; catalog and advisory failures are absorbed.
pub async fn run_progressive(
	adapter: &dyn CatalogAdapter,
	records: &dyn SearchRecordStore,
	policy: &SearchPolicy,
	credential_id: &str,
	credential: Option<&Credential>,
	seed: SearchSeed,
) -> Result<ProgressiveOutcome> {
	let platform = adapter.platform();
	let broadest_config = adapter.broadest_config();
	let max_attempts = policy.max_attempts.max(1);
	let mut state = SearchState::new(seed);

	loop {
		let new = NewSearchAttempt::new(
			state.keywords.clone(),
			platform,
			state.config.clone(),
			credential_id,
		);
		let product_count = if let Some(&attempt_id) = state.attempted.get(&new.fingerprint) {
			tracing::info!(
				%platform,
				attempt = state.consumed() + 1,
				fingerprint = new.fingerprint.as_str(),
				"Combination already attempted. Skipping catalog call."
			);

			state.trail.push(AttemptTrace {
				attempt_id,
				keywords: new.keywords.clone(),
				config: new.platform_config.clone(),
				fingerprint: new.fingerprint.clone(),
				outcome: AttemptOutcome::Duplicate,
				product_count: state.last_count,
				quality_score: None,
				error: None,
			});

			state.last_count
		} else {
			let run = execute_attempt(adapter, records, &new, credential).await?;
			let count = run.attempt.product_count;

			state.attempted.insert(new.fingerprint.clone(), run.attempt.id);

			state.tried.push(TriedSearch {
				keywords: new.keywords.clone(),
				config: new.platform_config.clone(),
				product_count: count,
			});
			state.trail.push(run.trace());
			state.offer(&run);

			state.last_count = count;

			if run.is_success() && count >= policy.target_product_count {
				tracing::info!(
					%platform,
					attempt = state.consumed(),
					product_count = count,
					"Target product count reached."
				);

				let excellent = count >= policy.ideal_product_count;
				let mut outcome = state.finish(StopReason::TargetReached);

				outcome.best = Some(run.into_best());
				outcome.excellent = excellent;

				return Ok(outcome);
			}

			count
		};

		if state.consumed() >= max_attempts {
			tracing::info!(%platform, attempts = state.consumed(), "Attempt budget exhausted.");

			return Ok(state.finish(StopReason::AttemptsExhausted));
		}

		let suggestion = {
			let context = StrategyContext {
				platform,
				keywords: &state.keywords,
				config: &state.config,
				product_count,
				base_keywords: &state.base_keywords,
				tried: &state.tried,
				broadest_config: &broadest_config,
				policy,
			};

			adapter.suggest_next_strategy(&context).await
		};

		match suggestion.mutation() {
			Mutation::Stop => {
				tracing::info!(
					%platform,
					reason = suggestion.reason.as_str(),
					"Advisor stopped the search."
				);

				return Ok(state.finish(StopReason::AdvisorStopped));
			},
			Mutation::Keywords(raw) => {
				let keywords = sanitize_keywords(&raw, policy.max_keyword_words as usize);

				if keywords.is_empty() {
					tracing::warn!(%platform, "Suggested keywords were empty after sanitizing.");

					return Ok(state.finish(StopReason::InvalidSuggestion));
				}

				state.keywords = keywords;
			},
			Mutation::Config(config) => {
				state.config = adapter.coerce_config(&config);
			},
			Mutation::Invalid => {
				tracing::warn!(
					%platform,
					action = ?suggestion.action,
					reason = suggestion.reason.as_str(),
					"Unusable strategy suggestion. Stopping."
				);

				return Ok(state.finish(StopReason::InvalidSuggestion));
			},
		}
	}
}

/// Executes one combination: find-or-create the record, mark it searching, call the catalog,
/// then persist the completed or failed result.
pub(crate) async fn execute_attempt(
	adapter: &dyn CatalogAdapter,
	records: &dyn SearchRecordStore,
	new: &NewSearchAttempt,
	credential: Option<&Credential>,
) -> Result<AttemptRun> {
	let mut attempt = records.find_or_create(new).await?;

	records.mark_searching(attempt.id).await?;

	attempt.status = SearchStatus::Searching;

	let result = adapter.execute(&new.keywords, &new.platform_config, credential).await;
	let now = OffsetDateTime::now_utc();

	match result {
		Ok(page) => {
			let products = adapter.normalize(&page);
			let quality = adapter.assess_quality(&products, &new.keywords).await;
			let product_count = products.len() as u32;

			records.complete(attempt.id, product_count, quality).await?;

			tracing::info!(
				platform = %new.platform,
				attempt_id = %attempt.id,
				keywords = new.keywords.as_str(),
				product_count,
				quality,
				"Search attempt completed."
			);

			attempt.status = SearchStatus::Completed;
			attempt.product_count = product_count;
			attempt.quality_score = Some(quality);
			attempt.error_message = None;
			attempt.executed_at = Some(now);
			attempt.updated_at = now;

			Ok(AttemptRun { attempt, products, error: None })
		},
		Err(AdapterError::Empty) => {
			records.complete(attempt.id, 0, 0.0).await?;

			tracing::info!(
				platform = %new.platform,
				attempt_id = %attempt.id,
				keywords = new.keywords.as_str(),
				"Search attempt returned no items."
			);

			attempt.status = SearchStatus::Completed;
			attempt.product_count = 0;
			attempt.quality_score = Some(0.0);
			attempt.error_message = None;
			attempt.executed_at = Some(now);
			attempt.updated_at = now;

			Ok(AttemptRun { attempt, products: Vec::new(), error: None })
		},
		Err(err) => {
			let message = err.to_string();

			records.fail(attempt.id, &message).await?;

			tracing::warn!(
				platform = %new.platform,
				attempt_id = %attempt.id,
				keywords = new.keywords.as_str(),
				error = %err,
				"Search attempt failed."
			);

			attempt.status = SearchStatus::Failed;
			attempt.product_count = 0;
			attempt.quality_score = None;
			attempt.error_message = Some(message.clone());
			attempt.executed_at = Some(now);
			attempt.updated_at = now;

			Ok(AttemptRun { attempt, products: Vec::new(), error: Some(message) })
		},
	}
}
