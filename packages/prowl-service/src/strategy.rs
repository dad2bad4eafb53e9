use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use prowl_domain::{
	FallbackInput, NormalizedProduct, Platform, StrategySuggestion, fallback_suggestion,
	heuristic_quality,
	keywords::{keywords_from_content, sanitize_keywords},
};

use crate::{AdvisoryError, Advisor, SearchPolicy};

/// Inputs for initial keyword generation.
#[derive(Clone, Debug)]
pub struct KeywordRequest<'a> {
	pub content: &'a str,
	pub domain: &'a str,
	pub feedback: Option<&'a str>,
	pub previous_keywords: Option<&'a str>,
	pub max_words: u32,
}

#[derive(Clone, Debug)]
pub struct ConfigRequest<'a> {
	pub platform: Platform,
	pub keywords: &'a str,
	pub feedback: Option<&'a str>,
}

/// A combination the current run has already executed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TriedSearch {
	pub keywords: String,
	pub config: Value,
	pub product_count: u32,
}

/// Everything a strategy suggestion may depend on.
#[derive(Clone, Debug)]
pub struct StrategyContext<'a> {
	pub platform: Platform,
	pub keywords: &'a str,
	pub config: &'a Value,
	pub product_count: u32,
	pub base_keywords: &'a str,
	pub tried: &'a [TriedSearch],
	pub broadest_config: &'a Value,
	pub policy: &'a SearchPolicy,
}

/// Wraps an [`Advisor`] with the deterministic fallbacks used when it fails.
#[derive(Clone)]
pub struct StrategyAdvisor {
	advisor: Arc<dyn Advisor>,
}
impl StrategyAdvisor {
	pub fn new(advisor: Arc<dyn Advisor>) -> Self {
		Self { advisor }
	}

	/// Advisory keywords, sanitized and capped. Falls back to the previous keywords, then to the
	/// leading significant tokens of the content.
	pub async fn generate_keywords(&self, request: &KeywordRequest<'_>) -> String {
		let max_words = request.max_words as usize;

		match self.advisor.propose_keywords(request).await {
			Ok(raw) => {
				let keywords = sanitize_keywords(&raw, max_words);

				if !keywords.is_empty() {
					tracing::info!(
						domain = request.domain,
						keywords = keywords.as_str(),
						"Keywords generated."
					);

					return keywords;
				}

				tracing::warn!(domain = request.domain, "Advisory keywords were empty.");
			},
			Err(err) => {
				tracing::warn!(
					domain = request.domain,
					error = %err,
					"Keyword generation failed. Using fallback."
				);
			},
		}

		if let Some(previous) = request.previous_keywords {
			let previous = sanitize_keywords(previous, max_words);

			if !previous.is_empty() {
				return previous;
			}
		}

		let from_content = keywords_from_content(request.content, max_words);

		if from_content.is_empty() {
			keywords_from_content(request.domain, max_words)
		} else {
			from_content
		}
	}

	pub async fn select_config(&self, request: &ConfigRequest<'_>) -> Result<Value, AdvisoryError> {
		self.advisor.select_config(request).await
	}

	/// Quality in `[0, 1]`; an empty list scores zero without consulting the advisor.
	pub async fn assess_quality(&self, keywords: &str, products: &[NormalizedProduct]) -> f32 {
		if products.is_empty() {
			return 0.0;
		}

		match self.advisor.score_results(keywords, products).await {
			Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
			Ok(score) => {
				tracing::warn!(score, "Advisory quality score is not finite. Using heuristic.");

				heuristic_quality(products.len())
			},
			Err(err) => {
				tracing::warn!(error = %err, "Quality assessment failed. Using heuristic.");

				heuristic_quality(products.len())
			},
		}
	}

	/// The advisor's suggestion, the deterministic fallback if it is unreachable, or an
	/// unrecognized suggestion if it answered with something unusable.
	pub async fn suggest_next(&self, context: &StrategyContext<'_>) -> StrategySuggestion {
		match self.advisor.suggest_strategy(context).await {
			Ok(suggestion) => {
				tracing::info!(
					platform = %context.platform,
					action = ?suggestion.action,
					reason = suggestion.reason.as_str(),
					"Advisory strategy suggested."
				);

				suggestion
			},
			Err(AdvisoryError::Unavailable { message }) => {
				let suggestion = fallback_suggestion(&FallbackInput {
					product_count: context.product_count,
					target_product_count: context.policy.target_product_count,
					attempted_combinations: context.tried.len(),
					max_combinations: context.policy.max_combinations as usize,
					current_keywords: context.keywords,
					current_config: context.config,
					base_keywords: context.base_keywords,
					broadest_config: context.broadest_config,
				});

				tracing::warn!(
					platform = %context.platform,
					error = message.as_str(),
					action = ?suggestion.action,
					"Advisory strategy unavailable. Using fallback."
				);

				suggestion
			},
			Err(AdvisoryError::Malformed { message }) => {
				tracing::warn!(
					platform = %context.platform,
					error = message.as_str(),
					"Advisory strategy was malformed."
				);

				StrategySuggestion::unrecognized(message)
			},
		}
	}
}
