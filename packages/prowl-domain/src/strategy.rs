use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::keywords::broadest_keyword;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyAction {
	ChangeKeywords,
	ChangeConfig,
	StopSearching,
	#[serde(other)]
	Unrecognized,
}

/// A proposed mutation of the current search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategySuggestion {
	pub action: StrategyAction,
	#[serde(default)]
	pub reason: String,
	#[serde(rename = "newKeywords", alias = "new_keywords", default)]
	pub new_keywords: Option<String>,
	#[serde(rename = "newConfig", alias = "new_config", default)]
	pub new_config: Option<Value>,
}
impl StrategySuggestion {
	pub fn stop(reason: impl Into<String>) -> Self {
		Self {
			action: StrategyAction::StopSearching,
			reason: reason.into(),
			new_keywords: None,
			new_config: None,
		}
	}

	pub fn change_keywords(keywords: impl Into<String>, reason: impl Into<String>) -> Self {
		Self {
			action: StrategyAction::ChangeKeywords,
			reason: reason.into(),
			new_keywords: Some(keywords.into()),
			new_config: None,
		}
	}

	pub fn change_config(config: Value, reason: impl Into<String>) -> Self {
		Self {
			action: StrategyAction::ChangeConfig,
			reason: reason.into(),
			new_keywords: None,
			new_config: Some(config),
		}
	}

	pub fn unrecognized(reason: impl Into<String>) -> Self {
		Self {
			action: StrategyAction::Unrecognized,
			reason: reason.into(),
			new_keywords: None,
			new_config: None,
		}
	}

	/// The state change this suggestion asks for.
	///
	/// A change action without a usable payload is [`Mutation::Invalid`].
	pub fn mutation(&self) -> Mutation {
		match self.action {
			StrategyAction::StopSearching => Mutation::Stop,
			StrategyAction::ChangeKeywords => match self.new_keywords.as_deref().map(str::trim) {
				Some(keywords) if !keywords.is_empty() => Mutation::Keywords(keywords.to_string()),
				_ => Mutation::Invalid,
			},
			StrategyAction::ChangeConfig => match &self.new_config {
				Some(config) if is_usable_config(config) => Mutation::Config(config.clone()),
				_ => Mutation::Invalid,
			},
			StrategyAction::Unrecognized => Mutation::Invalid,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
	Keywords(String),
	Config(Value),
	Stop,
	Invalid,
}

/// Observations fed to [`fallback_suggestion`].
#[derive(Clone, Debug)]
pub struct FallbackInput<'a> {
	pub product_count: u32,
	pub target_product_count: u32,
	/// Distinct keyword/config combinations tried so far, including the current one.
	pub attempted_combinations: usize,
	pub max_combinations: usize,
	pub current_keywords: &'a str,
	pub current_config: &'a Value,
	pub base_keywords: &'a str,
	pub broadest_config: &'a Value,
}

/// Deterministic strategy used when the advisory capability is unavailable.
pub fn fallback_suggestion(input: &FallbackInput<'_>) -> StrategySuggestion {
	if input.product_count >= input.target_product_count {
		return StrategySuggestion::stop("Target product count reached.");
	}
	if input.attempted_combinations >= input.max_combinations {
		return StrategySuggestion::stop("Stopping after too many attempts.");
	}
	if input.product_count == 0 && input.current_config != input.broadest_config {
		return StrategySuggestion::change_config(
			input.broadest_config.clone(),
			"No products found; broadening the platform config.",
		);
	}

	let keywords = broadest_keyword(input.base_keywords)
		.or_else(|| broadest_keyword(input.current_keywords))
		.unwrap_or_else(|| input.current_keywords.trim().to_string());

	StrategySuggestion::change_keywords(keywords, "Too few products; broadening the keywords.")
}

/// Count-only quality estimate in `[0, 1]`.
pub fn heuristic_quality(product_count: usize) -> f32 {
	(product_count as f32 / 20.0).min(1.0)
}

fn is_usable_config(config: &Value) -> bool {
	match config {
		Value::Object(map) => !map.is_empty(),
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn parses_camel_case_advisory_payload() {
		let suggestion: StrategySuggestion = serde_json::from_value(json!({
			"action": "change_keywords",
			"reason": "broader",
			"newKeywords": "sneakers"
		}))
		.expect("Suggestion must parse.");

		assert_eq!(suggestion.mutation(), Mutation::Keywords("sneakers".to_string()));
	}

	#[test]
	fn unknown_action_is_invalid() {
		let suggestion: StrategySuggestion =
			serde_json::from_value(json!({ "action": "try_harder" }))
				.expect("Suggestion must parse.");

		assert_eq!(suggestion.action, StrategyAction::Unrecognized);
		assert_eq!(suggestion.mutation(), Mutation::Invalid);
	}

	#[test]
	fn empty_payloads_are_invalid() {
		assert_eq!(StrategySuggestion::change_keywords("  ", "").mutation(), Mutation::Invalid);
		assert_eq!(StrategySuggestion::change_config(json!({}), "").mutation(), Mutation::Invalid);
	}

	#[test]
	fn heuristic_quality_saturates() {
		assert_eq!(heuristic_quality(0), 0.0);
		assert_eq!(heuristic_quality(10), 0.5);
		assert_eq!(heuristic_quality(80), 1.0);
	}
}
