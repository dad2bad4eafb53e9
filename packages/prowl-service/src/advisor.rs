use serde_json::Value;

use prowl_config::LlmProviderConfig;
use prowl_domain::{NormalizedProduct, Platform, StrategySuggestion, taxonomy};
use prowl_providers::advisory::{self, message};

use crate::{
	AdvisoryError, Advisor, BoxFuture, ConfigRequest, KeywordRequest, StrategyContext,
};

const KEYWORD_SYSTEM_PROMPT: &str = "\
You are an online shopping assistant optimized for product search APIs. You provide shopping \
keywords for people reading a given internet article. Match the likely shopping intent of the \
reader rather than the literal content of the article. Generalize brand names unless the brand \
is essential to the search. Favor broader, brandless product categories. For sports or music \
articles, prefer merchandise terms such as merch, gear or apparel.";
const CONFIG_SYSTEM_PROMPT: &str = "\
You are an expert at configuring product catalog searches. You know which categories, locations \
and languages return the most relevant products for a search phrase.";
const SCORE_SYSTEM_PROMPT: &str = "\
You judge how relevant a list of product search results is to the search phrase that produced \
it.";
const STRATEGY_SYSTEM_PROMPT: &str = "\
You optimize product searches across catalog platforms. Suggest whether to try different \
keywords or a different platform configuration based on the current results. Never suggest a \
keyword and configuration combination that has already been tried.";
const MAX_SCORED_TITLES: usize = 20;

/// [`Advisor`] backed by an OpenAI-compatible chat completion endpoint.
pub struct LlmAdvisor {
	cfg: LlmProviderConfig,
}
impl LlmAdvisor {
	pub fn new(cfg: LlmProviderConfig) -> Self {
		Self { cfg }
	}

	async fn ask(&self, system: &str, user: String) -> Result<Value, AdvisoryError> {
		let messages = [message("system", system), message("user", user)];

		Ok(advisory::complete_json(&self.cfg, &messages).await?)
	}

	async fn keywords(&self, request: &KeywordRequest<'_>) -> Result<String, AdvisoryError> {
		let answer = self.ask(KEYWORD_SYSTEM_PROMPT, keyword_prompt(request)).await?;

		string_field(&answer, "keywords")
	}

	async fn config(&self, request: &ConfigRequest<'_>) -> Result<Value, AdvisoryError> {
		let Some(prompt) = config_prompt(request) else {
			return Ok(taxonomy::broadest_config(request.platform));
		};

		self.ask(CONFIG_SYSTEM_PROMPT, prompt).await
	}

	async fn score(
		&self,
		keywords: &str,
		products: &[NormalizedProduct],
	) -> Result<f32, AdvisoryError> {
		let answer = self.ask(SCORE_SYSTEM_PROMPT, score_prompt(keywords, products)).await?;

		answer.get("score").and_then(Value::as_f64).map(|score| score as f32).ok_or_else(|| {
			AdvisoryError::Malformed {
				message: "Score answer is missing a numeric score.".to_string(),
			}
		})
	}

	async fn strategy(
		&self,
		context: &StrategyContext<'_>,
	) -> Result<StrategySuggestion, AdvisoryError> {
		let answer = self.ask(STRATEGY_SYSTEM_PROMPT, strategy_prompt(context)).await?;

		serde_json::from_value(answer)
			.map_err(|err| AdvisoryError::Malformed { message: err.to_string() })
	}
}
impl Advisor for LlmAdvisor {
	fn propose_keywords<'a>(
		&'a self,
		request: &'a KeywordRequest<'a>,
	) -> BoxFuture<'a, Result<String, AdvisoryError>> {
		Box::pin(self.keywords(request))
	}

	fn select_config<'a>(
		&'a self,
		request: &'a ConfigRequest<'a>,
	) -> BoxFuture<'a, Result<Value, AdvisoryError>> {
		Box::pin(self.config(request))
	}

	fn score_results<'a>(
		&'a self,
		keywords: &'a str,
		products: &'a [NormalizedProduct],
	) -> BoxFuture<'a, Result<f32, AdvisoryError>> {
		Box::pin(self.score(keywords, products))
	}

	fn suggest_strategy<'a>(
		&'a self,
		context: &'a StrategyContext<'a>,
	) -> BoxFuture<'a, Result<StrategySuggestion, AdvisoryError>> {
		Box::pin(self.strategy(context))
	}
}

fn string_field(answer: &Value, field: &str) -> Result<String, AdvisoryError> {
	answer
		.get(field)
		.and_then(Value::as_str)
		.map(|value| value.trim().to_string())
		.filter(|value| !value.is_empty())
		.ok_or_else(|| AdvisoryError::Malformed {
			message: format!("Answer is missing {field:?}."),
		})
}

fn keyword_prompt(request: &KeywordRequest<'_>) -> String {
	let mut prompt = format!(
		"Give me shopping search keywords for a reader of the article below on {domain}.\n\n\
Do not recommend print or physical media such as DVDs, books, newspapers or magazines. Do not \
put quotes in your reply and do not end it with punctuation. Your reply must be {max} words or \
less with no new lines.\n",
		domain = request.domain,
		max = request.max_words,
	);

	if let Some(feedback) = request.feedback.filter(|text| !text.trim().is_empty()) {
		prompt.push_str(&format!("\nPrevious feedback: \"{feedback}\"\n"));
	}
	if let Some(previous) = request.previous_keywords.filter(|text| !text.trim().is_empty()) {
		prompt.push_str(&format!("Previous keywords: \"{previous}\"\n"));
	}

	prompt.push_str(&format!(
		"\nReturn a JSON object with exactly this property:\n\
- \"keywords\": your {max}-word-or-less search phrase\n\n-----\n\n{content}",
		max = request.max_words,
		content = request.content,
	));

	prompt
}

fn config_prompt(request: &ConfigRequest<'_>) -> Option<String> {
	let feedback = request
		.feedback
		.filter(|text| !text.trim().is_empty())
		.map(|text| format!(" and feedback \"{text}\""))
		.unwrap_or_default();

	match request.platform {
		Platform::GeneralMarketplace => {
			let indexes = taxonomy::SEARCH_INDEXES
				.iter()
				.map(|(key, name)| format!("- {key}: {name}"))
				.collect::<Vec<_>>()
				.join("\n");

			Some(format!(
				"Given the keywords \"{keywords}\"{feedback}, select the best search index from \
the list below.\n\n{indexes}\n\nReturn a JSON object with:\n\
- \"searchIndex\": exact index key from the list above",
				keywords = request.keywords,
			))
		},
		Platform::ShoppingAggregator => {
			let locations = taxonomy::AGGREGATOR_LOCATIONS
				.iter()
				.map(|(name, _)| *name)
				.collect::<Vec<_>>()
				.join(", ");
			let languages = taxonomy::AGGREGATOR_LANGUAGES.join(", ");

			Some(format!(
				"Given the keywords \"{keywords}\"{feedback}, choose the search settings most \
likely to return relevant products.\n\nAvailable locations: {locations}\n\
Available languages: {languages}\n\nReturn a JSON object with:\n\
- \"location\": location for the search\n\
- \"language\": language code\n\
- \"country\": two-letter country code",
				keywords = request.keywords,
			))
		},
		Platform::SpecialtyRetailer => None,
	}
}

fn score_prompt(keywords: &str, products: &[NormalizedProduct]) -> String {
	let titles = products
		.iter()
		.take(MAX_SCORED_TITLES)
		.map(|product| format!("- {}", product.title))
		.collect::<Vec<_>>()
		.join("\n");

	format!(
		"Search phrase: \"{keywords}\"\nProducts found: {count}\n\nTop results:\n{titles}\n\n\
Return a JSON object with:\n\
- \"score\": relevance of the results to the search phrase, from 0.0 to 1.0",
		count = products.len(),
	)
}

fn strategy_prompt(context: &StrategyContext<'_>) -> String {
	let tried = context
		.tried
		.iter()
		.map(|search| {
			format!(
				"- \"{}\" with {}: {} products",
				search.keywords, search.config, search.product_count
			)
		})
		.collect::<Vec<_>>()
		.join("\n");
	let policy = context.policy;

	format!(
		"Current search results:\n\
- Platform: {platform}\n\
- Keywords: \"{keywords}\"\n\
- Platform config: {config}\n\
- Products found: {count}\n\
- Original keywords: \"{base}\"\n\n\
Already attempted searches:\n{tried}\n\n\
Target: at least {target} products ({ideal}+ is ideal).\n\n\
If there were no results, try broader keywords or a broader config. If there were some results \
but not enough, try simpler keywords, synonyms or related terms. Never repeat an attempted \
combination.\n\n\
Return a JSON object with:\n\
- \"action\": \"change_keywords\", \"change_config\" or \"stop_searching\"\n\
- \"reason\": brief explanation\n\
- \"newKeywords\": when changing keywords, at most {max_words} words\n\
- \"newConfig\": when changing config, the complete new platform config object\n\n\
If the product count already meets the target, set action to \"stop_searching\".",
		platform = context.platform,
		keywords = context.keywords,
		config = context.config,
		count = context.product_count,
		base = context.base_keywords,
		target = policy.target_product_count,
		ideal = policy.ideal_product_count,
		max_words = policy.max_keyword_words,
	)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::{SearchPolicy, TriedSearch};

	#[test]
	fn keyword_prompt_mentions_feedback_and_previous_keywords() {
		let prompt = keyword_prompt(&KeywordRequest {
			content: "Article body.",
			domain: "news.example.com",
			feedback: Some("too formal"),
			previous_keywords: Some("dress shoes"),
			max_words: 5,
		});

		assert!(prompt.contains("Previous feedback: \"too formal\""));
		assert!(prompt.contains("Previous keywords: \"dress shoes\""));
		assert!(prompt.ends_with("Article body."));
	}

	#[test]
	fn specialty_retailer_has_no_config_prompt() {
		let request = ConfigRequest {
			platform: Platform::SpecialtyRetailer,
			keywords: "jersey",
			feedback: None,
		};

		assert!(config_prompt(&request).is_none());
	}

	#[test]
	fn strategy_prompt_lists_tried_searches() {
		let policy = SearchPolicy::default();
		let config = json!({ "searchIndex": "All" });
		let tried = vec![TriedSearch {
			keywords: "retro consoles".to_string(),
			config: config.clone(),
			product_count: 3,
		}];
		let prompt = strategy_prompt(&StrategyContext {
			platform: Platform::GeneralMarketplace,
			keywords: "retro consoles",
			config: &config,
			product_count: 3,
			base_keywords: "retro consoles",
			tried: &tried,
			broadest_config: &config,
			policy: &policy,
		});

		assert!(prompt.contains("- \"retro consoles\" with {\"searchIndex\":\"All\"}: 3 products"));
		assert!(prompt.contains("at least 20 products (40+ is ideal)"));
	}
}
