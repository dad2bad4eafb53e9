use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

const MAX_TRIES: usize = 3;

/// Chat completion constrained to a JSON object answer.
///
/// HTTP failures return immediately; an answer that does not parse as JSON is retried.
pub async fn complete_json(
	cfg: &prowl_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;

	for _ in 0..MAX_TRIES {
		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"response_format": { "type": "json_object" },
			"messages": messages,
		});
		let json = crate::send_json(client.post(&url).headers(headers.clone()).json(&body)).await?;

		match parse_completion_json(json) {
			Ok(parsed) => return Ok(parsed),
			Err(err) => tracing::warn!(error = %err, "Advisory answer was not valid JSON."),
		}
	}

	Err(Error::InvalidResponse { message: "Advisory response is not valid JSON.".to_string() })
}

pub fn message(role: &str, content: impl Into<String>) -> Value {
	serde_json::json!({ "role": role, "content": content.into() })
}

fn parse_completion_json(json: Value) -> Result<Value> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Advisory response is missing message content.".to_string(),
		})?;
	let parsed: Value = serde_json::from_str(content).map_err(|_| Error::InvalidResponse {
		message: "Advisory content is not valid JSON.".to_string(),
	})?;

	if !parsed.is_object() {
		return Err(Error::InvalidResponse {
			message: "Advisory content is not a JSON object.".to_string(),
		});
	}

	Ok(parsed)
}
