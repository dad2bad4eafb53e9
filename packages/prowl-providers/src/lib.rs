pub mod advisory;
pub mod catalog;

mod error;

pub use error::{Error, Result};

use reqwest::{
	RequestBuilder, Response,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

const MAX_ERROR_BODY_CHARS: usize = 512;

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = default_header_map(default_headers)?;

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	Ok(headers)
}

pub fn default_header_map(default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

async fn send_json(request: RequestBuilder) -> Result<Value> {
	let res = request.send().await?;

	json_or_status(res).await
}

async fn json_or_status(res: Response) -> Result<Value> {
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::Status {
			status: status.as_u16(),
			body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
		});
	}

	Ok(res.json().await?)
}
