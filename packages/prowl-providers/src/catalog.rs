//! Catalog back-end clients. Each returns the raw item array of one search page.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, header::ACCEPT};
use serde_json::{Map, Value};

use crate::{Error, Result};

const BASE_BACKOFF_MS: u64 = 250;
const MARKETPLACE_MAX_ITEM_COUNT: u32 = 10;
const MARKETPLACE_RESOURCES: &[&str] = &[
	"ItemInfo.Title",
	"ItemInfo.Features",
	"ItemInfo.ByLineInfo",
	"Offers.Listings.Price",
	"Images.Primary.Medium",
	"Images.Primary.Large",
];

/// Resolved credential fields for one platform.
pub type CredentialFields = Map<String, Value>;

/// Searches the general marketplace.
///
/// The endpoint is a request-signing gateway; the access key pair is forwarded as HTTP basic
/// auth and the partner tag travels in the body.
pub async fn search_marketplace(
	cfg: &prowl_config::CatalogProviderConfig,
	keywords: &str,
	platform_config: &Value,
	credential: &CredentialFields,
) -> Result<Vec<Value>> {
	let access_key = credential_field(credential, "access_key")?;
	let secret_key = credential_field(credential, "secret_key")?;
	let partner_tag = credential_field(credential, "partner_tag")?;
	let search_index =
		platform_config.get("searchIndex").and_then(Value::as_str).unwrap_or("All").to_string();
	let client = client(cfg)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let headers = crate::default_header_map(&cfg.default_headers)?;
	let body = serde_json::json!({
		"Keywords": keywords,
		"SearchIndex": search_index,
		"PartnerTag": partner_tag,
		"PartnerType": "Associates",
		"ItemCount": cfg.page_size.min(MARKETPLACE_MAX_ITEM_COUNT),
		"Resources": MARKETPLACE_RESOURCES,
	});
	let json = send_with_retries("general_marketplace", cfg.max_retries, || {
		client
			.post(&url)
			.headers(headers.clone())
			.basic_auth(access_key, Some(secret_key))
			.json(&body)
	})
	.await?;

	parse_marketplace_items(json)
}

/// Searches the shopping aggregator with the location/language config.
pub async fn search_aggregator(
	cfg: &prowl_config::CatalogProviderConfig,
	keywords: &str,
	platform_config: &Value,
	credential: &CredentialFields,
) -> Result<Vec<Value>> {
	let api_key = credential_field(credential, "api_key")?;
	let location = config_str(platform_config, "location", "United States");
	let language = config_str(platform_config, "language", "en");
	let country = config_str(platform_config, "country", "us");
	let num = cfg.page_size.to_string();
	let client = client(cfg)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let headers = crate::default_header_map(&cfg.default_headers)?;
	let json = send_with_retries("shopping_aggregator", cfg.max_retries, || {
		client.get(&url).headers(headers.clone()).query(&[
			("engine", "google_shopping"),
			("q", keywords),
			("location", location),
			("hl", language),
			("gl", country),
			("num", num.as_str()),
			("api_key", api_key),
		])
	})
	.await?;

	parse_aggregator_items(json)
}

/// Searches the specialty retailer's partner catalog.
pub async fn search_specialty(
	cfg: &prowl_config::CatalogProviderConfig,
	keywords: &str,
	credential: &CredentialFields,
) -> Result<Vec<Value>> {
	let account_id = credential_field(credential, "account_id")?;
	let catalog_id = credential_field(credential, "catalog_id")?;
	let username = credential_field(credential, "username")?;
	let password = credential_field(credential, "password")?;
	let page_size = cfg.page_size.to_string();
	let client = client(cfg)?;
	let url = format!("{}{}/{account_id}/Catalogs/{catalog_id}/Items", cfg.api_base, cfg.path);
	let headers = crate::default_header_map(&cfg.default_headers)?;
	let json = send_with_retries("specialty_retailer", cfg.max_retries, || {
		client
			.get(&url)
			.headers(headers.clone())
			.header(ACCEPT, "application/json")
			.basic_auth(username, Some(password))
			.query(&[("Keyword", keywords), ("Page", "1"), ("PageSize", page_size.as_str())])
	})
	.await?;

	parse_specialty_items(json)
}

pub fn credential_field<'a>(credential: &'a CredentialFields, field: &str) -> Result<&'a str> {
	credential
		.get(field)
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.ok_or_else(|| Error::MissingCredentialField { field: field.to_string() })
}

fn client(cfg: &prowl_config::CatalogProviderConfig) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?)
}

fn config_str<'a>(config: &'a Value, key: &str, default: &'a str) -> &'a str {
	config
		.get(key)
		.and_then(Value::as_str)
		.filter(|value| !value.trim().is_empty())
		.unwrap_or(default)
}

async fn send_with_retries<F>(platform: &str, max_retries: u32, build: F) -> Result<Value>
where
	F: Fn() -> RequestBuilder,
{
	let mut retries = 0;

	loop {
		match crate::send_json(build()).await {
			Ok(json) => return Ok(json),
			Err(err) if err.is_retryable() && retries < max_retries => {
				let delay = Duration::from_millis(BASE_BACKOFF_MS << retries);

				tracing::warn!(
					platform,
					retry = retries + 1,
					delay_ms = delay.as_millis() as u64,
					error = %err,
					"Catalog request failed. Retrying."
				);
				tokio::time::sleep(delay).await;

				retries += 1;
			},
			Err(err) => return Err(err),
		}
	}
}

fn parse_marketplace_items(json: Value) -> Result<Vec<Value>> {
	if let Some(errors) = json.get("Errors").and_then(Value::as_array).filter(|e| !e.is_empty()) {
		let code = errors[0].get("Code").and_then(Value::as_str).unwrap_or_default();

		// No-results is reported as an error payload.
		if code == "NoResults" {
			return Ok(Vec::new());
		}

		let message = errors[0].get("Message").and_then(Value::as_str).unwrap_or(code);

		return Err(Error::InvalidResponse { message: format!("Marketplace error: {message}") });
	}

	Ok(items_at(&json, &["SearchResult", "Items"]))
}

fn parse_aggregator_items(json: Value) -> Result<Vec<Value>> {
	if let Some(message) = json.get("error").and_then(Value::as_str) {
		if message.contains("hasn't returned any results") {
			return Ok(Vec::new());
		}

		return Err(Error::InvalidResponse { message: format!("Aggregator error: {message}") });
	}

	Ok(items_at(&json, &["shopping_results"]))
}

fn parse_specialty_items(json: Value) -> Result<Vec<Value>> {
	if !json.is_object() {
		return Err(Error::InvalidResponse {
			message: "Specialty catalog response is not a JSON object.".to_string(),
		});
	}

	Ok(items_at(&json, &["Items"]))
}

fn items_at(json: &Value, path: &[&str]) -> Vec<Value> {
	let mut current = json;

	for key in path {
		match current.get(*key) {
			Some(next) => current = next,
			None => return Vec::new(),
		}
	}

	current.as_array().cloned().unwrap_or_default()
}
