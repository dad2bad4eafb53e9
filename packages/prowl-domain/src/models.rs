use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{ContentSearchStatus, Platform, SearchStatus, fingerprint};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchAttempt {
	pub id: Uuid,
	pub fingerprint: String,
	pub keywords: String,
	pub platform: Platform,
	pub platform_config: Value,
	pub credential_id: String,
	pub status: SearchStatus,
	#[serde(default)]
	pub product_count: u32,
	pub quality_score: Option<f32>,
	pub error_message: Option<String>,
	#[serde(with = "crate::time_serde::option", default)]
	pub executed_at: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl SearchAttempt {
	pub fn is_completed(&self) -> bool {
		self.status == SearchStatus::Completed
	}

	pub fn quality(&self) -> f32 {
		self.quality_score.unwrap_or(0.0)
	}
}

/// Identity tuple for a search that has not been persisted yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewSearchAttempt {
	pub fingerprint: String,
	pub keywords: String,
	pub platform: Platform,
	pub platform_config: Value,
	pub credential_id: String,
}
impl NewSearchAttempt {
	pub fn new(
		keywords: impl Into<String>,
		platform: Platform,
		platform_config: Value,
		credential_id: impl Into<String>,
	) -> Self {
		let keywords = keywords.into();
		let credential_id = credential_id.into();
		let fingerprint = fingerprint(&keywords, platform, &platform_config, &credential_id);

		Self { fingerprint, keywords, platform, platform_config, credential_id }
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentTarget {
	pub content_id: Uuid,
	pub url: String,
	pub text: String,
	pub feedback: Option<String>,
	pub best_attempt_id: Option<Uuid>,
	pub search_status: Option<ContentSearchStatus>,
}
impl ContentTarget {
	/// Hostname of the content URL, when it has one.
	pub fn domain(&self) -> Option<String> {
		crate::router::hostname(&self.url)
	}
}
