use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use prowl_domain::{ContentSearchStatus, ContentTarget, Platform, SearchAttempt, SearchStatus};

use crate::Error;

#[derive(Debug, sqlx::FromRow)]
pub struct SearchRow {
	pub search_id: Uuid,
	pub fingerprint: String,
	pub keywords: String,
	pub platform: String,
	pub platform_config: Value,
	pub credential_id: String,
	pub status: String,
	pub product_count: i32,
	pub quality_score: Option<f32>,
	pub error_message: Option<String>,
	pub executed_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl TryFrom<SearchRow> for SearchAttempt {
	type Error = Error;

	fn try_from(row: SearchRow) -> Result<Self, Self::Error> {
		let platform: Platform = row.platform.parse()?;
		let status: SearchStatus = row.status.parse()?;
		let product_count = u32::try_from(row.product_count).map_err(|_| {
			Error::InvalidArgument(format!(
				"Search {} has a negative product count.",
				row.search_id
			))
		})?;

		Ok(Self {
			id: row.search_id,
			fingerprint: row.fingerprint,
			keywords: row.keywords,
			platform,
			platform_config: row.platform_config,
			credential_id: row.credential_id,
			status,
			product_count,
			quality_score: row.quality_score,
			error_message: row.error_message,
			executed_at: row.executed_at,
			created_at: row.created_at,
			updated_at: row.updated_at,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ContentRow {
	pub content_id: Uuid,
	pub url: String,
	pub body: String,
	pub keyword_feedback: Option<String>,
	pub best_search_id: Option<Uuid>,
	pub search_status: Option<String>,
}
impl TryFrom<ContentRow> for ContentTarget {
	type Error = Error;

	fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
		let search_status = row
			.search_status
			.as_deref()
			.map(str::parse::<ContentSearchStatus>)
			.transpose()?;

		Ok(Self {
			content_id: row.content_id,
			url: row.url,
			text: row.body,
			feedback: row.keyword_feedback,
			best_attempt_id: row.best_search_id,
			search_status,
		})
	}
}
