use time::OffsetDateTime;
use uuid::Uuid;

use prowl_domain::{
	ContentSearchStatus, ContentTarget, NewSearchAttempt, Platform, SearchAttempt, SearchStatus,
};

use crate::{
	Error, Result,
	db::Db,
	models::{ContentRow, SearchRow},
};

const UNIQUE_VIOLATION: &str = "23505";
const SEARCH_COLUMNS: &str = "\
search_id,
	fingerprint,
	keywords,
	platform,
	platform_config,
	credential_id,
	status,
	product_count,
	quality_score,
	error_message,
	executed_at,
	created_at,
	updated_at";

/// Returns the record for `new.fingerprint`, creating it if needed.
///
/// An existing record is reset to `pending` so it can be executed again. A concurrent insert of
/// the same fingerprint surfaces as a unique violation, which is resolved by re-reading the row.
pub async fn find_or_create_search(
	db: &Db,
	new: &NewSearchAttempt,
	now: OffsetDateTime,
) -> Result<SearchAttempt> {
	if let Some(existing) = get_search_by_fingerprint(db, &new.fingerprint).await? {
		return reset_search(db, existing.id, now).await;
	}

	match insert_search(db, new, now).await {
		Ok(created) => Ok(created),
		Err(Error::Conflict(_)) => {
			let existing = get_search_by_fingerprint(db, &new.fingerprint).await?.ok_or_else(|| {
				Error::NotFound(format!("Search with fingerprint {} vanished.", new.fingerprint))
			})?;

			reset_search(db, existing.id, now).await
		},
		Err(err) => Err(err),
	}
}

pub async fn insert_search(
	db: &Db,
	new: &NewSearchAttempt,
	now: OffsetDateTime,
) -> Result<SearchAttempt> {
	let sql = format!(
		"\
INSERT INTO searches (
	search_id,
	fingerprint,
	keywords,
	platform,
	platform_config,
	credential_id,
	status,
	product_count,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $8)
RETURNING
	{SEARCH_COLUMNS}"
	);
	let row: SearchRow = sqlx::query_as(&sql)
		.bind(Uuid::new_v4())
		.bind(new.fingerprint.as_str())
		.bind(new.keywords.as_str())
		.bind(new.platform.as_str())
		.bind(&new.platform_config)
		.bind(new.credential_id.as_str())
		.bind(SearchStatus::Pending.as_str())
		.bind(now)
		.fetch_one(&db.pool)
		.await
		.map_err(|err| map_unique_violation(err, &new.fingerprint))?;

	row.try_into()
}

pub async fn get_search(db: &Db, search_id: Uuid) -> Result<Option<SearchAttempt>> {
	let sql = format!("SELECT {SEARCH_COLUMNS} FROM searches WHERE search_id = $1");
	let row: Option<SearchRow> =
		sqlx::query_as(&sql).bind(search_id).fetch_optional(&db.pool).await?;

	row.map(TryInto::try_into).transpose()
}

pub async fn get_search_by_fingerprint(
	db: &Db,
	fingerprint: &str,
) -> Result<Option<SearchAttempt>> {
	let sql = format!("SELECT {SEARCH_COLUMNS} FROM searches WHERE fingerprint = $1");
	let row: Option<SearchRow> =
		sqlx::query_as(&sql).bind(fingerprint).fetch_optional(&db.pool).await?;

	row.map(TryInto::try_into).transpose()
}

pub async fn set_search_status(
	db: &Db,
	search_id: Uuid,
	status: SearchStatus,
	now: OffsetDateTime,
) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE searches
SET status = $1, updated_at = $2
WHERE search_id = $3",
	)
	.bind(status.as_str())
	.bind(now)
	.bind(search_id)
	.execute(&db.pool)
	.await?;

	ensure_updated(result.rows_affected(), "search", search_id)
}

pub async fn complete_search(
	db: &Db,
	search_id: Uuid,
	product_count: u32,
	quality_score: f32,
	now: OffsetDateTime,
) -> Result<()> {
	let product_count = i32::try_from(product_count)
		.map_err(|_| Error::InvalidArgument("Product count does not fit in i32.".to_string()))?;
	let result = sqlx::query(
		"\
UPDATE searches
SET
	status = $1,
	product_count = $2,
	quality_score = $3,
	error_message = NULL,
	executed_at = $4,
	updated_at = $4
WHERE search_id = $5",
	)
	.bind(SearchStatus::Completed.as_str())
	.bind(product_count)
	.bind(quality_score)
	.bind(now)
	.bind(search_id)
	.execute(&db.pool)
	.await?;

	ensure_updated(result.rows_affected(), "search", search_id)
}

pub async fn fail_search(
	db: &Db,
	search_id: Uuid,
	error_message: &str,
	now: OffsetDateTime,
) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE searches
SET
	status = $1,
	product_count = 0,
	quality_score = NULL,
	error_message = $2,
	executed_at = $3,
	updated_at = $3
WHERE search_id = $4",
	)
	.bind(SearchStatus::Failed.as_str())
	.bind(error_message)
	.bind(now)
	.bind(search_id)
	.execute(&db.pool)
	.await?;

	ensure_updated(result.rows_affected(), "search", search_id)
}

/// Most recent attempts for `platform`, newest first.
pub async fn list_searches_by_platform(
	db: &Db,
	platform: Platform,
	limit: u32,
) -> Result<Vec<SearchAttempt>> {
	let sql = format!(
		"\
SELECT {SEARCH_COLUMNS}
FROM searches
WHERE platform = $1
ORDER BY created_at DESC, search_id ASC
LIMIT $2"
	);
	let rows: Vec<SearchRow> = sqlx::query_as(&sql)
		.bind(platform.as_str())
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	rows.into_iter().map(TryInto::try_into).collect()
}

pub async fn insert_content(db: &Db, content: &ContentTarget, now: OffsetDateTime) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO content_targets (
	content_id,
	url,
	body,
	keyword_feedback,
	best_search_id,
	search_status,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $7)",
	)
	.bind(content.content_id)
	.bind(content.url.as_str())
	.bind(content.text.as_str())
	.bind(content.feedback.as_deref())
	.bind(content.best_attempt_id)
	.bind(content.search_status.map(ContentSearchStatus::as_str))
	.bind(now)
	.execute(&db.pool)
	.await
	.map_err(|err| map_unique_violation(err, &content.content_id.to_string()))?;

	Ok(())
}

pub async fn get_content(db: &Db, content_id: Uuid) -> Result<Option<ContentTarget>> {
	let row: Option<ContentRow> = sqlx::query_as(
		"\
SELECT
	content_id,
	url,
	body,
	keyword_feedback,
	best_search_id,
	search_status
FROM content_targets
WHERE content_id = $1",
	)
	.bind(content_id)
	.fetch_optional(&db.pool)
	.await?;

	row.map(TryInto::try_into).transpose()
}

pub async fn set_content_status(
	db: &Db,
	content_id: Uuid,
	status: ContentSearchStatus,
	now: OffsetDateTime,
) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE content_targets
SET search_status = $1, updated_at = $2
WHERE content_id = $3",
	)
	.bind(status.as_str())
	.bind(now)
	.bind(content_id)
	.execute(&db.pool)
	.await?;

	ensure_updated(result.rows_affected(), "content", content_id)
}

pub async fn set_content_best_search(
	db: &Db,
	content_id: Uuid,
	search_id: Uuid,
	now: OffsetDateTime,
) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE content_targets
SET best_search_id = $1, updated_at = $2
WHERE content_id = $3",
	)
	.bind(search_id)
	.bind(now)
	.bind(content_id)
	.execute(&db.pool)
	.await?;

	ensure_updated(result.rows_affected(), "content", content_id)
}

pub async fn set_content_feedback(
	db: &Db,
	content_id: Uuid,
	feedback: &str,
	now: OffsetDateTime,
) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE content_targets
SET keyword_feedback = $1, updated_at = $2
WHERE content_id = $3",
	)
	.bind(feedback)
	.bind(now)
	.bind(content_id)
	.execute(&db.pool)
	.await?;

	ensure_updated(result.rows_affected(), "content", content_id)
}

/// Records that `search_ids` were attempted for `content_id`. Existing links are kept.
pub async fn link_content_searches(
	db: &Db,
	content_id: Uuid,
	search_ids: &[Uuid],
	now: OffsetDateTime,
) -> Result<()> {
	if search_ids.is_empty() {
		return Ok(());
	}

	sqlx::query(
		"\
INSERT INTO content_searches (content_id, search_id, linked_at)
SELECT $1, search_id, $3
FROM unnest($2::uuid[]) AS linked(search_id)
ON CONFLICT (content_id, search_id) DO NOTHING",
	)
	.bind(content_id)
	.bind(search_ids)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Every attempt linked to `content_id`, best quality first.
pub async fn list_content_searches(db: &Db, content_id: Uuid) -> Result<Vec<SearchAttempt>> {
	let sql = format!(
		"\
SELECT {SEARCH_COLUMNS}
FROM searches
WHERE search_id IN (SELECT search_id FROM content_searches WHERE content_id = $1)
ORDER BY quality_score DESC NULLS LAST, created_at DESC, search_id ASC"
	);
	let rows: Vec<SearchRow> = sqlx::query_as(&sql).bind(content_id).fetch_all(&db.pool).await?;

	rows.into_iter().map(TryInto::try_into).collect()
}

async fn reset_search(db: &Db, search_id: Uuid, now: OffsetDateTime) -> Result<SearchAttempt> {
	let sql = format!(
		"\
UPDATE searches
SET status = $1, error_message = NULL, updated_at = $2
WHERE search_id = $3
RETURNING
	{SEARCH_COLUMNS}"
	);
	let row: Option<SearchRow> = sqlx::query_as(&sql)
		.bind(SearchStatus::Pending.as_str())
		.bind(now)
		.bind(search_id)
		.fetch_optional(&db.pool)
		.await?;

	row.ok_or_else(|| Error::NotFound(format!("search {search_id}")))?.try_into()
}

fn ensure_updated(rows_affected: u64, kind: &str, id: Uuid) -> Result<()> {
	if rows_affected == 0 {
		return Err(Error::NotFound(format!("{kind} {id}")));
	}

	Ok(())
}

fn map_unique_violation(err: sqlx::Error, key: &str) -> Error {
	match &err {
		sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
			Error::Conflict(format!("{key} already exists.")),
		_ => Error::Sqlx(err),
	}
}
