//! Postgres-backed record and content stores.

use time::OffsetDateTime;
use uuid::Uuid;

use prowl_domain::{
	ContentSearchStatus, ContentTarget, NewSearchAttempt, Platform, SearchAttempt, SearchStatus,
};
use prowl_storage::{db::Db, queries};

use crate::{BoxFuture, ContentStore, Result, SearchRecordStore};

pub struct PgRecordStore {
	db: Db,
}
impl PgRecordStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl SearchRecordStore for PgRecordStore {
	fn find_or_create<'a>(
		&'a self,
		new: &'a NewSearchAttempt,
	) -> BoxFuture<'a, Result<SearchAttempt>> {
		Box::pin(async move {
			Ok(queries::find_or_create_search(&self.db, new, OffsetDateTime::now_utc()).await?)
		})
	}

	fn get(&self, attempt_id: Uuid) -> BoxFuture<'_, Result<Option<SearchAttempt>>> {
		Box::pin(async move { Ok(queries::get_search(&self.db, attempt_id).await?) })
	}

	fn mark_searching(&self, attempt_id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			queries::set_search_status(
				&self.db,
				attempt_id,
				SearchStatus::Searching,
				OffsetDateTime::now_utc(),
			)
			.await?;

			Ok(())
		})
	}

	fn complete(
		&self,
		attempt_id: Uuid,
		product_count: u32,
		quality_score: f32,
	) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			queries::complete_search(
				&self.db,
				attempt_id,
				product_count,
				quality_score,
				OffsetDateTime::now_utc(),
			)
			.await?;

			Ok(())
		})
	}

	fn fail<'a>(&'a self, attempt_id: Uuid, error_message: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::fail_search(&self.db, attempt_id, error_message, OffsetDateTime::now_utc())
				.await?;

			Ok(())
		})
	}

	fn list_by_platform(
		&self,
		platform: Platform,
		limit: u32,
	) -> BoxFuture<'_, Result<Vec<SearchAttempt>>> {
		Box::pin(async move {
			Ok(queries::list_searches_by_platform(&self.db, platform, limit).await?)
		})
	}

	fn link_to_content<'a>(
		&'a self,
		content_id: Uuid,
		attempt_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::link_content_searches(
				&self.db,
				content_id,
				attempt_ids,
				OffsetDateTime::now_utc(),
			)
			.await?;

			Ok(())
		})
	}

	fn list_by_content(&self, content_id: Uuid) -> BoxFuture<'_, Result<Vec<SearchAttempt>>> {
		Box::pin(async move { Ok(queries::list_content_searches(&self.db, content_id).await?) })
	}
}

pub struct PgContentStore {
	db: Db,
}
impl PgContentStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl ContentStore for PgContentStore {
	fn get(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<ContentTarget>>> {
		Box::pin(async move { Ok(queries::get_content(&self.db, content_id).await?) })
	}

	fn set_status(
		&self,
		content_id: Uuid,
		status: ContentSearchStatus,
	) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			queries::set_content_status(&self.db, content_id, status, OffsetDateTime::now_utc())
				.await?;

			Ok(())
		})
	}

	fn set_best_attempt(&self, content_id: Uuid, attempt_id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			queries::set_content_best_search(
				&self.db,
				content_id,
				attempt_id,
				OffsetDateTime::now_utc(),
			)
			.await?;

			Ok(())
		})
	}

	fn set_feedback<'a>(
		&'a self,
		content_id: Uuid,
		feedback: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::set_content_feedback(
				&self.db,
				content_id,
				feedback,
				OffsetDateTime::now_utc(),
			)
			.await?;

			Ok(())
		})
	}
}
