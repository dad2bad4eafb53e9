use std::path::{Path, PathBuf};

use serde::Serialize;

use prowl_domain::{NormalizedProduct, SearchAttempt};

use crate::{BoxFuture, Error, Result, ResultPublisher};

#[derive(Serialize)]
struct ResultsPayload<'a> {
	attempt: &'a SearchAttempt,
	products: &'a [NormalizedProduct],
}

/// Writes `<root>/searches/<fingerprint>/results.json`.
#[derive(Clone, Debug)]
pub struct DirPublisher {
	root: PathBuf,
}
impl DirPublisher {
	pub fn new(root: impl AsRef<Path>) -> Self {
		Self { root: root.as_ref().to_path_buf() }
	}

	pub fn results_path(&self, attempt: &SearchAttempt) -> PathBuf {
		self.root.join("searches").join(&attempt.fingerprint).join("results.json")
	}

	async fn write(&self, attempt: &SearchAttempt, products: &[NormalizedProduct]) -> Result<()> {
		let path = self.results_path(attempt);
		let payload = serde_json::to_vec_pretty(&ResultsPayload { attempt, products })
			.map_err(|err| Error::Publish { message: err.to_string() })?;

		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await.map_err(|err| Error::Publish {
				message: format!("Failed to create {}: {err}", parent.display()),
			})?;
		}

		tokio::fs::write(&path, payload).await.map_err(|err| Error::Publish {
			message: format!("Failed to write {}: {err}", path.display()),
		})?;

		tracing::info!(
			attempt_id = %attempt.id,
			path = %path.display(),
			product_count = products.len(),
			"Search results published."
		);

		Ok(())
	}
}
impl ResultPublisher for DirPublisher {
	fn publish<'a>(
		&'a self,
		attempt: &'a SearchAttempt,
		products: &'a [NormalizedProduct],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.write(attempt, products))
	}
}

/// Publisher used when no result root is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogPublisher;
impl ResultPublisher for LogPublisher {
	fn publish<'a>(
		&'a self,
		attempt: &'a SearchAttempt,
		products: &'a [NormalizedProduct],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			tracing::info!(
				attempt_id = %attempt.id,
				fingerprint = attempt.fingerprint.as_str(),
				product_count = products.len(),
				"Search results ready."
			);

			Ok(())
		})
	}
}
