//! One single search per registered platform, run concurrently.

use futures::future;

use prowl_domain::{ContentTarget, NewSearchAttempt, Platform};

use crate::{
	CatalogAdapter, Result, SearchService,
	progressive::{self, AttemptRun},
};

/// What one platform branch of a race produced.
pub(crate) struct RaceEntry {
	pub(crate) platform: Platform,
	pub(crate) result: Result<AttemptRun>,
}

pub(crate) async fn run_race(
	service: &SearchService,
	content: &ContentTarget,
	credential_id: &str,
) -> Vec<RaceEntry> {
	let branches = service
		.collaborators
		.adapters
		.values()
		.map(|adapter| race_branch(service, adapter.as_ref(), content, credential_id));

	future::join_all(branches).await
}

async fn race_branch(
	service: &SearchService,
	adapter: &dyn CatalogAdapter,
	content: &ContentTarget,
	credential_id: &str,
) -> RaceEntry {
	let platform = adapter.platform();
	let collaborators = &service.collaborators;
	let result = async {
		let credential = collaborators.credentials.resolve(credential_id, platform).await;
		let seed = service.seed_for(adapter, content).await?;
		let new = NewSearchAttempt::new(seed.keywords, platform, seed.config, credential_id);

		progressive::execute_attempt(
			adapter,
			collaborators.records.as_ref(),
			&new,
			credential.as_ref(),
		)
		.await
	}
	.await;

	if let Err(err) = &result {
		tracing::warn!(%platform, error = %err, "Race branch failed.");
	}

	RaceEntry { platform, result }
}

/// Index of the highest-quality successful run. Ties keep the earlier run.
pub(crate) fn pick_best(runs: &[&AttemptRun]) -> Option<usize> {
	let mut best: Option<(usize, f32)> = None;

	for (index, run) in runs.iter().enumerate() {
		if !run.is_success() {
			continue;
		}

		let quality = run.attempt.quality();

		match best {
			Some((_, current)) if quality <= current => {},
			_ => best = Some((index, quality)),
		}
	}

	best.map(|(index, _)| index)
}
