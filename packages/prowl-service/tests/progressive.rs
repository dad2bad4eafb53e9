mod common;

use std::sync::Arc;

use serde_json::{Value, json};

use prowl_domain::{Platform, SearchStatus, StrategySuggestion, taxonomy};
use prowl_service::{
	AdapterError, AttemptOutcome, ProgressiveOutcome, SearchPolicy, SearchSeed, StopReason,
	progressive::run_progressive,
};

use common::{
	CREDENTIAL_ID, MemoryRecordStore, ScriptedAdvisor, ScriptedCatalog, Step, UnavailableAdvisor,
};

fn broadest() -> Value {
	taxonomy::broadest_config(Platform::ShoppingAggregator)
}

fn keywords(suggestion: &str) -> StrategySuggestion {
	StrategySuggestion::change_keywords(suggestion, "scripted")
}

async fn run(
	catalog: &ScriptedCatalog,
	records: &MemoryRecordStore,
	policy: &SearchPolicy,
	seed: SearchSeed,
) -> ProgressiveOutcome {
	run_progressive(catalog, records, policy, CREDENTIAL_ID, None, seed)
		.await
		.expect("Progressive search should not fail on in-memory stores.")
}

fn outcomes(outcome: &ProgressiveOutcome) -> Vec<AttemptOutcome> {
	outcome.trail.iter().map(|trace| trace.outcome).collect()
}

#[tokio::test]
async fn always_changing_keywords_still_terminates() {
	let advisor = Arc::new(ScriptedAdvisor::new(Vec::new(), keywords("portable speaker")));
	let catalog = ScriptedCatalog::new(
		Platform::ShoppingAggregator,
		advisor.clone(),
		vec![Step::Items(3); 10],
	);
	let records = MemoryRecordStore::default();
	let policy = SearchPolicy::default();
	let seed = SearchSeed::new("desk speaker", broadest());
	let outcome = run(&catalog, &records, &policy, seed).await;

	assert_eq!(outcome.stop_reason, StopReason::AttemptsExhausted);
	assert_eq!(outcome.attempts(), policy.max_attempts as usize);
	assert_eq!(catalog.executed_keywords(), vec!["desk speaker", "portable speaker"]);
	assert_eq!(
		outcomes(&outcome),
		vec![
			AttemptOutcome::Completed,
			AttemptOutcome::Completed,
			AttemptOutcome::Duplicate,
			AttemptOutcome::Duplicate,
			AttemptOutcome::Duplicate,
		]
	);
	assert_eq!(records.all().len(), 2);
}

#[tokio::test]
async fn alternating_suggestions_are_bounded_by_max_attempts() {
	let advisor = Arc::new(ScriptedAdvisor::new(
		vec![keywords("alpha"), keywords("bravo"), keywords("alpha"), keywords("bravo")],
		keywords("alpha"),
	));
	let catalog =
		ScriptedCatalog::new(Platform::ShoppingAggregator, advisor, vec![Step::Items(1); 10]);
	let records = MemoryRecordStore::default();
	let policy = SearchPolicy { max_attempts: 4, ..SearchPolicy::default() };
	let outcome = run(&catalog, &records, &policy, SearchSeed::new("seed", broadest())).await;

	assert_eq!(outcome.attempts(), 4);
	assert_eq!(catalog.executed_keywords(), vec!["seed", "alpha", "bravo"]);
	assert_eq!(outcome.stop_reason, StopReason::AttemptsExhausted);
}

#[tokio::test]
async fn reaching_the_target_short_circuits_quality_ranking() {
	let advisor = Arc::new(ScriptedAdvisor::new(
		vec![keywords("bluetooth speakers")],
		StrategySuggestion::stop("done"),
	));
	let catalog = ScriptedCatalog::new(
		Platform::ShoppingAggregator,
		advisor,
		vec![Step::ItemsScored(5, 0.9), Step::ItemsScored(25, 0.3)],
	);
	let records = MemoryRecordStore::default();
	let outcome = run(
		&catalog,
		&records,
		&SearchPolicy::default(),
		SearchSeed::new("vintage bluetooth speaker", broadest()),
	)
	.await;
	let best = outcome.best.as_ref().expect("Expected a best attempt.");

	assert_eq!(outcome.stop_reason, StopReason::TargetReached);
	assert_eq!(best.attempt.keywords, "bluetooth speakers");
	assert_eq!(best.attempt.product_count, 25);
	assert_eq!(best.products.len(), 25);
	assert!(!outcome.excellent);
	assert_eq!(outcome.attempts(), 2);
}

#[tokio::test]
async fn ideal_count_marks_the_result_excellent() {
	let advisor = Arc::new(UnavailableAdvisor);
	let catalog =
		ScriptedCatalog::new(Platform::ShoppingAggregator, advisor, vec![Step::Items(45)]);
	let records = MemoryRecordStore::default();
	let outcome = run(
		&catalog,
		&records,
		&SearchPolicy::default(),
		SearchSeed::new("camping stove", broadest()),
	)
	.await;

	assert_eq!(outcome.stop_reason, StopReason::TargetReached);
	assert!(outcome.excellent);
	assert_eq!(outcome.attempts(), 1);
}

#[tokio::test]
async fn best_attempt_is_ranked_by_quality() {
	let advisor = Arc::new(ScriptedAdvisor::new(
		vec![keywords("bravo"), keywords("charlie")],
		StrategySuggestion::stop("done"),
	));
	let catalog = ScriptedCatalog::new(
		Platform::ShoppingAggregator,
		advisor,
		vec![Step::ItemsScored(3, 0.2), Step::ItemsScored(3, 0.9), Step::ItemsScored(3, 0.5)],
	);
	let records = MemoryRecordStore::default();
	let policy = SearchPolicy { max_attempts: 3, ..SearchPolicy::default() };
	let outcome = run(&catalog, &records, &policy, SearchSeed::new("alpha", broadest())).await;
	let best = outcome.best.as_ref().expect("Expected a best attempt.");

	assert_eq!(outcome.stop_reason, StopReason::AttemptsExhausted);
	assert_eq!(best.attempt.keywords, "bravo");
	assert_eq!(best.attempt.quality_score, Some(0.9));
}

#[tokio::test]
async fn quality_ties_keep_the_earlier_attempt() {
	let advisor =
		Arc::new(ScriptedAdvisor::new(vec![keywords("later")], StrategySuggestion::stop("done")));
	let catalog = ScriptedCatalog::new(
		Platform::ShoppingAggregator,
		advisor,
		vec![Step::ItemsScored(3, 0.6), Step::ItemsScored(9, 0.6)],
	);
	let records = MemoryRecordStore::default();
	let outcome =
		run(&catalog, &records, &SearchPolicy::default(), SearchSeed::new("earlier", broadest()))
			.await;
	let best = outcome.best.as_ref().expect("Expected a best attempt.");

	assert_eq!(outcome.stop_reason, StopReason::AdvisorStopped);
	assert_eq!(best.attempt.keywords, "earlier");
}

#[tokio::test]
async fn unavailable_advisor_follows_the_fallback_sequence() {
	let catalog = ScriptedCatalog::new(
		Platform::ShoppingAggregator,
		Arc::new(UnavailableAdvisor),
		vec![Step::Items(0), Step::Items(0), Step::Items(8)],
	);
	let records = MemoryRecordStore::default();
	let canada = taxonomy::aggregator_config("Canada", "en", "ca");
	let outcome = run(
		&catalog,
		&records,
		&SearchPolicy::default(),
		SearchSeed::new("red running shoes", canada.clone()),
	)
	.await;
	let calls = catalog
		.calls()
		.into_iter()
		.map(|(keywords, config, _)| (keywords, config))
		.collect::<Vec<_>>();

	assert_eq!(
		calls,
		vec![
			("red running shoes".to_string(), canada),
			("red running shoes".to_string(), broadest()),
			("red".to_string(), broadest()),
		]
	);
	assert_eq!(
		outcomes(&outcome),
		vec![
			AttemptOutcome::Completed,
			AttemptOutcome::Completed,
			AttemptOutcome::Completed,
			AttemptOutcome::Duplicate,
			AttemptOutcome::Duplicate,
		]
	);
	assert_eq!(outcome.stop_reason, StopReason::AttemptsExhausted);

	let best = outcome.best.as_ref().expect("Expected a best attempt.");

	assert_eq!(best.attempt.keywords, "red");
	assert_eq!(best.attempt.product_count, 8);
	assert!((best.quality() - 0.4).abs() < 1e-6);
}

#[tokio::test]
async fn adapter_failure_does_not_abort_the_search() {
	let catalog = ScriptedCatalog::new(
		Platform::ShoppingAggregator,
		Arc::new(UnavailableAdvisor),
		vec![
			Step::Fail(AdapterError::UpstreamUnavailable { message: "502".to_string() }),
			Step::Items(22),
		],
	);
	let records = MemoryRecordStore::default();
	let outcome = run(
		&catalog,
		&records,
		&SearchPolicy::default(),
		SearchSeed::new("wireless earbuds", broadest()),
	)
	.await;
	let best = outcome.best.as_ref().expect("Expected a best attempt.");

	assert_eq!(outcome.stop_reason, StopReason::TargetReached);
	assert_eq!(best.attempt.keywords, "wireless");
	assert_eq!(best.attempt.product_count, 22);
	assert_eq!(outcomes(&outcome), vec![AttemptOutcome::Failed, AttemptOutcome::Completed]);

	let stored = records.all();
	let failed = stored
		.iter()
		.find(|attempt| attempt.keywords == "wireless earbuds")
		.expect("Failed attempt should be persisted.");

	assert_eq!(failed.status, SearchStatus::Failed);
	assert!(failed.error_message.as_deref().is_some_and(|message| message.contains("502")));
	assert_eq!(
		records.by_id(best.attempt.id).map(|attempt| attempt.status),
		Some(SearchStatus::Completed)
	);
}

#[tokio::test]
async fn every_attempt_failing_leaves_no_best_attempt() {
	let failure = Step::Fail(AdapterError::UpstreamRejected { message: "bad query".to_string() });
	let catalog = ScriptedCatalog::new(
		Platform::ShoppingAggregator,
		Arc::new(UnavailableAdvisor),
		vec![failure; 5],
	);
	let records = MemoryRecordStore::default();
	let outcome = run(
		&catalog,
		&records,
		&SearchPolicy::default(),
		SearchSeed::new("heated gloves", broadest()),
	)
	.await;

	assert!(outcome.best.is_none());
	assert_eq!(outcome.stop_reason, StopReason::AttemptsExhausted);
	assert!(outcome.last_error().is_some_and(|message| message.contains("bad query")));
}

#[tokio::test]
async fn repeated_combinations_reuse_one_record() {
	let advisor = Arc::new(ScriptedAdvisor::new(
		Vec::new(),
		StrategySuggestion::change_config(broadest(), "same config"),
	));
	let catalog =
		ScriptedCatalog::new(Platform::ShoppingAggregator, advisor, vec![Step::Items(2); 4]);
	let records = MemoryRecordStore::default();
	let policy = SearchPolicy::default();
	let seed = SearchSeed::new("trail mix", broadest());
	let first = run(&catalog, &records, &policy, seed.clone()).await;

	assert_eq!(catalog.calls().len(), 1);
	assert_eq!(first.attempts(), 5);
	assert_eq!(records.all().len(), 1);

	let second = run(&catalog, &records, &policy, seed).await;
	let first_id = first.best.as_ref().map(|best| best.attempt.id);
	let second_id = second.best.as_ref().map(|best| best.attempt.id);

	assert_eq!(records.all().len(), 1);
	assert_eq!(first_id, second_id);
	assert_eq!(catalog.calls().len(), 2);
}

#[tokio::test]
async fn malformed_suggestion_stops_the_search() {
	for suggestion in [
		StrategySuggestion::unrecognized("gibberish"),
		keywords(""),
		keywords("\"\""),
		StrategySuggestion::change_config(json!({}), "empty"),
	] {
		let advisor = Arc::new(ScriptedAdvisor::new(Vec::new(), suggestion));
		let catalog =
			ScriptedCatalog::new(Platform::ShoppingAggregator, advisor, vec![Step::Items(4)]);
		let records = MemoryRecordStore::default();
		let outcome = run(
			&catalog,
			&records,
			&SearchPolicy::default(),
			SearchSeed::new("pour over kettle", broadest()),
		)
		.await;

		assert_eq!(outcome.stop_reason, StopReason::InvalidSuggestion);
		assert_eq!(outcome.attempts(), 1);
		assert_eq!(
			outcome.best.as_ref().map(|best| best.attempt.keywords.as_str()),
			Some("pour over kettle")
		);
	}
}

#[tokio::test]
async fn advisor_stop_returns_the_best_so_far() {
	let advisor = Arc::new(ScriptedAdvisor::new(Vec::new(), StrategySuggestion::stop("enough")));
	let catalog = ScriptedCatalog::new(
		Platform::ShoppingAggregator,
		advisor.clone(),
		vec![Step::ItemsScored(6, 0.7)],
	);
	let records = MemoryRecordStore::default();
	let outcome = run(
		&catalog,
		&records,
		&SearchPolicy::default(),
		SearchSeed::new("linen shirt", broadest()),
	)
	.await;

	assert_eq!(outcome.stop_reason, StopReason::AdvisorStopped);
	assert_eq!(outcome.best.map(|best| best.attempt.product_count), Some(6));
	assert_eq!(*advisor.strategy_calls.lock().expect("Test mutex poisoned."), 1);
}

#[tokio::test]
async fn suggested_configs_are_coerced_before_execution() {
	let advisor = Arc::new(ScriptedAdvisor::new(
		vec![StrategySuggestion::change_config(json!({ "searchIndex": "Gadgets" }), "narrow")],
		StrategySuggestion::stop("done"),
	));
	let catalog = ScriptedCatalog::new(
		Platform::GeneralMarketplace,
		advisor,
		vec![Step::Items(3), Step::Items(4)],
	);
	let records = MemoryRecordStore::default();
	let outcome = run(
		&catalog,
		&records,
		&SearchPolicy::default(),
		SearchSeed::new("camp stove", taxonomy::marketplace_config("SportsAndOutdoors")),
	)
	.await;
	let configs = catalog.calls().into_iter().map(|(_, config, _)| config).collect::<Vec<_>>();

	assert_eq!(
		configs,
		vec![taxonomy::marketplace_config("SportsAndOutdoors"), taxonomy::marketplace_config("All")]
	);
	assert_eq!(outcome.trail[1].config, taxonomy::marketplace_config("All"));
	assert_eq!(outcome.stop_reason, StopReason::AdvisorStopped);
}
