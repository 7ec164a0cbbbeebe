use serde_json::{Value, json};

use toplist_config::{Config, Publish, Purge, Service, Store};
use toplist_service::ToplistService;
use toplist_store::{DocPath, DocumentStore, FieldPath, MemoryStore, UpdateSpec};
use toplist_testkit::{FlakyStore, PlayerFixture};

fn cfg() -> Config {
	Config {
		service: Service {
			log_level: "info".to_string(),
			http_bind: "127.0.0.1:0".to_string(),
			updater_interval_secs: 300,
		},
		store: Store {
			project_id: "test".to_string(),
			api_base: "http://localhost".to_string(),
			timeout_ms: 10_000,
		},
		publish: Publish::default(),
		purge: Purge::default(),
	}
}

#[tokio::test]
async fn derives_changed_players_and_advances_watermark() {
	let store = MemoryStore::new();
	let alice = PlayerFixture::named("w1_1", "Alice");
	let bob = PlayerFixture::named("w1_2", "Bob");

	alice.seed_latest(&store).await;
	bob.seed_latest(&store).await;

	// A "latest/current" document outside the player tree; the group query
	// matches it but the path shape filter must discard it.
	store
		.set_merge(
			&DocPath::doc(&["guilds", "g1", "latest", "current"]),
			json!({ "lastUpdatedAt": 1_700_000_000_000_i64 })
				.as_object()
				.cloned()
				.unwrap(),
		)
		.await
		.unwrap();

	let service = ToplistService::new(cfg(), store.clone());
	let report = service.run_updater_once().await.unwrap();

	assert_eq!(report.processed, 2);
	assert_eq!(report.skipped_shape, 1);
	assert_eq!(report.skipped_invalid, 0);
	assert_eq!(report.scopes.get("eu1"), Some(&2));

	let derived = store
		.get(&DocPath::doc(&["toplist_players", "w1_1"]))
		.await
		.unwrap()
		.expect("derived doc for w1_1");

	assert_eq!(derived.fields.get("name"), Some(&json!("Alice")));
	assert_eq!(derived.fields.get("sum"), Some(&json!(150.0)));
	assert_eq!(derived.fields.get("mainAttribute"), Some(&json!(50.0)));
	assert_eq!(derived.fields.get("ratio"), Some(&json!(1.5)));
	assert_eq!(derived.fields.get("partitionKey"), Some(&json!("eu1")));
	assert_eq!(derived.fields.get("partitionGroup"), Some(&json!("EU")));

	let meta = store
		.get(&DocPath::doc(&["meta", "toplist"]))
		.await
		.unwrap()
		.expect("meta doc after run");
	let watermark = meta.fields.get("lastComputedAt").and_then(Value::as_i64).unwrap();

	assert!(watermark > 0);
	assert_eq!(
		meta.fields["scopeChange"]["eu1"]["changedSinceLastRebuild"],
		json!(2)
	);
}

#[tokio::test]
async fn rerun_over_same_window_converges_to_identical_cache() {
	let store = MemoryStore::new();

	PlayerFixture::default().seed_latest(&store).await;

	let service = ToplistService::new(cfg(), store.clone());

	service.run_updater_once().await.unwrap();

	let first = store
		.get(&DocPath::doc(&["toplist_players", "w1_1"]))
		.await
		.unwrap()
		.expect("derived doc")
		.fields;

	// Roll the watermark back so the same raw window is reprocessed.
	service
		.store()
		.update(
			&DocPath::doc(&["meta", "toplist"]),
			UpdateSpec::new().set(FieldPath::parse("lastComputedAt"), json!(0)),
		)
		.await
		.unwrap();

	let report = service.run_updater_once().await.unwrap();

	assert_eq!(report.processed, 1);

	let second = store
		.get(&DocPath::doc(&["toplist_players", "w1_1"]))
		.await
		.unwrap()
		.expect("derived doc")
		.fields;

	assert_eq!(first, second);
}

#[tokio::test]
async fn watermark_stays_behind_already_processed_writes() {
	let store = MemoryStore::new();

	PlayerFixture::default().seed_latest(&store).await;

	let service = ToplistService::new(cfg(), store.clone());

	service.run_updater_once().await.unwrap();

	// Nothing changed upstream, so the next run processes nothing.
	let report = service.run_updater_once().await.unwrap();

	assert_eq!(report.processed, 0);
	assert!(report.scopes.is_empty());
}

#[tokio::test]
async fn undeserializable_latest_doc_is_counted_and_skipped() {
	let store = MemoryStore::new();

	PlayerFixture::default().seed_latest(&store).await;
	store
		.set_merge(
			&DocPath::doc(&["players", "w1_9", "latest", "current"]),
			json!({ "values": 5, "lastUpdatedAt": 1_700_000_000_000_i64 })
				.as_object()
				.cloned()
				.unwrap(),
		)
		.await
		.unwrap();

	let service = ToplistService::new(cfg(), store.clone());
	let report = service.run_updater_once().await.unwrap();

	assert_eq!(report.processed, 1);
	assert_eq!(report.skipped_invalid, 1);
	assert!(
		store.get(&DocPath::doc(&["toplist_players", "w1_9"])).await.unwrap().is_none()
	);
}

#[tokio::test]
async fn stream_failure_aborts_without_advancing_the_watermark() {
	let inner = MemoryStore::new();

	PlayerFixture::default().seed_latest(&inner).await;

	let service = ToplistService::new(cfg(), FlakyStore::failing_after(inner.clone(), 0));

	assert!(service.run_updater_once().await.is_err());
	assert!(inner.get(&DocPath::doc(&["meta", "toplist"])).await.unwrap().is_none());
}
