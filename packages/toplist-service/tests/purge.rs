use serde_json::json;

use toplist_config::{Config, Publish, Purge, Service, Store};
use toplist_service::{PurgeRequest, ToplistService};
use toplist_store::{DocPath, DocumentStore, MemoryStore};
use toplist_testkit::PlayerFixture;

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

async fn seed_legacy(store: &MemoryStore, id: &str) {
	let fixture = PlayerFixture::named(id, "Legacy");

	fixture.seed_scan(store, "scan-1").await;
	fixture.seed_scan(store, "scan-2").await;
	fixture.seed_latest(store).await;
	store
		.set_merge(
			&DocPath::doc(&["players", id, "pets", "p1"]),
			json!({ "kind": "dog" }).as_object().cloned().unwrap(),
		)
		.await
		.unwrap();
	store
		.set_merge(
			&DocPath::doc(&["players", id]),
			json!({ "name": "Legacy" }).as_object().cloned().unwrap(),
		)
		.await
		.unwrap();
}

#[tokio::test]
async fn dry_run_reports_discovered_namespaces_without_deleting() {
	let store = MemoryStore::new();

	seed_legacy(&store, "12345").await;
	PlayerFixture::named("w1_55", "Modern").seed_scan(&store, "scan-1").await;

	let docs_before = store.len();
	let service = ToplistService::new(cfg(), store.clone());
	let report = service.run_purge(&PurgeRequest::default()).await.unwrap();

	assert_eq!(report.discovered, vec!["12345".to_string()]);
	assert!(!report.executed);
	assert_eq!(report.docs_deleted, 0);
	assert_eq!(store.len(), docs_before);
}

#[tokio::test]
async fn execute_removes_the_legacy_tree_and_spares_modern_ids() {
	let store = MemoryStore::new();

	seed_legacy(&store, "12345").await;

	let modern = PlayerFixture::named("w1_55", "Modern");

	modern.seed_scan(&store, "scan-1").await;
	modern.seed_latest(&store).await;

	let service = ToplistService::new(cfg(), store.clone());
	let report = service
		.run_purge(&PurgeRequest { execute: true, limit: None })
		.await
		.unwrap();

	assert_eq!(report.entities_deleted, 1);
	// Two scans, one pet, the latest document, the root document.
	assert_eq!(report.docs_deleted, 5);
	assert_eq!(report.failed_deletes, 0);
	assert!(!report.aborted_on_budget);

	assert!(store.get(&DocPath::doc(&["players", "12345"])).await.unwrap().is_none());
	assert!(
		store
			.get(&DocPath::doc(&["players", "12345", "scans", "scan-1"]))
			.await
			.unwrap()
			.is_none()
	);
	assert!(
		store
			.get(&DocPath::doc(&["players", "12345", "pets", "p1"]))
			.await
			.unwrap()
			.is_none()
	);
	assert!(
		store
			.get(&DocPath::doc(&["players", "12345", "latest", "current"]))
			.await
			.unwrap()
			.is_none()
	);

	assert!(
		store
			.get(&DocPath::doc(&["players", "w1_55", "scans", "scan-1"]))
			.await
			.unwrap()
			.is_some()
	);
	assert!(
		store
			.get(&DocPath::doc(&["players", "w1_55", "latest", "current"]))
			.await
			.unwrap()
			.is_some()
	);
}

#[tokio::test]
async fn limit_caps_discovery_across_pages() {
	let store = MemoryStore::new();

	for id in ["10001", "10002", "10003"] {
		PlayerFixture::named(id, "Legacy").seed_scan(&store, "scan-1").await;
	}

	let service = ToplistService::new(cfg(), store.clone());
	let report = service
		.run_purge(&PurgeRequest { execute: false, limit: Some(2) })
		.await
		.unwrap();

	assert_eq!(report.discovered.len(), 2);
}

#[tokio::test]
async fn delete_budget_aborts_the_run_and_keeps_committed_deletes() {
	let store = MemoryStore::new();

	seed_legacy(&store, "12345").await;
	seed_legacy(&store, "67890").await;

	let mut cfg = cfg();

	// Enough for the first namespace's sub-collections, not for its latest
	// and root documents.
	cfg.purge.max_total_deletes = 3;

	let service = ToplistService::new(cfg, store.clone());
	let report = service
		.run_purge(&PurgeRequest { execute: true, limit: None })
		.await
		.unwrap();

	assert!(report.aborted_on_budget);
	assert_eq!(report.entities_deleted, 0);
	assert_eq!(report.docs_deleted, 3);

	// The first namespace's scans and pet are gone, its latest and root
	// survive, and the second namespace was never touched.
	assert!(
		store
			.get(&DocPath::doc(&["players", "12345", "scans", "scan-1"]))
			.await
			.unwrap()
			.is_none()
	);
	assert!(
		store
			.get(&DocPath::doc(&["players", "12345", "latest", "current"]))
			.await
			.unwrap()
			.is_some()
	);
	assert!(store.get(&DocPath::doc(&["players", "12345"])).await.unwrap().is_some());
	assert!(
		store
			.get(&DocPath::doc(&["players", "67890", "scans", "scan-1"]))
			.await
			.unwrap()
			.is_some()
	);
}
