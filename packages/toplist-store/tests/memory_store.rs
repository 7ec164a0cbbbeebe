use serde_json::{Map, Value, json};

use toplist_store::{
	DocPath, DocumentStore, FieldPath, FilterOp, MemoryStore, Query, Transform, UpdateSpec,
};

fn fields(value: Value) -> Map<String, Value> {
	match value {
		Value::Object(map) => map,
		other => panic!("expected an object, got {other}"),
	}
}

#[tokio::test]
async fn set_merge_preserves_unnamed_fields() {
	let store = MemoryStore::new();
	let path = DocPath::doc(&["players", "1"]);

	store
		.set_merge(&path, fields(json!({ "name": "a", "stats": { "level": 3, "sum": 9 } })))
		.await
		.unwrap();
	store.set_merge(&path, fields(json!({ "stats": { "sum": 12 } }))).await.unwrap();

	let doc = store.get(&path).await.unwrap().unwrap();

	assert_eq!(doc.fields["name"], json!("a"));
	assert_eq!(doc.fields["stats"]["level"], json!(3));
	assert_eq!(doc.fields["stats"]["sum"], json!(12));
	assert!(doc.update_time_ms > 0);
}

#[tokio::test]
async fn update_distinguishes_nested_and_literal_field_paths() {
	let store = MemoryStore::new();
	let path = DocPath::doc(&["toplist_candidates", "snapshot_eu1_player_derived"]);

	store
		.update(
			&path,
			UpdateSpec::new()
				.set(FieldPath::parse("meta.pendingSincePublish"), json!(5))
				.set(FieldPath::raw("meta.lastPublishedAt"), json!(111)),
		)
		.await
		.unwrap();

	let doc = store.get(&path).await.unwrap().unwrap();

	assert_eq!(doc.fields["meta"]["pendingSincePublish"], json!(5));
	assert_eq!(doc.fields["meta.lastPublishedAt"], json!(111));

	store
		.update(&path, UpdateSpec::new().delete(FieldPath::raw("meta.lastPublishedAt")))
		.await
		.unwrap();

	let doc = store.get(&path).await.unwrap().unwrap();

	assert!(doc.fields.get("meta.lastPublishedAt").is_none());
	assert_eq!(doc.fields["meta"]["pendingSincePublish"], json!(5));
}

#[tokio::test]
async fn increment_starts_at_zero_and_accumulates() {
	let store = MemoryStore::new();
	let path = DocPath::doc(&["c", "d"]);
	let pending = || {
		UpdateSpec::new()
			.transform(FieldPath::parse("meta.pendingSincePublish"), Transform::Increment(1.0))
	};

	store.update(&path, pending()).await.unwrap();
	store.update(&path, pending()).await.unwrap();
	store.update(&path, pending()).await.unwrap();

	let doc = store.get(&path).await.unwrap().unwrap();

	assert_eq!(doc.fields["meta"]["pendingSincePublish"], json!(3));
}

#[tokio::test]
async fn server_timestamp_transform_writes_epoch_millis() {
	let store = MemoryStore::new();
	let path = DocPath::doc(&["c", "d"]);

	store
		.update(
			&path,
			UpdateSpec::new().transform(FieldPath::parse("publishedAt"), Transform::ServerTimestamp),
		)
		.await
		.unwrap();

	let doc = store.get(&path).await.unwrap().unwrap();
	let stamp = doc.fields["publishedAt"].as_i64().unwrap();

	assert!(stamp > 1_600_000_000_000);
}

#[tokio::test]
async fn delete_is_idempotent() {
	let store = MemoryStore::new();
	let path = DocPath::doc(&["c", "d"]);

	store.set_merge(&path, fields(json!({ "x": 1 }))).await.unwrap();
	store.delete(&path).await.unwrap();
	store.delete(&path).await.unwrap();

	assert!(store.get(&path).await.unwrap().is_none());
}

#[tokio::test]
async fn collection_group_queries_span_parents() {
	let store = MemoryStore::new();

	for (parent, id) in [("players/1", "a"), ("players/2", "b"), ("guilds/9", "c")] {
		let path = DocPath::parse(&format!("{parent}/scans/{id}")).unwrap();

		store.set_merge(&path, fields(json!({ "timestamp": 1 }))).await.unwrap();
	}

	let group = Query::collection_group("scans");
	let page = store.run_query(&group, None).await.unwrap();

	assert_eq!(page.docs.len(), 3);

	let scoped = Query::collection(DocPath::doc(&["players", "1"]), "scans");
	let page = store.run_query(&scoped, None).await.unwrap();

	assert_eq!(page.docs.len(), 1);
	assert_eq!(page.docs[0].path.to_string(), "players/1/scans/a");
}

#[tokio::test]
async fn range_filters_and_order_apply() {
	let store = MemoryStore::new();

	for (id, ts) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
		let path = DocPath::parse(&format!("players/{id}/scans/s")).unwrap();

		store
			.set_merge(&path, fields(json!({ "timestamp": ts, "server": "eu1" })))
			.await
			.unwrap();
	}

	let query = Query::collection_group("scans")
		.filter("server", FilterOp::Eq, json!("eu1"))
		.filter("timestamp", FilterOp::Ge, json!(20))
		.filter("timestamp", FilterOp::Le, json!(30))
		.order_by("timestamp");
	let page = store.run_query(&query, None).await.unwrap();
	let stamps: Vec<i64> =
		page.docs.iter().map(|doc| doc.fields["timestamp"].as_i64().unwrap()).collect();

	assert_eq!(stamps, vec![20, 30]);
}

#[tokio::test]
async fn pagination_walks_every_doc_exactly_once() {
	let store = MemoryStore::new();

	for id in 0..7 {
		let path = DocPath::parse(&format!("players/p{id}/scans/s")).unwrap();

		store.set_merge(&path, fields(json!({ "timestamp": id }))).await.unwrap();
	}

	let query = Query::collection_group("scans").order_by("timestamp").page_size(3);
	let mut seen = Vec::new();
	let mut cursor = None;

	loop {
		let page = store.run_query(&query, cursor.take()).await.unwrap();

		for doc in &page.docs {
			seen.push(doc.path.to_string());
		}

		match page.cursor {
			Some(next) => cursor = Some(next),
			None => break,
		}
	}

	assert_eq!(seen.len(), 7);

	let mut unique = seen.clone();

	unique.sort();
	unique.dedup();

	assert_eq!(unique.len(), 7);
}

#[tokio::test]
async fn docs_missing_the_order_field_are_excluded() {
	let store = MemoryStore::new();

	store
		.set_merge(
			&DocPath::parse("players/1/scans/s").unwrap(),
			fields(json!({ "timestamp": 5 })),
		)
		.await
		.unwrap();
	store
		.set_merge(&DocPath::parse("players/2/scans/s").unwrap(), fields(json!({ "other": 1 })))
		.await
		.unwrap();

	let query = Query::collection_group("scans").order_by("timestamp");
	let page = store.run_query(&query, None).await.unwrap();

	assert_eq!(page.docs.len(), 1);
}
