use std::sync::{
	Arc,
	atomic::{AtomicI64, Ordering},
};

use serde_json::{Map, Value, json};

use toplist_store::{
	Cursor, DocPath, Document, DocumentStore, Error, MemoryStore, Query, QueryPage, Result,
	UpdateSpec,
};

/// A player scan fixture with sensible defaults; override fields as needed.
#[derive(Clone, Debug)]
pub struct PlayerFixture {
	pub id: String,
	pub name: String,
	pub class_name: String,
	pub server: String,
	pub level: i64,
	pub strength: i64,
	pub dexterity: i64,
	pub intelligence: i64,
	pub constitution: i64,
	pub luck: i64,
	/// Capture time in epoch seconds.
	pub timestamp: i64,
	/// Ingestion write time in epoch milliseconds.
	pub last_updated_at: i64,
}

impl Default for PlayerFixture {
	fn default() -> Self {
		Self {
			id: "w1_1".to_string(),
			name: "Testling".to_string(),
			class_name: "Warrior".to_string(),
			server: "EU 1".to_string(),
			level: 100,
			strength: 50,
			dexterity: 30,
			intelligence: 20,
			constitution: 40,
			luck: 10,
			timestamp: 1_700_000_000,
			last_updated_at: 1_700_000_000_000,
		}
	}
}

impl PlayerFixture {
	pub fn named(id: &str, name: &str) -> Self {
		Self { id: id.to_string(), name: name.to_string(), ..Default::default() }
	}

	pub fn fields(&self) -> Map<String, Value> {
		let value = json!({
			"id": self.id,
			"name": self.name,
			"className": self.class_name,
			"server": self.server,
			"level": self.level,
			"values": {
				"Base Strength": self.strength,
				"Base Dexterity": self.dexterity,
				"Base Intelligence": self.intelligence,
				"Base Constitution": self.constitution,
				"Base Luck": self.luck,
			},
			"guild": { "id": "g1", "name": "Fixture Guild" },
			"timestamp": self.timestamp,
			"lastUpdatedAt": self.last_updated_at,
		});

		match value {
			Value::Object(map) => map,
			_ => unreachable!(),
		}
	}

	pub fn latest_path(&self) -> DocPath {
		DocPath::doc(&["players", &self.id, "latest", "current"])
	}

	pub fn scan_path(&self, scan_id: &str) -> DocPath {
		DocPath::doc(&["players", &self.id, "scans", scan_id])
	}

	pub async fn seed_latest(&self, store: &MemoryStore) {
		store.set_merge(&self.latest_path(), self.fields()).await.expect("seed latest doc");
	}

	pub async fn seed_scan(&self, store: &MemoryStore, scan_id: &str) {
		store.set_merge(&self.scan_path(scan_id), self.fields()).await.expect("seed scan doc");
	}
}

/// Builds candidate-document fields for publish-trigger tests. Entry keys are
/// `p0`, `p1`, ... so signature assertions stay readable.
pub fn candidate_fields(player_count: usize, updated_at: i64) -> Map<String, Value> {
	let players: Vec<Value> = (0..player_count)
		.map(|index| json!({ "entityId": format!("p{index}"), "sum": 100 - index as i64 }))
		.collect();
	let value = json!({ "players": players, "updatedAt": updated_at });

	match value {
		Value::Object(map) => map,
		_ => unreachable!(),
	}
}

/// Store wrapper that starts failing queries after a fixed number of pages,
/// for exercising mid-stream abort paths.
#[derive(Clone)]
pub struct FlakyStore {
	inner: MemoryStore,
	pages_left: Arc<AtomicI64>,
}

impl FlakyStore {
	pub fn failing_after(inner: MemoryStore, pages: i64) -> Self {
		Self { inner, pages_left: Arc::new(AtomicI64::new(pages)) }
	}
}

impl DocumentStore for FlakyStore {
	async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
		self.inner.get(path).await
	}

	async fn set_merge(&self, path: &DocPath, fields: Map<String, Value>) -> Result<()> {
		self.inner.set_merge(path, fields).await
	}

	async fn update(&self, path: &DocPath, spec: UpdateSpec) -> Result<()> {
		self.inner.update(path, spec).await
	}

	async fn delete(&self, path: &DocPath) -> Result<()> {
		self.inner.delete(path).await
	}

	async fn run_query(&self, query: &Query, cursor: Option<Cursor>) -> Result<QueryPage> {
		if self.pages_left.fetch_sub(1, Ordering::SeqCst) <= 0 {
			return Err(Error::Unavailable { message: "injected stream failure".to_string() });
		}

		self.inner.run_query(query, cursor).await
	}
}
