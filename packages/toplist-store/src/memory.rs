use std::{
	cmp::Ordering,
	collections::BTreeMap,
	sync::{Arc, Mutex},
};

use serde_json::{Map, Value, json};
use time::OffsetDateTime;

use crate::{
	Cursor, DocPath, Document, FieldPath, Query, QueryPage, QueryScope, Result, Transform,
	UpdateSpec,
};

/// In-memory [`DocumentStore`](crate::DocumentStore) with the exact merge,
/// transform, and pagination semantics of the real substrate. Backs the test
/// suites and local dry runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
	inner: Arc<Mutex<BTreeMap<String, Document>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Document>> {
		self.inner.lock().unwrap_or_else(|err| err.into_inner())
	}
}

impl crate::DocumentStore for MemoryStore {
	async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
		Ok(self.lock().get(&path.to_string()).cloned())
	}

	async fn set_merge(&self, path: &DocPath, fields: Map<String, Value>) -> Result<()> {
		let now = now_ms();
		let mut docs = self.lock();
		let doc = docs
			.entry(path.to_string())
			.or_insert_with(|| Document::new(path.clone(), Map::new()));

		deep_merge(&mut doc.fields, fields);

		doc.update_time_ms = now;

		Ok(())
	}

	async fn update(&self, path: &DocPath, spec: UpdateSpec) -> Result<()> {
		let now = now_ms();
		let mut docs = self.lock();
		let doc = docs
			.entry(path.to_string())
			.or_insert_with(|| Document::new(path.clone(), Map::new()));

		for (field_path, value) in &spec.set {
			set_at(&mut doc.fields, field_path, value.clone());
		}
		for field_path in &spec.delete {
			delete_at(&mut doc.fields, field_path);
		}
		for (field_path, transform) in &spec.transforms {
			let value = match transform {
				Transform::Increment(by) => {
					let current = read_at(&doc.fields, field_path)
						.and_then(Value::as_f64)
						.unwrap_or(0.0);
					number(current + by)
				},
				Transform::ServerTimestamp => json!(now),
			};

			set_at(&mut doc.fields, field_path, value);
		}

		doc.update_time_ms = now;

		Ok(())
	}

	async fn delete(&self, path: &DocPath) -> Result<()> {
		self.lock().remove(&path.to_string());

		Ok(())
	}

	async fn run_query(&self, query: &Query, cursor: Option<Cursor>) -> Result<QueryPage> {
		let docs = self.lock();
		let mut matched: Vec<&Document> = docs
			.values()
			.filter(|doc| in_scope(doc, &query.scope))
			.filter(|doc| query.filters.iter().all(|filter| passes(doc, filter)))
			.filter(|doc| {
				query
					.order_by
					.as_ref()
					.is_none_or(|field| doc.fields.get(field.as_str()).is_some())
			})
			.collect();

		matched.sort_by(|a, b| cmp_position(query, a, b));

		let after = |doc: &Document| match &cursor {
			None => true,
			Some(cursor) => cmp_to_cursor(query, doc, cursor) == Ordering::Greater,
		};
		let page: Vec<Document> =
			matched.into_iter().filter(|doc| after(doc)).take(query.page_size).cloned().collect();
		let cursor = if page.len() == query.page_size {
			page.last().map(|doc| Cursor {
				order_value: query
					.order_by
					.as_ref()
					.and_then(|field| doc.fields.get(field.as_str()).cloned()),
				path: doc.path.to_string(),
			})
		} else {
			None
		};

		Ok(QueryPage { docs: page, cursor })
	}
}

fn now_ms() -> i64 {
	(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn number(value: f64) -> Value {
	if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
		json!(value as i64)
	} else {
		json!(value)
	}
}

fn deep_merge(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
	for (key, value) in incoming {
		match (target.get_mut(&key), value) {
			(Some(Value::Object(existing)), Value::Object(nested)) => {
				deep_merge(existing, nested);
			},
			(_, value) => {
				target.insert(key, value);
			},
		}
	}
}

fn set_at(fields: &mut Map<String, Value>, path: &FieldPath, value: Value) {
	let segments = path.segments();
	let mut current = fields;

	for segment in &segments[..segments.len() - 1] {
		let entry = current
			.entry(segment.clone())
			.or_insert_with(|| Value::Object(Map::new()));

		if !entry.is_object() {
			*entry = Value::Object(Map::new());
		}

		current = match entry {
			Value::Object(map) => map,
			_ => unreachable!(),
		};
	}

	if let Some(last) = segments.last() {
		current.insert(last.clone(), value);
	}
}

fn delete_at(fields: &mut Map<String, Value>, path: &FieldPath) {
	let segments = path.segments();
	let mut current = fields;

	for segment in &segments[..segments.len() - 1] {
		current = match current.get_mut(segment) {
			Some(Value::Object(map)) => map,
			_ => return,
		};
	}

	if let Some(last) = segments.last() {
		current.remove(last);
	}
}

fn read_at<'a>(fields: &'a Map<String, Value>, path: &FieldPath) -> Option<&'a Value> {
	let mut current: Option<&Value> = None;

	for segment in path.segments() {
		current = match current {
			None => fields.get(segment),
			Some(Value::Object(map)) => map.get(segment),
			Some(_) => return None,
		};
		current?;
	}

	current
}

fn in_scope(doc: &Document, scope: &QueryScope) -> bool {
	match scope {
		QueryScope::Collection { parent, collection } =>
			doc.path.collection_id() == collection
				&& doc.path.parent_doc().as_ref() == Some(parent),
		QueryScope::CollectionGroup { collection } => doc.path.collection_id() == collection,
	}
}

fn passes(doc: &Document, filter: &crate::FieldFilter) -> bool {
	let Some(value) = doc.fields.get(filter.field.as_str()) else {
		return false;
	};
	let Some(ordering) = cmp_value(value, &filter.value) else {
		return false;
	};

	match filter.op {
		crate::FilterOp::Eq => ordering == Ordering::Equal,
		crate::FilterOp::Gt => ordering == Ordering::Greater,
		crate::FilterOp::Ge => ordering != Ordering::Less,
		crate::FilterOp::Lt => ordering == Ordering::Less,
		crate::FilterOp::Le => ordering != Ordering::Greater,
	}
}

/// Compares two field values when they are of a comparable kind.
fn cmp_value(a: &Value, b: &Value) -> Option<Ordering> {
	match (a, b) {
		(Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		(Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
		_ => None,
	}
}

fn position<'a>(query: &Query, doc: &'a Document) -> (Option<&'a Value>, String) {
	let order_value =
		query.order_by.as_ref().and_then(|field| doc.fields.get(field.as_str()));

	(order_value, doc.path.to_string())
}

fn cmp_position(query: &Query, a: &Document, b: &Document) -> Ordering {
	let (value_a, path_a) = position(query, a);
	let (value_b, path_b) = position(query, b);
	let by_value = match (value_a, value_b) {
		(Some(a), Some(b)) => cmp_value(a, b).unwrap_or(Ordering::Equal),
		_ => Ordering::Equal,
	};

	by_value.then_with(|| path_a.cmp(&path_b))
}

fn cmp_to_cursor(query: &Query, doc: &Document, cursor: &Cursor) -> Ordering {
	let (value, path) = position(query, doc);
	let by_value = match (value, cursor.order_value.as_ref()) {
		(Some(a), Some(b)) => cmp_value(a, b).unwrap_or(Ordering::Equal),
		_ => Ordering::Equal,
	};

	by_value.then_with(|| path.cmp(&cursor.path))
}
