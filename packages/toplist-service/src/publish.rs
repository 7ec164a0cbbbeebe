//! Change-triggered publisher for per-partition public snapshots.
//!
//! Fires on every write to a partition's latest-candidate document,
//! at-least-once and possibly out of order. A cheap content signature
//! suppresses redundant publishes; a pending-change counter on the candidate
//! document gates how often the public snapshot is actually rewritten. The
//! counter lives in the store and is only ever moved through atomic
//! field-level updates, since deliveries for one partition can overlap.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use toplist_store::{Document, DocumentStore, FieldPath, Transform, UpdateSpec};

use crate::{Result, ToplistService, paths};

/// Literal dotted keys of the legacy flat encoding. Candidates written by old
/// deployments carry these instead of a nested `meta` map; both may coexist
/// transiently and the nested form wins.
const LEGACY_PENDING_KEY: &str = "meta.pendingSincePublish";
const LEGACY_PUBLISHED_KEY: &str = "meta.lastPublishedAt";

const NESTED_PENDING: &str = "meta.pendingSincePublish";
const NESTED_PUBLISHED: &str = "meta.lastPublishedAt";

/// One upstream write to a latest-candidate document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateWriteEvent {
	pub before: Option<Document>,
	pub after: Option<Document>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PublishOutcome {
	/// The candidate document was deleted; nothing to do.
	Deleted,
	/// Neither content change nor legacy cleanup; the common case for writes
	/// touching unrelated fields.
	Unchanged,
	/// Content changed below the threshold; the pending counter moved.
	CounterBumped { pending: i64 },
	/// Only the legacy flat keys needed reconciling.
	MigratedOnly,
	/// The public snapshot was rewritten and the counter carried over.
	Published { server: String, pending_after: i64 },
	/// No partition code in the document id or `server` field; logged and
	/// swallowed, since the trigger has no caller to fail.
	SkippedUnresolvableServer,
}

impl<S: DocumentStore> ToplistService<S> {
	pub async fn handle_candidate_write(
		&self,
		event: &CandidateWriteEvent,
	) -> Result<PublishOutcome> {
		let Some(after) = event.after.as_ref() else {
			return Ok(PublishOutcome::Deleted);
		};
		let new_signature = content_signature(&after.fields);
		let old_signature = event.before.as_ref().map(|doc| content_signature(&doc.fields));
		let content_changed = match &old_signature {
			None => true,
			Some(signature) => signature.is_empty() || *signature != new_signature,
		};
		let legacy = detect_legacy(&after.fields);

		if !content_changed && !legacy.any() {
			return Ok(PublishOutcome::Unchanged);
		}

		let pending = resolve_pending(&after.fields);
		let threshold = i64::from(self.cfg().publish.threshold);
		let should_publish =
			content_changed && pending.is_finite() && pending >= threshold as f64;

		if !should_publish {
			return self.bump_and_migrate(after, content_changed, pending, &legacy).await;
		}

		let Some(server) = resolve_server(after) else {
			tracing::warn!(
				path = %after.path,
				"Cannot resolve a partition code for candidate. Skipping publish."
			);

			return Ok(PublishOutcome::SkippedUnresolvableServer);
		};
		let pending_after = (pending as i64) % threshold;

		self.write_public_snapshot(&server, after).await?;
		self.settle_candidate(after, pending_after, &legacy).await?;

		tracing::info!(server = %server, pending_after, "Public toplist snapshot published.");

		Ok(PublishOutcome::Published { server, pending_after })
	}

	/// Below-threshold path: one atomic update that moves the counter (when
	/// content changed) and folds any legacy flat keys into the nested form.
	async fn bump_and_migrate(
		&self,
		after: &Document,
		content_changed: bool,
		pending: f64,
		legacy: &LegacyFields<'_>,
	) -> Result<PublishOutcome> {
		let nested_pending_missing = nested_value(&after.fields, "pendingSincePublish").is_none();
		let mut spec = UpdateSpec::new();

		if content_changed {
			match legacy.pending.and_then(Value::as_f64) {
				Some(value) if nested_pending_missing =>
					spec = spec.set(FieldPath::parse(NESTED_PENDING), number(value + 1.0)),
				_ =>
					spec = spec
						.transform(FieldPath::parse(NESTED_PENDING), Transform::Increment(1.0)),
			}
		} else if let Some(value) = legacy.pending
			&& nested_pending_missing
			&& value.as_f64().is_some()
		{
			spec = spec.set(FieldPath::parse(NESTED_PENDING), value.clone());
		}
		if let Some(value) = legacy.published
			&& nested_value(&after.fields, "lastPublishedAt").is_none()
		{
			spec = spec.set(FieldPath::parse(NESTED_PUBLISHED), value.clone());
		}
		if legacy.pending.is_some() {
			spec = spec.delete(FieldPath::raw(LEGACY_PENDING_KEY));
		}
		if legacy.published.is_some() {
			spec = spec.delete(FieldPath::raw(LEGACY_PUBLISHED_KEY));
		}
		if spec.is_empty() {
			return Ok(PublishOutcome::Unchanged);
		}

		self.store().update(&after.path, spec).await?;

		if content_changed {
			let bumped = if pending.is_finite() { pending as i64 + 1 } else { 1 };

			Ok(PublishOutcome::CounterBumped { pending: bumped })
		} else {
			Ok(PublishOutcome::MigratedOnly)
		}
	}

	async fn write_public_snapshot(&self, server: &str, after: &Document) -> Result<()> {
		let players = after.fields.get("players").cloned().unwrap_or_else(|| json!([]));
		let mut spec = UpdateSpec::new()
			.set(FieldPath::raw("server"), json!(server))
			.set(FieldPath::raw("players"), players)
			.transform(FieldPath::raw("publishedAt"), Transform::ServerTimestamp);

		if let Some(updated_at) = after.fields.get("updatedAt") {
			spec = spec.set(FieldPath::raw("updatedAt"), updated_at.clone());
		}

		self.store().update(&paths::toplist_doc(server), spec).await?;

		Ok(())
	}

	/// Post-publish bookkeeping on the candidate: carry the counter over
	/// modulo the threshold (so no change is lost across the publish
	/// boundary), stamp the publish time, drop any legacy keys.
	async fn settle_candidate(
		&self,
		after: &Document,
		pending_after: i64,
		legacy: &LegacyFields<'_>,
	) -> Result<()> {
		let mut spec = UpdateSpec::new()
			.set(FieldPath::parse(NESTED_PENDING), json!(pending_after))
			.transform(FieldPath::parse(NESTED_PUBLISHED), Transform::ServerTimestamp);

		if legacy.pending.is_some() {
			spec = spec.delete(FieldPath::raw(LEGACY_PENDING_KEY));
		}
		if legacy.published.is_some() {
			spec = spec.delete(FieldPath::raw(LEGACY_PUBLISHED_KEY));
		}

		self.store().update(&after.path, spec).await?;

		Ok(())
	}
}

/// Cheap partial fingerprint of a ranked list: content hash (or update time)
/// plus entry count and first/middle/last entry keys. Deliberately not a full
/// payload hash; interior-only changes can escape detection.
pub fn content_signature(fields: &Map<String, Value>) -> String {
	let basis = fields
		.get("contentHash")
		.and_then(Value::as_str)
		.map(str::to_string)
		.or_else(|| fields.get("updatedAt").map(scalar_string))
		.unwrap_or_default();
	let players: &[Value] =
		fields.get("players").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);

	if basis.is_empty() && players.is_empty() {
		return String::new();
	}

	let first = players.first().map(entry_key).unwrap_or_default();
	let middle = players.get(players.len() / 2).map(entry_key).unwrap_or_default();
	let last = players.last().map(entry_key).unwrap_or_default();

	format!("{basis}|{}|{first}|{middle}|{last}", players.len())
}

fn entry_key(entry: &Value) -> String {
	entry
		.get("entityId")
		.or_else(|| entry.get("id"))
		.map(scalar_string)
		.unwrap_or_default()
}

fn scalar_string(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Number(number) => number.to_string(),
		other => other.to_string(),
	}
}

fn number(value: f64) -> Value {
	if value.fract() == 0.0 { json!(value as i64) } else { json!(value) }
}

struct LegacyFields<'a> {
	pending: Option<&'a Value>,
	published: Option<&'a Value>,
}

impl LegacyFields<'_> {
	fn any(&self) -> bool {
		self.pending.is_some() || self.published.is_some()
	}
}

fn detect_legacy(fields: &Map<String, Value>) -> LegacyFields<'_> {
	LegacyFields {
		pending: fields.get(LEGACY_PENDING_KEY),
		published: fields.get(LEGACY_PUBLISHED_KEY),
	}
}

fn nested_value<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
	fields.get("meta").and_then(|meta| meta.get(key))
}

/// Nested counter wins; the legacy flat key is the fallback; anything else is
/// "no counter yet", which never satisfies the publish threshold.
fn resolve_pending(fields: &Map<String, Value>) -> f64 {
	if let Some(value) = nested_value(fields, "pendingSincePublish").and_then(Value::as_f64) {
		return value;
	}
	if let Some(value) = fields.get(LEGACY_PENDING_KEY).and_then(Value::as_f64) {
		return value;
	}

	f64::NAN
}

/// Partition code from the candidate id (`snapshot_<code>_player_derived`),
/// falling back to the document's `server` field.
fn resolve_server(doc: &Document) -> Option<String> {
	if let Ok(re) = Regex::new(r"^snapshot_(.+)_player_derived$")
		&& let Some(caps) = re.captures(doc.path.id())
	{
		return Some(caps[1].to_uppercase());
	}

	doc.fields
		.get("server")
		.and_then(Value::as_str)
		.map(|server| server.trim().to_uppercase())
		.filter(|server| !server.is_empty())
}
