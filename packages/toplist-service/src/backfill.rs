//! Operator-invoked historical snapshot builder: scans a time window of raw
//! captures for one partition, keeps the freshest capture per entity, ranks
//! the derived records and writes one size-bounded snapshot document.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use time::OffsetDateTime;

use toplist_domain::{DerivedRecord, RawRecord, coerce_number, normalize_server};
use toplist_store::{DocumentStore, FieldPath, FilterOp, Query, Transform, UpdateSpec};

use crate::{Error, MAX_SNAPSHOT_BYTES, Result, ToplistService, now_ms, paths};

const PAGE_SIZE: usize = 300;

#[derive(Clone, Debug)]
pub struct BackfillRequest {
	/// Partition code, e.g. `EU1` or `F3`.
	pub server: String,
	/// Inclusive window bounds in epoch seconds.
	pub from_s: i64,
	pub to_s: i64,
	/// Snapshot label (`YYYY-MM`); defaults to the calendar month preceding
	/// `from_s`.
	pub label: Option<String>,
	pub top_n: usize,
	pub dry_run: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
	pub label: String,
	/// Path of the historical snapshot document.
	pub target: String,
	/// Scan documents the window query returned.
	pub scanned: u64,
	/// Matches outside the entity tree, discarded by path shape.
	pub skipped_shape: u64,
	/// Scans with no usable entity identifier.
	pub skipped_missing_id: u64,
	/// Scans whose capture timestamp did not parse to a positive number.
	pub skipped_timestamp: u64,
	/// Scans on a different partition than the requested one.
	pub skipped_partition: u64,
	pub unique_entities: u64,
	pub players_written: u64,
	pub bytes: u64,
	pub dry_run: bool,
}

impl<S: DocumentStore> ToplistService<S> {
	pub async fn run_backfill(&self, request: &BackfillRequest) -> Result<BackfillReport> {
		let (code, label) = validate(request)?;
		let partition_key = normalize_server(&code).key;
		let target = paths::historical_doc(&code, &label);
		let mut report = BackfillReport {
			label,
			target: target.to_string(),
			dry_run: request.dry_run,
			..Default::default()
		};

		// The range filter needs a composite index on the store side; its
		// absence surfaces as an actionable MissingIndex error, not "no data".
		let query = Query::collection_group(paths::SCANS)
			.filter("timestamp", FilterOp::Ge, json!(request.from_s))
			.filter("timestamp", FilterOp::Le, json!(request.to_s))
			.order_by("timestamp")
			.page_size(PAGE_SIZE);
		let mut freshest: BTreeMap<String, (i64, RawRecord)> = BTreeMap::new();
		let mut cursor = None;

		loop {
			let page = self.store().run_query(&query, cursor.take()).await?;

			for doc in &page.docs {
				report.scanned += 1;

				if !doc.path.matches_shape(&paths::SCAN_SHAPE) {
					report.skipped_shape += 1;

					continue;
				}

				let raw: RawRecord =
					match serde_json::from_value(Value::Object(doc.fields.clone())) {
						Ok(raw) => raw,
						Err(err) => {
							tracing::warn!(
								error = %err,
								path = %doc.path,
								"Scan document did not deserialize. Skipping."
							);

							report.skipped_missing_id += 1;

							continue;
						},
					};
				let entity_id = if raw.id.is_empty() {
					doc.path.segments()[1].clone()
				} else {
					raw.id.clone()
				};

				if entity_id.is_empty() {
					report.skipped_missing_id += 1;

					continue;
				}

				let timestamp = coerce_number(&raw.timestamp) as i64;

				if timestamp <= 0 {
					report.skipped_timestamp += 1;

					continue;
				}
				if normalize_server(&raw.server).key != partition_key {
					report.skipped_partition += 1;

					continue;
				}

				// Last capture in the window wins per entity.
				match freshest.get(&entity_id) {
					Some((kept, _)) if *kept >= timestamp => {},
					_ => {
						let mut raw = raw;

						raw.id = entity_id.clone();

						freshest.insert(entity_id, (timestamp, raw));
					},
				}
			}

			match page.cursor {
				Some(next) => cursor = Some(next),
				None => break,
			}
		}

		report.unique_entities = freshest.len() as u64;

		let mut players: Vec<DerivedRecord> =
			freshest.values().map(|(_, raw)| toplist_domain::derive(raw)).collect();

		players.sort_by(|a, b| {
			b.sum
				.partial_cmp(&a.sum)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| a.entity_id.cmp(&b.entity_id))
		});
		players.truncate(request.top_n);

		report.players_written = players.len() as u64;

		let fields = snapshot_fields(&code, &report.label, request, &players)?;
		let bytes = serde_json::to_string(&Value::Object(fields.clone()))?.len();

		report.bytes = bytes as u64;

		if bytes > MAX_SNAPSHOT_BYTES {
			return Err(Error::SnapshotTooLarge { bytes, budget: MAX_SNAPSHOT_BYTES });
		}

		if !request.dry_run {
			let mut spec = UpdateSpec::new()
				.transform(FieldPath::raw("publishedAt"), Transform::ServerTimestamp);

			for (key, value) in fields {
				spec = spec.set(FieldPath::raw(&key), value);
			}

			self.store().update(&target, spec).await?;
		}

		tracing::info!(
			target = %report.target,
			scanned = report.scanned,
			unique_entities = report.unique_entities,
			players_written = report.players_written,
			bytes = report.bytes,
			dry_run = report.dry_run,
			"Backfill complete."
		);

		Ok(report)
	}
}

fn snapshot_fields(
	code: &str,
	label: &str,
	request: &BackfillRequest,
	players: &[DerivedRecord],
) -> Result<Map<String, Value>> {
	let mut fields = Map::new();

	fields.insert("server".to_string(), json!(code));
	fields.insert("label".to_string(), json!(label));
	fields.insert("windowFromS".to_string(), json!(request.from_s));
	fields.insert("windowToS".to_string(), json!(request.to_s));
	fields.insert("updatedAt".to_string(), json!(now_ms()));
	fields.insert("players".to_string(), serde_json::to_value(players)?);

	Ok(fields)
}

fn validate(request: &BackfillRequest) -> Result<(String, String)> {
	let code = request.server.trim().to_uppercase();

	if code.is_empty() {
		return Err(Error::Validation { message: "server must not be empty".to_string() });
	}
	if code != "ALL" && normalize_server(&code).key == "all" {
		return Err(Error::Validation { message: format!("unrecognized server `{code}`") });
	}
	if request.from_s <= 0 || request.to_s <= 0 {
		return Err(Error::Validation {
			message: "window bounds must be positive epoch seconds".to_string(),
		});
	}
	if request.from_s > request.to_s {
		return Err(Error::Validation {
			message: "window start must not be after window end".to_string(),
		});
	}
	if request.top_n == 0 {
		return Err(Error::Validation { message: "top_n must be at least 1".to_string() });
	}

	let label = match &request.label {
		Some(label) => {
			let well_formed = Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$")
				.map(|re| re.is_match(label))
				.unwrap_or(false);

			if !well_formed {
				return Err(Error::Validation {
					message: format!("label `{label}` is not of the form YYYY-MM"),
				});
			}

			label.clone()
		},
		None => default_label(request.from_s)?,
	};

	Ok((code, label))
}

/// The calendar month preceding the window start, as `YYYY-MM`.
fn default_label(from_s: i64) -> Result<String> {
	let from = OffsetDateTime::from_unix_timestamp(from_s).map_err(|_| Error::Validation {
		message: format!("window start {from_s} is not a valid epoch timestamp"),
	})?;
	let (year, month) = match u8::from(from.month()) {
		1 => (from.year() - 1, 12),
		month => (from.year(), month - 1),
	};

	Ok(format!("{year:04}-{month:02}"))
}
