//! Incremental derived-cache updater: re-derives only entities whose latest
//! document changed since the persisted watermark.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value, json};

use toplist_domain::RawRecord;
use toplist_store::{DocumentStore, FilterOp, Query};

use crate::{Result, ToplistService, now_ms, paths};

const PAGE_SIZE: usize = 300;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UpdaterReport {
	pub processed: u64,
	/// Documents the broad `latest` query matched outside the entity tree.
	pub skipped_shape: u64,
	/// Latest documents whose fields did not deserialize into a raw record.
	pub skipped_invalid: u64,
	/// Derivations per ranking scope in this run.
	pub scopes: BTreeMap<String, u64>,
	/// The watermark this run committed.
	pub watermark_ms: i64,
}

impl<S: DocumentStore> ToplistService<S> {
	/// One run-to-completion pass. Everything is idempotent: the derived doc
	/// is a pure function of the raw record, so reprocessing a window after a
	/// failed run converges to the same cache. The watermark only advances
	/// when the whole stream succeeded.
	pub async fn run_updater_once(&self) -> Result<UpdaterReport> {
		let watermark = self.read_watermark().await?;
		let run_start_ms = now_ms();
		let query = Query::collection_group(paths::LATEST_COLLECTION)
			.filter("lastUpdatedAt", FilterOp::Gt, json!(watermark))
			.order_by("lastUpdatedAt")
			.page_size(PAGE_SIZE);
		let mut report = UpdaterReport { watermark_ms: run_start_ms, ..Default::default() };
		let mut cursor = None;

		loop {
			let page = self.store().run_query(&query, cursor.take()).await?;

			for doc in &page.docs {
				if !doc.path.matches_shape(&paths::LATEST_SHAPE) {
					report.skipped_shape += 1;

					continue;
				}

				let player_id = doc.path.segments()[1].clone();
				let mut raw: RawRecord =
					match serde_json::from_value(Value::Object(doc.fields.clone())) {
						Ok(raw) => raw,
						Err(err) => {
							tracing::warn!(
								error = %err,
								path = %doc.path,
								"Latest document did not deserialize. Skipping."
							);

							report.skipped_invalid += 1;

							continue;
						},
					};

				if raw.id.is_empty() {
					raw.id = player_id.clone();
				}

				let derived = toplist_domain::derive(&raw);
				let fields = match serde_json::to_value(&derived)? {
					Value::Object(map) => map,
					_ => Map::new(),
				};

				self.store().set_merge(&paths::derived_doc(&player_id), fields).await?;

				*report.scopes.entry(derived.partition_key).or_insert(0) += 1;
				report.processed += 1;
			}

			match page.cursor {
				Some(next) => cursor = Some(next),
				None => break,
			}
		}

		self.commit_run(run_start_ms, &report.scopes).await?;

		tracing::info!(
			processed = report.processed,
			skipped_shape = report.skipped_shape,
			skipped_invalid = report.skipped_invalid,
			scopes = report.scopes.len(),
			watermark_ms = report.watermark_ms,
			"Derived cache updater run complete."
		);

		Ok(report)
	}
}
