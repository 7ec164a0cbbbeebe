//! Access to the singleton control document holding the global watermark and
//! per-scope change counters.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use toplist_store::{DocumentStore, FieldPath, Transform, UpdateSpec};

use crate::{Result, ToplistService, paths};

impl<S: DocumentStore> ToplistService<S> {
	/// Timestamp (ms) up to which incremental derivation has been applied.
	/// A missing control document means nothing was processed yet.
	pub async fn read_watermark(&self) -> Result<i64> {
		let doc = self.store().get(&paths::meta_doc()).await?;
		let watermark = doc
			.and_then(|doc| doc.fields.get("lastComputedAt").and_then(Value::as_i64))
			.unwrap_or(0);

		Ok(watermark)
	}

	/// Advances the watermark and bumps the touched scopes' change counters in
	/// one atomic update. Counter bumps are increments, not sets, so they
	/// compose with the out-of-band ranking rebuild resetting them.
	pub(crate) async fn commit_run(
		&self,
		run_start_ms: i64,
		touched: &BTreeMap<String, u64>,
	) -> Result<()> {
		let mut spec =
			UpdateSpec::new().set(FieldPath::parse("lastComputedAt"), json!(run_start_ms));

		for (scope, changes) in touched {
			spec = spec
				.transform(
					FieldPath::from_segments(vec![
						"scopeChange".to_string(),
						scope.clone(),
						"changedSinceLastRebuild".to_string(),
					]),
					Transform::Increment(*changes as f64),
				)
				.set(
					FieldPath::from_segments(vec![
						"scopeChange".to_string(),
						scope.clone(),
						"lastChangeAtMs".to_string(),
					]),
					json!(run_start_ms),
				);
		}

		self.store().update(&paths::meta_doc(), spec).await?;

		Ok(())
	}
}
