//! Bounded purge of legacy entity namespaces. Discovery and deletion are both
//! capped so a runaway run can never empty the store; hitting a budget is a
//! normal, reported outcome.

use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use toplist_store::{DocPath, DocumentStore, Query, with_backoff};

use crate::{Result, ToplistService, paths};

const DISCOVERY_PAGE_SIZE: usize = 300;
const DELETE_PAGE_SIZE: usize = 100;
/// Entity-count interval between progress log lines during deletion.
const PROGRESS_EVERY: u64 = 25;

#[derive(Clone, Debug, Default)]
pub struct PurgeRequest {
	/// Deletes only happen under this flag; the default run is a dry run that
	/// reports the discovered set.
	pub execute: bool,
	/// Optional cap on discovered namespaces, on top of the configured one.
	pub limit: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
	/// Legacy entity ids found during discovery, in id order.
	pub discovered: Vec<String>,
	pub executed: bool,
	/// Entities whose whole tree was removed.
	pub entities_deleted: u64,
	pub docs_deleted: u64,
	/// Deletes that still failed after the bounded retries; logged and
	/// skipped, never fatal.
	pub failed_deletes: u64,
	/// Deletion stopped because the next batch would exceed the delete
	/// budget. Committed deletes stay committed.
	pub aborted_on_budget: bool,
}

impl<S: DocumentStore> ToplistService<S> {
	pub async fn run_purge(&self, request: &PurgeRequest) -> Result<PurgeReport> {
		let cap = request
			.limit
			.map_or(self.cfg().purge.max_namespaces, |limit| {
				limit.min(self.cfg().purge.max_namespaces)
			});
		let discovered = self.discover_legacy_namespaces(cap).await?;
		let mut report = PurgeReport {
			discovered: discovered.iter().cloned().collect(),
			executed: request.execute,
			..Default::default()
		};

		tracing::info!(
			discovered = report.discovered.len(),
			execute = request.execute,
			"Legacy namespace discovery complete."
		);

		if !request.execute {
			return Ok(report);
		}

		let budget = self.cfg().purge.max_total_deletes;

		for entity_id in &discovered {
			if !self.delete_namespace(entity_id, budget, &mut report).await? {
				report.aborted_on_budget = true;

				tracing::warn!(
					entity_id = %entity_id,
					docs_deleted = report.docs_deleted,
					budget,
					"Delete budget reached. Aborting purge."
				);

				break;
			}

			report.entities_deleted += 1;

			if report.entities_deleted % PROGRESS_EVERY == 0 {
				tracing::info!(
					entities_deleted = report.entities_deleted,
					docs_deleted = report.docs_deleted,
					"Purge in progress."
				);
			}
		}

		tracing::info!(
			entities_deleted = report.entities_deleted,
			docs_deleted = report.docs_deleted,
			failed_deletes = report.failed_deletes,
			aborted_on_budget = report.aborted_on_budget,
			"Purge complete."
		);

		Ok(report)
	}

	/// Walks the cross-entity scan stream in (entity id, document id) order
	/// and collects entity ids that are purely numeric, the legacy id scheme.
	/// Stops paging as soon as the cap is met.
	async fn discover_legacy_namespaces(&self, cap: usize) -> Result<BTreeSet<String>> {
		let legacy_id = Regex::new(r"^\d+$").ok();
		let query = Query::collection_group(paths::SCANS).page_size(DISCOVERY_PAGE_SIZE);
		let mut found = BTreeSet::new();
		let mut cursor = None;

		loop {
			let page = self.store().run_query(&query, cursor.take()).await?;

			for doc in &page.docs {
				if found.len() >= cap {
					return Ok(found);
				}
				if !doc.path.matches_shape(&paths::SCAN_SHAPE) {
					continue;
				}

				let entity_id = &doc.path.segments()[1];

				if legacy_id.as_ref().is_some_and(|re| re.is_match(entity_id)) {
					found.insert(entity_id.clone());
				}
			}

			match page.cursor {
				Some(next) if found.len() < cap => cursor = Some(next),
				_ => break,
			}
		}

		Ok(found)
	}

	/// Removes one entity's tree: the named sub-collections page by page, then
	/// the latest document, then the root. Returns `false` without touching
	/// anything further once the next batch would exceed the budget.
	async fn delete_namespace(
		&self,
		entity_id: &str,
		budget: u64,
		report: &mut PurgeReport,
	) -> Result<bool> {
		let root = paths::player_root(entity_id);

		for collection in paths::PURGED_SUBCOLLECTIONS {
			let query = Query::collection(root.clone(), collection).page_size(DELETE_PAGE_SIZE);

			loop {
				let page = self.store().run_query(&query, None).await?;

				if page.docs.is_empty() {
					break;
				}
				if attempted(report) + page.docs.len() as u64 > budget {
					return Ok(false);
				}

				for doc in &page.docs {
					self.delete_one(&doc.path, report).await;
				}

				if page.cursor.is_none() {
					break;
				}
			}
		}

		if attempted(report) + 2 > budget {
			return Ok(false);
		}

		self.delete_one(&paths::latest_doc(entity_id), report).await;
		self.delete_one(&root, report).await;

		Ok(true)
	}

	async fn delete_one(&self, path: &DocPath, report: &mut PurgeReport) {
		match with_backoff(|| self.store().delete(path)).await {
			Ok(()) => report.docs_deleted += 1,
			Err(err) => {
				tracing::error!(
					error = %err,
					path = %path,
					"Delete failed after retries. Continuing."
				);

				report.failed_deletes += 1;
			},
		}
	}
}

/// Deletes counted against the budget, successful or not.
fn attempted(report: &PurgeReport) -> u64 {
	report.docs_deleted + report.failed_deletes
}
