pub mod backfill;
pub mod meta;
pub mod paths;
pub mod publish;
pub mod purge;
pub mod updater;

mod error;

pub use backfill::{BackfillReport, BackfillRequest};
pub use error::Error;
pub use publish::{CandidateWriteEvent, PublishOutcome};
pub use purge::{PurgeReport, PurgeRequest};
pub use updater::UpdaterReport;

pub type Result<T, E = Error> = std::result::Result<T, E>;

use time::OffsetDateTime;

use toplist_store::DocumentStore;

/// Serialized size ceiling for any public or historical snapshot document.
pub const MAX_SNAPSHOT_BYTES: usize = 1_000_000;

/// All toplist operations against one document store. The store type is
/// generic so the suites run against the in-memory store and the binaries
/// against the HTTP one.
#[derive(Clone)]
pub struct ToplistService<S> {
	store: S,
	cfg: toplist_config::Config,
}

impl<S: DocumentStore> ToplistService<S> {
	pub fn new(cfg: toplist_config::Config, store: S) -> Self {
		Self { store, cfg }
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	pub fn cfg(&self) -> &toplist_config::Config {
		&self.cfg
	}
}

pub(crate) fn now_ms() -> i64 {
	(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
