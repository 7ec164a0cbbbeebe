mod document;
mod error;
mod http;
mod memory;
mod query;
mod retry;
mod write;

pub use document::{DocPath, Document, FieldPath};
pub use error::Error;
pub use http::{HttpStore, TOKEN_ENV};
pub use memory::MemoryStore;
pub use query::{Cursor, FieldFilter, FilterOp, Query, QueryPage, QueryScope};
pub use retry::{backoff_for_attempt, with_backoff};
pub use write::{Transform, UpdateSpec};

pub type Result<T, E = Error> = std::result::Result<T, E>;

use std::future::Future;

use serde_json::{Map, Value};

/// Keyed, queryable, paginated document persistence. Writes are atomic per
/// document: `update` applies its sets, deletes, and transforms as one
/// server-side merge, never as an application-level read-modify-write.
pub trait DocumentStore: Send + Sync {
	fn get(&self, path: &DocPath) -> impl Future<Output = Result<Option<Document>>> + Send;

	/// Deep-merges `fields` into the document, creating it if absent. Fields
	/// not named keep their stored value.
	fn set_merge(
		&self,
		path: &DocPath,
		fields: Map<String, Value>,
	) -> impl Future<Output = Result<()>> + Send;

	/// Applies an [`UpdateSpec`] atomically, creating the document if absent.
	fn update(&self, path: &DocPath, spec: UpdateSpec) -> impl Future<Output = Result<()>> + Send;

	/// Deletes the document. Deleting a missing document is not an error.
	fn delete(&self, path: &DocPath) -> impl Future<Output = Result<()>> + Send;

	/// Returns one page of results. Pass the previous page's cursor to resume;
	/// a `None` cursor in the page means the result set is exhausted.
	fn run_query(
		&self,
		query: &Query,
		cursor: Option<Cursor>,
	) -> impl Future<Output = Result<QueryPage>> + Send;
}
