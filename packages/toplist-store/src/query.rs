use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DocPath, Document};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOp {
	Eq,
	Gt,
	Ge,
	Lt,
	Le,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldFilter {
	pub field: String,
	pub op: FilterOp,
	pub value: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryScope {
	/// Documents of one collection directly under a parent document.
	Collection { parent: DocPath, collection: String },
	/// Every document in any collection with this id, anywhere in the tree.
	/// Broad by design; callers filter results by path shape.
	CollectionGroup { collection: String },
}

/// A paginated structural query. Results are totally ordered by
/// (order-by value, path) so cursors are unambiguous; without an order-by
/// field the path alone orders the results.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
	pub scope: QueryScope,
	#[serde(default)]
	pub filters: Vec<FieldFilter>,
	#[serde(default)]
	pub order_by: Option<String>,
	pub page_size: usize,
}

impl Query {
	pub fn collection_group(collection: &str) -> Self {
		Self {
			scope: QueryScope::CollectionGroup { collection: collection.to_string() },
			filters: Vec::new(),
			order_by: None,
			page_size: 300,
		}
	}

	pub fn collection(parent: DocPath, collection: &str) -> Self {
		Self {
			scope: QueryScope::Collection { parent, collection: collection.to_string() },
			filters: Vec::new(),
			order_by: None,
			page_size: 300,
		}
	}

	pub fn filter(mut self, field: &str, op: FilterOp, value: Value) -> Self {
		self.filters.push(FieldFilter { field: field.to_string(), op, value });

		self
	}

	pub fn order_by(mut self, field: &str) -> Self {
		self.order_by = Some(field.to_string());

		self
	}

	pub fn page_size(mut self, page_size: usize) -> Self {
		self.page_size = page_size;

		self
	}
}

/// Exclusive start position for the next page: the previous page's last
/// (order-by value, path) pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
	pub order_value: Option<Value>,
	pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
	pub docs: Vec<Document>,
	/// Set when the page was full; `None` means the result set is exhausted.
	pub cursor: Option<Cursor>,
}
