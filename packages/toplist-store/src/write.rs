use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FieldPath;

/// Server-side field transform, applied at write time. The application never
/// reads, mutates, and writes these fields back itself; concurrent writers
/// would lose updates.
#[derive(Clone, Debug, PartialEq)]
pub enum Transform {
	Increment(f64),
	ServerTimestamp,
}

/// One atomic document update: literal sets, field deletions, and transforms.
#[derive(Clone, Debug, Default)]
pub struct UpdateSpec {
	pub set: Vec<(FieldPath, Value)>,
	pub delete: Vec<FieldPath>,
	pub transforms: Vec<(FieldPath, Transform)>,
}

impl UpdateSpec {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(mut self, path: FieldPath, value: Value) -> Self {
		self.set.push((path, value));

		self
	}

	pub fn delete(mut self, path: FieldPath) -> Self {
		self.delete.push(path);

		self
	}

	pub fn transform(mut self, path: FieldPath, transform: Transform) -> Self {
		self.transforms.push((path, transform));

		self
	}

	pub fn is_empty(&self) -> bool {
		self.set.is_empty() && self.delete.is_empty() && self.transforms.is_empty()
	}
}

/// Wire form of an [`UpdateSpec`] for the HTTP store.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateBody {
	pub set: Vec<FieldWrite>,
	pub delete: Vec<Vec<String>>,
	pub transforms: Vec<TransformWrite>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct FieldWrite {
	pub path: Vec<String>,
	pub value: Value,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub(crate) enum TransformWrite {
	Increment { path: Vec<String>, by: f64 },
	ServerTimestamp { path: Vec<String> },
}

impl From<&UpdateSpec> for UpdateBody {
	fn from(spec: &UpdateSpec) -> Self {
		Self {
			set: spec
				.set
				.iter()
				.map(|(path, value)| FieldWrite {
					path: path.segments().to_vec(),
					value: value.clone(),
				})
				.collect(),
			delete: spec.delete.iter().map(|path| path.segments().to_vec()).collect(),
			transforms: spec
				.transforms
				.iter()
				.map(|(path, transform)| match transform {
					Transform::Increment(by) =>
						TransformWrite::Increment { path: path.segments().to_vec(), by: *by },
					Transform::ServerTimestamp =>
						TransformWrite::ServerTimestamp { path: path.segments().to_vec() },
				})
				.collect(),
		}
	}
}
