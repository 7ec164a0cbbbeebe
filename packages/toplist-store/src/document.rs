use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Slash-separated document path with alternating collection and document
/// segments, e.g. `players/42/latest/current`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
	segments: Vec<String>,
}

impl DocPath {
	/// Builds a document path from segments. Panics in debug builds if the
	/// segment count is odd; use [`DocPath::parse`] for untrusted input.
	pub fn doc(segments: &[&str]) -> Self {
		debug_assert!(segments.len() % 2 == 0, "document paths have an even segment count");

		Self { segments: segments.iter().map(|segment| segment.to_string()).collect() }
	}

	pub fn parse(path: &str) -> Result<Self> {
		let segments: Vec<String> =
			path.split('/').filter(|segment| !segment.is_empty()).map(str::to_string).collect();

		if segments.is_empty() || segments.len() % 2 != 0 {
			return Err(Error::InvalidPath {
				message: format!("{path:?} is not a document path."),
			});
		}

		Ok(Self { segments })
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	/// Document id, the last segment.
	pub fn id(&self) -> &str {
		self.segments.last().map(String::as_str).unwrap_or_default()
	}

	/// Collection id the document lives in, the second-to-last segment.
	pub fn collection_id(&self) -> &str {
		if self.segments.len() < 2 {
			return "";
		}

		&self.segments[self.segments.len() - 2]
	}

	pub fn parent_doc(&self) -> Option<DocPath> {
		if self.segments.len() < 4 {
			return None;
		}

		Some(Self { segments: self.segments[..self.segments.len() - 2].to_vec() })
	}

	pub fn child(&self, collection: &str, id: &str) -> DocPath {
		let mut segments = self.segments.clone();

		segments.push(collection.to_string());
		segments.push(id.to_string());

		Self { segments }
	}

	/// Checks the path against a shape pattern where `*` matches any single
	/// segment. Shapes guard broad structural queries against false positives.
	pub fn matches_shape(&self, shape: &[&str]) -> bool {
		self.segments.len() == shape.len()
			&& self
				.segments
				.iter()
				.zip(shape)
				.all(|(segment, pattern)| *pattern == "*" || segment == pattern)
	}

	pub fn is_descendant_of(&self, ancestor: &DocPath) -> bool {
		self.segments.len() > ancestor.segments.len()
			&& self.segments[..ancestor.segments.len()] == ancestor.segments[..]
	}
}

impl fmt::Display for DocPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.segments.join("/"))
	}
}

impl Serialize for DocPath {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for DocPath {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;

		DocPath::parse(&raw).map_err(serde::de::Error::custom)
	}
}

/// One stored document: its path, plain JSON fields, and the server-assigned
/// update time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
	pub path: DocPath,
	pub fields: Map<String, Value>,
	#[serde(default)]
	pub update_time_ms: i64,
}

impl Document {
	pub fn new(path: DocPath, fields: Map<String, Value>) -> Self {
		Self { path, fields, update_time_ms: 0 }
	}

	/// Looks a field up by path, descending into nested maps segment by
	/// segment. A raw field path with a literal dot never descends.
	pub fn field(&self, path: &FieldPath) -> Option<&Value> {
		let mut current: Option<&Value> = None;

		for segment in path.segments() {
			current = match current {
				None => self.fields.get(segment),
				Some(Value::Object(map)) => map.get(segment),
				Some(_) => return None,
			};
			current?;
		}

		current
	}
}

/// Explicit-segment field path. `parse` splits on dots; `raw` keeps a literal
/// dotted key as a single segment, which is how the legacy flat-key encoding
/// is addressed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
	segments: Vec<String>,
}

impl FieldPath {
	pub fn parse(path: &str) -> Self {
		Self { segments: path.split('.').map(str::to_string).collect() }
	}

	pub fn raw(key: &str) -> Self {
		Self { segments: vec![key.to_string()] }
	}

	pub fn from_segments(segments: Vec<String>) -> Self {
		Self { segments }
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}
}

impl fmt::Display for FieldPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.segments.join("."))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn shape_matching_uses_wildcards() {
		let path = DocPath::doc(&["players", "42", "latest", "current"]);

		assert!(path.matches_shape(&["players", "*", "latest", "current"]));
		assert!(!path.matches_shape(&["guilds", "*", "latest", "current"]));
		assert!(!path.matches_shape(&["players", "*", "latest"]));
	}

	#[test]
	fn parse_rejects_collection_paths() {
		assert!(DocPath::parse("players/42").is_ok());
		assert!(DocPath::parse("players").is_err());
		assert!(DocPath::parse("").is_err());
	}

	#[test]
	fn field_lookup_distinguishes_nested_from_literal_keys() {
		let mut fields = Map::new();

		fields.insert(
			"meta".to_string(),
			serde_json::json!({ "pendingSincePublish": 7 }),
		);
		fields.insert("meta.pendingSincePublish".to_string(), serde_json::json!(3));

		let doc = Document::new(DocPath::doc(&["c", "d"]), fields);

		assert_eq!(
			doc.field(&FieldPath::parse("meta.pendingSincePublish")),
			Some(&serde_json::json!(7))
		);
		assert_eq!(
			doc.field(&FieldPath::raw("meta.pendingSincePublish")),
			Some(&serde_json::json!(3))
		);
	}
}
