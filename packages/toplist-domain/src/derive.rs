use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{coerce_number, normalize_server};

/// The five canonical base attributes that make up the power sum.
pub const BASE_ATTRIBUTES: [&str; 5] = [
	"Base Strength",
	"Base Dexterity",
	"Base Intelligence",
	"Base Constitution",
	"Base Luck",
];

const MINE_ATTRIBUTE: &str = "Fortress Mine";
const TREASURY_ATTRIBUTE: &str = "Fortress Treasury";

/// Raw per-entity scan as the ingestion collaborator writes it. Every field is
/// defaulted so a partially-scraped document still deserializes; the numeric
/// fields stay loosely typed and go through [`coerce_number`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawRecord {
	pub id: String,
	pub name: String,
	pub class_name: String,
	pub level: Value,
	pub values: Map<String, Value>,
	pub server: String,
	pub guild: Option<RawGuild>,
	pub timestamp: Value,
	pub last_updated_at: Value,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawGuild {
	pub id: String,
	pub name: String,
}

/// Normalized ranking-relevant view of one entity, schema of the derived-cache
/// documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRecord {
	pub entity_id: String,
	pub name: String,
	pub class_tag: String,
	pub level: i64,
	pub partition_group: String,
	pub partition_key: String,
	pub guild_id: String,
	pub guild_name: String,
	pub sum: f64,
	pub main_attribute: f64,
	pub constitution: f64,
	pub ratio: f64,
	pub mine: f64,
	pub treasury: f64,
	pub capture_timestamp: i64,
	pub last_updated_at: i64,
}

/// Primary attribute for a class. Unknown classes rank by intelligence.
pub fn main_attribute_key(class_name: &str) -> &'static str {
	match class_name.trim().to_lowercase().as_str() {
		"warrior" | "berserker" | "battle mage" | "paladin" => "Base Strength",
		"scout" | "assassin" | "demon hunter" => "Base Dexterity",
		_ => "Base Intelligence",
	}
}

/// Turns a raw scan into its derived record. Total function: any missing or
/// malformed field coerces to a neutral value, so the derived cache never sees
/// a NaN score or a failed conversion.
pub fn derive(raw: &RawRecord) -> DerivedRecord {
	let level = coerce_number(&raw.level) as i64;
	let sum: f64 = BASE_ATTRIBUTES.iter().map(|key| attribute(&raw.values, key)).sum();
	let ratio = if level > 0 { sum / level as f64 } else { 0.0 };
	let partition = normalize_server(&raw.server);
	let guild = raw.guild.clone().unwrap_or_default();

	DerivedRecord {
		entity_id: raw.id.clone(),
		name: raw.name.clone(),
		class_tag: raw.class_name.clone(),
		level,
		partition_group: partition.group,
		partition_key: partition.key,
		guild_id: guild.id,
		guild_name: guild.name,
		sum,
		main_attribute: attribute(&raw.values, main_attribute_key(&raw.class_name)),
		constitution: attribute(&raw.values, "Base Constitution"),
		ratio,
		mine: attribute(&raw.values, MINE_ATTRIBUTE),
		treasury: attribute(&raw.values, TREASURY_ATTRIBUTE),
		capture_timestamp: coerce_number(&raw.timestamp) as i64,
		last_updated_at: coerce_number(&raw.last_updated_at) as i64,
	}
}

fn attribute(values: &Map<String, Value>, key: &str) -> f64 {
	values.get(key).map(coerce_number).unwrap_or(0.0)
}
