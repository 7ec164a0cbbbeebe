use regex::Regex;
use serde::{Deserialize, Serialize};

/// Ranking bucket a server string resolves to. `group` is the coarse regional
/// bucket, `key` the concrete per-server partition key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPartition {
	pub group: String,
	pub key: String,
}

/// Fixed aliases for server names that predate the code+number scheme.
const ALIASES: [(&str, &str, &str); 3] = [
	("EUROPE", "EU", "eu1"),
	("AMERICA", "US", "us1"),
	("INTERNATIONAL", "INT", "int1"),
];

/// Maps a free-form server string to its ranking partition. Rules are ordered:
/// host form (`s3.sfgame.de`), regional code + number (`EU 1`, `US12`), fixed
/// aliases, fusion prefix (`F3`). Unrecognized input lands in the catch-all
/// `("ALL", "all")` partition.
pub fn normalize_server(raw: &str) -> ServerPartition {
	let trimmed = raw.trim();
	let upper = trimmed.to_uppercase();

	if let Ok(re) = Regex::new(r"^S?(\d+)\.SFGAME\.([A-Z]{2,4})$")
		&& let Some(caps) = re.captures(&upper)
	{
		let group = caps[2].to_string();

		return ServerPartition {
			key: format!("{}{}", group.to_lowercase(), &caps[1]),
			group,
		};
	}
	if let Ok(re) = Regex::new(r"^([A-Z]{2,3})[\s_-]*(\d+)$")
		&& let Some(caps) = re.captures(&upper)
	{
		let group = caps[1].to_string();

		return ServerPartition {
			key: format!("{}{}", group.to_lowercase(), &caps[2]),
			group,
		};
	}
	for (alias, group, key) in ALIASES {
		if upper == alias {
			return ServerPartition { group: group.to_string(), key: key.to_string() };
		}
	}
	if let Ok(re) = Regex::new(r"^F(\d+)$")
		&& let Some(caps) = re.captures(&upper)
	{
		return ServerPartition { group: "FUSION".to_string(), key: format!("f{}", &caps[1]) };
	}

	ServerPartition { group: "ALL".to_string(), key: "all".to_string() }
}
