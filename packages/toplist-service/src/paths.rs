//! Collection layout of the store, shared by every job.

use toplist_store::DocPath;

pub const PLAYERS: &str = "players";
pub const LATEST_COLLECTION: &str = "latest";
pub const LATEST_DOC: &str = "current";
pub const SCANS: &str = "scans";
pub const PETS: &str = "pets";
pub const FORTRESS: &str = "fortress";
pub const DERIVED: &str = "toplist_players";
pub const TOPLISTS: &str = "toplists";
pub const META_COLLECTION: &str = "meta";
pub const META_DOC: &str = "toplist";

/// Per-entity sub-collections the purge job clears before removing the entity
/// itself.
pub const PURGED_SUBCOLLECTIONS: [&str; 3] = [SCANS, PETS, FORTRESS];

/// Shape of an entity's "latest" document. The collection-group query on
/// `latest` can match unrelated documents; anything off-shape is skipped.
pub const LATEST_SHAPE: [&str; 4] = [PLAYERS, "*", LATEST_COLLECTION, LATEST_DOC];

/// Shape of an entity's scan documents.
pub const SCAN_SHAPE: [&str; 4] = [PLAYERS, "*", SCANS, "*"];

pub fn player_root(player_id: &str) -> DocPath {
	DocPath::doc(&[PLAYERS, player_id])
}

pub fn latest_doc(player_id: &str) -> DocPath {
	DocPath::doc(&[PLAYERS, player_id, LATEST_COLLECTION, LATEST_DOC])
}

pub fn derived_doc(player_id: &str) -> DocPath {
	DocPath::doc(&[DERIVED, player_id])
}

pub fn meta_doc() -> DocPath {
	DocPath::doc(&[META_COLLECTION, META_DOC])
}

pub fn toplist_doc(code: &str) -> DocPath {
	DocPath::doc(&[TOPLISTS, code])
}

pub fn historical_doc(code: &str, label: &str) -> DocPath {
	DocPath::doc(&[TOPLISTS, &format!("{code}__{label}")])
}
