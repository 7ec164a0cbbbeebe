#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	Validation { message: String },
	#[error(
		"Snapshot of {bytes} bytes exceeds the {budget}-byte document budget. \
		Lower top_n or shard the window; nothing was written."
	)]
	SnapshotTooLarge { bytes: usize, budget: usize },
	#[error(transparent)]
	Store(#[from] toplist_store::Error),
	#[error(transparent)]
	Serde(#[from] serde_json::Error),
}
