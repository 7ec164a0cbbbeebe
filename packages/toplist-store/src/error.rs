#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Http(#[from] reqwest::Error),
	#[error(transparent)]
	Serde(#[from] serde_json::Error),
	#[error("Store responded with status {code}: {message}")]
	Status { code: u16, message: String },
	#[error("Store rate limited the request: {message}")]
	RateLimited { message: String },
	#[error("Store unavailable: {message}")]
	Unavailable { message: String },
	#[error("Missing composite index: {message}")]
	MissingIndex { message: String },
	#[error("Invalid document: {message}")]
	InvalidDocument { message: String },
	#[error("Invalid path: {message}")]
	InvalidPath { message: String },
}

impl Error {
	/// Transient conditions are the only ones worth retrying.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::RateLimited { .. } | Self::Unavailable { .. })
	}
}
