use std::sync::Arc;

use color_eyre::eyre;

use toplist_service::ToplistService;
use toplist_store::{DocumentStore, HttpStore, TOKEN_ENV};

pub struct AppState<S> {
	pub service: Arc<ToplistService<S>>,
}

impl<S> Clone for AppState<S> {
	fn clone(&self) -> Self {
		Self { service: Arc::clone(&self.service) }
	}
}

impl AppState<HttpStore> {
	pub fn new(config: toplist_config::Config) -> color_eyre::Result<Self> {
		let token = std::env::var(TOKEN_ENV)
			.map_err(|_| eyre::eyre!("{TOKEN_ENV} must hold the store bearer credential."))?;
		let store = HttpStore::new(&config.store, token)?;

		Ok(Self::with_store(config, store))
	}
}

impl<S: DocumentStore> AppState<S> {
	pub fn with_store(config: toplist_config::Config, store: S) -> Self {
		Self { service: Arc::new(ToplistService::new(config, store)) }
	}
}
