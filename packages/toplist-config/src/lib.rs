mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Publish, Purge, Service, Store};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.updater_interval_secs == 0 {
		return Err(Error::Validation {
			message: "service.updater_interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.store.project_id.trim().is_empty() {
		return Err(Error::Validation {
			message: "store.project_id must be non-empty.".to_string(),
		});
	}
	if cfg.store.api_base.trim().is_empty() {
		return Err(Error::Validation { message: "store.api_base must be non-empty.".to_string() });
	}
	if cfg.store.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "store.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.publish.threshold == 0 {
		return Err(Error::Validation {
			message: "publish.threshold must be greater than zero.".to_string(),
		});
	}
	if cfg.purge.max_namespaces == 0 {
		return Err(Error::Validation {
			message: "purge.max_namespaces must be greater than zero.".to_string(),
		});
	}
	if cfg.purge.max_total_deletes == 0 {
		return Err(Error::Validation {
			message: "purge.max_total_deletes must be greater than zero.".to_string(),
		});
	}

	Ok(())
}
