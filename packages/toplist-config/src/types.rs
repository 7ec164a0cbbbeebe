use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub store: Store,
	#[serde(default)]
	pub publish: Publish,
	#[serde(default)]
	pub purge: Purge,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
	/// Bind address of the candidate-write event endpoint.
	pub http_bind: String,
	#[serde(default = "default_updater_interval_secs")]
	pub updater_interval_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Store {
	pub project_id: String,
	pub api_base: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Publish {
	/// Detected content changes a partition accumulates before its public
	/// snapshot is republished.
	#[serde(default = "default_publish_threshold")]
	pub threshold: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Purge {
	/// Upper bound on legacy namespaces one purge run will discover.
	#[serde(default = "default_max_namespaces")]
	pub max_namespaces: usize,
	/// Global delete budget; the run aborts once the next batch would cross it.
	#[serde(default = "default_max_total_deletes")]
	pub max_total_deletes: u64,
}

impl Default for Publish {
	fn default() -> Self {
		Self { threshold: default_publish_threshold() }
	}
}

impl Default for Purge {
	fn default() -> Self {
		Self {
			max_namespaces: default_max_namespaces(),
			max_total_deletes: default_max_total_deletes(),
		}
	}
}

fn default_updater_interval_secs() -> u64 {
	300
}

fn default_timeout_ms() -> u64 {
	10_000
}

fn default_publish_threshold() -> u32 {
	100
}

fn default_max_namespaces() -> usize {
	200
}

fn default_max_total_deletes() -> u64 {
	50_000
}
