use toplist_config::{Config, validate};

fn parse(raw: &str) -> Config {
	toml::from_str(raw).expect("config should parse")
}

fn base_config() -> String {
	r#"
[service]
log_level = "info"
http_bind = "127.0.0.1:8080"

[store]
project_id = "toplist-prod"
api_base = "https://store.example.dev"
"#
	.to_string()
}

#[test]
fn minimal_config_passes_with_defaults() {
	let cfg = parse(&base_config());

	assert!(validate(&cfg).is_ok());
	assert_eq!(cfg.publish.threshold, 100);
	assert_eq!(cfg.service.updater_interval_secs, 300);
	assert_eq!(cfg.purge.max_namespaces, 200);
	assert_eq!(cfg.purge.max_total_deletes, 50_000);
}

#[test]
fn rejects_zero_publish_threshold() {
	let raw = format!("{}\n[publish]\nthreshold = 0\n", base_config());
	let cfg = parse(&raw);

	assert!(validate(&cfg).is_err());
}

#[test]
fn rejects_zero_purge_budget() {
	let raw = format!("{}\n[purge]\nmax_total_deletes = 0\n", base_config());
	let cfg = parse(&raw);

	assert!(validate(&cfg).is_err());
}

#[test]
fn rejects_empty_project_id() {
	let raw = base_config().replace("toplist-prod", " ");
	let cfg = parse(&raw);

	assert!(validate(&cfg).is_err());
}

#[test]
fn rejects_zero_updater_interval() {
	let raw = base_config().replace(
		"http_bind = \"127.0.0.1:8080\"",
		"http_bind = \"127.0.0.1:8080\"\nupdater_interval_secs = 0",
	);
	let cfg = parse(&raw);

	assert!(validate(&cfg).is_err());
}
