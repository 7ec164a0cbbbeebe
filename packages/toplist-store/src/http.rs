use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value, json};

use crate::{
	Cursor, DocPath, Document, Error, Query, QueryPage, Result, UpdateSpec, write::UpdateBody,
};

/// Environment variable the operator tools read their bearer credential from.
/// Credential acquisition itself lives outside this codebase.
pub const TOKEN_ENV: &str = "TOPLIST_ACCESS_TOKEN";

/// HTTP client for the document store's JSON API. Maps responses onto the
/// error taxonomy and never retries internally; callers wrap individual
/// operations in [`with_backoff`](crate::with_backoff) where retries are
/// appropriate.
#[derive(Clone)]
pub struct HttpStore {
	client: Client,
	base_url: String,
	token: String,
}

impl HttpStore {
	pub fn new(cfg: &toplist_config::Store, token: String) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let base_url = format!(
			"{}/v1/projects/{}/documents",
			cfg.api_base.trim_end_matches('/'),
			cfg.project_id
		);

		Ok(Self { client, base_url, token })
	}

	fn doc_url(&self, path: &DocPath) -> String {
		format!("{}/{}", self.base_url, path)
	}

	fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
		builder.bearer_auth(&self.token)
	}

	async fn expect_ok(&self, response: Response) -> Result<Response> {
		let status = response.status();

		if status.is_success() {
			return Ok(response);
		}

		let body = response.text().await.unwrap_or_default();

		Err(classify_failure(status.as_u16(), &body))
	}
}

impl crate::DocumentStore for HttpStore {
	async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
		let response = self.authorized(self.client.get(self.doc_url(path))).send().await?;

		if response.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let doc: Document = self.expect_ok(response).await?.json().await?;

		Ok(Some(doc))
	}

	async fn set_merge(&self, path: &DocPath, fields: Map<String, Value>) -> Result<()> {
		let url = format!("{}?mode=merge", self.doc_url(path));
		let response =
			self.authorized(self.client.patch(url)).json(&Value::Object(fields)).send().await?;

		self.expect_ok(response).await?;

		Ok(())
	}

	async fn update(&self, path: &DocPath, spec: UpdateSpec) -> Result<()> {
		let url = format!("{}:update", self.doc_url(path));
		let body = UpdateBody::from(&spec);
		let response = self.authorized(self.client.post(url)).json(&body).send().await?;

		self.expect_ok(response).await?;

		Ok(())
	}

	async fn delete(&self, path: &DocPath) -> Result<()> {
		let response = self.authorized(self.client.delete(self.doc_url(path))).send().await?;

		// Already-gone documents are a success for delete.
		if response.status() == StatusCode::NOT_FOUND {
			return Ok(());
		}

		self.expect_ok(response).await?;

		Ok(())
	}

	async fn run_query(&self, query: &Query, cursor: Option<Cursor>) -> Result<QueryPage> {
		let url = format!("{}:runQuery", self.base_url);
		let body = json!({ "query": query, "cursor": cursor });
		let response = self.authorized(self.client.post(url)).json(&body).send().await?;
		let page: QueryPage = self.expect_ok(response).await?.json().await?;

		Ok(page)
	}
}

/// Maps a failed response onto the error taxonomy. A failed precondition
/// complaining about an index means the composite index backing a range query
/// is missing; that gets an actionable hint instead of a bare status code.
fn classify_failure(code: u16, body: &str) -> Error {
	let message = if body.trim().is_empty() { "<empty body>".to_string() } else { body.to_string() };

	match code {
		429 => Error::RateLimited { message },
		500 | 502 | 503 | 504 => Error::Unavailable { message },
		400 | 412 if body.to_lowercase().contains("index") => Error::MissingIndex {
			message: format!(
				"{message} Create the composite index for the queried collection \
				(equality field + range field) and retry; this is not an empty result."
			),
		},
		_ => Error::Status { code, message },
	}
}
