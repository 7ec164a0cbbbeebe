use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use toplist_service::{CandidateWriteEvent, PublishOutcome};
use toplist_store::DocumentStore;

use crate::state::AppState;

pub fn router<S>(state: AppState<S>) -> Router
where
	S: DocumentStore + 'static,
{
	Router::new()
		.route("/health", get(health))
		.route("/v1/events/candidate-write", post(candidate_write::<S>))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn candidate_write<S>(
	State(state): State<AppState<S>>,
	Json(event): Json<CandidateWriteEvent>,
) -> Result<Json<PublishOutcome>, ApiError>
where
	S: DocumentStore + 'static,
{
	let outcome = state.service.handle_candidate_write(&event).await?;

	Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}

impl From<toplist_service::Error> for ApiError {
	fn from(err: toplist_service::Error) -> Self {
		let status = match &err {
			toplist_service::Error::Validation { .. } => StatusCode::BAD_REQUEST,
			toplist_service::Error::Store(store_err) if store_err.is_transient() =>
				StatusCode::SERVICE_UNAVAILABLE,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};

		Self { status, message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_server_error() {
			tracing::error!(status = %self.status, message = %self.message, "Request failed.");
		}

		(self.status, Json(ErrorBody { message: self.message })).into_response()
	}
}
