use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use seat_service::{AssignParticipantRequest, CreateGroupsRequest, Error, GroupsResponse};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/groups", post(create_groups))
		.route("/v1/groups/assign", post(assign_participant))
		.with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthBody {
	status: &'static str,
	message: &'static str,
}

async fn health() -> Json<HealthBody> {
	Json(HealthBody { status: "ok", message: "Grouping service is healthy." })
}

async fn create_groups(
	State(state): State<AppState>,
	payload: Result<Json<CreateGroupsRequest>, JsonRejection>,
) -> Result<Json<GroupsResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.create_groups(payload).await?;

	Ok(Json(response))
}

async fn assign_participant(
	State(state): State<AppState>,
	payload: Result<Json<AssignParticipantRequest>, JsonRejection>,
) -> Result<Json<GroupsResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.assign_participant(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}

	fn log(&self) {
		tracing::warn!(
			status = self.status.as_u16(),
			error_code = %self.error_code,
			message = %self.message,
			"Request rejected."
		);
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let api_error = match err {
			Error::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			Error::Unsatisfiable { message } =>
				Self::new(StatusCode::UNPROCESSABLE_ENTITY, "unsatisfiable_constraints", message),
			Error::Provider { message } =>
				Self::new(StatusCode::BAD_GATEWAY, "provider_error", message),
		};

		api_error.log();

		api_error
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		let api_error =
			Self::new(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text());

		api_error.log();

		api_error
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
