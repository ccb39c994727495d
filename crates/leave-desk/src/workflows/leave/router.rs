use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{text_field, ApplicationId, ApplicationSubmission, LeaveApplication};
use super::repository::{ApplicationRepository, NotificationGateway, RepositoryError};
use super::service::{ApplicationServiceError, LeaveApplicationService, NotificationOutcome};
use super::validation::ValidationError;

/// Body accepted by the status update endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default, deserialize_with = "text_field")]
    pub status: Option<String>,
}

/// JSON body extractor that reads an absent or blank body as `T::default()`, ignores the
/// content type, and answers undecodable bodies with a 400 JSON message.
#[derive(Debug, Clone, Default)]
pub struct FormBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for FormBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&body).map(Self).map_err(|err| {
            let payload = json!({
                "message": "Invalid request body",
                "error": err.to_string(),
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAccepted {
    pub message: &'static str,
    pub application_id: ApplicationId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdated {
    pub message: &'static str,
    pub updated_application: LeaveApplication,
    pub email_status: &'static str,
    pub notification: NotificationOutcome,
}

/// Router builder exposing the submission and review endpoints.
pub fn application_router<R, G>(service: Arc<LeaveApplicationService<R, G>>) -> Router
where
    R: ApplicationRepository + 'static,
    G: NotificationGateway + 'static,
{
    Router::new()
        .route("/submit-application", post(submit_handler::<R, G>))
        .route("/api/leave-applications", get(list_handler::<R, G>))
        .route(
            "/api/leave-applications/:id",
            get(fetch_handler::<R, G>)
                .patch(update_status_handler::<R, G>)
                .delete(delete_handler::<R, G>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R, G>(
    State(service): State<Arc<LeaveApplicationService<R, G>>>,
    FormBody(submission): FormBody<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: NotificationGateway + 'static,
{
    match service.submit(submission) {
        Ok(record) => {
            let body = SubmissionAccepted {
                message: "Application submitted successfully",
                application_id: record.id,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(err) => error_response("Error submitting application", err),
    }
}

pub(crate) async fn list_handler<R, G>(
    State(service): State<Arc<LeaveApplicationService<R, G>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: NotificationGateway + 'static,
{
    match service.list() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => error_response("Error fetching applications", err),
    }
}

pub(crate) async fn fetch_handler<R, G>(
    State(service): State<Arc<LeaveApplicationService<R, G>>>,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: NotificationGateway + 'static,
{
    match service.get(&ApplicationId(id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response("Error fetching application", err),
    }
}

pub(crate) async fn update_status_handler<R, G>(
    State(service): State<Arc<LeaveApplicationService<R, G>>>,
    Path(id): Path<String>,
    FormBody(request): FormBody<StatusUpdateRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: NotificationGateway + 'static,
{
    let id = ApplicationId(id);
    // Delivery blocks on the mail transport, so keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        service.update_status(&id, request.status.as_deref())
    })
    .await;

    match outcome {
        Ok(Ok(change)) => {
            let body = StatusUpdated {
                message: "Status updated successfully",
                email_status: change.notification.label(),
                notification: change.notification,
                updated_application: change.application,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(Err(err)) => error_response("Error updating status", err),
        Err(join_error) => {
            error!(error = %join_error, "status update task aborted");
            let payload = json!({
                "message": "Error updating status",
                "error": join_error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn delete_handler<R, G>(
    State(service): State<Arc<LeaveApplicationService<R, G>>>,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    G: NotificationGateway + 'static,
{
    match service.delete(&ApplicationId(id)) {
        Ok(_) => {
            let payload = json!({ "message": "Application deleted successfully" });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response("Error deleting application", err),
    }
}

fn error_response(context: &'static str, err: ApplicationServiceError) -> Response {
    match err {
        ApplicationServiceError::Validation(ValidationError::MissingFields {
            missing,
            received,
        }) => {
            let payload = json!({
                "message": "Missing required fields",
                "missingFields": missing,
                "receivedData": received,
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        ApplicationServiceError::Validation(ValidationError::MissingStatus) => {
            let payload = json!({ "message": "Status is required" });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        ApplicationServiceError::NotFound(_) => {
            let payload = json!({ "message": "Application not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        ApplicationServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({
                "message": "Application was modified concurrently",
                "error": RepositoryError::Conflict.to_string(),
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        ApplicationServiceError::Repository(other) => {
            error!(error = %other, context, "application store error");
            let payload = json!({
                "message": context,
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
