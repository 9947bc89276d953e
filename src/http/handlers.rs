//! Request handlers.

use super::AppState;
use super::body::spawn_streaming_body;
use crate::export::ExportRequest;
use crate::observability::{
    REQUEST_ID_HEADER, RequestContext, enter_request_context, scope_request_context,
};
use crate::Error;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Query parameters of the export endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    /// Project id (required).
    pub project: Option<String>,
    /// Layer id (optional).
    pub layer: Option<String>,
}

impl ExportParams {
    /// Validates the parameters into an export request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `project` is missing or blank.
    pub fn into_request(self) -> crate::Result<ExportRequest> {
        let project = self
            .project
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidInput("missing 'project' query parameter".to_string()))?;
        let request = ExportRequest::new(project);
        Ok(match self.layer.map(|l| l.trim().to_string()) {
            Some(layer) if !layer.is_empty() => request.with_layer(layer),
            _ => request,
        })
    }
}

/// `GET /export/csv?project=..&layer=..`
pub async fn export_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ExportParams>,
) -> Response {
    let context = RequestContext::from_header(
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    let request_id = context.request_id().to_string();

    let mut response =
        scope_request_context(context.clone(), run_export(state, context, params)).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn run_export(state: AppState, context: RequestContext, params: ExportParams) -> Response {
    let request = match params.into_request() {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    // Every store read happens here, so failures still get a proper status.
    let service = state.service.clone();
    let prepare_context = context.clone();
    let prepared = tokio::task::spawn_blocking(move || {
        let _guard = enter_request_context(prepare_context);
        service.prepare(&request)
    })
    .await;
    let prepared = match prepared {
        Ok(Ok(prepared)) => prepared,
        Ok(Err(e)) => return e.into_response(),
        Err(e) => return Error::operation("prepare_export", e).into_response(),
    };

    let disposition = format!("attachment; filename=\"{}\"", prepared.request().file_name());
    let span = tracing::Span::current();
    let body = spawn_streaming_body(state.stream_buffer, move |writer| {
        let _guard = enter_request_context(context);
        span.in_scope(|| prepared.write_to(writer))
    });

    let mut response = body.into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(CSV_CONTENT_TYPE),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response_headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// Maps an error to its HTTP status.
#[must_use]
pub const fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::ProjectNotFound(_) => StatusCode::NOT_FOUND,
        Error::AmbiguousForm { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::OperationFailed { .. } | Error::StreamWrite(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        },
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let body = match &self {
            Self::ProjectNotFound(_) => "Project not found".to_string(),
            Self::OperationFailed { .. } | Self::StreamWrite(_) => {
                tracing::error!(error = %self, "Export failed");
                "Export failed".to_string()
            },
            Self::InvalidInput(_) | Self::AmbiguousForm { .. } => self.to_string(),
        };
        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE))],
            body,
        )
            .into_response()
    }
}
