use crate::config::ErrorStatusMode;
use crate::error::{Phase, QueryError};
use crate::render::render_dump;
use crate::session::{Connector, Session};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The only statement this endpoint ever runs. Nothing from the request is
/// spliced into it.
pub const ROW_DUMP_QUERY: &str = "select * from nodejs_user_test";

/// Opens a connection, runs [`ROW_DUMP_QUERY`], closes the connection and
/// answers with either the dump or the error.
///
/// Query string, headers and body of the request are ignored.
pub async fn row_dump_handler<C: Connector>(
    State(state): State<Arc<AppState<C>>>,
) -> Result<Response, StatusCode> {
    debug!("Received row dump request");

    let mut session = match state.connector.connect(&state.params).await {
        Ok(s) => s,
        Err(e) => {
            error!(phase = %e.phase, "query error : {}", e);
            return Ok(error_response(state.error_status, e));
        }
    };

    let outcome = session.query(ROW_DUMP_QUERY).await;

    // Released before anything is written back, on both paths
    if let Err(e) = session.close().await {
        warn!("Failed to close database connection: {}", e);
    }

    match outcome {
        Ok(result) => {
            debug!(rows = ?result.rows, "rows");
            debug!(fields = ?result.fields, "fields");
            let body = match render_dump(&result) {
                Ok(b) => b,
                Err(e) => {
                    error!("Failed to serialize result set: {}", e);
                    return Err(StatusCode::INTERNAL_SERVER_ERROR);
                }
            };
            info!(
                "Dumped {} row(s) with {} field(s)",
                result.rows.len(),
                result.fields.len()
            );
            Ok(Html(body).into_response())
        }
        Err(e) => {
            error!(phase = %e.phase, "query error : {}", e);
            Ok(error_response(state.error_status, e))
        }
    }
}

fn error_response(mode: ErrorStatusMode, err: QueryError) -> Response {
    let status = match mode {
        ErrorStatusMode::Verbatim => StatusCode::OK,
        ErrorStatusMode::Mapped => match err.phase {
            Phase::Connect => StatusCode::SERVICE_UNAVAILABLE,
            Phase::Query | Phase::Close => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };
    (status, Json(err)).into_response()
}
