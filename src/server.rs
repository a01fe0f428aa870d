//! The HTTP layer: routes wrapping the engine and the tabular adapter
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart},
    http::header,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::engine::{compare, normalize, Comparison};
use crate::error::{ListsetError, Result};
use crate::export::{export, ExportRequest};
use crate::tabular::{import, MemberRecord, SAMPLE_TEMPLATE};

/// Binds to the configured address and serves until the process is stopped
pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let address = config.address();
    let listener =
        TcpListener::bind(&address).await.with_context(|| format!("Can't listen on {address}"))?;
    info!("listset listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await.context("Server stopped unexpectedly")?;
    Ok(())
}

/// Every route the service answers. Handlers keep no state between requests.
pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/calculator", get(calculator))
        .route("/health", get(health))
        .route("/compare", post(compare_lists))
        .route("/import-csv", post(import_table))
        .route("/export-csv", post(export_table))
        .route("/sample-template", get(sample_template))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn home() -> Html<&'static str> {
    Html(include_str!("pages/home.html"))
}

async fn calculator() -> Html<&'static str> {
    Html(include_str!("pages/calculator.html"))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
struct CompareRequest {
    #[serde(default)]
    lists: IndexMap<String, Value>,
}

/// An unreadable body, or one without `lists`, compares nobody. A member whose
/// value isn't a list has no items and so drops out.
async fn compare_lists(body: Bytes) -> Json<Comparison> {
    let request: CompareRequest = serde_json::from_slice(&body).unwrap_or_else(|err| {
        debug!(%err, "compare body unreadable, comparing nobody");
        CompareRequest::default()
    });
    let sets = normalize(
        request
            .lists
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_array().into_iter().flatten())),
    );
    debug!(members = sets.len(), "comparing");
    Json(compare(&sets))
}

#[derive(Debug, Serialize)]
struct ImportResponse {
    success: bool,
    members: Vec<MemberRecord>,
    count: usize,
}

async fn import_table(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportResponse>> {
    let mut multipart = multipart.map_err(|_| ListsetError::MissingFile)?;
    while let Some(field) =
        multipart.next_field().await.map_err(|err| ListsetError::Processing(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_owned();
        if filename.is_empty() {
            return Err(ListsetError::EmptyFilename);
        }
        let contents =
            field.bytes().await.map_err(|err| ListsetError::Processing(err.to_string()))?;
        let members = import(&filename, &contents)?;
        info!(file = %filename, members = members.len(), "imported member table");
        return Ok(Json(ImportResponse { success: true, count: members.len(), members }));
    }
    Err(ListsetError::MissingFile)
}

async fn export_table(body: Bytes) -> Result<Response> {
    let request = ExportRequest::from_body(&body);
    let file = export(&request, Local::now().naive_local())?;
    info!(file = %file.filename, members = request.members.len(), "exported");
    let disposition = format!("attachment; filename={}", file.filename);
    Ok((
        [(header::CONTENT_TYPE, file.content_type.to_owned()), (header::CONTENT_DISPOSITION, disposition)],
        file.contents,
    )
        .into_response())
}

async fn sample_template() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=sample_template.csv"),
        ],
        SAMPLE_TEMPLATE,
    )
}
