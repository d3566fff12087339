//! Chat endpoint

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;
use std::convert::Infallible;

use crate::engine::Upload;
use crate::error::{Error, Result};
use crate::server::state::AppState;

/// POST /api/chat - Multipart `query` text plus optional `file`; the answer is
/// streamed back as plain text while the model produces it
pub async fn chat(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response> {
    let mut query = None;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "query" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::InvalidRequest(format!("Failed to read query: {}", e)))?;
                query = Some(text);
            }
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidRequest(format!("Failed to read file: {}", e)))?;

                tracing::info!("Received file: {} ({} bytes)", filename, data.len());
                upload = Some(Upload { filename, data });
            }
            other => tracing::debug!("Ignoring multipart field: {}", other),
        }
    }

    let query = query.ok_or_else(|| Error::InvalidRequest("Missing 'query' field".to_string()))?;

    let fragments = state.engine().handle_turn(&query, upload).await;
    let body = Body::from_stream(fragments.map(Ok::<_, Infallible>));

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response())
}
