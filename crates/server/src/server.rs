//! HTTP transport: accepts connections with `tiny_http` and drives the
//! handlers on the tokio runtime.

use crate::api::{ApiError, ApiRequest, ApiResponse, App};
use anyhow::{anyhow, Context, Result};
use std::io::{self, Read};
use std::sync::Arc;
use tiny_http::{Header, Request, Response, Server};

const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "*"),
];

/// Bind a listening socket.
pub fn bind(addr: &str) -> Result<Arc<Server>> {
    let server = Server::http(addr).map_err(|e| anyhow!("failed to bind {}: {}", addr, e))?;
    Ok(Arc::new(server))
}

/// Serve requests until the server is unblocked.
///
/// Each request is handled on its own task; a slow model call never holds up
/// other clients.
pub async fn run(server: Arc<Server>, app: Arc<App>, max_upload_bytes: usize) -> Result<()> {
    let handle = tokio::runtime::Handle::current();

    tokio::task::spawn_blocking(move || {
        for request in server.incoming_requests() {
            handle.spawn(serve(request, Arc::clone(&app), max_upload_bytes));
        }
    })
    .await
    .context("accept loop terminated abnormally")?;

    log::info!("Server stopped accepting connections");
    Ok(())
}

async fn serve(request: Request, app: Arc<App>, max_upload_bytes: usize) {
    let method = request.method().to_string();
    let url = request.url().to_string();

    let read = tokio::task::spawn_blocking(move || read_request(request, max_upload_bytes)).await;
    let (request, api_request) = match read {
        Ok(read) => read,
        Err(e) => {
            log::error!("{} {}: reading request failed: {}", method, url, e);
            return;
        }
    };

    let response = match api_request {
        Ok(api_request) => tokio::spawn(async move { app.handle(api_request).await })
            .await
            .unwrap_or_else(|e| ApiError::Internal(e.to_string()).into()),
        Err(err) => err.into(),
    };

    log::info!("{} {} -> {}", method, url, response.status);

    match tokio::task::spawn_blocking(move || respond(request, response)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("{} {}: failed to write response: {}", method, url, e),
        Err(e) => log::error!("{} {}: response task failed: {}", method, url, e),
    }
}

fn read_request(
    mut request: Request,
    max_upload_bytes: usize,
) -> (Request, Result<ApiRequest, ApiError>) {
    let content_type = request
        .headers()
        .iter()
        .find(|header| header.field.equiv("Content-Type"))
        .map(|header| header.value.as_str().to_string());

    if request.body_length().is_some_and(|len| len > max_upload_bytes) {
        return (request, Err(ApiError::PayloadTooLarge(max_upload_bytes)));
    }

    let mut body = Vec::new();
    let limit = max_upload_bytes as u64 + 1;
    let result = match Read::take(request.as_reader(), limit).read_to_end(&mut body) {
        Err(e) => Err(ApiError::InvalidRequest(format!("failed to read body: {}", e))),
        Ok(_) if body.len() > max_upload_bytes => Err(ApiError::PayloadTooLarge(max_upload_bytes)),
        Ok(_) => Ok(ApiRequest {
            method: request.method().to_string(),
            path: request.url().to_string(),
            content_type,
            body,
        }),
    };

    (request, result)
}

fn respond(request: Request, response: ApiResponse) -> io::Result<()> {
    let data = match &response.body {
        Some(body) => serde_json::to_vec(body)?,
        None => Vec::new(),
    };

    let mut headers = CORS_HEADERS.to_vec();
    if response.body.is_some() {
        headers.push(("Content-Type", "application/json"));
    }

    let mut reply = Response::from_data(data).with_status_code(response.status);
    for (name, value) in headers {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            reply = reply.with_header(header);
        }
    }

    request.respond(reply)
}
