use chrono::Utc;
use serde_json::json;
use xitca_web::{
    WebContext,
    handler::state::StateRef,
    http::{
        HeaderMap, StatusCode, WebResponse,
        header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, ETAG, HeaderValue, IF_NONE_MATCH},
    },
};

use crate::{
    authorizer::authenticate,
    config::AppState,
    metrics::RequestTimer,
    request::{extract_credentials, extract_metadata},
    resolver::Resolution,
    utils::GetError,
    writer::BundleWriter,
};

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

pub async fn index() -> String {
    json!({ "service": SERVICE_NAME }).to_string()
}

pub async fn health() -> String {
    json!({ "status": "healthy", "service": SERVICE_NAME }).to_string()
}

/// Serves the bundle matching the request metadata. JSON unless the client
/// accepts YAML.
pub async fn get_config(ctx: &WebContext<'_, AppState>) -> Result<WebResponse, GetError> {
    let timer = RequestTimer::new("GET", "/api/v1/config");
    let state = ctx.state();
    let headers = ctx.req().headers();

    let result = authorized(state, headers, ctx.req().uri().query()).and_then(|resolution| {
        let writer = pick_writer(state, headers)?;
        bundle_response(&resolution, writer, headers)
    });
    finish(timer, result)
}

pub async fn get_stats(ctx: &WebContext<'_, AppState>) -> Result<WebResponse, GetError> {
    let timer = RequestTimer::new("GET", "/api/v1/config/stats");
    let state = ctx.state();

    let result = authorized(state, ctx.req().headers(), ctx.req().uri().query())
        .and_then(|_| json_response(&state.provider.stats()));
    finish(timer, result)
}

pub async fn reload(ctx: &WebContext<'_, AppState>) -> Result<WebResponse, GetError> {
    let timer = RequestTimer::new("GET", "/api/v1/config/reload");
    let state = ctx.state();

    let result = match authorized(state, ctx.req().headers(), ctx.req().uri().query()) {
        // the task outlives this request if the client goes away
        Ok(_) => match state.provider.spawn_reload().await {
            Ok(Ok(outcome)) => json_response(&json!({
                "status": "reloaded",
                "generation": outcome.generation,
                "timestamp": outcome.timestamp,
            })),
            Ok(Err(e)) => Err(e.into()),
            Err(e) => Err(GetError::InternalError {
                reason: format!("reload task failed: {e}"),
            }),
        },
        Err(e) => Err(e),
    };
    finish(timer, result)
}

pub async fn metrics_handler(StateRef(state): StateRef<'_, AppState>) -> String {
    state.metrics.render()
}

/// Resolves the request metadata and checks the credentials required by the
/// matched source.
fn authorized(
    state: &AppState,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<Resolution, GetError> {
    let metadata = extract_metadata(headers, query, &state.meta_prefix);
    let resolution = state.provider.resolve(&metadata)?;

    if !authenticate(resolution.source.auth.as_ref(), &extract_credentials(headers)) {
        return Err(GetError::Unauthorized {
            id: resolution.source.id.clone(),
        });
    }
    Ok(resolution)
}

fn pick_writer<'a>(state: &'a AppState, headers: &HeaderMap) -> Result<&'a dyn BundleWriter, GetError> {
    let wants_yaml = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("yaml"));
    let format = if wants_yaml { "yaml" } else { "json" };

    state.writer.find(format).ok_or_else(|| GetError::BadRequest {
        reason: format!("unknown output format: '{format}'"),
    })
}

fn bundle_response(
    resolution: &Resolution,
    writer: &dyn BundleWriter,
    headers: &HeaderMap,
) -> Result<WebResponse, GetError> {
    let etag = format!("\"{}\"", resolution.etag);
    let etag_value = HeaderValue::from_str(&etag).map_err(|e| GetError::InternalError {
        reason: format!("invalid etag: {e}"),
    })?;
    let max_age = (resolution.expires_at - Utc::now()).num_seconds().max(0);
    let cache_control = HeaderValue::from_str(&format!("private, max-age={max_age}"))
        .map_err(|e| GetError::InternalError {
            reason: format!("invalid cache-control: {e}"),
        })?;

    let not_modified = headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| etag_matches(v, &resolution.etag));

    let mut res = if not_modified {
        let mut res = WebResponse::new(String::new().into());
        *res.status_mut() = StatusCode::NOT_MODIFIED;
        res
    } else {
        let body = writer
            .to_str(&resolution.bundle)
            .map_err(|e| GetError::InternalError {
                reason: e.to_string(),
            })?;
        let mut res = WebResponse::new(body.into());
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(writer.content_type()));
        res
    };
    res.headers_mut().insert(ETAG, etag_value);
    res.headers_mut().insert(CACHE_CONTROL, cache_control);
    Ok(res)
}

/// Compares an `If-None-Match` value against a fingerprint. Accepts quoted,
/// unquoted and weak tags, and comma-separated lists.
pub fn etag_matches(header: &str, fingerprint: &str) -> bool {
    header.split(',').map(str::trim).any(|tag| {
        let tag = tag.strip_prefix("W/").unwrap_or(tag);
        tag == "*" || tag.trim_matches('"') == fingerprint
    })
}

fn json_response<T: serde::Serialize>(value: &T) -> Result<WebResponse, GetError> {
    let body = serde_json::to_string(value).map_err(|e| GetError::InternalError {
        reason: e.to_string(),
    })?;
    let mut res = WebResponse::new(body.into());
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(res)
}

fn finish(timer: RequestTimer, result: Result<WebResponse, GetError>) -> Result<WebResponse, GetError> {
    let status = match &result {
        Ok(res) => res.status(),
        Err(e) => e.status(),
    };
    timer.finish(status.as_u16());
    result
}
