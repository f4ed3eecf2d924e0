use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use ogcard_core::{
    AppError,
    params::{RawParams, resolve},
};
use ogcard_images::template::compose;

use crate::{AppState, handlers::negotiate_format};

pub async fn get_render(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let raw = RawParams::from_query(query.as_deref().unwrap_or_default());
    render(&state, raw, &headers).await
}

/// JSON body variant. A missing or malformed body renders the defaults.
pub async fn post_render(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let mut raw = RawParams::from_json(&body);
    if raw.format.is_none()
        && let Some(query) = query.as_deref()
    {
        raw.format = RawParams::from_query(query).format;
    }
    render(&state, raw, &headers).await
}

async fn render(
    state: &AppState,
    raw: RawParams,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let config = resolve(&raw, &state.config.defaults);
    let explicit_format = raw.output_format();
    let format = negotiate_format(explicit_format, headers);
    tracing::debug!(theme = %config.theme, ratio = %config.ratio, ?format, "Rendering image");

    let svg = compose(&config, state.palettes.get(config.theme), &state.config.brand);
    let renderer = state.renderer.clone();
    let dimensions = config.dimensions();
    let data = tokio::task::spawn_blocking(move || renderer.render(&svg, dimensions, format))
        .await
        .map_err(|e| AppError::Render(e.into()))?
        .map_err(AppError::Render)?;

    let mut out_headers = HeaderMap::new();
    out_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
    out_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600"));
    if explicit_format.is_none() {
        out_headers.insert(header::VARY, HeaderValue::from_static("accept"));
    }
    Ok((out_headers, data).into_response())
}
