use std::str::FromStr;

use axum::{
    Router,
    http::{HeaderMap, header},
    routing::get,
};
use mime::Mime;
use ogcard_core::models::OutputFormat;

use crate::AppState;

mod common;
mod render;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(common::get_usage))
        .route("/health", get(common::get_health))
        .route("/render", get(render::get_render).post(render::post_render))
}

pub fn parse_accept(headers: &HeaderMap) -> Vec<Mime> {
    let result = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .iter()
        .flat_map(|s| s.split(','))
        .map(|s| s.trim())
        .filter_map(|s| Mime::from_str(s).ok())
        .collect::<Vec<_>>();
    if result.is_empty() {
        // If no Accept header is present, use */*
        vec![mime::STAR_STAR]
    } else {
        result
    }
}

/// Picks the response encoding. An explicit `format` parameter wins, then the
/// first supported `Accept` entry. Falls back to PNG rather than failing.
pub fn negotiate_format(explicit: Option<OutputFormat>, headers: &HeaderMap) -> OutputFormat {
    if let Some(format) = explicit {
        return format;
    }
    parse_accept(headers).iter().find_map(OutputFormat::from_mime).unwrap_or_default()
}
