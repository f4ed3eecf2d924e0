use std::fmt::Write;

use axum::{Json, extract::State};
use ogcard_core::{
    AppError, FullUri,
    models::{Ratio, Theme},
    util::UrlExt,
};
use serde::Serialize;
use url::Url;

use crate::AppState;

/// Plain-text usage for the render endpoint.
pub async fn get_usage(
    FullUri(uri): FullUri,
    State(state): State<AppState>,
) -> Result<String, AppError> {
    let base = Url::parse(&uri.to_string()).or_else(|_| Url::parse("http://localhost/"))?;
    let render_url = base.with_path("/render");
    let defaults = &state.config.defaults;
    let themes = Theme::ALL.map(Theme::as_str).join(" | ");
    let ratios = Ratio::ALL
        .map(|ratio| {
            let dims = ratio.dimensions();
            format!("{} ({}x{})", ratio, dims.width, dims.height)
        })
        .join(" | ");

    let mut out = String::new();
    writeln!(out, "Social share image renderer\n")?;
    writeln!(out, "GET  {}?title=&subtitle=&cta=&theme=&ratio=&format=", render_url)?;
    writeln!(out, "POST {} with a JSON body using the same fields\n", render_url)?;
    writeln!(out, "All parameters are optional:")?;
    writeln!(out, "  title     headline (default: {:?})", defaults.title)?;
    writeln!(out, "  subtitle  subheading (default: {:?})", defaults.subtitle)?;
    writeln!(out, "  cta       button text (default: {:?})", defaults.cta)?;
    writeln!(out, "  theme     {} (default: {})", themes, Theme::default())?;
    writeln!(out, "  ratio     {} (default: {})", ratios, Ratio::default())?;
    writeln!(out, "  format    png | webp | jpeg | svg (default: from Accept, else png)\n")?;
    writeln!(out, "Unrecognized values fall back to the defaults.\n")?;
    writeln!(out, "Example:")?;
    writeln!(
        out,
        "  {}",
        render_url.with_query_pairs(&[
            ("title", defaults.title.as_str()),
            ("theme", "purple"),
            ("ratio", "4:5"),
        ])
    )?;
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
