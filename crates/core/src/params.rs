//! Request parameter resolution.
//!
//! Raw request input (a query string or a JSON body) is collected into
//! [`RawParams`] and then resolved against the configured [`Defaults`] into a
//! [`ResolvedConfig`]. Nothing in this module fails: absent, empty or
//! unrecognized values are replaced by their defaults.

use serde_json::Value;
use url::form_urlencoded;

use crate::{
    config::Defaults,
    models::{OutputFormat, Ratio, ResolvedConfig, Theme},
};

/// Unvalidated request fields, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub cta: Option<String>,
    pub theme: Option<String>,
    pub ratio: Option<String>,
    pub format: Option<String>,
}

impl RawParams {
    /// Parses a urlencoded query string. The first occurrence of a key wins.
    pub fn from_query(query: &str) -> Self {
        let mut out = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if let Some(slot) = out.slot(&key)
                && slot.is_none()
            {
                *slot = Some(value.into_owned());
            }
        }
        out
    }

    /// Best-effort parse of a JSON request body.
    ///
    /// An empty or malformed body, or a non-object value, yields empty params.
    /// Fields that are not strings are ignored individually.
    pub fn from_json(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_json_value(&value),
            Err(e) => {
                tracing::debug!("Ignoring unparseable request body: {e}");
                Self::default()
            }
        }
    }

    pub fn from_json_value(value: &Value) -> Self {
        let mut out = Self::default();
        let Some(object) = value.as_object() else {
            tracing::debug!("Ignoring non-object request body");
            return out;
        };
        for (key, value) in object {
            if let Some(slot) = out.slot(key) {
                *slot = value.as_str().map(str::to_string);
            }
        }
        out
    }

    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "title" => Some(&mut self.title),
            "subtitle" => Some(&mut self.subtitle),
            "cta" => Some(&mut self.cta),
            "theme" => Some(&mut self.theme),
            "ratio" => Some(&mut self.ratio),
            "format" => Some(&mut self.format),
            _ => None,
        }
    }

    /// The explicitly requested output format, if any.
    pub fn output_format(&self) -> Option<OutputFormat> {
        non_empty(self.format.as_deref()).map(OutputFormat::from_param)
    }
}

/// Resolves raw input into a fully defaulted configuration.
pub fn resolve(raw: &RawParams, defaults: &Defaults) -> ResolvedConfig {
    // At least one character survives so no field resolves to blank text.
    let max_len = defaults.max_text_len.max(1);
    let text = |value: Option<&str>, default: &str| {
        truncate(non_empty(value).unwrap_or(default), max_len)
    };
    ResolvedConfig {
        title: text(raw.title.as_deref(), &defaults.title),
        subtitle: text(raw.subtitle.as_deref(), &defaults.subtitle),
        cta: text(raw.cta.as_deref(), &defaults.cta),
        theme: raw.theme.as_deref().map(Theme::from_param).unwrap_or_default(),
        ratio: raw.ratio.as_deref().map(Ratio::from_param).unwrap_or_default(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}
