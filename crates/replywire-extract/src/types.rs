//! Selector and extraction result types — matching the control panel's wire
//! shapes.

use replywire_core::{SelectorMethod, Settings};
use serde::{Deserialize, Serialize};

/// Addressing scheme for a selector expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorKind {
    #[serde(rename = "css")]
    Css,
    #[serde(rename = "path-query")]
    PathQuery,
}

/// An addressing expression identifying elements to extract text from.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    kind: SelectorKind,
    expression: String,
}

impl Selector {
    /// A CSS selector.
    pub fn css(expression: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Css,
            expression: expression.into(),
        }
    }

    /// A path-query selector (slash-separated tree path).
    pub fn path_query(expression: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::PathQuery,
            expression: expression.into(),
        }
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Resolve persisted settings into the ordered selector list the
    /// monitoring session should evaluate. Custom entries are always CSS.
    pub fn from_settings(settings: &Settings) -> Vec<Selector> {
        settings
            .effective_expressions()
            .into_iter()
            .map(|(method, expr)| match method {
                SelectorMethod::PathQuery => Selector::path_query(expr),
                _ => Selector::css(expr),
            })
            .collect()
    }
}

/// Outcome of one extraction attempt. Produced fresh on every attempt and
/// never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Optional identifying token associated with the matched message,
    /// e.g. a counterpart address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResult {
    pub fn matched(text: String, auxiliary: Option<String>) -> Self {
        Self {
            ok: true,
            text: Some(text),
            auxiliary,
            error: None,
        }
    }

    pub fn miss(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: None,
            auxiliary: None,
            error: Some(error.into()),
        }
    }
}
