//! Application name extraction from an OutSystems landing page
//!
//! Reactive and mobile apps load `scripts/<App>.appDefinition.js` and
//! `scripts/<App>.index.js`; older or customised pages only give a hint through
//! the first non-framework script bundle.

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::fmt;

/// Script bundles shipped by the platform itself, never the app name
const FRAMEWORK_BUNDLES: &[&str] = &["OutSystemsReactWidgets", "OutSystemsUI", "OutSystemsMaps"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppNameSource {
    AppDefinition,
    Index,
    ScriptGuess,
}

impl fmt::Display for AppNameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppNameSource::AppDefinition => write!(f, ".appDefinition.js"),
            AppNameSource::Index => write!(f, ".index.js"),
            AppNameSource::ScriptGuess => write!(f, "JS files"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppName {
    pub name: String,
    pub source: AppNameSource,
}

impl AppName {
    /// A guess is reported but should be treated with suspicion
    pub fn is_certain(&self) -> bool {
        self.source != AppNameSource::ScriptGuess
    }
}

const APP_DEFINITION_PATTERN: &str = r"(?i)([^/]+)\.appDefinition\.js";
const INDEX_PATTERN: &str = r"(?i)([^/]+)\.index\.js";
const SCRIPT_PATTERN: &str = r"(?i)scripts/([^/.]+)(?:\.[^/]*)?\.js";

/// Every `src` attribute in document order
fn sources(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("[src]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .map(|src| src.split(['?', '#']).next().unwrap_or(src).to_string())
        .collect()
}

/// Captures of `pattern` across `sources`, in document order
fn captures(pattern: &str, sources: &[String]) -> Vec<String> {
    let Ok(re) = Regex::new(pattern) else {
        return Vec::new();
    };
    sources
        .iter()
        .filter_map(|src| re.captures(src).map(|c| c[1].to_string()))
        .collect()
}

pub fn extract_app_name(html: &str) -> Option<AppName> {
    let sources = sources(html);

    if let Some(name) = captures(APP_DEFINITION_PATTERN, &sources).into_iter().next() {
        return Some(AppName {
            name,
            source: AppNameSource::AppDefinition,
        });
    }

    if let Some(name) = captures(INDEX_PATTERN, &sources).into_iter().next() {
        return Some(AppName {
            name,
            source: AppNameSource::Index,
        });
    }

    captures(SCRIPT_PATTERN, &sources)
        .into_iter()
        .find(|name| !FRAMEWORK_BUNDLES.contains(&name.as_str()))
        .map(|name| AppName {
            name,
            source: AppNameSource::ScriptGuess,
        })
}
