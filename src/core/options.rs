//! Option registry: named, described key/value settings and their merge at run time

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

pub const TARGET: &str = "TARGET";
pub const THREADS: &str = "THREADS";
pub const TIMEOUT: &str = "TIMEOUT";
pub const PROXY: &str = "PROXY";
pub const USER_AGENT: &str = "USER_AGENT";

/// Upper bound on concurrent workers a module may start
pub const MAX_THREADS: usize = 256;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Option names are case-insensitive and stored upper-case.
pub fn canonical(name: &str) -> String {
    name.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOption {
    pub value: String,
    pub required: bool,
    pub description: String,
}

impl ModuleOption {
    /// A required option with no default value
    pub fn required(description: &str) -> Self {
        Self {
            value: String::new(),
            required: true,
            description: description.to_string(),
        }
    }

    /// An optional option with a default value (may be empty)
    pub fn optional(default: &str, description: &str) -> Self {
        Self {
            value: default.to_string(),
            required: false,
            description: description.to_string(),
        }
    }

    pub fn is_set(&self) -> bool {
        !self.value.is_empty()
    }
}

/// Insertion-ordered set of options keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<(String, ModuleOption)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The console-wide options every module run receives
    pub fn globals() -> Self {
        Self::new()
            .with(TARGET, ModuleOption::required("Target OutSystems application URL"))
            .with(THREADS, ModuleOption::optional("10", "Number of threads"))
            .with(TIMEOUT, ModuleOption::optional("30", "Request timeout (seconds)"))
            .with(
                PROXY,
                ModuleOption::optional("", "HTTP proxy (e.g., http://127.0.0.1:8080)"),
            )
            .with(
                USER_AGENT,
                ModuleOption::optional(DEFAULT_USER_AGENT, "User agent string"),
            )
    }

    pub fn with(mut self, name: &str, option: ModuleOption) -> Self {
        self.insert(name, option);
        self
    }

    /// Insert or replace in place, keeping the original position.
    pub fn insert(&mut self, name: &str, option: ModuleOption) {
        let name = canonical(name);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = option,
            None => self.entries.push((name, option)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModuleOption> {
        let name = canonical(name);
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, o)| o)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModuleOption> {
        let name = canonical(name);
        self.entries
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, o)| o)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns false when the option does not exist.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        match self.get_mut(name) {
            Some(option) => {
                option.value = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleOption)> {
        self.entries.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flatten both scopes into one value map. Module values are merged last, so
/// a module option sharing a global name wins.
pub fn resolve(global: &OptionSet, module: &OptionSet) -> ModuleConfig {
    ModuleConfig::from_pairs(
        global
            .iter()
            .chain(module.iter())
            .map(|(name, option)| (name, option.value.clone())),
    )
}

/// Every required option, across both scopes, whose value is empty.
/// Global names come first, in declaration order, without duplicates.
pub fn validate_required(global: &OptionSet, module: &OptionSet) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for (name, option) in global.iter().chain(module.iter()) {
        if option.required && !option.is_set() && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    missing
}

/// Immutable option snapshot built once per `run` and owned by the module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleConfig {
    values: BTreeMap<String, String>,
}

impl ModuleConfig {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (canonical(k.as_ref()), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&canonical(name)).map(|s| s.as_str())
    }

    /// Value if present and non-empty
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// `true` only for a case-insensitive "true"; empty or missing yields the default.
    pub fn flag(&self, name: &str, default: bool) -> bool {
        match self.non_empty(name) {
            Some(v) => v.eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    pub fn parse<T>(&self, name: &str) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self
            .non_empty(name)
            .ok_or_else(|| anyhow::anyhow!("Option {} is not set", canonical(name)))?;
        raw.trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: '{}' ({})", canonical(name), raw, e))
    }

    /// Parse a value, falling back to `default` when missing or empty.
    pub fn parse_or<T>(&self, name: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.non_empty(name) {
            Some(_) => self.parse(name),
            None => Ok(default),
        }
    }

    pub fn target(&self) -> &str {
        self.get(TARGET).unwrap_or("")
    }

    pub fn threads(&self) -> anyhow::Result<usize> {
        Ok(self.parse_or::<usize>(THREADS, 10)?.clamp(1, MAX_THREADS))
    }

    pub fn timeout(&self) -> anyhow::Result<Duration> {
        let secs = self.parse_or::<f64>(TIMEOUT, 30.0)?;
        if !secs.is_finite() || secs <= 0.0 {
            anyhow::bail!("Invalid value for {}: must be a positive number of seconds", TIMEOUT);
        }
        Ok(Duration::from_secs_f64(secs))
    }

    pub fn proxy(&self) -> Option<&str> {
        self.non_empty(PROXY)
    }

    pub fn user_agent(&self) -> &str {
        self.non_empty(USER_AGENT).unwrap_or(DEFAULT_USER_AGENT)
    }
}
