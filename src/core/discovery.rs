//! Module discovery over a directory of `*.toml` module definitions
//!
//! A definition file binds a module name (its file stem) to a compiled-in
//! implementation and may override the description or option defaults:
//!
//! ```toml
//! entry = "osscan"
//! description = "Recon against the staging tenant"
//!
//! [options.DEEP_SCAN]
//! value = "false"
//! ```
//!
//! One broken file never stops the others from loading.

use crate::core::error::DiscoveryError;
use crate::core::module::{Catalog, ModuleDescriptor};
use crate::core::options::{ModuleOption, OptionSet};
use crate::core::registry::ModuleRegistry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DEFINITION_EXTENSION: &str = "toml";

#[derive(Debug, Deserialize)]
struct ModuleDefinition {
    entry: Option<String>,
    description: Option<String>,
    #[serde(default)]
    options: BTreeMap<String, OptionOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct OptionOverride {
    value: Option<String>,
    required: Option<bool>,
    description: Option<String>,
}

/// Result of a discovery pass: whatever loaded, plus what did not.
#[derive(Debug, Default)]
pub struct Discovery {
    pub registry: ModuleRegistry,
    pub errors: Vec<DiscoveryError>,
}

pub fn discover(directory: &Path, catalog: &Catalog) -> Discovery {
    let mut discovery = Discovery {
        registry: ModuleRegistry::new(),
        errors: Vec::new(),
    };

    let candidates = match candidates(directory) {
        Ok(c) => c,
        Err(e) => {
            discovery.errors.push(e);
            return discovery;
        }
    };

    let globals = OptionSet::globals();

    for (name, path) in candidates {
        match load(&name, &path, catalog) {
            Ok(Some(descriptor)) => {
                for option in descriptor.options.names().filter(|n| globals.contains(n)) {
                    tracing::warn!(
                        "Module '{}' redeclares global option {}; its value will override the global one",
                        name,
                        option
                    );
                }
                tracing::debug!("Loaded module {} from {}", name, path.display());
                if !discovery.registry.register(descriptor) {
                    tracing::warn!("Duplicate module name '{}' ignored", name);
                }
            }
            Ok(None) => {
                tracing::debug!("Skipping {}: no entry point declared", path.display());
            }
            Err(e) => discovery.errors.push(e),
        }
    }

    discovery
}

/// Definition files in stable (file-name sorted) order, private names excluded.
fn candidates(directory: &Path) -> Result<Vec<(String, PathBuf)>, DiscoveryError> {
    if !directory.is_dir() {
        return Err(DiscoveryError::MissingDirectory(directory.to_path_buf()));
    }

    let read_dir = fs::read_dir(directory).map_err(|source| DiscoveryError::ReadDirectory {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut found = Vec::new();
    for entry in read_dir.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(DEFINITION_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with('_') || stem.starts_with('.') {
            continue;
        }
        found.push((stem.to_string(), path));
    }

    found.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));
    Ok(found)
}

fn load(
    name: &str,
    path: &Path,
    catalog: &Catalog,
) -> Result<Option<ModuleDescriptor>, DiscoveryError> {
    let content = fs::read_to_string(path).map_err(|source| DiscoveryError::ReadDefinition {
        path: path.to_path_buf(),
        source,
    })?;

    let definition: ModuleDefinition =
        toml::from_str(&content).map_err(|source| DiscoveryError::InvalidDefinition {
            path: path.to_path_buf(),
            source,
        })?;

    let Some(entry) = definition.entry else {
        return Ok(None);
    };

    let module = catalog
        .get(&entry)
        .ok_or_else(|| DiscoveryError::UnknownEntry {
            path: path.to_path_buf(),
            entry: entry.clone(),
        })?;

    let mut descriptor = ModuleDescriptor::from_module(name, module);

    if let Some(description) = definition.description {
        descriptor.description = description;
    }

    for (option_name, patch) in definition.options {
        apply_override(&mut descriptor.options, &option_name, patch);
    }

    Ok(Some(descriptor))
}

fn apply_override(options: &mut OptionSet, name: &str, patch: OptionOverride) {
    let mut option = options
        .get(name)
        .cloned()
        .unwrap_or_else(|| ModuleOption::optional("", ""));

    if let Some(value) = patch.value {
        option.value = value;
    }
    if let Some(required) = patch.required {
        option.required = required;
    }
    if let Some(description) = patch.description {
        option.description = description;
    }

    options.insert(name, option);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, content: &str) {
        fs::write(dir.path().join(file), content).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty_not_fatal() {
        let dir = TempDir::new().unwrap();
        let discovery = discover(&dir.path().join("nope"), &Catalog::builtin());
        assert!(discovery.registry.is_empty());
        assert!(matches!(
            discovery.errors.as_slice(),
            [DiscoveryError::MissingDirectory(_)]
        ));
    }

    #[test]
    fn test_order_is_sorted_and_stable() {
        let dir = TempDir::new().unwrap();
        write(&dir, "zeta.toml", "entry = \"osscan\"");
        write(&dir, "alpha.toml", "entry = \"osenum\"");
        write(&dir, "mid.toml", "entry = \"osscan\"");

        let first: Vec<String> = discover(dir.path(), &Catalog::builtin())
            .registry
            .names()
            .map(String::from)
            .collect();
        let second: Vec<String> = discover(dir.path(), &Catalog::builtin())
            .registry
            .names()
            .map(String::from)
            .collect();

        assert_eq!(first, vec!["alpha", "mid", "zeta"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bad_file_does_not_abort_others() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a_broken.toml", "entry = [unterminated");
        write(&dir, "b_unknown.toml", "entry = \"password_spray\"");
        write(&dir, "c_good.toml", "entry = \"osscan\"");

        let discovery = discover(dir.path(), &Catalog::builtin());
        let names: Vec<&str> = discovery.registry.names().collect();
        assert_eq!(names, vec!["c_good"]);
        assert_eq!(discovery.errors.len(), 2);
        assert!(matches!(
            discovery.errors[0],
            DiscoveryError::InvalidDefinition { .. }
        ));
        assert!(matches!(
            discovery.errors[1],
            DiscoveryError::UnknownEntry { .. }
        ));
    }

    #[test]
    fn test_failure_renders_as_single_error_line() {
        let dir = TempDir::new().unwrap();
        write(&dir, "broken.toml", "entry = [unterminated");

        let discovery = discover(dir.path(), &Catalog::builtin());
        let lines: Vec<String> = discovery.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Error loading "));
        assert!(lines[0].contains("broken.toml"));
    }

    #[test]
    fn test_private_and_shapeless_files_skipped_silently() {
        let dir = TempDir::new().unwrap();
        write(&dir, "__init__.toml", "entry = \"osscan\"");
        write(&dir, "_helper.toml", "entry = \"osscan\"");
        write(&dir, "notes.toml", "description = \"no entry point\"");
        write(&dir, "readme.txt", "entry = \"osscan\"");

        let discovery = discover(dir.path(), &Catalog::builtin());
        assert!(discovery.registry.is_empty());
        assert!(discovery.errors.is_empty());
    }

    #[test]
    fn test_overrides_apply() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "staging.toml",
            r#"
entry = "osscan"
description = "Staging recon"

[options.deep_scan]
value = "false"

[options.NOTE]
required = true
description = "Engagement reference"
"#,
        );

        let discovery = discover(dir.path(), &Catalog::builtin());
        let module = discovery.registry.get("staging").unwrap();
        assert_eq!(module.description, "Staging recon");
        assert_eq!(module.options.get("DEEP_SCAN").unwrap().value, "false");
        let note = module.options.get("NOTE").unwrap();
        assert!(note.required);
        assert_eq!(note.value, "");
    }
}
