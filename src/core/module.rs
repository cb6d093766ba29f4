//! Module contract and the compiled-in catalog of implementations

use crate::core::options::{ModuleConfig, OptionSet};
use crate::core::workspace::WorkspaceManager;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A runnable security-testing module.
///
/// `description` and `options` describe the module to the console; `run`
/// receives the resolved option snapshot and a handle on the active workspace.
/// Reporting happens through stdout and `WorkspaceManager::save_scan_results`.
#[async_trait]
pub trait Module: Send + Sync {
    /// Identifier referenced by `entry` in module definition files
    fn id(&self) -> &'static str;

    fn description(&self) -> &str;

    /// Default option schema
    fn options(&self) -> OptionSet;

    async fn run(&self, config: ModuleConfig, workspace: &WorkspaceManager) -> anyhow::Result<()>;
}

/// A discovered module, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct ModuleDescriptor {
    pub name: String,
    pub description: String,
    pub options: OptionSet,
    pub entry: Arc<dyn Module>,
}

impl ModuleDescriptor {
    /// Descriptor carrying the implementation's own description and schema
    pub fn from_module(name: &str, module: Arc<dyn Module>) -> Self {
        Self {
            name: name.to_string(),
            description: module.description().to_string(),
            options: module.options(),
            entry: module,
        }
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("entry", &self.entry.id())
            .finish()
    }
}

/// The set of module implementations linked into this binary.
#[derive(Clone, Default)]
pub struct Catalog {
    modules: Vec<Arc<dyn Module>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All modules shipped with the console
    pub fn builtin() -> Self {
        Self::new()
            .with(Arc::new(crate::modules::osenum::OsEnum))
            .with(Arc::new(crate::modules::osscan::OsScan))
    }

    pub fn with(mut self, module: Arc<dyn Module>) -> Self {
        self.register(module);
        self
    }

    /// Later registrations replace earlier ones with the same id.
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.retain(|m| m.id() != module.id());
        self.modules.push(module);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Module>> {
        self.modules.iter().find(|m| m.id() == id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.modules.iter().map(|m| m.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_recon_modules() {
        let catalog = Catalog::builtin();
        assert!(catalog.get("osscan").is_some());
        assert!(catalog.get("osenum").is_some());
        assert!(catalog.get("password_spray").is_none());
    }

    #[test]
    fn test_descriptor_copies_schema() {
        let module = Catalog::builtin().get("osscan").unwrap();
        let descriptor = ModuleDescriptor::from_module("osscan", module);
        assert!(descriptor.options.contains("DEEP_SCAN"));
        assert!(!descriptor.description.is_empty());
    }
}
