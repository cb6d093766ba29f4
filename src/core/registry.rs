//! Ordered module registry addressed by 1-based position or by name

use crate::core::error::ConsoleError;
use crate::core::module::ModuleDescriptor;

#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false (and keeps the first) if the name is already taken.
    pub fn register(&mut self, descriptor: ModuleDescriptor) -> bool {
        if self.get(&descriptor.name).is_some() {
            return false;
        }
        self.modules.push(descriptor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// 1-based lookup, matching the numbering printed by `show modules`
    pub fn by_index(&self, index: usize) -> Option<&ModuleDescriptor> {
        index.checked_sub(1).and_then(|i| self.modules.get(i))
    }

    /// Resolve a `use` argument. Anything that parses as an integer is a
    /// position; everything else is a name.
    pub fn lookup(&self, identifier: &str) -> Result<&ModuleDescriptor, ConsoleError> {
        match identifier.parse::<i64>() {
            Ok(number) => usize::try_from(number)
                .ok()
                .and_then(|n| self.by_index(n))
                .ok_or(ConsoleError::InvalidModuleNumber(number)),
            Err(_) => self
                .get(identifier)
                .ok_or_else(|| ConsoleError::InvalidModule(identifier.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
