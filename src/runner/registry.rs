//! Plugin catalogue and id-keyed registries.
//!
//! A [`PluginModule`] stands in for one plugin source file: a name plus a
//! loader that builds zero or more plugins from the [`PluginContext`]. The
//! [`Catalog`] lists modules in discovery order. Adding a plugin means adding
//! a module to the catalogue; the runner itself never changes.

use super::context::PluginContext;
use super::contracts::Plugin;
use crate::error::Result;
use std::fmt;

type Loader = Box<dyn Fn(&PluginContext) -> Result<Vec<Plugin>> + Send + Sync>;

pub struct PluginModule {
    name: &'static str,
    loader: Loader,
}

impl PluginModule {
    pub fn new<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn(&PluginContext) -> Result<Vec<Plugin>> + Send + Sync + 'static,
    {
        Self {
            name,
            loader: Box::new(loader),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Instantiate every plugin this module defines.
    pub fn load(&self, ctx: &PluginContext) -> Result<Vec<Plugin>> {
        (self.loader)(ctx)
    }
}

impl fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginModule").field("name", &self.name).finish()
    }
}

/// Ordered list of plugin modules.
#[derive(Debug, Default)]
pub struct Catalog {
    modules: Vec<PluginModule>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module; modules are discovered in the order they are added.
    pub fn module<F>(mut self, name: &'static str, loader: F) -> Self
    where
        F: Fn(&PluginContext) -> Result<Vec<Plugin>> + Send + Sync + 'static,
    {
        self.modules.push(PluginModule::new(name, loader));
        self
    }

    pub fn modules(&self) -> &[PluginModule] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Id-keyed plugin map that keeps first-registration order.
///
/// Registering an id twice replaces the earlier plugin but keeps its slot,
/// so the later registration wins without changing iteration order.
pub struct Registry<T: ?Sized> {
    entries: Vec<(String, Box<T>)>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` under `id`, returning the plugin it replaced, if any.
    pub fn insert(&mut self, id: impl Into<String>, item: Box<T>) -> Option<Box<T>> {
        let id = id.into();
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, item)),
            None => {
                self.entries.push((id, item));
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, v)| v.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    #[cfg(test)]
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Keep only entries whose id satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(k, _)| keep(k));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
