use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::domain::{ports::ToolAdapter, DomainError, ToolDescriptor, ToolKind};

/// Fixed dispatch table from tool name to adapter, one adapter per [`ToolKind`].
pub struct ToolRegistry {
    adapters: BTreeMap<ToolKind, Arc<dyn ToolAdapter>>,
    names: HashMap<String, ToolKind>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Requires exactly one adapter for every kind, each under a unique name.
    pub fn new(tools: Vec<Arc<dyn ToolAdapter>>) -> Result<Self, DomainError> {
        let mut adapters = BTreeMap::new();
        let mut names = HashMap::new();

        for tool in tools {
            let descriptor = tool.descriptor();
            if names.contains_key(&descriptor.name) {
                return Err(DomainError::config(format!(
                    "tool name `{}` is registered twice",
                    descriptor.name
                )));
            }
            if adapters.contains_key(&descriptor.kind) {
                return Err(DomainError::config(format!(
                    "more than one adapter for {}",
                    descriptor.kind
                )));
            }
            names.insert(descriptor.name.clone(), descriptor.kind);
            adapters.insert(descriptor.kind, tool);
        }

        if let Some(missing) = ToolKind::ALL.iter().find(|k| !adapters.contains_key(*k)) {
            return Err(DomainError::config(format!("no adapter for {missing}")));
        }

        let descriptors = adapters.values().map(|t| t.descriptor()).collect();
        Ok(Self {
            adapters,
            names,
            descriptors,
        })
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    /// Exact name match first, then a case-insensitive one.
    pub fn resolve(&self, name: &str) -> Option<ToolKind> {
        let name = name.trim();
        self.names.get(name).copied().or_else(|| {
            self.names
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, kind)| *kind)
        })
    }

    pub async fn dispatch(&self, name: &str, input: &str) -> Result<String, DomainError> {
        let tool = self
            .resolve(name)
            .and_then(|kind| self.adapters.get(&kind))
            .ok_or_else(|| DomainError::not_found(format!("tool `{name}`")))?;
        tool.invoke(input).await
    }
}
