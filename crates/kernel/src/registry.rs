use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Module};

/// Registry holding every feature module, in registration order.
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Get all registered modules
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Initialize modules in registration order
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    struct TestModule {
        name: &'static str,
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
    }

    #[test]
    fn test_get_module_by_name() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule { name: "books" }));
        registry.register(Arc::new(TestModule { name: "users" }));

        assert!(registry.get_module("books").is_some());
        assert!(registry.get_module("users").is_some());
        assert!(registry.get_module("orders").is_none());
    }

    #[tokio::test]
    async fn test_module_initialization() {
        let mut registry = ModuleRegistry::new();
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        registry.register(Arc::new(TestModule { name: "test" }));
        registry.init_modules(&ctx).await.unwrap();
    }
}
