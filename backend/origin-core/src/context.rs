//! Process-scoped context shared by the asset server, the interceptor and the host.
//!
//! Exactly one context should exist per process. Instead of an implicit static the
//! host owns a [`ContextCell`]: the first caller of [`ContextCell::get_or_init`]
//! builds the context and every later caller receives the same `Arc`. Tests build
//! their own cells so they never share state.

use crate::config::CoreConfig;
use crate::locator::ResourceLocator;
use crate::virtual_path::VirtualPathResolver;

use std::sync::Arc;

use log::info;
use once_cell::sync::OnceCell;

/// Configuration, path mapping and resource access shared across components.
pub struct CoreContext {
    config: CoreConfig,
    resolver: Arc<VirtualPathResolver>,
    locator: Arc<dyn ResourceLocator>,
}

impl CoreContext {
    pub fn new(mut config: CoreConfig, locator: Arc<dyn ResourceLocator>) -> Self {
        config.normalize();
        let resolver = Arc::new(VirtualPathResolver::from_config(&config.paths));
        Self {
            config,
            resolver,
            locator,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<VirtualPathResolver> {
        &self.resolver
    }

    pub fn locator(&self) -> &Arc<dyn ResourceLocator> {
        &self.locator
    }
}

/// Single-initialization holder for a [`CoreContext`].
pub struct ContextCell {
    inner: OnceCell<Arc<CoreContext>>,
}

impl ContextCell {
    pub const fn new() -> Self {
        Self {
            inner: OnceCell::new(),
        }
    }

    /// The process-wide cell for hosts that want one.
    pub fn global() -> &'static ContextCell {
        static GLOBAL: ContextCell = ContextCell::new();
        &GLOBAL
    }

    /// Return the existing context, building it with `init` on first use.
    pub fn get_or_init<F>(&self, init: F) -> Arc<CoreContext>
    where
        F: FnOnce() -> CoreContext,
    {
        Arc::clone(self.inner.get_or_init(|| {
            info!("Creating process-scoped core context");
            Arc::new(init())
        }))
    }

    pub fn get(&self) -> Option<Arc<CoreContext>> {
        self.inner.get().cloned()
    }
}

impl Default for ContextCell {
    fn default() -> Self {
        Self::new()
    }
}
