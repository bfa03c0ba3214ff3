//! Application state management

use std::sync::Arc;

use crate::auth::TokenValidator;
use crate::config::LimitsConfig;
use crate::render::PdfRenderer;

/// Shared, read-only application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    limits: LimitsConfig,
    validator: Arc<dyn TokenValidator>,
    renderer: Arc<dyn PdfRenderer>,
}

impl AppState {
    pub fn new(
        limits: LimitsConfig,
        validator: Arc<dyn TokenValidator>,
        renderer: Arc<dyn PdfRenderer>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                limits,
                validator,
                renderer,
            }),
        }
    }

    /// Request size and time limits
    pub fn limits(&self) -> &LimitsConfig {
        &self.inner.limits
    }

    pub fn validator(&self) -> &dyn TokenValidator {
        self.inner.validator.as_ref()
    }

    /// Owned handle, for render tasks that outlive the handler
    pub fn renderer(&self) -> Arc<dyn PdfRenderer> {
        Arc::clone(&self.inner.renderer)
    }
}
