//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::LineageService;
use crate::config::Settings;
use crate::infrastructure::store::JsonRecordStore;
use crate::infrastructure::traits::{FileSystem, RealFileSystem, RecordStore};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Persistence collaborator for member records
    pub store: Arc<dyn RecordStore>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = Arc::new(JsonRecordStore::new(fs.clone(), settings.data_dir.clone()));
        Self::with_deps(settings, fs, store)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs, store }
    }

    /// Lineage service using the configured reference policy.
    pub fn lineage_service(&self) -> LineageService {
        LineageService::new(
            self.fs.clone(),
            self.store.clone(),
            self.settings.reference_policy,
        )
    }
}
