use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::detect::record::DetectionRecord;
use crate::frame::Frame;

use super::backend::DetectorBackend;

pub type SharedBackend = Arc<Mutex<dyn DetectorBackend>>;

/// Thread-safe registry of detector backends.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect` takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, SharedBackend>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        log::debug!("registered detector backend '{}'", name);
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!(
                "backend '{}' not registered (available: {})",
                name,
                self.list().join(", ")
            ));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<SharedBackend> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<SharedBackend> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run detection on the default backend.
    pub fn detect(&self, frame: &Frame) -> Result<Vec<DetectionRecord>> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no detector backend registered"))?;
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("backend lock poisoned"))?;
        guard.detect(frame)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StubBackend;

    struct EmptyBackend;

    impl DetectorBackend for EmptyBackend {
        fn name(&self) -> &'static str {
            "empty"
        }

        fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectionRecord>> {
            Ok(vec![])
        }
    }

    #[test]
    fn first_registered_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register(EmptyBackend);
        registry.register(StubBackend::new());
        assert_eq!(registry.default_name(), Some("empty"));
        assert_eq!(registry.list(), vec!["empty".to_string(), "stub".to_string()]);

        let frame = Frame::blank(0, 640, 480);
        assert!(registry.detect(&frame).unwrap().is_empty());

        registry.set_default("stub").unwrap();
        assert_eq!(registry.default_name(), Some("stub"));
        assert!(!registry.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn unknown_default_is_rejected() {
        let mut registry = BackendRegistry::new();
        registry.register(EmptyBackend);
        let err = registry.set_default("yolo").unwrap_err();
        assert!(err.to_string().contains("not registered"));
        assert_eq!(registry.default_name(), Some("empty"));
    }

    #[test]
    fn empty_registry_cannot_detect() {
        let registry = BackendRegistry::default();
        assert!(registry.detect(&Frame::blank(0, 1, 1)).is_err());
    }
}
