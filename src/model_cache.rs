//! Process-wide registry of loaded detectors.
//!
//! A model is loaded on first use and reused by later requests. Running a
//! session needs exclusive access, so each detector has its own lock; the
//! registry lock is only held for lookups, inserts and evictions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use parking_lot::Mutex;
use crate::common::ModelConfig;
use crate::detectors::OrtDetector;
use crate::error::DetectError;
use crate::Result;

pub type SharedDetector = Arc<Mutex<OrtDetector>>;

/// A loaded model and the options it was loaded with.
struct Loaded<T> {
    config: ModelConfig,
    model: Arc<T>,
}

/// Loaded models keyed by weights path.
pub(crate) struct ModelRegistry<T> {
    models: Mutex<HashMap<PathBuf, Arc<OnceLock<Loaded<T>>>>>,
}

impl<T> Default for ModelRegistry<T> {
    fn default() -> Self {
        Self {
            models: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> ModelRegistry<T> {
    /// Returns the model for `config.weights_path`, calling `load` on first use.
    ///
    /// A path already loaded with different options is a `ModelLoad` error.
    /// A failed load leaves no entry behind.
    pub(crate) fn get_or_load(
        &self,
        config: &ModelConfig,
        load: impl FnOnce(&ModelConfig) -> Result<T>,
    ) -> Result<Arc<T>> {
        let slot = {
            let mut models = self.models.lock();
            models
                .entry(config.weights_path.clone())
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .clone()
        };

        let loaded = match slot.get() {
            Some(loaded) => loaded,
            None => match load(config) {
                // Concurrent first requests for one path may each load; only one is kept.
                Ok(model) => slot.get_or_init(|| Loaded {
                    config: config.clone(),
                    model: Arc::new(model),
                }),
                Err(err) => {
                    self.evict_empty(config, &slot);
                    return Err(err);
                }
            },
        };

        if loaded.config != *config {
            return Err(DetectError::ModelLoad(format!(
                "{} is already loaded with different options",
                config.weights_path.display()
            )));
        }
        Ok(loaded.model.clone())
    }

    fn evict_empty(&self, config: &ModelConfig, slot: &Arc<OnceLock<Loaded<T>>>) {
        let mut models = self.models.lock();
        let is_same_empty_slot = models
            .get(&config.weights_path)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && current.get().is_none());
        if is_same_empty_slot {
            models.remove(&config.weights_path);
        }
    }

    pub(crate) fn clear(&self) {
        self.models.lock().clear();
    }

    pub(crate) fn loaded(&self) -> usize {
        self.models
            .lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.models.lock().len()
    }
}

fn registry() -> &'static ModelRegistry<Mutex<OrtDetector>> {
    static REGISTRY: OnceLock<ModelRegistry<Mutex<OrtDetector>>> = OnceLock::new();
    REGISTRY.get_or_init(ModelRegistry::default)
}

/// Returns the detector for `config.weights_path`, loading it on first use.
///
/// The detector is reused only for an identical config; asking for a loaded
/// path with other options fails with [`DetectError::ModelLoad`]. Call
/// [`clear`] first to reload it. A failed load is not cached.
pub fn load_detector(config: &ModelConfig) -> Result<SharedDetector> {
    registry().get_or_load(config, |config| OrtDetector::new(config).map(Mutex::new))
}

/// Drops every cached detector. Requests holding a detector keep it alive
/// until they finish.
pub fn clear() {
    registry().clear();
}

/// Number of models currently cached.
pub fn loaded_models() -> usize {
    registry().loaded()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use super::*;

    fn config(path: &str) -> ModelConfig {
        ModelConfig::new(path)
    }

    #[test]
    fn loads_once_per_path() {
        let registry = ModelRegistry::<String>::default();
        let calls = Cell::new(0);
        let load = |c: &ModelConfig| {
            calls.set(calls.get() + 1);
            Ok(c.weights_path.display().to_string())
        };

        let a = registry.get_or_load(&config("a.onnx"), load).unwrap();
        let b = registry.get_or_load(&config("a.onnx"), load).unwrap();
        registry.get_or_load(&config("b.onnx"), load).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 2);
        assert_eq!(registry.loaded(), 2);
    }

    #[test]
    fn other_options_for_a_loaded_path_are_rejected() {
        let registry = ModelRegistry::<String>::default();
        let load = |_: &ModelConfig| Ok("model".to_string());
        registry.get_or_load(&config("a.onnx"), load).unwrap();

        let relabelled = ModelConfig {
            labels_path: Some(PathBuf::from("other_labels.txt")),
            ..config("a.onnx")
        };
        let stricter = ModelConfig {
            conf_threshold: 0.6,
            ..config("a.onnx")
        };
        for other in [relabelled, stricter] {
            let err = registry.get_or_load(&other, load).unwrap_err();
            assert!(matches!(err, DetectError::ModelLoad(_)), "{err}");
        }

        registry.clear();
        let reloaded = ModelConfig {
            conf_threshold: 0.6,
            ..config("a.onnx")
        };
        assert!(registry.get_or_load(&reloaded, load).is_ok());
    }

    #[test]
    fn failed_loads_leave_no_entries() {
        let registry = ModelRegistry::<String>::default();
        for i in 0..50 {
            let missing = config(&format!("/nonexistent/model_{i}.onnx"));
            let err = registry
                .get_or_load(&missing, |_| Err(DetectError::ModelLoad("missing".to_string())))
                .unwrap_err();
            assert!(matches!(err, DetectError::ModelLoad(_)));
        }
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.loaded(), 0);

        // a later successful load of a failed path is cached
        let path = config("/nonexistent/model_0.onnx");
        registry.get_or_load(&path, |_| Ok("model".to_string())).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
