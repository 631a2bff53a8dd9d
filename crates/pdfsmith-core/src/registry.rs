//! The backend capability registry.
//!
//! Owns the closed set of known extraction backends, probes their runtime
//! availability once per process, and exposes the deterministic preference
//! order used for selection and fallback.

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::{BackendKind, PdfBackend};

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Environment misconfiguration: nothing downstream can function.
    /// Raised at orchestrator construction, never per call.
    #[error("no PDF extraction backend is available in this environment")]
    NoBackendAvailable,
}

struct Entry {
    backend: Arc<dyn PdfBackend>,
    /// Probe result, set on first use and read-only thereafter. A process
    /// restart is the only reset.
    available: OnceLock<bool>,
}

impl Entry {
    fn available(&self) -> bool {
        *self.available.get_or_init(|| {
            let ok = self.backend.probe();
            debug!(
                backend = self.backend.name(),
                kind = %self.backend.kind(),
                available = ok,
                "probed extraction backend"
            );
            ok
        })
    }
}

/// Sole owner of the known backend set. Safe for concurrent read-only use:
/// probes are idempotent and cached per entry.
pub struct BackendRegistry {
    /// Held in preference order: highest capability first.
    entries: Vec<Entry>,
}

impl BackendRegistry {
    pub fn new(mut backends: Vec<Arc<dyn PdfBackend>>) -> Self {
        backends.sort_by_key(|b| b.kind());
        Self {
            entries: backends
                .into_iter()
                .map(|backend| Entry {
                    backend,
                    available: OnceLock::new(),
                })
                .collect(),
        }
    }

    /// Probe one backend by name. The answer is cached for the remainder
    /// of the process.
    pub fn probe(&self, name: &str) -> bool {
        self.entries
            .iter()
            .filter(|e| e.backend.name().eq_ignore_ascii_case(name))
            .any(Entry::available)
    }

    /// Available backends, best capability first.
    pub fn preference_order(&self) -> Vec<Arc<dyn PdfBackend>> {
        self.entries
            .iter()
            .filter(|e| e.available())
            .map(|e| Arc::clone(&e.backend))
            .collect()
    }

    pub fn ensure_available(&self) -> Result<(), RegistryError> {
        if self.entries.iter().any(Entry::available) {
            Ok(())
        } else {
            Err(RegistryError::NoBackendAvailable)
        }
    }

    /// Select a backend. A named request (backend identifier or capability
    /// label) is honored when that backend is available; otherwise selection
    /// falls back to the best available backend with a non-fatal warning.
    pub fn select(&self, requested: Option<&str>) -> Result<Arc<dyn PdfBackend>, RegistryError> {
        if let Some(name) = requested {
            if let Some(entry) = self.entries.iter().find(|e| {
                e.backend.name().eq_ignore_ascii_case(name)
                    || e.backend.kind().label().eq_ignore_ascii_case(name)
            }) {
                if entry.available() {
                    return Ok(Arc::clone(&entry.backend));
                }
            }
            warn!(
                requested = name,
                "requested backend not available, falling back to auto selection"
            );
        }
        self.preference_order()
            .into_iter()
            .next()
            .ok_or(RegistryError::NoBackendAvailable)
    }

    /// `(name, kind, available)` for every registered backend, in
    /// preference order.
    pub fn statuses(&self) -> Vec<(&'static str, BackendKind, bool)> {
        self.entries
            .iter()
            .map(|e| (e.backend.name(), e.backend.kind(), e.available()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    fn registry(backends: Vec<MockBackend>) -> BackendRegistry {
        BackendRegistry::new(
            backends
                .into_iter()
                .map(|b| Arc::new(b) as Arc<dyn PdfBackend>)
                .collect(),
        )
    }

    #[test]
    fn preference_order_ranks_by_capability() {
        let reg = registry(vec![
            MockBackend::new("basic", BackendKind::Basic),
            MockBackend::new("best", BackendKind::HighFidelity),
            MockBackend::new("layout", BackendKind::LayoutAware),
        ]);
        let order: Vec<&str> = reg.preference_order().iter().map(|b| b.name()).collect();
        assert_eq!(order, vec!["best", "layout", "basic"]);
    }

    #[test]
    fn unavailable_backends_are_excluded() {
        let reg = registry(vec![
            MockBackend::new("best", BackendKind::HighFidelity).unavailable(),
            MockBackend::new("basic", BackendKind::Basic),
        ]);
        let order: Vec<&str> = reg.preference_order().iter().map(|b| b.name()).collect();
        assert_eq!(order, vec!["basic"]);
    }

    #[test]
    fn probe_result_is_cached() {
        let backend = Arc::new(MockBackend::new("best", BackendKind::HighFidelity));
        let reg = BackendRegistry::new(vec![backend.clone() as Arc<dyn PdfBackend>]);

        assert!(reg.probe("best"));
        assert!(reg.probe("best"));
        let _ = reg.preference_order();
        let _ = reg.select(None);

        assert_eq!(backend.probe_count(), 1);
    }

    #[test]
    fn select_honors_available_request() {
        let reg = registry(vec![
            MockBackend::new("best", BackendKind::HighFidelity),
            MockBackend::new("basic", BackendKind::Basic),
        ]);
        let chosen = reg.select(Some("basic")).unwrap();
        assert_eq!(chosen.name(), "basic");
    }

    #[test]
    fn select_accepts_capability_labels() {
        let reg = registry(vec![
            MockBackend::new("best", BackendKind::HighFidelity),
            MockBackend::new("plain", BackendKind::Basic),
        ]);
        assert_eq!(reg.select(Some("high-fidelity")).unwrap().name(), "best");
    }

    #[test]
    fn select_request_is_case_insensitive() {
        let reg = registry(vec![MockBackend::new("basic", BackendKind::Basic)]);
        assert_eq!(reg.select(Some("BASIC")).unwrap().name(), "basic");
    }

    #[test]
    fn select_falls_back_when_request_unavailable() {
        let reg = registry(vec![
            MockBackend::new("best", BackendKind::HighFidelity),
            MockBackend::new("basic", BackendKind::Basic).unavailable(),
        ]);
        let chosen = reg.select(Some("basic")).unwrap();
        assert_eq!(chosen.name(), "best");
    }

    #[test]
    fn select_falls_back_for_unknown_name() {
        let reg = registry(vec![MockBackend::new("basic", BackendKind::Basic)]);
        assert_eq!(reg.select(Some("nonexistent")).unwrap().name(), "basic");
    }

    #[test]
    fn empty_environment_reports_no_backend() {
        let reg = registry(vec![
            MockBackend::new("best", BackendKind::HighFidelity).unavailable(),
        ]);
        assert!(matches!(
            reg.ensure_available(),
            Err(RegistryError::NoBackendAvailable)
        ));
        assert!(reg.select(None).is_err());
    }
}
