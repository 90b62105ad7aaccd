//! Fabric configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default capacity of the update history
pub const DEFAULT_MAX_UPDATES: usize = 100_000;

/// How concurrent admissions interact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMode {
    /// Semantic checks of concurrent admissions overlap; each checks against
    /// the content as it was when the admission started.
    #[default]
    Concurrent,
    /// Admissions run one at a time in submission order; each checks against
    /// every previously decided admission.
    Serializable,
}

/// Admission engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricConfig {
    /// Maximum number of recorded update attempts
    pub max_updates: usize,
    /// Concurrency mode
    pub admission_mode: AdmissionMode,
    /// Deadline for the semantic check phase; `None` waits indefinitely
    pub check_timeout_secs: Option<u64>,
}

impl FabricConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With history capacity
    #[inline]
    #[must_use]
    pub fn with_max_updates(mut self, max: usize) -> Self {
        self.max_updates = max;
        self
    }

    /// With admission mode
    #[inline]
    #[must_use]
    pub fn with_admission_mode(mut self, mode: AdmissionMode) -> Self {
        self.admission_mode = mode;
        self
    }

    /// With check deadline
    #[inline]
    #[must_use]
    pub fn with_check_timeout(mut self, secs: Option<u64>) -> Self {
        self.check_timeout_secs = secs;
        self
    }

    /// Check deadline as a duration
    #[inline]
    #[must_use]
    pub fn check_timeout(&self) -> Option<Duration> {
        self.check_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            max_updates: DEFAULT_MAX_UPDATES,
            admission_mode: AdmissionMode::Concurrent,
            check_timeout_secs: Some(60),
        }
    }
}
