//! Persona directory

use crate::error::PersonaError;
use dashmap::DashMap;
use std::path::Path;
use tkf_core::Persona;
use tracing::{debug, info, warn};

/// Persona lookup
pub trait PersonaDirectory: Send + Sync {
    /// Persona by id, if known
    fn get(&self, id: &str) -> Option<Persona>;

    /// Every known persona, ordered by id
    fn all(&self) -> Vec<Persona>;
}

/// Concurrent in-memory persona directory
#[derive(Debug, Default)]
pub struct InMemoryPersonaDirectory {
    personas: DashMap<String, Persona>,
}

impl InMemoryPersonaDirectory {
    /// Create empty directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a persona
    pub fn insert(&self, persona: Persona) {
        self.personas.insert(persona.id.clone(), persona);
    }

    /// Number of personas
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.personas.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    /// Load every `*.json` profile in `dir`
    ///
    /// Profiles with an empty id are skipped.
    ///
    /// # Errors
    /// - `PersonaError::Io` when the directory or a profile cannot be read
    /// - `PersonaError::Parse` when a profile is not valid persona JSON
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, PersonaError> {
        let dir = dir.as_ref();
        let directory = Self::new();
        for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
            let path = entry.map_err(io_err(dir))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let raw = std::fs::read_to_string(&path).map_err(io_err(&path))?;
            let persona: Persona = serde_json::from_str(&raw).map_err(|source| PersonaError::Parse {
                path: path.clone(),
                source,
            })?;
            if persona.id.trim().is_empty() {
                warn!(path = %path.display(), "persona profile without id skipped");
                continue;
            }
            debug!(persona_id = %persona.id, "persona loaded");
            directory.insert(persona);
        }

        info!(dir = %dir.display(), personas = directory.len(), "persona directory loaded");
        Ok(directory)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersonaError {
    let path = path.to_path_buf();
    move |source| PersonaError::Io { path, source }
}

impl PersonaDirectory for InMemoryPersonaDirectory {
    fn get(&self, id: &str) -> Option<Persona> {
        self.personas.get(id).map(|entry| entry.value().clone())
    }

    fn all(&self) -> Vec<Persona> {
        let mut all: Vec<Persona> = self.personas.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}
