//! In-memory versioned preference store
//!
//! Updates use optimistic concurrency: callers present the version
//! they read and a mismatch yields `Conflict`, so two concurrent
//! read-modify-write cycles cannot silently drop each other's change.

use std::collections::HashMap;

use async_trait::async_trait;
use cadence_core::PreferenceStore;
use cadence_domain::{
    CadenceError, Preferences, PreferencesPatch, Result, VersionedPreferences,
};
use parking_lot::RwLock;
use tracing::debug;

/// Thread-safe preference store keyed by user id.
///
/// Unknown users read as defaults at version 1, so a first update can
/// present the version it was handed by `get`.
pub struct InMemoryPreferenceStore {
    entries: RwLock<HashMap<String, VersionedPreferences>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Seed a user with explicit preferences at version 1.
    pub fn with_user(self, user_id: impl Into<String>, preferences: Preferences) -> Self {
        self.entries
            .write()
            .insert(user_id.into(), VersionedPreferences { preferences, version: 1 });
        self
    }

    fn default_entry() -> VersionedPreferences {
        VersionedPreferences { preferences: Preferences::default(), version: 1 }
    }
}

impl Default for InMemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get(&self, user_id: &str) -> Result<VersionedPreferences> {
        if let Some(entry) = self.entries.read().get(user_id) {
            return Ok(entry.clone());
        }
        Ok(Self::default_entry())
    }

    async fn update(
        &self,
        user_id: &str,
        expected_version: u64,
        patch: &PreferencesPatch,
    ) -> Result<VersionedPreferences> {
        let mut entries = self.entries.write();
        let entry = entries.entry(user_id.to_string()).or_insert_with(Self::default_entry);

        if entry.version != expected_version {
            return Err(CadenceError::Conflict(format!(
                "preferences for {user_id} are at version {}, caller expected {expected_version}",
                entry.version
            )));
        }

        patch.apply_to(&mut entry.preferences);
        entry.version += 1;
        debug!(user_id, version = entry.version, "preferences updated");
        Ok(entry.clone())
    }
}
