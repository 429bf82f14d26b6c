//! Persisted single-slot hunt progress.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;
use thiserror::Error;

/// Key under which the progress record is stored.
pub const PROGRESS_KEY: &str = "huntProgress";

/// Where the player is inside a hunt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HuntProgress {
    pub hunt_id: String,
    pub challenge_index: usize,
}

/// Durable client-side key-value store backing the progress tracker.
/// Platform-specific implementations should provide this
pub trait PersistenceStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Delete a value. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be modified.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value, for inspection.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl PersistenceStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("progress store error: {0}")]
    Store(Box<dyn std::error::Error + Send + Sync>),
    #[error("progress record could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProgressError {
    fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(err))
    }
}

/// Reads and writes the progress record, enforcing forward-only movement.
#[derive(Debug, Clone)]
pub struct ProgressTracker<S> {
    store: S,
}

impl<S: PersistenceStore> ProgressTracker<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Persist progress, replacing any record for another hunt.
    ///
    /// For the hunt already on record the index never moves backwards; a lower index
    /// leaves the stored record in place. Returns the index now on record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the existing record is unreadable.
    pub fn save(&self, hunt_id: &str, challenge_index: usize) -> Result<usize, ProgressError> {
        if let Some(existing) = self.load()?
            && existing.hunt_id == hunt_id
            && existing.challenge_index > challenge_index
        {
            log::debug!(
                "progress for {hunt_id} stays at {} (asked {challenge_index})",
                existing.challenge_index
            );
            return Ok(existing.challenge_index);
        }
        self.write(&HuntProgress {
            hunt_id: hunt_id.to_string(),
            challenge_index,
        })?;
        Ok(challenge_index)
    }

    /// Begin a hunt at its first challenge, overwriting whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn restart(&self, hunt_id: &str) -> Result<(), ProgressError> {
        self.write(&HuntProgress {
            hunt_id: hunt_id.to_string(),
            challenge_index: 0,
        })
    }

    fn write(&self, progress: &HuntProgress) -> Result<(), ProgressError> {
        let json = serde_json::to_string(progress)?;
        self.store
            .set(PROGRESS_KEY, &json)
            .map_err(ProgressError::store)
    }

    /// Load the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the record is not valid JSON.
    pub fn load(&self) -> Result<Option<HuntProgress>, ProgressError> {
        let Some(raw) = self.store.get(PROGRESS_KEY).map_err(ProgressError::store)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Load the stored record, discarding it when it cannot be decoded.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store itself fails.
    pub fn load_or_reset(&self) -> Result<Option<HuntProgress>, ProgressError> {
        match self.load() {
            Ok(progress) => Ok(progress),
            Err(ProgressError::Decode(err)) => {
                log::warn!("discarding unreadable progress record: {err}");
                self.clear()?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Remove the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn clear(&self) -> Result<(), ProgressError> {
        self.store
            .remove(PROGRESS_KEY)
            .map_err(ProgressError::store)
    }

    /// Clamp a requested challenge index to what the player has earned.
    ///
    /// Without progress for `hunt_id` only the first challenge is allowed; with it the
    /// request is clamped down to the stored index, never up.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store itself fails.
    pub fn validate_requested_index(
        &self,
        hunt_id: &str,
        requested_index: usize,
    ) -> Result<usize, ProgressError> {
        let allowed = match self.load_or_reset()? {
            Some(progress) if progress.hunt_id == hunt_id => {
                requested_index.min(progress.challenge_index)
            }
            _ => 0,
        };
        if allowed != requested_index {
            log::warn!("requested challenge {requested_index} of {hunt_id} clamped to {allowed}");
        }
        Ok(allowed)
    }
}
