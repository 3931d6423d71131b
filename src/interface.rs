//! Shared, thread-safe access to a categorization.
//!
//! The engine itself is single-threaded: every operation needs exclusive
//! access. [`SharedCategorization`] serializes access behind a mutex and
//! fans each view change out to subscribers over channels, in the order
//! the changes were made. A poisoned lock is reported as an error instead
//! of being recovered.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use tracing::{debug, warn};

use crate::categorization::Categorization;
use crate::change::ViewChange;
use crate::error::{CategorizationError, Result};
use crate::record::Record;

pub struct SharedCategorization<R: Record> {
    inner: Arc<Mutex<Categorization<R>>>,
    subscribers: Arc<Mutex<Vec<Sender<ViewChange>>>>,
}

impl<R: Record> Clone for SharedCategorization<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<R: Record> SharedCategorization<R> {
    pub fn new(categorization: Categorization<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(categorization)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Categorization<R>>> {
        self.inner
            .lock()
            .map_err(|e| CategorizationError::Lock(e.to_string()))
    }
    fn try_lock(&self) -> Result<MutexGuard<'_, Categorization<R>>> {
        match self.inner.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(CategorizationError::Contended(
                "categorization is in use".to_string(),
            )),
            Err(TryLockError::Poisoned(e)) => Err(CategorizationError::Lock(e.to_string())),
        }
    }

    /// Runs `f` with shared access, waiting for the lock.
    pub fn read<T>(&self, f: impl FnOnce(&Categorization<R>) -> T) -> Result<T> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }
    /// Like [`SharedCategorization::read`] but fails instead of waiting.
    pub fn try_read<T>(&self, f: impl FnOnce(&Categorization<R>) -> T) -> Result<T> {
        let guard = self.try_lock()?;
        Ok(f(&guard))
    }
    /// Runs a mutation with exclusive access. Every change the view goes
    /// through during `f` is published to the subscribers, one by one and
    /// before the lock is given up, even when a later step of `f` fails.
    pub fn mutate(
        &self,
        f: impl FnOnce(&mut Categorization<R>) -> Result<ViewChange>,
    ) -> Result<ViewChange> {
        let mut guard = self.lock()?;
        self.journaled(&mut guard, f)
    }
    pub fn try_mutate(
        &self,
        f: impl FnOnce(&mut Categorization<R>) -> Result<ViewChange>,
    ) -> Result<ViewChange> {
        let mut guard = self.try_lock()?;
        self.journaled(&mut guard, f)
    }
    fn journaled(
        &self,
        categorization: &mut Categorization<R>,
        f: impl FnOnce(&mut Categorization<R>) -> Result<ViewChange>,
    ) -> Result<ViewChange> {
        categorization.journal = Some(Vec::new());
        let outcome = f(categorization);
        let journal = categorization.journal.take().unwrap_or_default();
        if outcome.is_err() && !journal.is_empty() {
            warn!(published = journal.len(), "mutation failed after changing the view");
        }
        for change in &journal {
            self.publish(change)?;
        }
        outcome
    }

    /// Receives every non-empty change made from now on.
    pub fn subscribe(&self) -> Result<Receiver<ViewChange>> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .map_err(|e| CategorizationError::Lock(e.to_string()))?
            .push(tx);
        Ok(rx)
    }
    fn publish(&self, change: &ViewChange) -> Result<()> {
        if change.is_empty() {
            return Ok(());
        }
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|e| CategorizationError::Lock(e.to_string()))?;
        let before = subscribers.len();
        // a failed send means the receiver is gone
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
        if subscribers.len() < before {
            debug!(dropped = before - subscribers.len(), "subscribers went away");
        }
        Ok(())
    }

    // ------------- conveniences -------------
    pub fn insert_item(&self, record: R) -> Result<ViewChange> {
        self.mutate(|c| c.insert_item(record))
    }
    pub fn update_item(&self, record: R) -> Result<ViewChange> {
        self.mutate(|c| c.update_item(record))
    }
    pub fn update_items(&self, records: Vec<R>) -> Result<ViewChange> {
        self.mutate(|c| c.update_items(records))
    }
    pub fn remove_item(&self, key: &R::Key) -> Result<ViewChange> {
        self.mutate(|c| c.remove_item(key))
    }
    pub fn recompute(&self) -> Result<ViewChange> {
        self.mutate(|c| c.recompute())
    }
    /// A copy of the working view as it stands.
    pub fn view(&self) -> Result<Vec<R>> {
        self.read(|c| c.working_view().cloned().collect())
    }
    pub fn is_poisoned(&self) -> bool {
        let poisoned = self.inner.is_poisoned();
        if poisoned {
            warn!("categorization lock is poisoned");
        }
        poisoned
    }
}
