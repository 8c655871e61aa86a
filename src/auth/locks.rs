use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Point de sérialisation par email.
///
/// Deux appels concurrents sur le même email s'exécutent l'un après l'autre;
/// des emails différents ne se bloquent pas. Une entrée disparaît dès que plus
/// personne ne la détient.
#[derive(Debug, Default)]
pub struct EmailLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EmailLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exécute `f` en détenant le verrou associé à `email`.
    pub fn with_lock<T>(&self, email: &str, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(email.to_owned()).or_default())
        };

        let result = {
            // `()` carries no state, a poisoned slot is still usable
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // map + this handle: nobody else is waiting on it
        if Arc::strong_count(&slot) == 2 {
            slots.remove(email);
        }
        result
    }

    #[cfg(test)]
    pub fn held(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
