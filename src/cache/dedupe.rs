//! Request Deduplicator Module
//!
//! Tracks which keys have a fetch in flight so concurrent readers share one
//! backend round trip. Each granted fetch carries a ticket; cancelling a key
//! invalidates the ticket and the late result is dropped.

use std::collections::{BTreeSet, HashMap};

// == Fetch Ticket ==
/// Proof that the holder owns the in-flight fetch for `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a fetch ticket must be handed back through `end`"]
pub struct FetchTicket {
    key: String,
    id: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

// == Request Deduplicator ==
#[derive(Debug, Default)]
pub struct RequestDeduplicator {
    in_flight: HashMap<String, u64>,
    next_id: u64,
}

impl RequestDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    // == Try Begin ==
    /// Grants the fetch for `key` unless one is already running.
    pub fn try_begin(&mut self, key: &str) -> Option<FetchTicket> {
        if self.in_flight.contains_key(key) {
            return None;
        }
        self.next_id += 1;
        self.in_flight.insert(key.to_string(), self.next_id);
        Some(FetchTicket {
            key: key.to_string(),
            id: self.next_id,
        })
    }

    // == End ==
    /// Clears the in-flight marker held by `ticket`.
    ///
    /// Returns false when the ticket was cancelled (or superseded) in the
    /// meantime; the caller must then discard its result.
    pub fn end(&mut self, ticket: &FetchTicket) -> bool {
        match self.in_flight.get(&ticket.key) {
            Some(id) if *id == ticket.id => {
                self.in_flight.remove(&ticket.key);
                true
            }
            _ => false,
        }
    }

    // == Cancel ==
    /// Drops the in-flight marker for `key`. Returns whether one existed.
    pub fn cancel(&mut self, key: &str) -> bool {
        self.in_flight.remove(key).is_some()
    }

    /// Cancels every in-flight fetch.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.in_flight.len();
        self.in_flight.clear();
        count
    }

    /// True while `ticket` still owns its key.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.in_flight.get(&ticket.key) == Some(&ticket.id)
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Keys with a fetch in flight, sorted.
    pub fn loading(&self) -> BTreeSet<String> {
        self.in_flight.keys().cloned().collect()
    }
}
