//! The in-flight probe table: tracks sent-but-not-yet-resolved probes keyed
//! by ICMP sequence number.
//!
//! A hash map would give O(1) lookup, but the working set is bounded by the
//! outstanding-probe window (at most a handful of seconds of probes at
//! steady pacing), so a flat vector with linear scan is simpler and just as
//! fast in practice (see DESIGN.md).

use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("sequence {0} is already in flight")]
    Duplicate(u16),
}

#[derive(Debug, Clone)]
pub struct ProbeEntry {
    pub sequence: u16,
    pub bytes: Vec<u8>,
    pub send_time: Instant,
}

#[derive(Debug, Default)]
pub struct InFlightTable {
    entries: Vec<ProbeEntry>,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn insert(&mut self, sequence: u16, bytes: Vec<u8>, now: Instant) -> Result<(), TableError> {
        if self.entries.iter().any(|e| e.sequence == sequence) {
            return Err(TableError::Duplicate(sequence));
        }
        self.entries.push(ProbeEntry {
            sequence,
            bytes,
            send_time: now,
        });
        Ok(())
    }

    pub fn find(&self, sequence: u16) -> Option<&ProbeEntry> {
        self.entries.iter().find(|e| e.sequence == sequence)
    }

    pub fn remove(&mut self, sequence: u16) -> Option<ProbeEntry> {
        let idx = self.entries.iter().position(|e| e.sequence == sequence)?;
        Some(self.entries.remove(idx))
    }

    /// Removes every entry whose age is at least `timeout`, returning them.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> Vec<ProbeEntry> {
        let mut expired = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if now.duration_since(self.entries[i].send_time) >= timeout {
                expired.push(self.entries.remove(i));
            } else {
                i += 1;
            }
        }
        expired
    }

    pub fn drain(&mut self) -> Vec<ProbeEntry> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_bytes() -> Vec<u8> {
        vec![1, 2, 3]
    }

    #[test]
    fn insert_then_find_round_trips() {
        let mut table = InFlightTable::new();
        let now = Instant::now();
        table.insert(1, entry_bytes(), now).unwrap();
        let found = table.find(1).unwrap();
        assert_eq!(found.sequence, 1);
        assert_eq!(found.bytes, entry_bytes());
    }

    #[test]
    fn duplicate_insert_fails() {
        let mut table = InFlightTable::new();
        let now = Instant::now();
        table.insert(5, entry_bytes(), now).unwrap();
        let err = table.insert(5, entry_bytes(), now).unwrap_err();
        assert!(matches!(err, TableError::Duplicate(5)));
    }

    #[test]
    fn insert_then_remove_leaves_table_empty() {
        let mut table = InFlightTable::new();
        let now = Instant::now();
        table.insert(9, entry_bytes(), now).unwrap();
        assert_eq!(table.len(), 1);
        let removed = table.remove(9).unwrap();
        assert_eq!(removed.sequence, 9);
        assert!(table.is_empty());
    }

    #[test]
    fn remove_of_absent_sequence_is_silent() {
        let mut table = InFlightTable::new();
        assert!(table.remove(1).is_none());
    }

    #[test]
    fn expire_removes_only_entries_past_timeout() {
        let mut table = InFlightTable::new();
        let old = Instant::now() - Duration::from_secs(5);
        let fresh = Instant::now();
        table.insert(1, entry_bytes(), old).unwrap();
        table.insert(2, entry_bytes(), fresh).unwrap();

        let expired = table.expire(Instant::now(), Duration::from_secs(1));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].sequence, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.find(2).unwrap().sequence, 2);
    }

    #[test]
    fn drain_releases_every_entry() {
        let mut table = InFlightTable::new();
        let now = Instant::now();
        table.insert(1, entry_bytes(), now).unwrap();
        table.insert(2, entry_bytes(), now).unwrap();
        let drained = table.drain();
        assert_eq!(drained.len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn sequence_reuse_after_expiry_is_permitted() {
        let mut table = InFlightTable::new();
        let old = Instant::now() - Duration::from_secs(5);
        table.insert(1, entry_bytes(), old).unwrap();
        table.expire(Instant::now(), Duration::from_secs(1));
        assert!(table.insert(1, entry_bytes(), Instant::now()).is_ok());
    }
}
