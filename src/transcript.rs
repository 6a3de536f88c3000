//! Append-only chat transcript.
//!
//! DESIGN
//! ======
//! Entries are keyed by `(ts, seq)`. `ts` is the append time in ms, clamped
//! so it never goes below the previous entry's; `seq` is a per-transcript
//! counter. Two appends in the same millisecond therefore get distinct keys
//! and keep their arrival order, and iteration order is key order.
//!
//! Storage is an `Arc<Vec<_>>`: appending to a transcript that is not shared
//! pushes in place, appending to one still held by an older snapshot copies
//! the vector first.

#[cfg(test)]
#[path = "transcript_test.rs"]
mod transcript_test;

use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::event::ChatEvent;
use crate::identity::Role;
use crate::member::MemberSnapshot;

/// Position of an entry in the transcript.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntryKey {
    /// Append time, milliseconds since the Unix epoch.
    pub ts: i64,
    /// Strictly increasing within one transcript.
    pub seq: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub key: EntryKey,
    pub detail: ChatEvent,
    /// Sender snapshot. Absent for join/leave entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberSnapshot>,
}

impl TranscriptEntry {
    /// Role of the sender as recorded at append time.
    #[must_use]
    pub fn role(&self) -> Role {
        self.member
            .as_ref()
            .map_or_else(|| Role::of(self.detail.nick()), MemberSnapshot::role)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Arc<Vec<TranscriptEntry>>,
    next_seq: u64,
}

impl Transcript {
    /// Append an entry and return its key.
    pub fn append(&mut self, now_ms: i64, detail: ChatEvent, member: Option<MemberSnapshot>) -> EntryKey {
        let ts = self.entries.last().map_or(now_ms, |last| now_ms.max(last.key.ts));
        let key = EntryKey {
            ts,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        Arc::make_mut(&mut self.entries).push(TranscriptEntry { key, detail, member });
        key
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TranscriptEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn get(&self, key: EntryKey) -> Option<&TranscriptEntry> {
        self.entries
            .binary_search_by(|e| e.key.cmp(&key))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Entries appended after `key`, oldest first.
    #[must_use]
    pub fn since(&self, key: EntryKey) -> &[TranscriptEntry] {
        let start = self.entries.partition_point(|e| e.key <= key);
        &self.entries[start..]
    }

    /// True when both transcripts share the same storage.
    #[must_use]
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a TranscriptEntry;
    type IntoIter = std::slice::Iter<'a, TranscriptEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Transcript {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}
