//! Chat transcript state.
//!
//! DESIGN
//! ======
//! Single messages append. History snapshots are merged: the server keeps a
//! sliding window of recent messages and re-sends all of it after every new
//! message. The merge finds where the transcript's last message sits in the
//! snapshot and appends whatever follows it. The transcript may be shorter
//! than the window (history limit) or the window may have slid past the
//! transcript's head; either way only the overlapping run has to match.
//!
//! Repeated identical messages make several positions match. The server's
//! snapshot always ends with at least one message the client has not seen,
//! so positions that leave something to append win over the exact-resend
//! position. A snapshot that matches nowhere replaces the transcript.
#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use crate::net::types::ChatMessage;

/// Outcome of [`ChatState::merge_snapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotMerge {
    /// `added` messages were appended and `evicted` of the oldest dropped.
    Appended { added: usize, evicted: usize },
    /// The transcript was replaced by the snapshot.
    Replaced,
}

#[derive(Clone, Debug, Default)]
pub struct ChatState {
    messages: Vec<ChatMessage>,
    history_limit: Option<usize>,
}

impl ChatState {
    pub fn new(history_limit: Option<usize>) -> Self {
        Self { messages: Vec::new(), history_limit }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append one message. Returns how many of the oldest were evicted to
    /// honour the history limit.
    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.enforce_limit()
    }

    pub fn merge_snapshot(&mut self, snapshot: Vec<ChatMessage>) -> SnapshotMerge {
        if self.messages.is_empty() {
            let added = snapshot.len();
            self.messages = snapshot;
            let evicted = self.enforce_limit();
            return SnapshotMerge::Appended { added, evicted };
        }

        let Some(last_seen) = align(&self.messages, &snapshot) else {
            self.messages = snapshot;
            self.enforce_limit();
            return SnapshotMerge::Replaced;
        };

        let added = snapshot.len() - last_seen - 1;
        self.messages.extend(snapshot.into_iter().skip(last_seen + 1));
        let evicted = self.enforce_limit();
        SnapshotMerge::Appended { added, evicted }
    }

    fn enforce_limit(&mut self) -> usize {
        match self.history_limit {
            Some(limit) if self.messages.len() > limit => {
                let excess = self.messages.len() - limit;
                self.messages.drain(..excess);
                excess
            }
            _ => 0,
        }
    }
}

/// Index in `snapshot` of the transcript's last message, if the two line up.
///
/// Position `p` lines up when the last `min(current.len(), p + 1)` messages
/// of `current` equal the snapshot run ending at `p`. The latest position
/// that still leaves a new message wins; the final position (nothing new)
/// is the fallback.
fn align(current: &[ChatMessage], snapshot: &[ChatMessage]) -> Option<usize> {
    let lines_up = |p: usize| {
        let run = current.len().min(p + 1);
        snapshot[p + 1 - run..=p] == current[current.len() - run..]
    };
    let last = snapshot.len().checked_sub(1)?;
    (0..last).rev().find(|&p| lines_up(p)).or_else(|| lines_up(last).then_some(last))
}
