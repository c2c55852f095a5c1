//! Journal of terminus connection events.
//!
//! The [`ConnectionJournal`] records every connect, disconnect, activation and
//! deactivation that happens while beams are retraced. Solution checkers and
//! the interaction layer read it after an update instead of diffing terminus
//! state themselves.
//!
//! The journal is cleared at the start of each update via
//! [`ConnectionJournal::clear`] and then populated incrementally as steps are
//! pushed and truncated.
//!
//! # Example
//!
//! ```
//! use lumen_grid::prelude::*;
//! use lumen_ledger::journal::{ConnectionJournal, TerminusEvent};
//!
//! let mut journal = ConnectionJournal::new();
//! journal.record(1, TerminusEvent::Connected {
//!     terminus: ItemId(4),
//!     opening: 0,
//!     beam: BeamId(0),
//! });
//! journal.record(1, TerminusEvent::Activated { terminus: ItemId(4) });
//!
//! assert_eq!(journal.len(), 2);
//! assert_eq!(journal.events_for_terminus(ItemId(4)).count(), 2);
//! assert_eq!(journal.events_for_beam(BeamId(0)).count(), 1);
//! ```

use serde::{Deserialize, Serialize};

use lumen_grid::id::{BeamId, ItemId};

// ---------------------------------------------------------------------------
// TerminusEvent
// ---------------------------------------------------------------------------

/// A discrete change in terminus connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminusEvent {
    /// `beam` now holds `opening`.
    Connected {
        terminus: ItemId,
        opening: usize,
        beam: BeamId,
    },
    /// `beam` released `opening`.
    Disconnected {
        terminus: ItemId,
        opening: usize,
        beam: BeamId,
    },
    /// Every opening became connected.
    Activated { terminus: ItemId },
    /// An opening of an activated terminus lost its connection.
    Deactivated { terminus: ItemId },
}

impl TerminusEvent {
    pub fn terminus(&self) -> ItemId {
        match self {
            TerminusEvent::Connected { terminus, .. }
            | TerminusEvent::Disconnected { terminus, .. }
            | TerminusEvent::Activated { terminus }
            | TerminusEvent::Deactivated { terminus } => *terminus,
        }
    }

    pub fn beam(&self) -> Option<BeamId> {
        match self {
            TerminusEvent::Connected { beam, .. } | TerminusEvent::Disconnected { beam, .. } => {
                Some(*beam)
            }
            TerminusEvent::Activated { .. } | TerminusEvent::Deactivated { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// JournalEntry
// ---------------------------------------------------------------------------

/// A recorded event with its position in the update sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// The update during which the event happened.
    pub update: u64,
    /// Order within the update, starting at 0.
    pub sequence: u64,
    pub event: TerminusEvent,
}

// ---------------------------------------------------------------------------
// ConnectionJournal
// ---------------------------------------------------------------------------

/// Accumulates [`TerminusEvent`]s during an update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionJournal {
    entries: Vec<JournalEntry>,
}

impl ConnectionJournal {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an event.
    pub fn record(&mut self, update: u64, event: TerminusEvent) {
        let sequence = self.entries.len() as u64;
        self.entries.push(JournalEntry {
            update,
            sequence,
            event,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn events(&self) -> impl Iterator<Item = &TerminusEvent> {
        self.entries.iter().map(|entry| &entry.event)
    }

    pub fn events_for_terminus(&self, terminus: ItemId) -> impl Iterator<Item = &TerminusEvent> {
        self.events().filter(move |event| event.terminus() == terminus)
    }

    pub fn events_for_beam(&self, beam: BeamId) -> impl Iterator<Item = &TerminusEvent> {
        self.events().filter(move |event| event.beam() == Some(beam))
    }
}
