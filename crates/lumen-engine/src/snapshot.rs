//! Trace snapshots with BLAKE3 hashing.
//!
//! A [`TraceSnapshot`] captures everything an update produced: every beam's
//! steps and stored portal choices, plus the opening each beam is connected
//! to. The BLAKE3 hex digest of that state is the determinism check for the
//! tracer: the same grid traced twice, or traced on another machine, must
//! produce the same hash.
//!
//! The update counter is recorded but not hashed, so re-running an update on
//! an unchanged grid keeps the hash stable.
//!
//! # Example
//!
//! ```
//! use lumen_engine::prelude::*;
//!
//! let json = r##"{
//!     "tiles": [[
//!         { "items": [ { "type": "terminus", "on": true, "openings": [ { "direction": 0 } ] } ] },
//!         { "items": [ { "type": "wall" } ] }
//!     ]]
//! }"##;
//! let mut puzzle = Puzzle::from_json(json).unwrap();
//!
//! puzzle.update().unwrap();
//! let first = puzzle.capture_trace();
//! puzzle.update().unwrap();
//! let second = puzzle.capture_trace();
//!
//! assert_eq!(first.hash.len(), 64);
//! assert_eq!(first.hash, second.hash);
//! assert!(second.verify());
//! ```

use serde::{Deserialize, Serialize};

use lumen_grid::id::{BeamId, ItemId};
use lumen_ledger::step::Step;

use crate::puzzle::Puzzle;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// One beam's traced path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamSnapshot {
    pub id: BeamId,
    pub terminus: ItemId,
    pub opening: usize,
    pub steps: Vec<Step>,
    /// Stored portal choices as `(portal, destination)`, ordered by portal.
    pub choices: Vec<(ItemId, ItemId)>,
}

/// A beam holding a terminus opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub terminus: ItemId,
    pub opening: usize,
    pub beam: BeamId,
}

/// The traced state of a puzzle after an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSnapshot {
    /// Number of updates run when the snapshot was taken.
    pub update: u64,
    pub beams: Vec<BeamSnapshot>,
    pub connections: Vec<ConnectionSnapshot>,
    /// BLAKE3 hex digest (64 lowercase hex chars) of `beams` and
    /// `connections`.
    pub hash: String,
}

impl TraceSnapshot {
    /// Recompute the hash and compare it with the recorded one.
    pub fn verify(&self) -> bool {
        compute_hash(&self.beams, &self.connections) == self.hash
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

fn compute_hash(beams: &[BeamSnapshot], connections: &[ConnectionSnapshot]) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        beams: &'a [BeamSnapshot],
        connections: &'a [ConnectionSnapshot],
    }

    let json_bytes = serde_json::to_vec(&HashableState { beams, connections })
        .expect("trace state should always be JSON-serializable");

    blake3::hash(&json_bytes).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Puzzle snapshot methods
// ---------------------------------------------------------------------------

impl Puzzle {
    /// Capture every beam's path and all terminus connections.
    pub fn capture_trace(&self) -> TraceSnapshot {
        let beams: Vec<BeamSnapshot> = self
            .beams()
            .iter()
            .map(|beam| BeamSnapshot {
                id: beam.id(),
                terminus: beam.terminus(),
                opening: beam.opening(),
                steps: beam.steps().to_vec(),
                choices: beam
                    .choices()
                    .iter()
                    .map(|(&portal, &destination)| (portal, destination))
                    .collect(),
            })
            .collect();

        let connections: Vec<ConnectionSnapshot> = self
            .grid()
            .termini()
            .flat_map(|(terminus, state)| {
                state
                    .openings
                    .iter()
                    .enumerate()
                    .filter_map(move |(opening, o)| {
                        o.connection.map(|beam| ConnectionSnapshot {
                            terminus,
                            opening,
                            beam,
                        })
                    })
            })
            .collect();

        let hash = compute_hash(&beams, &connections);
        TraceSnapshot {
            update: self.update_count(),
            beams,
            connections,
            hash,
        }
    }

    /// BLAKE3 hex digest of the current traced state.
    pub fn state_hash(&self) -> String {
        self.capture_trace().hash
    }
}
