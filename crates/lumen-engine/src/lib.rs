//! Lumen Engine -- deterministic beam tracing over a hex grid.
//!
//! This crate builds on [`lumen_grid`] and [`lumen_ledger`] to provide the
//! puzzle driver: every terminus that is switched on emits one beam per
//! opening, and [`Puzzle::update`](puzzle::Puzzle::update) retraces all of
//! them until their ledgers stop changing. Interaction with reflectors,
//! portals, filters, walls and termini goes through the item collision
//! protocol in [`protocol`].
//!
//! # Quick Start
//!
//! ```
//! use lumen_engine::prelude::*;
//!
//! let json = r##"{
//!     "id": "two-lamps",
//!     "tiles": [[
//!         { "items": [ { "type": "terminus", "on": true, "openings": [ { "direction": 0 } ] } ] },
//!         { "items": [ { "type": "terminus", "on": true, "openings": [ { "direction": 3 } ] } ] }
//!     ]]
//! }"##;
//!
//! let mut puzzle = Puzzle::from_json(json).unwrap();
//! let report = puzzle.update().unwrap();
//!
//! assert!(report.converged);
//! assert!(report.solved);
//! assert!(puzzle.beams().iter().all(|b| b.termination() == Some(Termination::Connected)));
//! ```

#![deny(unsafe_code)]

pub mod beam;
pub mod collision;
pub mod mask;
pub mod protocol;
pub mod puzzle;
pub mod snapshot;
pub mod solution;
pub mod tracer;

use lumen_grid::hex::CubeCoordinate;
use lumen_grid::id::ItemId;
use lumen_grid::terminus::TerminusError;
use lumen_grid::GridError;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the grid crate for convenience.
pub use lumen_grid;

/// Re-export the ledger crate for convenience.
pub use lumen_ledger;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading, updating or interacting with a puzzle.
#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    /// The grid rejected a construction or modifier operation.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Connecting a beam would break a terminus invariant. This means the
    /// tracer produced an inconsistent state and the update is aborted.
    #[error("terminus {terminus} rejected a connection: {source}")]
    Terminus {
        terminus: ItemId,
        #[source]
        source: TerminusError,
    },

    #[error("failed to parse puzzle: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid trace config: {0}")]
    Config(String),

    #[error("no portal destination choice is pending")]
    NoPendingMask,

    /// The chosen tile is masked out.
    #[error("tile {0} is not a candidate destination")]
    ExcludedTile(CubeCoordinate),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use lumen_grid::prelude::*;
    pub use lumen_ledger::prelude::*;

    pub use crate::beam::Beam;
    pub use crate::collision::{CollisionIndex, CollisionLoop, CollisionRecord};
    pub use crate::mask::{Mask, MaskCandidate};
    pub use crate::protocol::{CollisionHandler, ResolveContext, Resolution, Wall};
    pub use crate::puzzle::{ColorPolicy, Puzzle, PuzzleData, TraceConfig, UpdateReport};
    pub use crate::snapshot::{BeamSnapshot, TraceSnapshot};
    pub use crate::solution::SolutionCondition;
    pub use crate::tracer::{BeamTracer, Convergence};
    pub use crate::PuzzleError;
}
