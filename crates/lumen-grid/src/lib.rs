//! Lumen Grid -- hex coordinates, tiles and optical elements.
//!
//! This crate holds the static half of a beam puzzle: where the tiles are,
//! what sits on them, and how the user may mutate it. Tracing beams across
//! the grid lives in `lumen-engine`.
//!
//! # Quick Start
//!
//! ```
//! use lumen_grid::prelude::*;
//!
//! let data: GridData = serde_json::from_value(serde_json::json!({
//!     "tiles": [[
//!         { "items": [ { "type": "terminus", "on": true, "openings": [ { "direction": 0 } ] } ] },
//!         { "items": [ { "type": "reflector", "direction": 3, "rotatable": true } ] }
//!     ]]
//! })).unwrap();
//!
//! let grid = Grid::from_data(&data).unwrap();
//! assert_eq!(grid.tile_count(), 2);
//! assert_eq!(grid.termini().count(), 1);
//! ```

#![deny(unsafe_code)]

pub mod color;
pub mod data;
pub mod grid;
pub mod hex;
pub mod id;
pub mod item;
pub mod layout;
pub mod terminus;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while building or mutating a grid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A cube coordinate broke the `q + r + s == 0` invariant.
    #[error("invalid cube coordinate ({q}, {r}, {s}): components must sum to zero")]
    InvalidCube { q: i32, r: i32, s: i32 },

    #[error("invalid direction {0}: must be in 0..6")]
    InvalidDirection(u8),

    #[error("invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("no tile at {0}")]
    UnknownTile(hex::CubeCoordinate),

    #[error("{0} does not exist")]
    UnknownItem(id::ItemId),

    #[error("{0} is not a terminus")]
    NotATerminus(id::ItemId),

    #[error("tile {tile} already holds exclusive {occupant}")]
    TileOccupied {
        tile: hex::CubeCoordinate,
        occupant: id::ItemId,
    },

    #[error("terminus at {0} has no openings")]
    EmptyTerminus(hex::CubeCoordinate),

    #[error("terminus at {tile} has more than one opening facing {direction:?}")]
    DuplicateOpening {
        tile: hex::CubeCoordinate,
        direction: hex::Direction,
    },

    #[error("{0} is not movable")]
    NotMovable(id::ItemId),

    #[error("{0} is not rotatable")]
    NotRotatable(id::ItemId),

    #[error("{0} is not toggleable")]
    NotToggleable(id::ItemId),

    #[error("{item} sits on locked tile {tile}")]
    Locked {
        item: id::ItemId,
        tile: hex::CubeCoordinate,
    },

    #[error("tile {0} is immutable")]
    ImmutableTile(hex::CubeCoordinate),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::color::Color;
    pub use crate::data::{GridData, ItemData, ItemKindData, Modifier, OpeningData, TileData};
    pub use crate::grid::{Grid, Tile};
    pub use crate::hex::{CubeCoordinate, Direction, FractionalCube, OffsetCoordinate};
    pub use crate::id::{BeamId, ItemId};
    pub use crate::item::{Capabilities, Filter, Item, ItemKind, Portal, Reflector, Rotation};
    pub use crate::layout::Layout;
    pub use crate::terminus::{Opening, Terminus, TerminusError};
    pub use crate::GridError;
}
