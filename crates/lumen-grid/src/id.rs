//! Stable identifiers for items and beams.
//!
//! Both are plain sequential indices handed out at construction time. Items
//! and beams are never destroyed while a puzzle is loaded, so there is no
//! generation counter: an id stays valid for the lifetime of its [`Grid`].
//!
//! [`Grid`]: crate::grid::Grid

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an item placed on a tile.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identity of a beam. One beam exists per terminus opening.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeamId(pub u32);

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

impl fmt::Debug for BeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeamId({})", self.0)
    }
}

impl fmt::Display for BeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "beam#{}", self.0)
    }
}

/// Hands out sequential ids.
#[derive(Debug, Clone, Default)]
pub(crate) struct IdSequence {
    next: u32,
}

impl IdSequence {
    pub(crate) fn next_item(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next += 1;
        id
    }
}
