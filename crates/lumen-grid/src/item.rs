//! Optical elements placed on tiles.
//!
//! [`ItemKind`] is a closed set: walls, reflectors, portals, filters and
//! termini. What the user may do with an item is described separately by
//! [`Capabilities`], so any kind can be made movable, rotatable or toggleable
//! without a type hierarchy.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::hex::{CubeCoordinate, Direction};
use crate::id::ItemId;
use crate::terminus::Terminus;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// User interactions an item supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub movable: bool,
    pub rotatable: bool,
    pub toggleable: bool,
}

/// Sense of a rotation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    #[inline]
    pub fn steps(self) -> i32 {
        match self {
            Rotation::Clockwise => 1,
            Rotation::CounterClockwise => -1,
        }
    }
}

// ---------------------------------------------------------------------------
// Element payloads
// ---------------------------------------------------------------------------

/// A mirror. `direction` is the normal of its reflective face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflector {
    pub direction: Direction,
    /// Whether the back face reflects too.
    #[serde(default)]
    pub double_sided: bool,
}

/// A teleporter. Beams leave a destination portal heading opposite to its
/// `direction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub direction: Direction,
}

/// Tints beams passing through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub color: Color,
}

/// The element-specific part of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Wall,
    Reflector(Reflector),
    Portal(Portal),
    Filter(Filter),
    Terminus(Terminus),
}

impl ItemKind {
    /// Short lowercase name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Wall => "wall",
            ItemKind::Reflector(_) => "reflector",
            ItemKind::Portal(_) => "portal",
            ItemKind::Filter(_) => "filter",
            ItemKind::Terminus(_) => "terminus",
        }
    }

    /// Whether this kind occupies its tile exclusively.
    ///
    /// A tile holds at most one blocking element; filters can share.
    pub fn is_exclusive(&self) -> bool {
        !matches!(self, ItemKind::Filter(_))
    }

    /// Rotate every directional part of the element.
    pub fn rotate(&mut self, steps: i32) {
        match self {
            ItemKind::Wall | ItemKind::Filter(_) => {}
            ItemKind::Reflector(reflector) => {
                reflector.direction = reflector.direction.rotate(steps);
            }
            ItemKind::Portal(portal) => portal.direction = portal.direction.rotate(steps),
            ItemKind::Terminus(terminus) => terminus.rotate(steps),
        }
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// An element placed on a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Back-reference to the tile holding this item. The grid owns the item.
    pub tile: CubeCoordinate,
    pub capabilities: Capabilities,
    pub kind: ItemKind,
}

impl Item {
    pub fn as_terminus(&self) -> Option<&Terminus> {
        match &self.kind {
            ItemKind::Terminus(terminus) => Some(terminus),
            _ => None,
        }
    }

    pub fn as_terminus_mut(&mut self) -> Option<&mut Terminus> {
        match &mut self.kind {
            ItemKind::Terminus(terminus) => Some(terminus),
            _ => None,
        }
    }

    pub fn as_portal(&self) -> Option<&Portal> {
        match &self.kind {
            ItemKind::Portal(portal) => Some(portal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_reflector_wraps() {
        let mut kind = ItemKind::Reflector(Reflector {
            direction: Direction::NORTH_EAST,
            double_sided: false,
        });
        kind.rotate(Rotation::Clockwise.steps());
        assert_eq!(
            kind,
            ItemKind::Reflector(Reflector {
                direction: Direction::EAST,
                double_sided: false
            })
        );
    }

    #[test]
    fn walls_and_filters_ignore_rotation() {
        let mut wall = ItemKind::Wall;
        wall.rotate(2);
        assert_eq!(wall, ItemKind::Wall);
        assert!(!ItemKind::Filter(Filter { color: Color::WHITE }).is_exclusive());
        assert!(ItemKind::Wall.is_exclusive());
    }
}
