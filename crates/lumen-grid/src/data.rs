//! Declarative puzzle description as authored in JSON.
//!
//! Item and modifier entries are kept as raw [`serde_json::Value`]s here and
//! decoded one by one during [`Grid::from_data`](crate::grid::Grid::from_data),
//! so a single unknown or malformed entry is logged and skipped instead of
//! rejecting the whole puzzle.
//!
//! ```
//! use lumen_grid::data::GridData;
//!
//! let data: GridData = serde_json::from_value(serde_json::json!({
//!     "tiles": [
//!         [ { "items": [ { "type": "wall" } ] }, null ],
//!     ]
//! })).unwrap();
//! assert_eq!(data.tiles[0].len(), 2);
//! assert!(data.tiles[0][1].is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::hex::Direction;
use crate::item::{Capabilities, Filter, ItemKind, Portal, Reflector};
use crate::terminus::{Opening, Terminus};

/// Rows of optional tiles. Row `r`, column `c` is offset coordinate `(r, c)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridData {
    pub tiles: Vec<Vec<Option<TileData>>>,
}

/// One tile: raw item and modifier entries in authoring order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileData {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub modifiers: Vec<serde_json::Value>,
}

/// A decoded item entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemData {
    #[serde(flatten)]
    pub kind: ItemKindData,
    #[serde(flatten)]
    pub capabilities: Capabilities,
}

/// Type-tagged element description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKindData {
    Wall,
    Reflector {
        direction: Direction,
        #[serde(default)]
        double_sided: bool,
    },
    Portal {
        direction: Direction,
    },
    Filter {
        color: Color,
    },
    Terminus {
        openings: Vec<OpeningData>,
        #[serde(default)]
        on: bool,
    },
}

/// An authored opening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningData {
    pub direction: Direction,
    #[serde(default)]
    pub colors: Vec<Color>,
}

impl From<ItemKindData> for ItemKind {
    fn from(data: ItemKindData) -> Self {
        match data {
            ItemKindData::Wall => ItemKind::Wall,
            ItemKindData::Reflector {
                direction,
                double_sided,
            } => ItemKind::Reflector(Reflector {
                direction,
                double_sided,
            }),
            ItemKindData::Portal { direction } => ItemKind::Portal(Portal { direction }),
            ItemKindData::Filter { color } => ItemKind::Filter(Filter { color }),
            ItemKindData::Terminus { openings, on } => ItemKind::Terminus(Terminus {
                openings: openings
                    .into_iter()
                    .map(|o| Opening {
                        direction: o.direction,
                        colors: o.colors,
                        connection: None,
                    })
                    .collect(),
                on,
            }),
        }
    }
}

/// Tile-level interaction rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Modifier {
    /// Items on this tile cannot be moved, rotated or toggled.
    Lock,
    /// Items cannot be moved onto or off this tile.
    Immutable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reflector_with_capabilities() {
        let data: ItemData = serde_json::from_value(serde_json::json!({
            "type": "reflector",
            "direction": 2,
            "rotatable": true
        }))
        .unwrap();
        assert!(data.capabilities.rotatable);
        assert!(!data.capabilities.movable);
        assert!(matches!(
            data.kind,
            ItemKindData::Reflector { direction, double_sided: false } if direction == Direction::SOUTH_WEST
        ));
    }

    #[test]
    fn decode_terminus_openings() {
        let data: ItemData = serde_json::from_value(serde_json::json!({
            "type": "terminus",
            "on": true,
            "openings": [ { "direction": 0, "colors": ["#ff0000"] }, { "direction": 3 } ]
        }))
        .unwrap();
        let kind: ItemKind = data.kind.into();
        let ItemKind::Terminus(terminus) = kind else {
            panic!("expected terminus");
        };
        assert!(terminus.on);
        assert_eq!(terminus.openings.len(), 2);
        assert_eq!(terminus.openings[0].colors, vec![Color::rgb(255, 0, 0)]);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let result: Result<ItemData, _> =
            serde_json::from_value(serde_json::json!({ "type": "black_hole" }));
        assert!(result.is_err());
        let result: Result<Modifier, _> =
            serde_json::from_value(serde_json::json!({ "type": "swap" }));
        assert!(result.is_err());
    }
}
