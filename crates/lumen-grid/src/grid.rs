//! Sparse hex grid: tiles keyed by coordinate, items stored by id.
//!
//! The [`Grid`] owns every [`Item`]. Tiles only hold ordered lists of item ids
//! plus their [`Modifier`]s, and each item keeps a back-reference to its tile
//! coordinate. Both maps are `BTreeMap`s so iteration order is stable, which
//! the tracer relies on for deterministic results.
//!
//! # Mutation
//!
//! After construction the only mutations are the modifier operations issued
//! by the interaction layer: [`rotate_item`](Grid::rotate_item),
//! [`toggle_item`](Grid::toggle_item) and [`move_item`](Grid::move_item).
//! Terminus connections are the tracer's business and go through
//! [`terminus_mut`](Grid::terminus_mut).
//!
//! ```
//! use lumen_grid::prelude::*;
//!
//! let mut grid = Grid::new();
//! let a = CubeCoordinate::ORIGIN;
//! let b = a.neighbor(Direction::EAST);
//! grid.insert_tile(a);
//! grid.insert_tile(b);
//! let wall = grid.place_item(b, ItemKind::Wall, Capabilities::default()).unwrap();
//!
//! let tile_a = grid.tile(a).unwrap();
//! let east = grid.neighboring_tile(tile_a, Direction::EAST).unwrap();
//! assert_eq!(east.items, vec![wall]);
//! assert!(grid.neighboring_tile(tile_a, Direction::WEST).is_none());
//! ```

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::data::{GridData, ItemData, Modifier};
use crate::hex::{CubeCoordinate, Direction, OffsetCoordinate};
use crate::id::{IdSequence, ItemId};
use crate::item::{Capabilities, Item, ItemKind, Rotation};
use crate::terminus::Terminus;
use crate::GridError;

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// A single hex cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub coordinate: CubeCoordinate,
    /// Items in authoring order.
    pub items: Vec<ItemId>,
    pub modifiers: Vec<Modifier>,
}

impl Tile {
    pub fn new(coordinate: CubeCoordinate) -> Self {
        Self {
            coordinate,
            items: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Coordinate-keyed tiles and the items placed on them.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    tiles: BTreeMap<CubeCoordinate, Tile>,
    items: BTreeMap<ItemId, Item>,
    ids: IdSequence,
}

impl Grid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from declarative puzzle data.
    ///
    /// Unknown or malformed item and modifier entries are logged and skipped.
    /// A second exclusive item on the same tile is skipped the same way.
    /// Termini without openings, or with two openings on one edge, are
    /// rejected because they would break the connection invariants.
    pub fn from_data(data: &GridData) -> Result<Self, GridError> {
        let mut grid = Grid::new();

        for (row, columns) in data.tiles.iter().enumerate() {
            for (col, tile_data) in columns.iter().enumerate() {
                let Some(tile_data) = tile_data else {
                    continue;
                };
                let coordinate =
                    OffsetCoordinate::new(row as i32, col as i32).to_cube();
                grid.insert_tile(coordinate);

                for raw in &tile_data.modifiers {
                    match serde_json::from_value::<Modifier>(raw.clone()) {
                        Ok(modifier) => {
                            if let Some(tile) = grid.tiles.get_mut(&coordinate) {
                                tile.modifiers.push(modifier);
                            }
                        }
                        Err(e) => warn!(
                            row,
                            col,
                            error = %e,
                            "skipping unrecognized modifier"
                        ),
                    }
                }

                for raw in &tile_data.items {
                    let item = match serde_json::from_value::<ItemData>(raw.clone()) {
                        Ok(item) => item,
                        Err(e) => {
                            warn!(row, col, error = %e, "skipping unrecognized item");
                            continue;
                        }
                    };
                    match grid.place_item(coordinate, item.kind.into(), item.capabilities) {
                        Ok(_) => {}
                        Err(GridError::TileOccupied { tile, occupant }) => warn!(
                            %tile,
                            %occupant,
                            "skipping item on a tile that already holds an exclusive item"
                        ),
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        debug!(
            tiles = grid.tiles.len(),
            items = grid.items.len(),
            "grid constructed"
        );
        Ok(grid)
    }

    /// Add an empty tile. Existing tiles are left untouched.
    pub fn insert_tile(&mut self, coordinate: CubeCoordinate) {
        self.tiles
            .entry(coordinate)
            .or_insert_with(|| Tile::new(coordinate));
    }

    /// Place a new item on an existing tile and return its id.
    pub fn place_item(
        &mut self,
        coordinate: CubeCoordinate,
        kind: ItemKind,
        capabilities: Capabilities,
    ) -> Result<ItemId, GridError> {
        if let ItemKind::Terminus(terminus) = &kind {
            validate_terminus(coordinate, terminus)?;
        }
        if !self.tiles.contains_key(&coordinate) {
            return Err(GridError::UnknownTile(coordinate));
        }
        if kind.is_exclusive() {
            if let Some(occupant) = self.exclusive_item_at(coordinate) {
                return Err(GridError::TileOccupied {
                    tile: coordinate,
                    occupant,
                });
            }
        }

        let id = self.ids.next_item();
        self.items.insert(
            id,
            Item {
                id,
                tile: coordinate,
                capabilities,
                kind,
            },
        );
        if let Some(tile) = self.tiles.get_mut(&coordinate) {
            tile.items.push(id);
        }
        Ok(id)
    }

    // -- lookup -------------------------------------------------------------

    /// The tile at `coordinate`. There is no wraparound at the edges.
    pub fn tile(&self, coordinate: CubeCoordinate) -> Option<&Tile> {
        self.tiles.get(&coordinate)
    }

    /// The tile adjacent to `tile` in `direction`, if the grid has one.
    pub fn neighboring_tile(&self, tile: &Tile, direction: Direction) -> Option<&Tile> {
        self.tile(tile.coordinate.neighbor(direction))
    }

    /// All tiles in coordinate order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// All items in id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Items on the tile at `coordinate`, in authoring order.
    pub fn items_on(&self, coordinate: CubeCoordinate) -> impl Iterator<Item = &Item> {
        self.tiles
            .get(&coordinate)
            .into_iter()
            .flat_map(|tile| tile.items.iter())
            .filter_map(|id| self.items.get(id))
    }

    /// The wall, reflector, portal or terminus on a tile, if any.
    pub fn exclusive_item_at(&self, coordinate: CubeCoordinate) -> Option<ItemId> {
        self.items_on(coordinate)
            .find(|item| item.kind.is_exclusive())
            .map(|item| item.id)
    }

    /// The terminus on a tile, if any.
    pub fn terminus_at(&self, coordinate: CubeCoordinate) -> Option<(ItemId, &Terminus)> {
        self.items_on(coordinate)
            .find_map(|item| item.as_terminus().map(|t| (item.id, t)))
    }

    /// All termini in id order.
    pub fn termini(&self) -> impl Iterator<Item = (ItemId, &Terminus)> {
        self.items
            .values()
            .filter_map(|item| item.as_terminus().map(|t| (item.id, t)))
    }

    pub fn terminus(&self, id: ItemId) -> Result<&Terminus, GridError> {
        self.item(id)
            .ok_or(GridError::UnknownItem(id))?
            .as_terminus()
            .ok_or(GridError::NotATerminus(id))
    }

    /// Mutable access to a terminus, for connecting and disconnecting beams.
    pub fn terminus_mut(&mut self, id: ItemId) -> Result<&mut Terminus, GridError> {
        self.items
            .get_mut(&id)
            .ok_or(GridError::UnknownItem(id))?
            .as_terminus_mut()
            .ok_or(GridError::NotATerminus(id))
    }

    /// Release every terminus opening. Returns how many were held.
    pub fn clear_connections(&mut self) -> usize {
        let mut cleared = 0;
        for item in self.items.values_mut() {
            if let Some(terminus) = item.as_terminus_mut() {
                for opening in &mut terminus.openings {
                    cleared += usize::from(opening.connection.take().is_some());
                }
            }
        }
        cleared
    }

    // -- modifier operations ------------------------------------------------

    /// Rotate an item one step.
    pub fn rotate_item(&mut self, id: ItemId, rotation: Rotation) -> Result<(), GridError> {
        let item = self.unlocked_item(id)?;
        if !item.capabilities.rotatable {
            return Err(GridError::NotRotatable(id));
        }
        if let Some(item) = self.items.get_mut(&id) {
            item.kind.rotate(rotation.steps());
            debug!(item = %id, kind = item.kind.name(), ?rotation, "item rotated");
        }
        Ok(())
    }

    /// Switch a terminus on or off. Returns the new state.
    pub fn toggle_item(&mut self, id: ItemId) -> Result<bool, GridError> {
        let item = self.unlocked_item(id)?;
        if !item.capabilities.toggleable {
            return Err(GridError::NotToggleable(id));
        }
        let terminus = self.terminus_mut(id)?;
        terminus.on = !terminus.on;
        let on = terminus.on;
        debug!(item = %id, on, "terminus toggled");
        Ok(on)
    }

    /// Move an item to another tile.
    pub fn move_item(&mut self, id: ItemId, to: CubeCoordinate) -> Result<(), GridError> {
        let item = self.unlocked_item(id)?;
        if !item.capabilities.movable {
            return Err(GridError::NotMovable(id));
        }
        let from = item.tile;
        let exclusive = item.kind.is_exclusive();
        if from == to {
            return Ok(());
        }

        let source = self.tile(from).ok_or(GridError::UnknownTile(from))?;
        if source.has_modifier(Modifier::Immutable) {
            return Err(GridError::ImmutableTile(from));
        }
        let destination = self.tile(to).ok_or(GridError::UnknownTile(to))?;
        if destination.has_modifier(Modifier::Immutable) {
            return Err(GridError::ImmutableTile(to));
        }
        if exclusive {
            if let Some(occupant) = self.exclusive_item_at(to) {
                return Err(GridError::TileOccupied { tile: to, occupant });
            }
        }

        if let Some(tile) = self.tiles.get_mut(&from) {
            tile.items.retain(|&other| other != id);
        }
        if let Some(tile) = self.tiles.get_mut(&to) {
            tile.items.push(id);
        }
        if let Some(item) = self.items.get_mut(&id) {
            item.tile = to;
        }
        debug!(item = %id, %from, %to, "item moved");
        Ok(())
    }

    /// Look up an item and reject it if its tile is locked.
    fn unlocked_item(&self, id: ItemId) -> Result<&Item, GridError> {
        let item = self.item(id).ok_or(GridError::UnknownItem(id))?;
        let locked = self
            .tile(item.tile)
            .is_some_and(|tile| tile.has_modifier(Modifier::Lock));
        if locked {
            return Err(GridError::Locked {
                item: id,
                tile: item.tile,
            });
        }
        Ok(item)
    }
}

fn validate_terminus(tile: CubeCoordinate, terminus: &Terminus) -> Result<(), GridError> {
    if terminus.openings.is_empty() {
        return Err(GridError::EmptyTerminus(tile));
    }
    for (index, opening) in terminus.openings.iter().enumerate() {
        if terminus.openings[..index]
            .iter()
            .any(|o| o.direction == opening.direction)
        {
            return Err(GridError::DuplicateOpening {
                tile,
                direction: opening.direction,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
