//! Portal destination disambiguation.
//!
//! A beam entering a portal with several matching destinations, and no
//! stored choice for that portal, is suspended. The update then hands the
//! interaction layer a [`Mask`]: every tile except the candidate
//! destinations is excluded, and picking one of them through
//! [`Puzzle::choose`](crate::puzzle::Puzzle::choose) stores the choice on the
//! beam and retraces.

use serde::{Deserialize, Serialize};

use lumen_grid::grid::Grid;
use lumen_grid::hex::CubeCoordinate;
use lumen_grid::id::{BeamId, ItemId};
use lumen_ledger::step::Suspended;

use crate::beam::Beam;

/// A selectable destination portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskCandidate {
    pub portal: ItemId,
    pub tile: CubeCoordinate,
}

/// A pending request for the user to pick a portal destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    /// The suspended beam.
    pub beam: BeamId,
    /// The portal the beam entered.
    pub portal: ItemId,
    pub candidates: Vec<MaskCandidate>,
}

impl Mask {
    /// The mask for `beam`, if its path ends suspended.
    pub fn for_beam(beam: &Beam, grid: &Grid) -> Option<Self> {
        let suspended = beam.ledger().last()?.state.first::<Suspended>()?;
        let candidates = suspended
            .candidates
            .iter()
            .filter_map(|&portal| {
                grid.item(portal).map(|item| MaskCandidate {
                    portal,
                    tile: item.tile,
                })
            })
            .collect();
        Some(Self {
            beam: beam.id(),
            portal: suspended.portal,
            candidates,
        })
    }

    /// Whether `tile` is masked out.
    pub fn is_excluded(&self, tile: CubeCoordinate) -> bool {
        self.candidate_at(tile).is_none()
    }

    /// The destination portal on `tile`, if it is a candidate.
    pub fn candidate_at(&self, tile: CubeCoordinate) -> Option<ItemId> {
        self.candidates
            .iter()
            .find(|candidate| candidate.tile == tile)
            .map(|candidate| candidate.portal)
    }

    pub fn tiles(&self) -> impl Iterator<Item = CubeCoordinate> + '_ {
        self.candidates.iter().map(|candidate| candidate.tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask() -> Mask {
        Mask {
            beam: BeamId(0),
            portal: ItemId(1),
            candidates: vec![
                MaskCandidate {
                    portal: ItemId(2),
                    tile: CubeCoordinate::new(2, 0, -2),
                },
                MaskCandidate {
                    portal: ItemId(3),
                    tile: CubeCoordinate::new(0, 2, -2),
                },
            ],
        }
    }

    #[test]
    fn only_candidate_tiles_are_selectable() {
        let mask = mask();
        assert!(!mask.is_excluded(CubeCoordinate::new(2, 0, -2)));
        assert!(mask.is_excluded(CubeCoordinate::ORIGIN));
        assert_eq!(mask.candidate_at(CubeCoordinate::new(0, 2, -2)), Some(ItemId(3)));
        assert_eq!(mask.tiles().count(), 2);
    }
}
