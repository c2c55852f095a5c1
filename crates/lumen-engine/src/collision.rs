//! Cross-beam aggregation of collisions.
//!
//! After an update, every beam whose path ended in a [`Collision`] is indexed
//! in a [`CollisionIndex`]. Beams that ran into each other are then grouped
//! into [`CollisionLoop`]s: starting from a seed beam, every beam named by a
//! member's collision, or naming a member in its own, joins the loop until
//! the set stops growing.
//!
//! The index is rebuilt from the ledgers on every update and never carried
//! over, so it always matches the current paths.
//!
//! # Example
//!
//! ```
//! use lumen_engine::prelude::*;
//!
//! // Two lamps firing at each other across an empty tile.
//! let json = r##"{
//!     "tiles": [[
//!         { "items": [ { "type": "terminus", "on": true, "openings": [ { "direction": 0 } ] } ] },
//!         {},
//!         { "items": [ { "type": "terminus", "on": true, "openings": [ { "direction": 3 } ] } ] }
//!     ]]
//! }"##;
//! let mut puzzle = Puzzle::from_json(json).unwrap();
//! let report = puzzle.update().unwrap();
//!
//! assert_eq!(report.collision_loops.len(), 1);
//! let collision_loop = &report.collision_loops[0];
//! assert_eq!(collision_loop.beams().count(), 2);
//! assert_eq!(collision_loop.step_indices(BeamId(0)), &[1]);
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use lumen_grid::id::{BeamId, ItemId};
use lumen_ledger::step::Collision;

use crate::beam::Beam;

// ---------------------------------------------------------------------------
// CollisionRecord
// ---------------------------------------------------------------------------

/// A collision fact found in a beam's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    /// Index of the step carrying the fact.
    pub step: usize,
    pub point: DVec2,
    pub item: Option<ItemId>,
    /// The beam collided with. Equal to the owner for self-crossings.
    pub beam: Option<BeamId>,
}

// ---------------------------------------------------------------------------
// CollisionIndex
// ---------------------------------------------------------------------------

/// Beam -> collisions, memoized for one update.
#[derive(Debug, Clone, Default)]
pub struct CollisionIndex {
    by_beam: BTreeMap<BeamId, Vec<CollisionRecord>>,
}

impl CollisionIndex {
    pub fn build(beams: &[Beam]) -> Self {
        let mut by_beam: BTreeMap<BeamId, Vec<CollisionRecord>> = BTreeMap::new();
        for beam in beams {
            for (step, record) in beam.steps().iter().enumerate() {
                for collision in record.state.facts::<Collision>() {
                    by_beam.entry(beam.id()).or_default().push(CollisionRecord {
                        step,
                        point: collision.point,
                        item: collision.item,
                        beam: collision.beam,
                    });
                }
            }
        }
        Self { by_beam }
    }

    /// Collisions of `beam` in step order.
    pub fn collisions(&self, beam: BeamId) -> &[CollisionRecord] {
        self.by_beam.get(&beam).map_or(&[], Vec::as_slice)
    }

    /// Beams with at least one collision, in id order.
    pub fn colliding_beams(&self) -> impl Iterator<Item = BeamId> + '_ {
        self.by_beam.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_beam.is_empty()
    }

    /// Beams named in `beam`'s collisions, other than itself.
    fn partners(&self, beam: BeamId) -> impl Iterator<Item = BeamId> + '_ {
        self.collisions(beam)
            .iter()
            .filter_map(|record| record.beam)
            .filter(move |&other| other != beam)
    }

    /// Beams whose collisions name `beam`.
    fn hit_by(&self, beam: BeamId) -> impl Iterator<Item = BeamId> + '_ {
        self.by_beam
            .iter()
            .filter(move |(&owner, records)| {
                owner != beam && records.iter().any(|record| record.beam == Some(beam))
            })
            .map(|(&owner, _)| owner)
    }

    /// Every group of beams that collided with each other.
    ///
    /// Loops are disjoint and ordered by their smallest beam id.
    pub fn loops(&self) -> Vec<CollisionLoop> {
        let mut seen = BTreeSet::new();
        let mut loops = Vec::new();
        for beam in self.colliding_beams() {
            if seen.contains(&beam) || self.partners(beam).next().is_none() {
                continue;
            }
            let collision_loop = CollisionLoop::from_seeds(self, [beam]);
            seen.extend(collision_loop.beams());
            loops.push(collision_loop);
        }
        loops
    }
}

// ---------------------------------------------------------------------------
// CollisionLoop
// ---------------------------------------------------------------------------

/// A transitively closed set of mutually colliding beams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionLoop {
    beams: BTreeSet<BeamId>,
    items: BTreeSet<ItemId>,
    steps: BTreeMap<BeamId, Vec<usize>>,
}

impl CollisionLoop {
    /// Close `seeds` over the collision graph of `index`.
    pub fn from_seeds(index: &CollisionIndex, seeds: impl IntoIterator<Item = BeamId>) -> Self {
        let mut beams = BTreeSet::new();
        let mut queue: VecDeque<BeamId> = seeds.into_iter().collect();
        while let Some(beam) = queue.pop_front() {
            if !beams.insert(beam) {
                continue;
            }
            queue.extend(index.partners(beam).filter(|other| !beams.contains(other)));
            queue.extend(index.hit_by(beam).filter(|other| !beams.contains(other)));
        }

        let mut items = BTreeSet::new();
        let mut steps = BTreeMap::new();
        for &beam in &beams {
            let records = index.collisions(beam);
            items.extend(records.iter().filter_map(|record| record.item));
            let mut indices: Vec<usize> = records.iter().map(|record| record.step).collect();
            indices.sort_unstable();
            indices.dedup();
            steps.insert(beam, indices);
        }

        Self {
            beams,
            items,
            steps,
        }
    }

    pub fn beams(&self) -> impl Iterator<Item = BeamId> + '_ {
        self.beams.iter().copied()
    }

    pub fn contains(&self, beam: BeamId) -> bool {
        self.beams.contains(&beam)
    }

    /// Items hit by any member, each once.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().copied()
    }

    /// Collision step indices of `beam`, ascending.
    pub fn step_indices(&self, beam: BeamId) -> &[usize] {
        self.steps.get(&beam).map_or(&[], Vec::as_slice)
    }

    /// The member whose collision happens first, ties broken by beam id.
    pub fn earliest(&self) -> Option<(BeamId, usize)> {
        self.steps
            .iter()
            .filter_map(|(&beam, indices)| indices.first().map(|&step| (beam, step)))
            .min_by_key(|&(beam, step)| (step, beam))
    }

    pub fn len(&self) -> usize {
        self.beams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beams.is_empty()
    }
}
