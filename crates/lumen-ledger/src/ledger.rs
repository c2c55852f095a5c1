//! The append-only step sequence of one beam.
//!
//! A [`StepLedger`] is never patched in place. Each update the tracer builds
//! a fresh candidate path from index 0 and compares it against the stored one
//! step by step. At the first index where they disagree the ledger is cut
//! with [`truncate`](StepLedger::truncate), which hands the removed steps back
//! so their side effects (terminus connections, tile occupancy) can be undone
//! before new steps are pushed.
//!
//! ```
//! use lumen_grid::prelude::*;
//! use lumen_ledger::ledger::StepLedger;
//! use lumen_ledger::step::{Step, StepState};
//!
//! let step = |tile: CubeCoordinate| Step {
//!     tile,
//!     direction_from: Some(Direction::EAST),
//!     direction_to: Direction::EAST,
//!     point: glam::DVec2::ZERO,
//!     colors: Vec::new(),
//!     state: StepState::default(),
//! };
//!
//! let mut ledger = StepLedger::new();
//! ledger.push(step(CubeCoordinate::ORIGIN));
//! ledger.push(step(CubeCoordinate::new(1, 0, -1)));
//! ledger.push(step(CubeCoordinate::new(2, 0, -2)));
//!
//! let removed = ledger.truncate(1);
//! assert_eq!(removed.len(), 2);
//! assert_eq!(ledger.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use lumen_grid::hex::CubeCoordinate;

use crate::step::{Step, Termination};

/// Ordered, gap-free sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepLedger {
    steps: Vec<Step>,
}

impl StepLedger {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step.
    ///
    /// # Panics
    ///
    /// Panics if the last step is final, or if `step` does not follow the last
    /// step. A step follows when its tile is the neighbor of the previous tile
    /// in the previous departure direction, or when the previous step
    /// teleported the beam.
    pub fn push(&mut self, step: Step) {
        if let Some(last) = self.steps.last() {
            assert!(
                !last.is_final(),
                "cannot extend a path that already ended at {}",
                last.tile
            );
            assert!(
                last.teleports_to().is_some() || last.tile.neighbor(last.direction_to) == step.tile,
                "step at {} does not follow step at {} heading {:?}",
                step.tile,
                last.tile,
                last.direction_to
            );
        }
        self.steps.push(step);
    }

    /// Remove every step at or after `index` and return them in order.
    pub fn truncate(&mut self, index: usize) -> Vec<Step> {
        if index >= self.steps.len() {
            return Vec::new();
        }
        self.steps.split_off(index)
    }

    /// Remove every step.
    pub fn clear(&mut self) -> Vec<Step> {
        self.truncate(0)
    }

    /// First index where `candidate` disagrees with the stored steps.
    ///
    /// Returns `None` when both sequences are identical.
    pub fn first_divergence(&self, candidate: &[Step]) -> Option<usize> {
        let shared = self.steps.len().min(candidate.len());
        (0..shared)
            .find(|&i| self.steps[i] != candidate[i])
            .or_else(|| (self.steps.len() != candidate.len()).then_some(shared))
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Indices of the steps visiting `tile`.
    pub fn visits(&self, tile: CubeCoordinate) -> impl Iterator<Item = usize> + '_ {
        self.steps
            .iter()
            .enumerate()
            .filter(move |(_, step)| step.tile == tile)
            .map(|(index, _)| index)
    }

    /// How the path ends, or `None` while it is empty.
    pub fn termination(&self) -> Option<Termination> {
        self.steps.last().and_then(Step::termination)
    }
}
