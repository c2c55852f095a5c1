//! Beams and their persisted portal choices.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lumen_grid::color::Color;
use lumen_grid::id::{BeamId, ItemId};
use lumen_ledger::ledger::StepLedger;
use lumen_ledger::step::{Step, Termination};

/// A beam emitted through one opening of a terminus.
///
/// Beams are created once per opening when a puzzle is loaded and live for
/// as long as the puzzle. Their ledgers are recomputed on every update, but
/// the portal choice map is not: a destination picked by the user keeps
/// applying to every later retrace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    id: BeamId,
    terminus: ItemId,
    opening: usize,
    pub(crate) ledger: StepLedger,
    /// Portal id -> chosen destination portal id.
    choices: BTreeMap<ItemId, ItemId>,
}

impl Beam {
    pub fn new(id: BeamId, terminus: ItemId, opening: usize) -> Self {
        Self {
            id,
            terminus,
            opening,
            ledger: StepLedger::new(),
            choices: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> BeamId {
        self.id
    }

    /// The terminus emitting this beam.
    pub fn terminus(&self) -> ItemId {
        self.terminus
    }

    /// Index of the emitting opening on the terminus.
    pub fn opening(&self) -> usize {
        self.opening
    }

    pub fn ledger(&self) -> &StepLedger {
        &self.ledger
    }

    pub fn steps(&self) -> &[Step] {
        self.ledger.steps()
    }

    /// A beam with no steps is switched off.
    pub fn is_active(&self) -> bool {
        !self.ledger.is_empty()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.ledger.termination()
    }

    /// Rendered color at the end of the path.
    pub fn color(&self) -> Option<Color> {
        self.ledger.last().and_then(Step::color)
    }

    pub fn choices(&self) -> &BTreeMap<ItemId, ItemId> {
        &self.choices
    }

    /// The stored destination for `portal`, if the user picked one.
    pub fn choice(&self, portal: ItemId) -> Option<ItemId> {
        self.choices.get(&portal).copied()
    }

    pub(crate) fn set_choice(&mut self, portal: ItemId, destination: ItemId) {
        self.choices.insert(portal, destination);
    }
}
