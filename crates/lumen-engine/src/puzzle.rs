//! The puzzle driver.
//!
//! A [`Puzzle`] owns the [`Grid`], one [`Beam`] per terminus opening, the
//! [`BeamTracer`] and the [`ConnectionJournal`]. Each call to
//! [`Puzzle::update`]:
//!
//! 1. Clears the journal and bumps the update counter.
//! 2. Traces every beam afresh in [`BeamId`] order, repeating full passes
//!    until nothing changes or [`TraceConfig::max_passes`] is reached, and
//!    reconciles the ledgers with the result. The outcome depends only on
//!    the grid and the stored portal choices.
//! 3. Rebuilds the [`CollisionIndex`] and groups collisions into loops.
//! 4. Raises a [`Mask`] for the first suspended beam, replacing any pending
//!    one.
//! 5. Evaluates the [`SolutionCondition`]s.
//!
//! Modifier operations ([`rotate_item`](Puzzle::rotate_item),
//! [`toggle_item`](Puzzle::toggle_item), [`move_item`](Puzzle::move_item))
//! mutate the grid and then run an update, so callers never see ledgers that
//! are out of date with the grid.

use serde::{Deserialize, Serialize};
use tracing::debug;

use lumen_grid::data::GridData;
use lumen_grid::grid::Grid;
use lumen_grid::hex::CubeCoordinate;
use lumen_grid::id::{BeamId, ItemId};
use lumen_grid::item::Rotation;
use lumen_grid::layout::Layout;
use lumen_grid::terminus::Terminus;
use lumen_ledger::journal::{ConnectionJournal, TerminusEvent};

use crate::beam::Beam;
use crate::collision::{CollisionIndex, CollisionLoop};
use crate::mask::Mask;
use crate::solution::{self, SolutionCondition};
use crate::tracer::BeamTracer;
use crate::PuzzleError;

// ---------------------------------------------------------------------------
// TraceConfig
// ---------------------------------------------------------------------------

/// How filters combine with the colors a beam already carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Every filter adds its color; the beam renders as the average.
    #[default]
    Accumulate,
    /// Each filter replaces the beam's colors with its own.
    Replace,
}

/// Tuning for the tracer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Upper bound on full retrace passes per update. Must be at least 1.
    pub max_passes: u32,
    pub color_policy: ColorPolicy,
    /// Tile circumradius used for step points. Must be positive and finite.
    pub tile_size: f64,
}

impl Default for TraceConfig {
    /// 32 passes, accumulating colors, unit tiles.
    fn default() -> Self {
        Self {
            max_passes: 32,
            color_policy: ColorPolicy::Accumulate,
            tile_size: 1.0,
        }
    }
}

impl TraceConfig {
    pub fn validate(&self) -> Result<(), PuzzleError> {
        if self.max_passes == 0 {
            return Err(PuzzleError::Config(
                "max_passes must be at least 1".to_owned(),
            ));
        }
        if !(self.tile_size > 0.0 && self.tile_size.is_finite()) {
            return Err(PuzzleError::Config(format!(
                "tile_size must be positive and finite, got {}",
                self.tile_size
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PuzzleData
// ---------------------------------------------------------------------------

/// Declarative puzzle description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PuzzleData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub grid: GridData,
    /// Empty means every terminus must be activated.
    #[serde(default)]
    pub solution: Vec<SolutionCondition>,
    #[serde(default)]
    pub config: TraceConfig,
}

// ---------------------------------------------------------------------------
// UpdateReport
// ---------------------------------------------------------------------------

/// What an update did.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    /// The update number, starting at 1.
    pub update: u64,
    pub passes: u32,
    /// `false` if ledgers were still changing when the pass limit hit.
    pub converged: bool,
    /// Terminus events in the order they happened.
    pub events: Vec<TerminusEvent>,
    pub collision_loops: Vec<CollisionLoop>,
    /// Pending portal choice, if a beam is suspended.
    pub mask: Option<Mask>,
    pub solved: bool,
}

// ---------------------------------------------------------------------------
// Puzzle
// ---------------------------------------------------------------------------

/// A loaded puzzle and its traced beams.
#[derive(Debug, Clone)]
pub struct Puzzle {
    id: String,
    title: String,
    grid: Grid,
    beams: Vec<Beam>,
    tracer: BeamTracer,
    journal: ConnectionJournal,
    collisions: CollisionIndex,
    mask: Option<Mask>,
    solution: Vec<SolutionCondition>,
    config: TraceConfig,
    update_count: u64,
}

impl Puzzle {
    /// Build a puzzle from its description. No beams are traced until the
    /// first [`update`](Self::update).
    pub fn new(data: &PuzzleData) -> Result<Self, PuzzleError> {
        let grid = Grid::from_data(&data.grid)?;
        let mut puzzle = Self::from_grid(grid, data.config.clone(), data.solution.clone())?;
        puzzle.id = data.id.clone();
        puzzle.title = data.title.clone();
        debug!(
            id = %puzzle.id,
            tiles = puzzle.grid.tile_count(),
            beams = puzzle.beams.len(),
            "puzzle loaded"
        );
        Ok(puzzle)
    }

    pub fn from_json(json: &str) -> Result<Self, PuzzleError> {
        let data: PuzzleData = serde_json::from_str(json)?;
        Self::new(&data)
    }

    /// Wrap an already built grid. One beam is created for every opening of
    /// every terminus, numbered in terminus id order. Connections the grid
    /// still holds belong to no beam of this puzzle and are released.
    pub fn from_grid(
        mut grid: Grid,
        config: TraceConfig,
        solution: Vec<SolutionCondition>,
    ) -> Result<Self, PuzzleError> {
        config.validate()?;
        let released = grid.clear_connections();
        if released > 0 {
            debug!(released, "released connections of a reused grid");
        }

        let mut beams = Vec::new();
        for (terminus, state) in grid.termini() {
            for opening in 0..state.openings.len() {
                let id = BeamId(beams.len() as u32);
                beams.push(Beam::new(id, terminus, opening));
            }
        }

        Ok(Self {
            id: String::new(),
            title: String::new(),
            tracer: BeamTracer::new(&config),
            grid,
            beams,
            journal: ConnectionJournal::new(),
            collisions: CollisionIndex::default(),
            mask: None,
            solution,
            config,
            update_count: 0,
        })
    }

    /// Retrace every beam against the current grid.
    ///
    /// # Errors
    ///
    /// Returns [`PuzzleError::Terminus`] if a connection would break a
    /// terminus invariant. The update is abandoned at that point and the
    /// ledgers are left as far as they got.
    pub fn update(&mut self) -> Result<UpdateReport, PuzzleError> {
        self.update_count += 1;
        let update = self.update_count;
        self.journal.clear();

        let convergence = self.tracer.retrace_all(
            &mut self.grid,
            &mut self.beams,
            &mut self.journal,
            update,
            self.config.max_passes,
        )?;

        self.collisions = CollisionIndex::build(&self.beams);
        self.mask = self
            .beams
            .iter()
            .find_map(|beam| Mask::for_beam(beam, &self.grid));
        let solved = self.is_solved();

        debug!(
            update,
            passes = convergence.passes,
            converged = convergence.converged,
            events = self.journal.len(),
            pending_choice = self.mask.is_some(),
            solved,
            "puzzle updated"
        );

        Ok(UpdateReport {
            update,
            passes: convergence.passes,
            converged: convergence.converged,
            events: self.journal.events().cloned().collect(),
            collision_loops: self.collisions.loops(),
            mask: self.mask.clone(),
            solved,
        })
    }

    // -- modifier operations ------------------------------------------------

    pub fn rotate_item(
        &mut self,
        id: ItemId,
        rotation: Rotation,
    ) -> Result<UpdateReport, PuzzleError> {
        self.grid.rotate_item(id, rotation)?;
        self.update()
    }

    pub fn toggle_item(&mut self, id: ItemId) -> Result<UpdateReport, PuzzleError> {
        self.grid.toggle_item(id)?;
        self.update()
    }

    pub fn move_item(&mut self, id: ItemId, to: CubeCoordinate) -> Result<UpdateReport, PuzzleError> {
        self.grid.move_item(id, to)?;
        self.update()
    }

    // -- portal choices -----------------------------------------------------

    /// Answer the pending [`Mask`] with the portal on `tile`.
    ///
    /// The choice is stored on the suspended beam and applies to every later
    /// update.
    pub fn choose(&mut self, tile: CubeCoordinate) -> Result<UpdateReport, PuzzleError> {
        let mask = self.mask.as_ref().ok_or(PuzzleError::NoPendingMask)?;
        let destination = mask
            .candidate_at(tile)
            .ok_or(PuzzleError::ExcludedTile(tile))?;
        let (beam_id, portal) = (mask.beam, mask.portal);

        if let Some(beam) = self.beams.iter_mut().find(|beam| beam.id() == beam_id) {
            beam.set_choice(portal, destination);
            debug!(beam = %beam_id, %portal, %destination, "portal destination chosen");
        }
        self.update()
    }

    /// Drop the pending [`Mask`] without choosing. The beam stays suspended
    /// and the next update raises the request again.
    pub fn cancel_mask(&mut self) -> Option<Mask> {
        self.mask.take()
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    pub fn beam(&self, id: BeamId) -> Option<&Beam> {
        self.beams.iter().find(|beam| beam.id() == id)
    }

    /// Beams emitted by `terminus`, one per opening.
    pub fn beams_of(&self, terminus: ItemId) -> impl Iterator<Item = &Beam> {
        self.beams
            .iter()
            .filter(move |beam| beam.terminus() == terminus)
    }

    pub fn termini(&self) -> impl Iterator<Item = (ItemId, &Terminus)> {
        self.grid.termini()
    }

    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    /// Events of the most recent update.
    pub fn journal(&self) -> &ConnectionJournal {
        &self.journal
    }

    /// Collisions of the most recent update.
    pub fn collisions(&self) -> &CollisionIndex {
        &self.collisions
    }

    pub fn tracer(&self) -> &BeamTracer {
        &self.tracer
    }

    pub fn layout(&self) -> &Layout {
        self.tracer.layout()
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn solution(&self) -> &[SolutionCondition] {
        &self.solution
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn is_solved(&self) -> bool {
        solution::is_solved(&self.solution, &self.grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_block_is_optional() {
        let data: PuzzleData = serde_json::from_str(r#"{ "tiles": [] }"#).unwrap();
        assert_eq!(data.config, TraceConfig::default());
        assert!(data.solution.is_empty());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let data: PuzzleData = serde_json::from_str(
            r#"{ "tiles": [], "config": { "color_policy": "replace" } }"#,
        )
        .unwrap();
        assert_eq!(data.config.color_policy, ColorPolicy::Replace);
        assert_eq!(data.config.max_passes, 32);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TraceConfig {
            tile_size: 0.0,
            ..TraceConfig::default()
        };
        let err = Puzzle::from_grid(Grid::new(), config, Vec::new()).unwrap_err();
        assert!(matches!(err, PuzzleError::Config(_)));
    }

    #[test]
    fn choose_without_mask_fails() {
        let mut puzzle = Puzzle::from_grid(Grid::new(), TraceConfig::default(), Vec::new()).unwrap();
        assert!(matches!(
            puzzle.choose(CubeCoordinate::ORIGIN),
            Err(PuzzleError::NoPendingMask)
        ));
        assert_eq!(puzzle.update_count(), 0);
    }
}
