//! Beam tracing and ledger reconciliation.
//!
//! Every update is computed from the grid alone. The [`BeamTracer`] first
//! traces all beams into scratch paths against an occupancy map that starts
//! out empty, then reconciles the beams' ledgers with those paths:
//!
//! 1. **Trace.** Beams are walked in [`BeamId`] order, one tile at a time.
//!    Each finished path replaces that beam's entries in the occupancy map,
//!    so later beams see it. Whole passes repeat until one leaves every path
//!    unchanged, which makes crossings mutual: the beam that got through on
//!    the first pass finds the one it blocked on the next.
//! 2. **Release.** For every beam, the ledger is cut at the first index where
//!    it disagrees with the new path. Removed steps release the terminus
//!    openings they held.
//! 3. **Commit.** The new tails are pushed and their connections applied.
//!
//! Releasing every beam before committing any means a connection never
//! lands on an opening still held by a stale step.
//!
//! Candidate steps are resolved in this order:
//!
//! 1. A tile already crossed by another beam, or earlier by the same beam,
//!    stops the beam with a [`Collision`] naming the smallest such beam.
//!    Tiles holding a terminus are exempt because every arrival there ends
//!    the path anyway.
//! 2. Items on the tile resolve the step in authoring order through the
//!    [`protocol`](crate::protocol).
//! 3. A step that would leave back through the edge it entered is a
//!    collision.
//! 4. A step heading off the grid records [`OutOfBounds`].

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use lumen_grid::grid::Grid;
use lumen_grid::hex::CubeCoordinate;
use lumen_grid::id::BeamId;
use lumen_grid::layout::Layout;
use lumen_grid::GridError;
use lumen_ledger::journal::{ConnectionJournal, TerminusEvent};
use lumen_ledger::step::{
    Collision, OutOfBounds, PortalTransit, Step, StepState, Suspended, TerminusConnection,
};

use crate::beam::Beam;
use crate::protocol::{resolve_item, Resolution, ResolveContext};
use crate::puzzle::{ColorPolicy, TraceConfig};
use crate::PuzzleError;

// ---------------------------------------------------------------------------
// Convergence
// ---------------------------------------------------------------------------

/// Outcome of [`BeamTracer::retrace_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// Number of full passes run, including the final unchanged one.
    pub passes: u32,
    /// `false` if the pass limit was reached while paths still changed.
    pub converged: bool,
}

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

/// Tile -> (beam, step index) of every traced step on it.
#[derive(Debug, Clone, Default)]
struct Occupancy {
    tiles: BTreeMap<CubeCoordinate, Vec<(BeamId, usize)>>,
}

impl Occupancy {
    fn on(&self, tile: CubeCoordinate) -> &[(BeamId, usize)] {
        self.tiles.get(&tile).map_or(&[], Vec::as_slice)
    }

    fn occupy(&mut self, beam: BeamId, path: &[Step]) {
        for (index, step) in path.iter().enumerate() {
            self.tiles.entry(step.tile).or_default().push((beam, index));
        }
    }

    fn release(&mut self, beam: BeamId) {
        self.tiles.retain(|_, entries| {
            entries.retain(|&(other, _)| other != beam);
            !entries.is_empty()
        });
    }
}

// ---------------------------------------------------------------------------
// BeamTracer
// ---------------------------------------------------------------------------

/// Traces beams against a grid and keeps their ledgers in line with it.
#[derive(Debug, Clone)]
pub struct BeamTracer {
    layout: Layout,
    color_policy: ColorPolicy,
    /// Occupancy of the most recent update.
    occupancy: Occupancy,
}

impl BeamTracer {
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            layout: Layout::new(config.tile_size),
            color_policy: config.color_policy,
            occupancy: Occupancy::default(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Steps on `tile` after the last update, as `(beam, step index)` pairs.
    pub fn occupants(&self, tile: CubeCoordinate) -> &[(BeamId, usize)] {
        self.occupancy.on(tile)
    }

    /// Recompute every beam's path and reconcile the ledgers with it.
    ///
    /// The result depends only on the grid and the beams' stored portal
    /// choices, never on what the ledgers held before.
    pub fn retrace_all(
        &mut self,
        grid: &mut Grid,
        beams: &mut [Beam],
        journal: &mut ConnectionJournal,
        update: u64,
        max_passes: u32,
    ) -> Result<Convergence, PuzzleError> {
        let (paths, occupancy, convergence) = self.trace_paths(grid, beams, update, max_passes)?;

        let mut divergence = Vec::with_capacity(beams.len());
        for (beam, path) in beams.iter_mut().zip(&paths) {
            let at = beam.ledger.first_divergence(path);
            if let Some(index) = at {
                self.release(grid, beam, index, journal, update)?;
            }
            divergence.push(at);
        }

        for ((beam, path), at) in beams.iter_mut().zip(paths).zip(divergence) {
            let Some(index) = at else {
                continue;
            };
            for step in path.into_iter().skip(index) {
                self.commit(grid, beam, step, journal, update)?;
            }
            if beam.is_active() {
                debug!(
                    beam = %beam.id(),
                    from = index,
                    steps = beam.ledger.len(),
                    termination = ?beam.termination(),
                    "beam retraced"
                );
            } else {
                debug!(beam = %beam.id(), "beam switched off");
            }
        }

        self.occupancy = occupancy;
        Ok(convergence)
    }

    // -- tracing ------------------------------------------------------------

    /// Trace all beams from an empty occupancy until a pass changes nothing.
    fn trace_paths(
        &self,
        grid: &Grid,
        beams: &[Beam],
        update: u64,
        max_passes: u32,
    ) -> Result<(Vec<Vec<Step>>, Occupancy, Convergence), PuzzleError> {
        let max_passes = max_passes.max(1);
        let mut paths: Vec<Vec<Step>> = vec![Vec::new(); beams.len()];
        let mut occupancy = Occupancy::default();

        for pass in 1..=max_passes {
            let mut changed = false;
            for (beam, path) in beams.iter().zip(paths.iter_mut()) {
                occupancy.release(beam.id());
                let traced = self.trace_beam(grid, beam, &occupancy)?;
                occupancy.occupy(beam.id(), &traced);
                if traced != *path {
                    *path = traced;
                    changed = true;
                }
            }
            if !changed {
                debug!(update, passes = pass, "beam paths converged");
                let convergence = Convergence {
                    passes: pass,
                    converged: true,
                };
                return Ok((paths, occupancy, convergence));
            }
        }

        warn!(
            update,
            max_passes, "beam paths still changing after the pass limit"
        );
        let convergence = Convergence {
            passes: max_passes,
            converged: false,
        };
        Ok((paths, occupancy, convergence))
    }

    /// The full path of one beam, empty while its terminus is off.
    fn trace_beam(
        &self,
        grid: &Grid,
        beam: &Beam,
        occupancy: &Occupancy,
    ) -> Result<Vec<Step>, PuzzleError> {
        let mut path = Vec::new();
        let Some(mut step) = self.origin_step(grid, beam)? else {
            return Ok(path);
        };
        loop {
            trace!(
                beam = %beam.id(),
                index = path.len(),
                tile = %step.tile,
                direction = ?step.direction_to,
                facts = step.state.len(),
                "step traced"
            );
            let is_final = step.is_final();
            path.push(step);
            if is_final {
                return Ok(path);
            }
            let Some(previous) = path.last() else {
                return Ok(path);
            };
            step = self.next_step(grid, beam, occupancy, previous, &path)?;
        }
    }

    /// The step inside the emitting terminus, or `None` while it is off.
    fn origin_step(&self, grid: &Grid, beam: &Beam) -> Result<Option<Step>, PuzzleError> {
        let item = grid
            .item(beam.terminus())
            .ok_or(GridError::UnknownItem(beam.terminus()))?;
        let terminus = item
            .as_terminus()
            .ok_or(GridError::NotATerminus(beam.terminus()))?;
        let Some(opening) = terminus.openings.get(beam.opening()) else {
            return Ok(None);
        };
        if !terminus.on {
            return Ok(None);
        }

        let mut step = Step {
            tile: item.tile,
            direction_from: None,
            direction_to: opening.direction,
            point: self.layout.tile_center(item.tile),
            colors: opening.colors.clone(),
            state: StepState::default(),
        };
        self.check_exit(grid, &mut step);
        self.settle_point(&mut step);
        Ok(Some(step))
    }

    /// The candidate following `previous`, the last step of `path`.
    fn next_step(
        &self,
        grid: &Grid,
        beam: &Beam,
        occupancy: &Occupancy,
        previous: &Step,
        path: &[Step],
    ) -> Result<Step, PuzzleError> {
        let (tile, heading) = match previous.teleports_to() {
            Some(exit) => {
                let portal = grid.item(exit).ok_or(GridError::UnknownItem(exit))?;
                let heading = portal
                    .as_portal()
                    .map_or(previous.direction_to, |p| p.direction.opposite());
                (portal.tile, heading)
            }
            None => (
                previous.tile.neighbor(previous.direction_to),
                previous.direction_to,
            ),
        };
        let center = self.layout.tile_center(tile);

        let mut step = Step {
            tile,
            direction_from: Some(heading),
            direction_to: heading,
            point: center,
            colors: previous.colors.clone(),
            state: StepState::default(),
        };

        if grid.terminus_at(tile).is_none() {
            if let Some(other) = crossing(occupancy, tile, beam.id(), path) {
                step.state.push(Collision {
                    point: center,
                    item: None,
                    beam: Some(other),
                });
                return Ok(step);
            }
        }

        let context = ResolveContext {
            grid,
            layout: &self.layout,
            beam,
            previous: Some(previous),
            color_policy: self.color_policy,
        };
        for item in grid.items_on(tile) {
            match resolve_item(item, &mut step, &context) {
                Resolution::Continue => {}
                Resolution::Terminal | Resolution::Suspend => {
                    self.settle_point(&mut step);
                    return Ok(step);
                }
            }
        }

        if step.direction_to == heading.opposite() {
            step.state.push(Collision {
                point: center,
                item: None,
                beam: None,
            });
        } else if step.teleports_to().is_none() {
            self.check_exit(grid, &mut step);
        }
        self.settle_point(&mut step);
        Ok(step)
    }

    fn check_exit(&self, grid: &Grid, step: &mut Step) {
        if grid.tile(step.tile.neighbor(step.direction_to)).is_none() {
            step.state.push(OutOfBounds {
                point: self.layout.boundary_point(step.tile, step.direction_to),
            });
        }
    }

    /// Where the beam is drawn to on this step.
    fn settle_point(&self, step: &mut Step) {
        step.point = if let Some(collision) = step.state.first::<Collision>() {
            collision.point
        } else if let Some(exit) = step.state.first::<OutOfBounds>() {
            exit.point
        } else if step.state.has::<TerminusConnection>()
            || step.state.has::<Suspended>()
            || step.state.has::<PortalTransit>()
        {
            self.layout.tile_center(step.tile)
        } else {
            self.layout.boundary_point(step.tile, step.direction_to)
        };
    }

    // -- ledger effects -----------------------------------------------------

    fn commit(
        &mut self,
        grid: &mut Grid,
        beam: &mut Beam,
        step: Step,
        journal: &mut ConnectionJournal,
        update: u64,
    ) -> Result<(), PuzzleError> {
        if let (Some(connection), Some(side)) =
            (step.state.first::<TerminusConnection>(), step.entry_side())
        {
            let terminus = grid.terminus_mut(connection.terminus)?;
            let opening =
                terminus
                    .connect(beam.id(), side)
                    .map_err(|source| PuzzleError::Terminus {
                        terminus: connection.terminus,
                        source,
                    })?;
            journal.record(
                update,
                TerminusEvent::Connected {
                    terminus: connection.terminus,
                    opening,
                    beam: beam.id(),
                },
            );
            if terminus.is_activated() {
                debug!(terminus = %connection.terminus, "terminus activated");
                journal.record(
                    update,
                    TerminusEvent::Activated {
                        terminus: connection.terminus,
                    },
                );
            }
        }
        beam.ledger.push(step);
        Ok(())
    }

    /// Drop every step at or after `index`, releasing the openings they held.
    fn release(
        &mut self,
        grid: &mut Grid,
        beam: &mut Beam,
        index: usize,
        journal: &mut ConnectionJournal,
        update: u64,
    ) -> Result<(), PuzzleError> {
        for step in beam.ledger.truncate(index) {
            let Some(connection) = step.state.first::<TerminusConnection>() else {
                continue;
            };
            let terminus = grid.terminus_mut(connection.terminus)?;
            let was_activated = terminus.is_activated();
            for opening in terminus.disconnect(beam.id()) {
                journal.record(
                    update,
                    TerminusEvent::Disconnected {
                        terminus: connection.terminus,
                        opening,
                        beam: beam.id(),
                    },
                );
            }
            if was_activated && !terminus.is_activated() {
                debug!(terminus = %connection.terminus, "terminus deactivated");
                journal.record(
                    update,
                    TerminusEvent::Deactivated {
                        terminus: connection.terminus,
                    },
                );
            }
        }
        Ok(())
    }
}

/// The beam already on `tile` that the next step of `beam` would hit.
///
/// `path` holds the steps traced so far for `beam` itself.
fn crossing(
    occupancy: &Occupancy,
    tile: CubeCoordinate,
    beam: BeamId,
    path: &[Step],
) -> Option<BeamId> {
    let others = occupancy
        .on(tile)
        .iter()
        .map(|&(other, _)| other)
        .filter(|&other| other != beam);
    let own = path.iter().any(|step| step.tile == tile).then_some(beam);
    others.chain(own).min()
}
