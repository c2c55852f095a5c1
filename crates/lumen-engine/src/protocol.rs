//! The item collision protocol.
//!
//! When a beam enters a tile, the tracer builds a candidate [`Step`] with the
//! arrival heading and asks every item on the tile, in authoring order, to
//! resolve it through [`CollisionHandler::resolve`]. A handler may record
//! facts on the step, change its departure direction or colors, and decides
//! whether the beam keeps going:
//!
//! | Element   | Outcome                                                       |
//! |-----------|---------------------------------------------------------------|
//! | wall      | always a collision                                            |
//! | reflector | turn on the front face; collision on the back or head-on      |
//! | portal    | teleport to the single matching portal, suspend on several   |
//! | filter    | tint the beam and continue                                    |
//! | terminus  | connect through a matching opening, collision otherwise       |
//!
//! Handlers never mutate the grid. Terminus connections are applied by the
//! tracer when the step is committed to the ledger.

use lumen_grid::grid::Grid;
use lumen_grid::hex::Direction;
use lumen_grid::item::{Filter, Item, ItemKind, Portal, Reflector};
use lumen_grid::layout::Layout;
use lumen_grid::terminus::Terminus;
use lumen_ledger::step::{
    Collision, FilterSeen, PortalPhase, PortalTransit, ReflectorSeen, Step, Suspended,
    TerminusConnection,
};

use crate::beam::Beam;
use crate::puzzle::ColorPolicy;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// What a handler decided for the candidate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Keep propagating with the step as updated.
    Continue,
    /// The path ends on this step. A final fact has been recorded.
    Terminal,
    /// The path pauses until the user picks a portal destination. A
    /// [`Suspended`] fact has been recorded.
    Suspend,
}

// ---------------------------------------------------------------------------
// ResolveContext
// ---------------------------------------------------------------------------

/// Read-only view of the world passed to every handler.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub grid: &'a Grid,
    pub layout: &'a Layout,
    /// The beam being traced. Its ledger may still hold stale steps from the
    /// previous update; only [`Beam::choice`] and identity are meaningful.
    pub beam: &'a Beam,
    /// The step before the candidate, or `None` at the origin.
    pub previous: Option<&'a Step>,
    pub color_policy: ColorPolicy,
}

// ---------------------------------------------------------------------------
// CollisionHandler
// ---------------------------------------------------------------------------

/// Implemented by every element kind that can sit in a beam's path.
pub trait CollisionHandler {
    /// Resolve the beam entering `item`'s tile. `step` arrives with
    /// `direction_to` equal to the arrival heading.
    fn resolve(&self, item: &Item, step: &mut Step, context: &ResolveContext<'_>) -> Resolution;
}

/// Marker for [`ItemKind::Wall`], which carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wall;

/// Dispatch to the handler for `item`'s kind.
pub fn resolve_item(item: &Item, step: &mut Step, context: &ResolveContext<'_>) -> Resolution {
    match &item.kind {
        ItemKind::Wall => Wall.resolve(item, step, context),
        ItemKind::Reflector(reflector) => reflector.resolve(item, step, context),
        ItemKind::Portal(portal) => portal.resolve(item, step, context),
        ItemKind::Filter(filter) => filter.resolve(item, step, context),
        ItemKind::Terminus(terminus) => terminus.resolve(item, step, context),
    }
}

fn collide(step: &mut Step, point: glam::DVec2, item: &Item) -> Resolution {
    step.state.push(Collision {
        point,
        item: Some(item.id),
        beam: None,
    });
    Resolution::Terminal
}

/// The heading the beam arrived with.
fn arrival_heading(step: &Step) -> Direction {
    step.direction_from.unwrap_or(step.direction_to)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

impl CollisionHandler for Wall {
    fn resolve(&self, item: &Item, step: &mut Step, context: &ResolveContext<'_>) -> Resolution {
        let point = match step.entry_side() {
            Some(side) => context.layout.boundary_point(step.tile, side),
            None => context.layout.tile_center(step.tile),
        };
        collide(step, point, item)
    }
}

impl CollisionHandler for Reflector {
    /// The face normal is `direction`. A beam entering through a side at most
    /// one step away from the normal is mirrored to `2 * normal - entry`.
    /// Entering straight along the normal reflects the beam onto itself,
    /// which is a collision.
    fn resolve(&self, item: &Item, step: &mut Step, context: &ResolveContext<'_>) -> Resolution {
        let Some(entry) = step.entry_side() else {
            return Resolution::Continue;
        };
        let faces = |normal: Direction| entry.offset_from(normal).abs() <= 1;

        let normal = if faces(self.direction) {
            self.direction
        } else if self.double_sided && faces(self.direction.opposite()) {
            self.direction.opposite()
        } else {
            let point = context.layout.boundary_point(step.tile, entry);
            return collide(step, point, item);
        };

        let out = Direction::wrapping(2 * i32::from(normal.index()) - i32::from(entry.index()));
        if out == entry {
            let point = context.layout.tile_center(step.tile);
            return collide(step, point, item);
        }

        step.state.push(ReflectorSeen { reflector: item.id });
        step.direction_to = out;
        Resolution::Continue
    }
}

impl CollisionHandler for Portal {
    /// Destinations are the other portals facing back along the arrival
    /// heading, narrowed by the beam's stored choice for this portal.
    fn resolve(&self, item: &Item, step: &mut Step, context: &ResolveContext<'_>) -> Resolution {
        let heading = arrival_heading(step);

        // Second half of a teleport: the beam lands here and walks on.
        if let Some(previous) = context.previous {
            if previous.teleports_to() == Some(item.id) {
                let entry = previous
                    .state
                    .facts::<PortalTransit>()
                    .find(|transit| transit.phase == PortalPhase::Teleport)
                    .map_or(item.id, |transit| transit.entry);
                step.state.push(PortalTransit {
                    entry,
                    exit: item.id,
                    phase: PortalPhase::Exit,
                });
                return Resolution::Continue;
            }
        }

        let mut candidates: Vec<&Item> = context
            .grid
            .items()
            .filter(|other| other.id != item.id)
            .filter(|other| {
                other
                    .as_portal()
                    .is_some_and(|portal| portal.direction == heading.opposite())
            })
            .collect();
        if let Some(chosen) = context.beam.choice(item.id) {
            candidates.retain(|other| other.id == chosen);
        }

        match candidates.as_slice() {
            [] => {
                let point = context.layout.tile_center(step.tile);
                collide(step, point, item)
            }
            [destination] => {
                let exit_heading = destination
                    .as_portal()
                    .map_or(heading, |portal| portal.direction.opposite());
                step.state.push(PortalTransit {
                    entry: item.id,
                    exit: destination.id,
                    phase: PortalPhase::Teleport,
                });
                step.direction_to = exit_heading;
                Resolution::Continue
            }
            several => {
                step.state.push(Suspended {
                    portal: item.id,
                    candidates: several.iter().map(|other| other.id).collect(),
                });
                Resolution::Suspend
            }
        }
    }
}

impl CollisionHandler for Filter {
    fn resolve(&self, item: &Item, step: &mut Step, context: &ResolveContext<'_>) -> Resolution {
        if context.color_policy == ColorPolicy::Replace {
            step.colors.clear();
        }
        step.colors.push(self.color);
        step.state.push(FilterSeen { filter: item.id });
        Resolution::Continue
    }
}

impl CollisionHandler for Terminus {
    /// A beam connects when it enters through the edge an opening faces.
    /// Entering any other edge, or coming back to its own terminus, is a
    /// collision.
    fn resolve(&self, item: &Item, step: &mut Step, context: &ResolveContext<'_>) -> Resolution {
        let Some(entry) = step.entry_side() else {
            return Resolution::Continue;
        };
        if item.id == context.beam.terminus() {
            let point = context.layout.tile_center(step.tile);
            return collide(step, point, item);
        }
        match self.opening_facing(entry) {
            Some(opening) => {
                step.state.push(TerminusConnection {
                    terminus: item.id,
                    opening,
                });
                Resolution::Terminal
            }
            None => {
                let point = context.layout.boundary_point(step.tile, entry);
                collide(step, point, item)
            }
        }
    }
}
