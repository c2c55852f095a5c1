//! Steps and the facts attached to them.
//!
//! A [`Step`] records one tile visit of a beam. Everything the tracer learned
//! while resolving that visit lives in its [`StepState`]: an ordered list of
//! typed [`Fact`]s. Callers query facts by payload type instead of matching
//! on the enum by hand:
//!
//! ```
//! use lumen_grid::prelude::*;
//! use lumen_ledger::step::{Collision, Fact, FilterSeen, StepState};
//!
//! let mut state = StepState::default();
//! state.push(FilterSeen { filter: ItemId(3) });
//! state.push(Collision { point: glam::DVec2::ZERO, item: None, beam: Some(BeamId(1)) });
//!
//! assert!(state.is_final());
//! assert_eq!(state.facts::<FilterSeen>().count(), 1);
//! assert_eq!(state.first::<Collision>().unwrap().beam, Some(BeamId(1)));
//! ```

use glam::DVec2;
use serde::{Deserialize, Serialize};

use lumen_grid::color::Color;
use lumen_grid::hex::{CubeCoordinate, Direction};
use lumen_grid::id::{BeamId, ItemId};

// ---------------------------------------------------------------------------
// Fact payloads
// ---------------------------------------------------------------------------

/// The beam passed a filter on this step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSeen {
    pub filter: ItemId,
}

/// The beam was turned by a reflector on this step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectorSeen {
    pub reflector: ItemId,
}

/// The beam entered portal `entry` and leaves through portal `exit`.
///
/// Recorded on the teleport step at `entry` and again, with
/// [`PortalPhase::Exit`], on the step at the exit portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalTransit {
    pub entry: ItemId,
    pub exit: ItemId,
    pub phase: PortalPhase,
}

/// Which side of a teleport a [`PortalTransit`] fact describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalPhase {
    Teleport,
    Exit,
}

/// The beam stopped against an item, another beam, or itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    pub point: DVec2,
    /// The item hit, if any.
    pub item: Option<ItemId>,
    /// The beam hit, if any. Equal to the step's own beam for self-crossings.
    pub beam: Option<BeamId>,
}

/// The beam connected to a terminus opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminusConnection {
    pub terminus: ItemId,
    pub opening: usize,
}

/// The beam left the grid through the edge at `point`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutOfBounds {
    pub point: DVec2,
}

/// The beam waits for the user to pick one of several portal destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suspended {
    pub portal: ItemId,
    pub candidates: Vec<ItemId>,
}

// ---------------------------------------------------------------------------
// Fact
// ---------------------------------------------------------------------------

/// One namespaced fact about a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fact {
    FilterSeen(FilterSeen),
    ReflectorSeen(ReflectorSeen),
    PortalTransit(PortalTransit),
    Collision(Collision),
    TerminusConnection(TerminusConnection),
    OutOfBounds(OutOfBounds),
    Suspended(Suspended),
}

impl Fact {
    /// Whether propagation stops at a step carrying this fact.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Fact::Collision(_)
                | Fact::TerminusConnection(_)
                | Fact::OutOfBounds(_)
                | Fact::Suspended(_)
        )
    }
}

/// A fact payload type that can be extracted from a [`Fact`].
pub trait FactKind: Into<Fact> + 'static {
    fn from_fact(fact: &Fact) -> Option<&Self>;
}

macro_rules! impl_fact_kind {
    ($($variant:ident),* $(,)?) => {
        $(
            impl FactKind for $variant {
                #[inline]
                fn from_fact(fact: &Fact) -> Option<&Self> {
                    match fact {
                        Fact::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$variant> for Fact {
                #[inline]
                fn from(inner: $variant) -> Self {
                    Fact::$variant(inner)
                }
            }
        )*
    };
}

impl_fact_kind!(
    FilterSeen,
    ReflectorSeen,
    PortalTransit,
    Collision,
    TerminusConnection,
    OutOfBounds,
    Suspended,
);

// ---------------------------------------------------------------------------
// StepState
// ---------------------------------------------------------------------------

/// Ordered bag of facts attached to a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    facts: Vec<Fact>,
}

impl StepState {
    pub fn push(&mut self, fact: impl Into<Fact>) {
        self.facts.push(fact.into());
    }

    /// Facts of payload type `K`, in insertion order.
    pub fn facts<K: FactKind>(&self) -> impl Iterator<Item = &K> {
        self.facts.iter().filter_map(K::from_fact)
    }

    pub fn first<K: FactKind>(&self) -> Option<&K> {
        self.facts().next()
    }

    pub fn has<K: FactKind>(&self) -> bool {
        self.first::<K>().is_some()
    }

    pub fn is_final(&self) -> bool {
        self.facts.iter().any(Fact::is_final)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

/// How a beam's path ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Termination {
    Connected,
    Collision,
    OutOfBounds,
    Suspended,
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One tile visit of a beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub tile: CubeCoordinate,
    /// Heading on arrival. `None` for the first step, which starts inside the
    /// origin terminus.
    pub direction_from: Option<Direction>,
    /// Heading on departure.
    pub direction_to: Direction,
    /// Where the beam is drawn to on this tile.
    pub point: DVec2,
    /// Colors accumulated so far, in order.
    pub colors: Vec<Color>,
    pub state: StepState,
}

impl Step {
    /// The tile edge the beam entered through.
    pub fn entry_side(&self) -> Option<Direction> {
        self.direction_from.map(Direction::opposite)
    }

    /// Rendered color: the average of the accumulated colors.
    pub fn color(&self) -> Option<Color> {
        Color::average(&self.colors)
    }

    pub fn is_final(&self) -> bool {
        self.state.is_final()
    }

    /// How the path ends here, if it does.
    pub fn termination(&self) -> Option<Termination> {
        self.state.iter().find_map(|fact| match fact {
            Fact::Collision(_) => Some(Termination::Collision),
            Fact::TerminusConnection(_) => Some(Termination::Connected),
            Fact::OutOfBounds(_) => Some(Termination::OutOfBounds),
            Fact::Suspended(_) => Some(Termination::Suspended),
            _ => None,
        })
    }

    /// The exit portal if this step teleports the beam.
    pub fn teleports_to(&self) -> Option<ItemId> {
        self.state
            .facts::<PortalTransit>()
            .find(|transit| transit.phase == PortalPhase::Teleport)
            .map(|transit| transit.exit)
    }
}
