//! Termini: beam sources and sinks.
//!
//! A terminus has a fixed set of directional [`Opening`]s. While the terminus
//! is switched on, one beam leaves through each opening. A beam arriving
//! through an opening of another terminus connects to it. The terminus is
//! *activated* exactly when every one of its openings holds a connection;
//! activation is derived on every query, never stored.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::hex::Direction;
use crate::id::BeamId;

/// Invariant violations on terminus connections.
///
/// These signal a bug in the tracer (a beam connecting twice, or into a
/// closed or occupied opening) and must abort the update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TerminusError {
    #[error("terminus is already activated; {beam} cannot connect")]
    AlreadyActivated { beam: BeamId },

    #[error("no opening faces {side:?}; {beam} cannot connect")]
    NoOpening { beam: BeamId, side: Direction },

    #[error("opening {opening} is already connected to {holder}; {beam} cannot connect")]
    OpeningOccupied {
        beam: BeamId,
        opening: usize,
        holder: BeamId,
    },
}

/// A directional connection point on a terminus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    /// The tile edge this opening sits on.
    pub direction: Direction,
    /// Colors seeded into the beam emitted from this opening.
    #[serde(default)]
    pub colors: Vec<Color>,
    /// The beam currently connected here, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<BeamId>,
}

impl Opening {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            colors: Vec::new(),
            connection: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// A beam source/sink with one or more openings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminus {
    pub openings: Vec<Opening>,
    /// Whether the terminus emits beams.
    #[serde(default)]
    pub on: bool,
}

impl Terminus {
    pub fn new(openings: Vec<Opening>) -> Self {
        Self {
            openings,
            on: false,
        }
    }

    /// `true` iff every opening is connected.
    pub fn is_activated(&self) -> bool {
        self.openings.iter().all(Opening::is_connected)
    }

    /// Index of the opening on tile edge `side`.
    pub fn opening_facing(&self, side: Direction) -> Option<usize> {
        self.openings.iter().position(|o| o.direction == side)
    }

    /// Number of openings holding a connection.
    pub fn connection_count(&self) -> usize {
        self.openings.iter().filter(|o| o.is_connected()).count()
    }

    /// Connect `beam`, which entered the tile through edge `side`.
    ///
    /// Returns the index of the opening that now holds the connection.
    pub fn connect(&mut self, beam: BeamId, side: Direction) -> Result<usize, TerminusError> {
        if self.is_activated() {
            return Err(TerminusError::AlreadyActivated { beam });
        }
        let opening = self
            .opening_facing(side)
            .ok_or(TerminusError::NoOpening { beam, side })?;
        if let Some(holder) = self.openings[opening].connection {
            return Err(TerminusError::OpeningOccupied {
                beam,
                opening,
                holder,
            });
        }
        self.openings[opening].connection = Some(beam);
        Ok(opening)
    }

    /// Clear every opening held by `beam`. Returns the cleared indices.
    pub fn disconnect(&mut self, beam: BeamId) -> Vec<usize> {
        let mut cleared = Vec::new();
        for (index, opening) in self.openings.iter_mut().enumerate() {
            if opening.connection == Some(beam) {
                opening.connection = None;
                cleared.push(index);
            }
        }
        cleared
    }

    pub(crate) fn rotate(&mut self, steps: i32) {
        for opening in &mut self.openings {
            opening.direction = opening.direction.rotate(steps);
        }
    }
}
