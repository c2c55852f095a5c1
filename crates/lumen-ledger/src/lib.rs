//! Lumen Ledger -- the recorded history of beam paths.
//!
//! This crate holds what the tracer produces: the [`step::Step`]s of each
//! beam with their typed facts, the per-beam [`ledger::StepLedger`], and the
//! [`journal::ConnectionJournal`] of terminus events.
//!
//! # Modules
//!
//! - [`step`]: steps, facts and the typed fact query API.
//! - [`ledger`]: the append/truncate step sequence with divergence detection.
//! - [`journal`]: terminus connect / disconnect / activation events.

#![deny(unsafe_code)]

pub mod journal;
pub mod ledger;
pub mod step;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::journal::{ConnectionJournal, JournalEntry, TerminusEvent};
    pub use crate::ledger::StepLedger;
    pub use crate::step::{
        Collision, Fact, FactKind, FilterSeen, OutOfBounds, PortalPhase, PortalTransit,
        ReflectorSeen, Step, StepState, Suspended, TerminusConnection, Termination,
    };
}
