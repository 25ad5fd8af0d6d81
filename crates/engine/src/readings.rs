//! The Reading Aggregate Provider boundary.
//!
//! Nozzle readings are recorded by the dispensing side of the system; the
//! engine never writes them and only ever consumes `SUM`s over a station and
//! time window, split by payment mode.

use crate::MoneyCents;

/// Sum of amounts recorded by nozzle readings in a shift's time window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadingAggregate {
    pub cash: MoneyCents,
    pub online: MoneyCents,
    pub credit: MoneyCents,
}
