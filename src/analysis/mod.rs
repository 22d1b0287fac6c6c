/// Aggregation stages for the sediment valuation pipeline.
///
/// Pure transformations over in-memory rows; no I/O here. Data flows
/// strictly forward: convert → station_year → regional, with
/// `state_yields` as a parallel reporting path over the same converted
/// events.
///
/// Submodules:
/// - `convert` — per-event unit and mass conversion (`EventLoads`).
/// - `station_year` — groups event loads by (station, year), validity flags.
/// - `regional` — area-weighted regional annual yields and grades.
/// - `state_yields` — yield-basis per-state reports.

pub mod convert;
pub mod regional;
pub mod state_yields;
pub mod station_year;
