//! Edge-of-field sediment and nutrient valuation pipeline.
//!
//! Batch analysis over the USGS edge-of-field monitoring export: derives
//! per-event nutrient masses from concentrations and runoff volumes,
//! aggregates them into station-year and regional annual tables with
//! parameter-specific effective areas, estimates how much land the captured
//! sediment could amend at reference and candidate doses, and values the
//! sediment-bound nutrients as a fertilizer substitute, regionally and per
//! monitoring site.

pub mod analysis;
pub mod config;
pub mod dev_mode;
pub mod economics;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod output;
pub mod reuse;
pub mod stations;
pub mod verify;
