/// Economic valuation of the captured sediment against conventional
/// fertilizer cost.
///
/// Submodules:
/// - `annual` — regional per-year valuation, Methods A and B side by side.
/// - `site` — per-station ranking at a P-limited optimized dose.

pub mod annual;
pub mod site;

pub use annual::annual_valuation;
pub use site::site_economics;
