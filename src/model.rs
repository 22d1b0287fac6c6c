/// Core data types for the edge-of-field sediment valuation pipeline.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no pipeline logic — only types. Every stage of the
/// batch (ingest → convert → aggregate → value) communicates through the
/// records defined here.

use std::fmt;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// The three monitored water-quality parameters tracked independently
/// throughout the pipeline. Validity, effective area, and per-hectare yield
/// are always computed per parameter, never for the trio as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Sediment,
    Nitrogen,
    Phosphorus,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Sediment => write!(f, "sediment"),
            Parameter::Nitrogen => write!(f, "N"),
            Parameter::Phosphorus => write!(f, "P"),
        }
    }
}

/// Per-parameter validity flags for one station-year.
///
/// A flag is true iff at least one contributing event carried a non-missing
/// concentration reading for that parameter's source field. The three flags
/// are independent: a logger can capture turbidity while the nutrient
/// sampler is down, so a station-year may be valid for sediment and invalid
/// for N in the same year. They are never collapsed into one combined flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterValidity {
    pub sediment: bool,
    pub nitrogen: bool,
    pub phosphorus: bool,
}

impl ParameterValidity {
    pub fn is_valid_for(&self, parameter: Parameter) -> bool {
        match parameter {
            Parameter::Sediment => self.sediment,
            Parameter::Nitrogen => self.nitrogen,
            Parameter::Phosphorus => self.phosphorus,
        }
    }

    /// True if the station-year is valid for at least one parameter.
    pub fn any(&self) -> bool {
        self.sediment || self.nitrogen || self.phosphorus
    }
}

// ---------------------------------------------------------------------------
// Input rows
// ---------------------------------------------------------------------------

/// One row of the site table, as read from CSV.
///
/// `area_acres` stays in source units here; conversion to hectares happens
/// when the site catalog is built so the acre→hectare factor is applied in
/// exactly one place.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRow {
    pub station_id: String,
    pub state: String,
    pub area_acres: Option<f64>,
    pub site_type: String,
}

/// One measured runoff event at one station, as read from the event table.
///
/// `storm_start` is the raw timestamp text from whichever column the schema
/// resolver located; parsing (and the decision to drop the event when the
/// text is unparseable) belongs to the converter, not the reader. All
/// measured fields may be absent — absence means "no reading", never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StormEvent {
    pub station_id: String,
    pub storm_start: String,
    pub runoff_volume_l: Option<f64>,
    pub sediment_load_lbs: Option<f64>,
    /// Total unfiltered phosphorus concentration, mg/L.
    pub total_p_mgl: Option<f64>,
    /// Total nitrogen concentration, mg/L.
    pub total_n_mgl: Option<f64>,
    /// Suspended-sediment concentration, mg/L.
    pub suspended_sediment_mgl: Option<f64>,
    /// Orthophosphate concentration (dissolved-P proxy), mg/L.
    pub orthophosphate_mgl: Option<f64>,
    /// Total Kjeldahl nitrogen concentration, mg/L.
    pub tkn_mgl: Option<f64>,
    /// Ammonia plus ammonium concentration (dissolved-N proxy), mg/L.
    pub ammonia_mgl: Option<f64>,
    /// Per-acre yield fields feeding the state reporting variant, lbs/acre.
    pub sediment_yield_lbs_ac: Option<f64>,
    pub n_yield_lbs_ac: Option<f64>,
    pub p_yield_lbs_ac: Option<f64>,
}

// ---------------------------------------------------------------------------
// Derived per-event record
// ---------------------------------------------------------------------------

/// Masses derived once from one storm event, in kilograms.
///
/// Produced by `analysis::convert::derive_event_loads`. Events whose
/// timestamp cannot be parsed never become an `EventLoads` — they are
/// excluded from all downstream aggregation rather than imputed.
///
/// The `has_*_conc` flags record whether the source concentration reading
/// was present at all; they feed station-year validity and must never be
/// reconstructed from the derived masses (a mass can be missing because the
/// runoff volume was missing even though the concentration was read).
#[derive(Debug, Clone, PartialEq)]
pub struct EventLoads {
    pub station_id: String,
    pub year: i32,
    pub sediment_kg: Option<f64>,
    pub total_n_kg: Option<f64>,
    pub total_p_kg: Option<f64>,
    pub particulate_n_kg: Option<f64>,
    pub particulate_p_kg: Option<f64>,
    pub has_sediment_conc: bool,
    pub has_n_conc: bool,
    pub has_p_conc: bool,
    /// Yield-basis fields carried through unconverted for the state report.
    pub sediment_yield_lbs_ac: Option<f64>,
    pub n_yield_lbs_ac: Option<f64>,
    pub p_yield_lbs_ac: Option<f64>,
}

// ---------------------------------------------------------------------------
// Aggregated records
// ---------------------------------------------------------------------------

/// All events at one station within one calendar year, summed.
///
/// Mass sums skip missing per-event values (a missing reading contributes
/// nothing to the sum — the validity flags are what say whether the sum
/// means anything). `area_ha` is the station's catchment area carried
/// through from the site catalog, taken once, never summed per event.
#[derive(Debug, Clone, PartialEq)]
pub struct StationYear {
    pub station_id: String,
    pub year: i32,
    pub state: String,
    pub area_ha: Option<f64>,
    pub event_count: usize,
    pub sediment_kg: f64,
    pub total_n_kg: f64,
    pub total_p_kg: f64,
    pub particulate_n_kg: f64,
    pub particulate_p_kg: f64,
    pub validity: ParameterValidity,
}

/// One calendar year of the regional aggregate.
///
/// The three effective areas are sums over *different* station subsets (the
/// stations valid for that specific parameter in that year), which is why
/// they are stored separately: each per-hectare yield divides by its own
/// parameter's area and must never borrow another parameter's.
///
/// `None` means "undefined" (zero effective area, or zero sediment mass for
/// the grades) and is written as an empty CSV cell — downstream consumers
/// decide how to handle it; nothing here coerces undefined to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalAnnual {
    pub year: i32,
    pub station_count: usize,
    pub area_sediment_ha: f64,
    pub area_n_ha: f64,
    pub area_p_ha: f64,
    pub total_sediment_kg: f64,
    pub total_n_kg: f64,
    pub total_p_kg: f64,
    pub particulate_n_kg: f64,
    pub particulate_p_kg: f64,
    pub sediment_kg_ha: Option<f64>,
    pub n_kg_ha: Option<f64>,
    pub p_kg_ha: Option<f64>,
    /// Sediment grade: g nutrient per kg dry sediment.
    pub grade_n_g_kg: Option<f64>,
    pub grade_p_g_kg: Option<f64>,
    /// Nutrient recovered per hectare of amended land at the reference dose.
    pub recovered_n_kg_ha: Option<f64>,
    pub recovered_p_kg_ha: Option<f64>,
}

/// Hectares coverable at the reference dose for one year.
///
/// Unlike the yield ratios, a zero (or missing) sediment supply maps to a
/// reuse area of zero, not undefined: zero supply correctly covers zero
/// land, whereas a yield over zero monitored area is unmeasurable.
#[derive(Debug, Clone, PartialEq)]
pub struct ReusePotential {
    pub year: i32,
    pub total_sediment_kg: f64,
    pub dose_kg_ha: f64,
    pub reuse_area_ha: f64,
    pub recovered_n_kg_ha: Option<f64>,
    pub recovered_p_kg_ha: Option<f64>,
}

/// Outcome of applying one candidate dose to one state's sediment supply.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseOutcome {
    pub state: String,
    pub dose_kg_ha: f64,
    pub total_sediment_kg: f64,
    pub coverable_area_ha: f64,
    pub applied_n_kg_ha: Option<f64>,
    pub applied_p_kg_ha: Option<f64>,
    pub usable_n_kg_ha: Option<f64>,
    pub usable_p_kg_ha: Option<f64>,
    /// Fraction of agronomic demand met per nutrient, capped at 1.0.
    pub demand_met_n: Option<f64>,
    pub demand_met_p: Option<f64>,
    pub limiting_fraction: Option<f64>,
    /// Hectares whose full fertilizer demand the sediment would replace.
    pub fully_replaced_ha: f64,
    /// Value of all usable nutrient with no demand ceiling, USD.
    pub gross_value_usd: f64,
    /// min(gross value, fully-replaced hectares at full replacement price).
    pub demand_capped_value_usd: f64,
}

/// Fertilizer-cost-equivalent valuation for one year.
///
/// Method A (limiting nutrient) and Method B (separate pricing with per
/// nutrient demand caps) are deliberately divergent estimates published
/// side by side; the pipeline never reconciles them into one number.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualValuation {
    pub year: i32,
    pub reuse_area_ha: f64,
    pub applied_n_kg_ha: Option<f64>,
    pub applied_p_kg_ha: Option<f64>,
    pub usable_n_kg_ha: Option<f64>,
    pub usable_p_kg_ha: Option<f64>,
    /// Fraction of agronomic demand replaced, clamped to [0, 1].
    pub replaced_n_fraction: Option<f64>,
    pub replaced_p_fraction: Option<f64>,
    pub replaced_limiting_fraction: Option<f64>,
    /// Method A: limiting fraction × full per-hectare fertilizer cost.
    pub cost_reduction_per_ha_limiting_usd: Option<f64>,
    pub cost_reduction_total_limiting_usd: f64,
    /// Method B: per-nutrient usable mass capped at demand, priced apart.
    pub cost_reduction_per_ha_usd: Option<f64>,
    pub cost_reduction_total_usd: f64,
    pub grade_n_g_kg: Option<f64>,
    pub grade_p_g_kg: Option<f64>,
}

/// Ranked per-station valuation at the P-limited optimized dose.
///
/// Stations below the minimum-load filter never appear here, so the grade
/// denominators are strictly positive and the fields can stay plain floats.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteEconomics {
    pub rank: usize,
    pub station_id: String,
    pub event_count: usize,
    pub years_monitored: usize,
    pub total_sediment_kg: f64,
    pub avg_annual_load_kg: f64,
    pub grade_n_g_kg: f64,
    pub grade_p_g_kg: f64,
    pub optimized_dose_kg_ha: f64,
    pub potential_reuse_area_ha: f64,
    pub applied_n_kg_ha: f64,
    pub applied_p_kg_ha: f64,
    pub available_n_kg_ha: f64,
    pub available_p_kg_ha: f64,
    pub value_n_usd_ha: f64,
    pub value_p_usd_ha: f64,
    pub total_value_usd_ha: f64,
}

// ---------------------------------------------------------------------------
// State yield report rows
// ---------------------------------------------------------------------------

/// One station-year of the yield-basis reporting variant, kg/ha/yr.
#[derive(Debug, Clone, PartialEq)]
pub struct StationYearYield {
    pub station_id: String,
    pub year: i32,
    pub state: String,
    pub sediment_kg_ha_yr: f64,
    pub n_kg_ha_yr: f64,
    pub p_kg_ha_yr: f64,
}

/// Mean annual yields across a state's stations for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAnnualYield {
    pub state: String,
    pub year: i32,
    pub station_count: usize,
    pub mean_sediment_kg_ha_yr: f64,
    pub mean_n_kg_ha_yr: f64,
    pub mean_p_kg_ha_yr: f64,
}

/// Mean annual yields across all of a state's station-years.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAverageYield {
    pub state: String,
    pub station_year_count: usize,
    pub mean_sediment_kg_ha_yr: f64,
    pub mean_n_kg_ha_yr: f64,
    pub mean_p_kg_ha_yr: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abort a pipeline run.
///
/// Missing *values* never appear here — they propagate as `None` through the
/// arithmetic. This enum covers the fatal cases only: inputs whose shape
/// (not content) makes the batch impossible to compute.
#[derive(Debug, PartialEq)]
pub enum PipelineError {
    /// A required column is absent from an input table.
    MissingColumn { table: String, column: String },
    /// No storm-start or date-like column could be located in the event
    /// table, so no event can be assigned to a year.
    NoDateColumn { table: String },
    /// The same station id appears more than once in the site table.
    DuplicateStation(String),
    /// Underlying file I/O failure, flattened to text.
    Io(String),
    /// CSV-level failure (unreadable record, ragged row), flattened to text.
    Csv(String),
    /// JSON serialization failure while writing the run summary.
    Json(String),
    /// The configuration file could not be read or parsed.
    Config(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MissingColumn { table, column } => {
                write!(f, "required column '{}' missing from {}", column, table)
            }
            PipelineError::NoDateColumn { table } => {
                write!(
                    f,
                    "no storm-start or date-like column found in {} — cannot assign events to years",
                    table
                )
            }
            PipelineError::DuplicateStation(id) => {
                write!(f, "duplicate station id in site table: {}", id)
            }
            PipelineError::Io(msg) => write!(f, "I/O error: {}", msg),
            PipelineError::Csv(msg) => write!(f, "CSV error: {}", msg),
            PipelineError::Json(msg) => write!(f, "JSON error: {}", msg),
            PipelineError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_flags_are_independent() {
        let v = ParameterValidity {
            sediment: true,
            nitrogen: false,
            phosphorus: false,
        };
        assert!(v.is_valid_for(Parameter::Sediment));
        assert!(!v.is_valid_for(Parameter::Nitrogen));
        assert!(!v.is_valid_for(Parameter::Phosphorus));
        assert!(v.any());
        assert!(!ParameterValidity::default().any());
    }

    #[test]
    fn test_error_display_names_the_table_and_column() {
        let err = PipelineError::MissingColumn {
            table: "EOF_Site_Table.csv".to_string(),
            column: "Area".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("Area"), "message should name the column: {}", text);
        assert!(
            text.contains("EOF_Site_Table.csv"),
            "message should name the table: {}",
            text
        );
    }
}
