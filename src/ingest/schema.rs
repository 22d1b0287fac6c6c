/// Schema resolution for the input tables.
///
/// Column positions are resolved from the header row exactly once per
/// table, before any data row is read. Required columns that cannot be
/// found fail the run immediately with an error naming the table and the
/// column — there is no degraded continuation without them. The
/// storm-start heuristic lives here too, at the adapter boundary, so the
/// aggregation code never sees a header name.

use csv::StringRecord;

use crate::model::PipelineError;

// ---------------------------------------------------------------------------
// Table and column names
// ---------------------------------------------------------------------------

pub const SITE_TABLE: &str = "site table";
pub const EVENT_TABLE: &str = "storm event table";

// Site table columns.
pub const COL_STATION: &str = "USGS_Station_Number";
pub const COL_STATE: &str = "State";
pub const COL_AREA: &str = "Area";
pub const COL_SITE_TYPE: &str = "Site_Type";

// Event table required columns (besides the station id and the
// heuristically-located storm-start column).
pub const COL_RUNOFF_VOLUME: &str = "runoff_volume";
pub const COL_SEDIMENT_LOAD_LBS: &str = "suspended_sediment_load_pounds";

// Event table optional concentration columns, mg/L.
pub const COL_TOTAL_P_CONC: &str = "total_phosphorus_unfiltered_conc_mgL";
pub const COL_TOTAL_N_CONC: &str = "total_nitrogen_conc_mgL";
pub const COL_SS_CONC: &str = "suspended_sediment_conc_mgL";
pub const COL_ORTHO_P_CONC: &str = "orthophosphate_conc_mgL";
pub const COL_TKN_CONC: &str = "total_Kjeldahl_nitrogen_unfiltered_conc_mgL";
pub const COL_AMMONIA_CONC: &str = "ammonia_plus_ammonium_conc_mgL";

// Event table optional per-acre yield columns, lbs/acre.
pub const COL_SEDIMENT_YIELD: &str = "suspended_sediment_yield_pounds_per_acre";
pub const COL_N_YIELD: &str = "total_nitrogen_yield_pounds_per_acre";
pub const COL_P_YIELD: &str = "total_phosphorus_unfiltered_yield_pounds_per_acre";

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

/// Resolved header row of one input table.
pub struct TableSchema {
    table: &'static str,
    headers: Vec<String>,
}

impl TableSchema {
    pub fn from_headers(table: &'static str, headers: &StringRecord) -> Self {
        TableSchema {
            table,
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
        }
    }

    /// Position of a required column; fatal if absent.
    pub fn require(&self, column: &str) -> Result<usize, PipelineError> {
        self.position(column)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.table.to_string(),
                column: column.to_string(),
            })
    }

    /// Position of an optional column; `None` means the whole column is
    /// absent and every row reads as missing for it.
    pub fn optional(&self, column: &str) -> Option<usize> {
        self.position(column)
    }

    pub fn has(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Locates the event-start column: the first header containing both
    /// "storm" and "start" (case-insensitive), else the first containing
    /// "date". USGS exports have renamed this column across revisions, so
    /// an exact-name lookup is too brittle.
    pub fn storm_start_column(&self) -> Result<usize, PipelineError> {
        let storm = self.headers.iter().position(|h| {
            let lower = h.to_lowercase();
            lower.contains("storm") && lower.contains("start")
        });
        if let Some(idx) = storm {
            return Ok(idx);
        }
        self.headers
            .iter()
            .position(|h| h.to_lowercase().contains("date"))
            .ok_or_else(|| PipelineError::NoDateColumn {
                table: self.table.to_string(),
            })
    }

    /// Name of the column `storm_start_column` resolved to, for logging.
    pub fn column_name(&self, idx: usize) -> &str {
        &self.headers[idx]
    }
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Parses a numeric field that may carry a missing-value marker. USGS
/// exports mix "", "null", "NA", and "NaN" for absent readings; all map to
/// `None`. Unparseable garbage also maps to `None` rather than failing the
/// row — one bad cell must not discard an otherwise sound event.
pub fn parse_field(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("nan")
    {
        return None;
    }
    trimmed.parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
