//! Input Table Verification Module
//!
//! Framework for testing input files against the expected schemas to
//! determine whether a downloaded data release can feed the pipeline.
//!
//! Use this after fetching a new USGS release, before a full batch run:
//! it reports which required and optional columns resolve, without
//! computing anything.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ingest::schema::{
    self, TableSchema, COL_AMMONIA_CONC, COL_AREA, COL_N_YIELD, COL_ORTHO_P_CONC, COL_P_YIELD,
    COL_RUNOFF_VOLUME, COL_SEDIMENT_LOAD_LBS, COL_SEDIMENT_YIELD, COL_SITE_TYPE, COL_SS_CONC,
    COL_STATE, COL_STATION, COL_TKN_CONC, COL_TOTAL_N_CONC, COL_TOTAL_P_CONC,
};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub site_table: TableVerification,
    pub event_table: TableVerification,
}

impl VerificationReport {
    /// True when either table cannot feed the pipeline at all.
    pub fn failed(&self) -> bool {
        self.site_table.status == VerificationStatus::Failed
            || self.event_table.status == VerificationStatus::Failed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableVerification {
    pub table: String,
    pub path: String,
    pub status: VerificationStatus,
    pub row_count: usize,
    pub required_present: Vec<String>,
    pub required_missing: Vec<String>,
    pub optional_present: Vec<String>,
    pub optional_missing: Vec<String>,
    pub storm_start_column: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Table Verification
// ============================================================================

pub fn verify_site_table(path: &Path) -> TableVerification {
    verify_table(
        path,
        schema::SITE_TABLE,
        &[COL_STATION, COL_STATE, COL_AREA, COL_SITE_TYPE],
        &[],
        false,
    )
}

pub fn verify_event_table(path: &Path) -> TableVerification {
    verify_table(
        path,
        schema::EVENT_TABLE,
        &[COL_STATION, COL_RUNOFF_VOLUME, COL_SEDIMENT_LOAD_LBS],
        &[
            COL_SS_CONC,
            COL_TOTAL_N_CONC,
            COL_TOTAL_P_CONC,
            COL_ORTHO_P_CONC,
            COL_TKN_CONC,
            COL_AMMONIA_CONC,
            COL_SEDIMENT_YIELD,
            COL_N_YIELD,
            COL_P_YIELD,
        ],
        true,
    )
}

fn verify_table(
    path: &Path,
    table: &'static str,
    required: &[&str],
    optional: &[&str],
    needs_storm_start: bool,
) -> TableVerification {
    let mut result = TableVerification {
        table: table.to_string(),
        path: path.display().to_string(),
        status: VerificationStatus::Failed,
        row_count: 0,
        required_present: Vec::new(),
        required_missing: Vec::new(),
        optional_present: Vec::new(),
        optional_missing: Vec::new(),
        storm_start_column: None,
        error_message: None,
    };

    let mut reader = match csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
    {
        Ok(reader) => reader,
        Err(err) => {
            result.error_message = Some(err.to_string());
            return result;
        }
    };
    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(err) => {
            result.error_message = Some(err.to_string());
            return result;
        }
    };
    let schema = TableSchema::from_headers(table, &headers);

    for column in required {
        if schema.has(column) {
            result.required_present.push(column.to_string());
        } else {
            result.required_missing.push(column.to_string());
        }
    }
    for column in optional {
        if schema.has(column) {
            result.optional_present.push(column.to_string());
        } else {
            result.optional_missing.push(column.to_string());
        }
    }

    let mut storm_start_ok = true;
    if needs_storm_start {
        match schema.storm_start_column() {
            Ok(idx) => result.storm_start_column = Some(schema.column_name(idx).to_string()),
            Err(err) => {
                storm_start_ok = false;
                result.error_message = Some(err.to_string());
            }
        }
    }

    result.row_count = reader.records().filter(|record| record.is_ok()).count();

    result.status = if !result.required_missing.is_empty() || !storm_start_ok {
        VerificationStatus::Failed
    } else if result.optional_missing.is_empty() && result.row_count > 0 {
        VerificationStatus::Success
    } else {
        VerificationStatus::PartialSuccess
    };

    result
}

// ============================================================================
// Full Verification Runner
// ============================================================================

pub fn run_verification(site_path: &Path, event_path: &Path) -> VerificationReport {
    println!("Verifying input tables...");

    let site_table = verify_site_table(site_path);
    print_table_line(&site_table);
    let event_table = verify_event_table(event_path);
    print_table_line(&event_table);

    VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        site_table,
        event_table,
    }
}

fn print_table_line(result: &TableVerification) {
    match result.status {
        VerificationStatus::Success => {
            println!("  ✓ {} — {} rows, all columns found", result.table, result.row_count);
        }
        VerificationStatus::PartialSuccess => {
            println!(
                "  ⚠ {} — {} rows, missing optional: {:?}",
                result.table, result.row_count, result.optional_missing
            );
        }
        VerificationStatus::Failed => {
            println!(
                "  ✗ {} — FAILED: {}",
                result.table,
                result
                    .error_message
                    .clone()
                    .unwrap_or_else(|| format!("missing required: {:?}", result.required_missing))
            );
        }
    }
}

pub fn print_summary(report: &VerificationReport) {
    println!();
    println!("═══════════════════════════════════════════════");
    println!("VERIFICATION SUMMARY");
    println!("═══════════════════════════════════════════════");
    for result in [&report.site_table, &report.event_table] {
        let mark = match result.status {
            VerificationStatus::Success => "✓",
            VerificationStatus::PartialSuccess => "⚠",
            VerificationStatus::Failed => "✗",
        };
        println!(
            "{} {:<20} {:>6} rows   required {}/{}   optional {}/{}",
            mark,
            result.table,
            result.row_count,
            result.required_present.len(),
            result.required_present.len() + result.required_missing.len(),
            result.optional_present.len(),
            result.optional_present.len() + result.optional_missing.len(),
        );
        if let Some(column) = &result.storm_start_column {
            println!("  storm-start column: '{}'", column);
        }
    }
    println!("═══════════════════════════════════════════════");
}

// ============================================================================
// Tests
// ============================================================================
