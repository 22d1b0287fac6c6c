/// CSV and JSON writers for the pipeline's published tables.
///
/// Every writer takes rows that arrive already in their deterministic order
/// (the aggregators group through ordered maps) and writes them as-is, so a
/// rerun over unchanged inputs produces byte-identical files. Undefined
/// values are written as empty cells, never as zeros or "NaN" text.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::model::{
    AnnualValuation, DoseOutcome, PipelineError, RegionalAnnual, ReusePotential, SiteEconomics,
    StateAnnualYield, StateAverageYield, StationYear,
};

// ---------------------------------------------------------------------------
// Output file names
// ---------------------------------------------------------------------------

pub const STATION_YEAR_LOADS_CSV: &str = "Station_Year_Loads.csv";
pub const ANNUAL_REGION_YIELDS_CSV: &str = "Annual_Region_Yields.csv";
pub const ANNUAL_REGION_REUSE_CSV: &str = "Annual_Region_Reuse_Potential.csv";
pub const STATE_DOSE_SWEEP_CSV: &str = "State_Dose_Sweep.csv";
pub const ANNUAL_REGION_ECON_CSV: &str = "Annual_Region_Econ_Value.csv";
pub const STATE_ANNUAL_YIELDS_CSV: &str = "State_Annual_Yields.csv";
pub const STATE_AVERAGE_YIELDS_CSV: &str = "State_Average_Annual_Yields.csv";
pub const SITE_ECONOMICS_CSV: &str = "Site_Specific_Economics.csv";
pub const RUN_SUMMARY_JSON: &str = "run_summary.json";

// ---------------------------------------------------------------------------
// Cell formatting
// ---------------------------------------------------------------------------

fn cell(value: f64) -> String {
    value.to_string()
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn flag_cell(value: bool) -> String {
    if value { "true".to_string() } else { "false".to_string() }
}

// ---------------------------------------------------------------------------
// Table writers
// ---------------------------------------------------------------------------

pub fn write_station_year_loads(
    path: &Path,
    rows: &[StationYear],
) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "station_id",
        "year",
        "state",
        "area_ha",
        "event_count",
        "sediment_kg",
        "total_n_kg",
        "total_p_kg",
        "particulate_n_kg",
        "particulate_p_kg",
        "valid_sediment",
        "valid_n",
        "valid_p",
    ])?;
    for row in rows {
        writer.write_record([
            row.station_id.clone(),
            row.year.to_string(),
            row.state.clone(),
            opt_cell(row.area_ha),
            row.event_count.to_string(),
            cell(row.sediment_kg),
            cell(row.total_n_kg),
            cell(row.total_p_kg),
            cell(row.particulate_n_kg),
            cell(row.particulate_p_kg),
            flag_cell(row.validity.sediment),
            flag_cell(row.validity.nitrogen),
            flag_cell(row.validity.phosphorus),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_annual_region_yields(
    path: &Path,
    rows: &[RegionalAnnual],
) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "year",
        "station_count",
        "area_sediment_ha",
        "area_n_ha",
        "area_p_ha",
        "total_sediment_kg",
        "total_n_kg",
        "total_p_kg",
        "particulate_n_kg",
        "particulate_p_kg",
        "sediment_kg_ha",
        "n_kg_ha",
        "p_kg_ha",
        "grade_n_g_kg",
        "grade_p_g_kg",
        "recovered_n_kg_ha",
        "recovered_p_kg_ha",
    ])?;
    for row in rows {
        writer.write_record([
            row.year.to_string(),
            row.station_count.to_string(),
            cell(row.area_sediment_ha),
            cell(row.area_n_ha),
            cell(row.area_p_ha),
            cell(row.total_sediment_kg),
            cell(row.total_n_kg),
            cell(row.total_p_kg),
            cell(row.particulate_n_kg),
            cell(row.particulate_p_kg),
            opt_cell(row.sediment_kg_ha),
            opt_cell(row.n_kg_ha),
            opt_cell(row.p_kg_ha),
            opt_cell(row.grade_n_g_kg),
            opt_cell(row.grade_p_g_kg),
            opt_cell(row.recovered_n_kg_ha),
            opt_cell(row.recovered_p_kg_ha),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_annual_region_reuse(
    path: &Path,
    rows: &[ReusePotential],
) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "year",
        "total_sediment_kg",
        "dose_kg_ha",
        "reuse_area_ha",
        "recovered_n_kg_ha",
        "recovered_p_kg_ha",
    ])?;
    for row in rows {
        writer.write_record([
            row.year.to_string(),
            cell(row.total_sediment_kg),
            cell(row.dose_kg_ha),
            cell(row.reuse_area_ha),
            opt_cell(row.recovered_n_kg_ha),
            opt_cell(row.recovered_p_kg_ha),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_state_dose_sweep(path: &Path, rows: &[DoseOutcome]) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "state",
        "dose_kg_ha",
        "total_sediment_kg",
        "coverable_area_ha",
        "applied_n_kg_ha",
        "applied_p_kg_ha",
        "usable_n_kg_ha",
        "usable_p_kg_ha",
        "demand_met_n",
        "demand_met_p",
        "limiting_fraction",
        "fully_replaced_ha",
        "gross_value_usd",
        "demand_capped_value_usd",
    ])?;
    for row in rows {
        writer.write_record([
            row.state.clone(),
            cell(row.dose_kg_ha),
            cell(row.total_sediment_kg),
            cell(row.coverable_area_ha),
            opt_cell(row.applied_n_kg_ha),
            opt_cell(row.applied_p_kg_ha),
            opt_cell(row.usable_n_kg_ha),
            opt_cell(row.usable_p_kg_ha),
            opt_cell(row.demand_met_n),
            opt_cell(row.demand_met_p),
            opt_cell(row.limiting_fraction),
            cell(row.fully_replaced_ha),
            cell(row.gross_value_usd),
            cell(row.demand_capped_value_usd),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_annual_region_econ(
    path: &Path,
    rows: &[AnnualValuation],
) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "year",
        "reuse_area_ha",
        "applied_n_kg_ha",
        "applied_p_kg_ha",
        "usable_n_kg_ha",
        "usable_p_kg_ha",
        "replaced_n_fraction",
        "replaced_p_fraction",
        "replaced_limiting_fraction",
        "cost_reduction_per_ha_limiting_usd",
        "cost_reduction_total_limiting_usd",
        "cost_reduction_per_ha_usd",
        "cost_reduction_total_usd",
        "grade_n_g_kg",
        "grade_p_g_kg",
    ])?;
    for row in rows {
        writer.write_record([
            row.year.to_string(),
            cell(row.reuse_area_ha),
            opt_cell(row.applied_n_kg_ha),
            opt_cell(row.applied_p_kg_ha),
            opt_cell(row.usable_n_kg_ha),
            opt_cell(row.usable_p_kg_ha),
            opt_cell(row.replaced_n_fraction),
            opt_cell(row.replaced_p_fraction),
            opt_cell(row.replaced_limiting_fraction),
            opt_cell(row.cost_reduction_per_ha_limiting_usd),
            cell(row.cost_reduction_total_limiting_usd),
            opt_cell(row.cost_reduction_per_ha_usd),
            cell(row.cost_reduction_total_usd),
            opt_cell(row.grade_n_g_kg),
            opt_cell(row.grade_p_g_kg),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_state_annual_yields(
    path: &Path,
    rows: &[StateAnnualYield],
) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "state",
        "year",
        "station_count",
        "mean_sediment_kg_ha_yr",
        "mean_n_kg_ha_yr",
        "mean_p_kg_ha_yr",
    ])?;
    for row in rows {
        writer.write_record([
            row.state.clone(),
            row.year.to_string(),
            row.station_count.to_string(),
            cell(row.mean_sediment_kg_ha_yr),
            cell(row.mean_n_kg_ha_yr),
            cell(row.mean_p_kg_ha_yr),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_state_average_yields(
    path: &Path,
    rows: &[StateAverageYield],
) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "state",
        "station_year_count",
        "mean_sediment_kg_ha_yr",
        "mean_n_kg_ha_yr",
        "mean_p_kg_ha_yr",
    ])?;
    for row in rows {
        writer.write_record([
            row.state.clone(),
            row.station_year_count.to_string(),
            cell(row.mean_sediment_kg_ha_yr),
            cell(row.mean_n_kg_ha_yr),
            cell(row.mean_p_kg_ha_yr),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_site_economics(path: &Path, rows: &[SiteEconomics]) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "rank",
        "station_id",
        "event_count",
        "years_monitored",
        "total_sediment_kg",
        "avg_annual_load_kg",
        "grade_n_g_kg",
        "grade_p_g_kg",
        "optimized_dose_kg_ha",
        "potential_reuse_area_ha",
        "applied_n_kg_ha",
        "applied_p_kg_ha",
        "available_n_kg_ha",
        "available_p_kg_ha",
        "value_n_usd_ha",
        "value_p_usd_ha",
        "total_value_usd_ha",
    ])?;
    for row in rows {
        writer.write_record([
            row.rank.to_string(),
            row.station_id.clone(),
            row.event_count.to_string(),
            row.years_monitored.to_string(),
            cell(row.total_sediment_kg),
            cell(row.avg_annual_load_kg),
            cell(row.grade_n_g_kg),
            cell(row.grade_p_g_kg),
            cell(row.optimized_dose_kg_ha),
            cell(row.potential_reuse_area_ha),
            cell(row.applied_n_kg_ha),
            cell(row.applied_p_kg_ha),
            cell(row.available_n_kg_ha),
            cell(row.available_p_kg_ha),
            cell(row.value_n_usd_ha),
            cell(row.value_p_usd_ha),
            cell(row.total_value_usd_ha),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Provenance record written once per full run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_utc: String,
    pub site_table_path: String,
    pub event_table_path: String,
    pub sites_read: usize,
    pub events_read: usize,
    pub events_converted: usize,
    pub events_dropped_no_year: usize,
    pub events_in_region: usize,
    pub events_dropped_unknown_station: usize,
    pub events_dropped_out_of_region: usize,
    pub station_year_count: usize,
    pub region_year_count: usize,
    pub ranked_site_count: usize,
    pub outputs: Vec<String>,
    pub config: AnalysisConfig,
}

pub fn write_run_summary(path: &Path, summary: &RunSummary) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
