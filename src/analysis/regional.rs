/// Regional yield aggregator.
///
/// For each calendar year, partitions the station-year rows into three
/// validity subsets (sediment-valid, N-valid, P-valid — overlapping or
/// disjoint as the data dictates) and computes each parameter's effective
/// area, mass total, and per-hectare yield from its own subset only. A
/// station contributes its area to a parameter's denominator only when it
/// contributed data to that parameter's numerator; sharing one combined
/// area across parameters silently corrupts every yield, and preventing
/// that is this module's whole reason to exist.

use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::model::{RegionalAnnual, StationYear};

/// Mass ÷ area (or mass ÷ mass) with an undefined — not zero, not
/// infinite — result when the denominator is zero.
fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// One `RegionalAnnual` per distinct year in the input, in year order.
/// A year where no station is valid for anything still yields a row with
/// zero totals and undefined yields; consumers handle the nulls, nothing
/// here coerces them to zero.
pub fn aggregate_regional(
    station_years: &[StationYear],
    config: &AnalysisConfig,
) -> Vec<RegionalAnnual> {
    let mut by_year: BTreeMap<i32, Vec<&StationYear>> = BTreeMap::new();
    for row in station_years {
        by_year.entry(row.year).or_default().push(row);
    }

    by_year
        .into_iter()
        .map(|(year, rows)| annual_row(year, &rows, config))
        .collect()
}

fn annual_row(year: i32, rows: &[&StationYear], config: &AnalysisConfig) -> RegionalAnnual {
    let mut area_sediment_ha = 0.0;
    let mut area_n_ha = 0.0;
    let mut area_p_ha = 0.0;
    let mut total_sediment_kg = 0.0;
    let mut total_n_kg = 0.0;
    let mut total_p_kg = 0.0;
    let mut particulate_n_kg = 0.0;
    let mut particulate_p_kg = 0.0;

    // A station with no recorded catchment area still contributes its mass;
    // it just adds nothing to the effective area.
    for row in rows {
        let area = row.area_ha.unwrap_or(0.0);
        if row.validity.sediment {
            area_sediment_ha += area;
            total_sediment_kg += row.sediment_kg;
        }
        if row.validity.nitrogen {
            area_n_ha += area;
            total_n_kg += row.total_n_kg;
            particulate_n_kg += row.particulate_n_kg;
        }
        if row.validity.phosphorus {
            area_p_ha += area;
            total_p_kg += row.total_p_kg;
            particulate_p_kg += row.particulate_p_kg;
        }
    }

    let grade_n_g_kg = ratio(particulate_n_kg, total_sediment_kg).map(|g| g * 1000.0);
    let grade_p_g_kg = ratio(particulate_p_kg, total_sediment_kg).map(|g| g * 1000.0);

    RegionalAnnual {
        year,
        station_count: rows.len(),
        area_sediment_ha,
        area_n_ha,
        area_p_ha,
        total_sediment_kg,
        total_n_kg,
        total_p_kg,
        particulate_n_kg,
        particulate_p_kg,
        sediment_kg_ha: ratio(total_sediment_kg, area_sediment_ha),
        n_kg_ha: ratio(total_n_kg, area_n_ha),
        p_kg_ha: ratio(total_p_kg, area_p_ha),
        grade_n_g_kg,
        grade_p_g_kg,
        recovered_n_kg_ha: grade_n_g_kg.map(|g| g * config.reference_dose_kg_ha / 1000.0),
        recovered_p_kg_ha: grade_p_g_kg.map(|g| g * config.reference_dose_kg_ha / 1000.0),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
