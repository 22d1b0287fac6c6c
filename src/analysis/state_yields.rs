/// Yield-basis state reports.
///
/// A parallel reporting path that never touches concentrations or runoff
/// volumes: it sums the per-acre yield fields straight off the events,
/// converts lbs/acre to kg/ha with the independently documented 1.12085
/// factor, and averages by state. Kept separate from the mass pipeline —
/// the two bases answer different questions and must not be mixed.

use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::model::{EventLoads, StateAnnualYield, StateAverageYield, StationYearYield};
use crate::stations::StationCatalog;

/// Per-(station, year) yield sums in kg/ha/yr, in key order. Missing yield
/// values contribute nothing; a station-year with no yield readings at all
/// reports zeros, matching the summation semantics of the source tables.
/// Stations absent from the catalog are skipped — without a site row there
/// is no state to report under.
pub fn station_year_yields(
    loads: &[EventLoads],
    catalog: &StationCatalog,
    config: &AnalysisConfig,
) -> Vec<StationYearYield> {
    let factor = config.lbs_per_acre_to_kg_per_ha;
    let mut groups: BTreeMap<(String, i32), StationYearYield> = BTreeMap::new();

    for load in loads {
        let Some(station) = catalog.find(&load.station_id) else {
            continue;
        };
        let entry = groups
            .entry((load.station_id.clone(), load.year))
            .or_insert_with(|| StationYearYield {
                station_id: load.station_id.clone(),
                year: load.year,
                state: station.state.clone(),
                sediment_kg_ha_yr: 0.0,
                n_kg_ha_yr: 0.0,
                p_kg_ha_yr: 0.0,
            });
        if let Some(yield_lbs_ac) = load.sediment_yield_lbs_ac {
            entry.sediment_kg_ha_yr += yield_lbs_ac * factor;
        }
        if let Some(yield_lbs_ac) = load.n_yield_lbs_ac {
            entry.n_kg_ha_yr += yield_lbs_ac * factor;
        }
        if let Some(yield_lbs_ac) = load.p_yield_lbs_ac {
            entry.p_kg_ha_yr += yield_lbs_ac * factor;
        }
    }

    groups.into_values().collect()
}

/// Mean yields per (state, year) across that state's stations.
pub fn state_annual_yields(rows: &[StationYearYield]) -> Vec<StateAnnualYield> {
    let mut groups: BTreeMap<(String, i32), Vec<&StationYearYield>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.state.clone(), row.year))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|((state, year), members)| {
            let n = members.len() as f64;
            StateAnnualYield {
                state,
                year,
                station_count: members.len(),
                mean_sediment_kg_ha_yr: members.iter().map(|m| m.sediment_kg_ha_yr).sum::<f64>()
                    / n,
                mean_n_kg_ha_yr: members.iter().map(|m| m.n_kg_ha_yr).sum::<f64>() / n,
                mean_p_kg_ha_yr: members.iter().map(|m| m.p_kg_ha_yr).sum::<f64>() / n,
            }
        })
        .collect()
}

/// Mean yields per state across all of its station-years (not across the
/// annual means — a year with more reporting stations weighs more).
pub fn state_average_yields(rows: &[StationYearYield]) -> Vec<StateAverageYield> {
    let mut groups: BTreeMap<String, Vec<&StationYearYield>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.state.clone()).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(state, members)| {
            let n = members.len() as f64;
            StateAverageYield {
                state,
                station_year_count: members.len(),
                mean_sediment_kg_ha_yr: members.iter().map(|m| m.sediment_kg_ha_yr).sum::<f64>()
                    / n,
                mean_n_kg_ha_yr: members.iter().map(|m| m.n_kg_ha_yr).sum::<f64>() / n,
                mean_p_kg_ha_yr: members.iter().map(|m| m.p_kg_ha_yr).sum::<f64>() / n,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
