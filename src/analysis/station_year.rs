/// Station-year aggregator.
///
/// Groups converted event loads by (station, year), sums masses, and
/// computes the per-parameter validity flags. Grouping uses a `BTreeMap`
/// keyed on (station, year) so row order and floating-point summation
/// order are identical on every run.

use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::model::{EventLoads, ParameterValidity, StationYear};
use crate::stations::StationCatalog;

// ---------------------------------------------------------------------------
// Region filter
// ---------------------------------------------------------------------------

/// Event loads restricted to stations that are both present in the site
/// catalog and located in a configured region state.
pub struct RegionLoads {
    pub kept: Vec<EventLoads>,
    /// Events at stations with no site-table row; their state and area are
    /// unknown, so they cannot join the regional aggregate.
    pub dropped_unknown_station: usize,
    pub dropped_out_of_region: usize,
}

pub fn filter_to_region(
    loads: &[EventLoads],
    catalog: &StationCatalog,
    config: &AnalysisConfig,
) -> RegionLoads {
    let mut kept = Vec::new();
    let mut dropped_unknown_station = 0;
    let mut dropped_out_of_region = 0;
    for load in loads {
        match catalog.find(&load.station_id) {
            None => dropped_unknown_station += 1,
            Some(station) if !config.in_region(&station.state) => dropped_out_of_region += 1,
            Some(_) => kept.push(load.clone()),
        }
    }
    RegionLoads {
        kept,
        dropped_unknown_station,
        dropped_out_of_region,
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// One `StationYear` per (station, year) pair in the input, in key order.
///
/// Mass sums skip missing per-event values. Validity flags OR together the
/// per-event concentration-presence flags: one real reading anywhere in the
/// year makes the station-year valid for that parameter. Area and state
/// come from the catalog once per group, never per event.
pub fn aggregate_station_years(
    loads: &[EventLoads],
    catalog: &StationCatalog,
) -> Vec<StationYear> {
    let mut groups: BTreeMap<(String, i32), StationYear> = BTreeMap::new();

    for load in loads {
        let key = (load.station_id.clone(), load.year);
        let entry = groups.entry(key).or_insert_with(|| {
            let station = catalog.find(&load.station_id);
            StationYear {
                station_id: load.station_id.clone(),
                year: load.year,
                state: station.map(|s| s.state.clone()).unwrap_or_default(),
                area_ha: station.and_then(|s| s.area_ha),
                event_count: 0,
                sediment_kg: 0.0,
                total_n_kg: 0.0,
                total_p_kg: 0.0,
                particulate_n_kg: 0.0,
                particulate_p_kg: 0.0,
                validity: ParameterValidity::default(),
            }
        });

        entry.event_count += 1;
        if let Some(kg) = load.sediment_kg {
            entry.sediment_kg += kg;
        }
        if let Some(kg) = load.total_n_kg {
            entry.total_n_kg += kg;
        }
        if let Some(kg) = load.total_p_kg {
            entry.total_p_kg += kg;
        }
        if let Some(kg) = load.particulate_n_kg {
            entry.particulate_n_kg += kg;
        }
        if let Some(kg) = load.particulate_p_kg {
            entry.particulate_p_kg += kg;
        }
        entry.validity.sediment |= load.has_sediment_conc;
        entry.validity.nitrogen |= load.has_n_conc;
        entry.validity.phosphorus |= load.has_p_conc;
    }

    groups.into_values().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
