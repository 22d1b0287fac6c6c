/// Reuse-dose analysis: how much land the captured sediment could amend.
///
/// Two outputs share the same core rule (area = supply ÷ dose): the
/// per-year reuse potential at the reference dose, and a per-state sweep
/// over the candidate dose list with demand-capped valuation. Zero supply
/// maps to zero area — unlike the yield ratios, this is a well-defined
/// quantity, not an unmeasurable one.

use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::model::{DoseOutcome, RegionalAnnual, ReusePotential, StationYear};

// ---------------------------------------------------------------------------
// Reuse area
// ---------------------------------------------------------------------------

/// Hectares coverable at a dose: total mass ÷ dose, with zero (or
/// missing) supply covering zero land.
pub fn reuse_area(total_sediment_kg: f64, dose_kg_ha: f64) -> f64 {
    if total_sediment_kg > 0.0 && dose_kg_ha > 0.0 {
        total_sediment_kg / dose_kg_ha
    } else {
        0.0
    }
}

/// Per-year reuse potential at the reference dose, carrying through the
/// grade-derived recovered-per-hectare values for the valuation stage.
pub fn annual_reuse_potential(
    annuals: &[RegionalAnnual],
    config: &AnalysisConfig,
) -> Vec<ReusePotential> {
    annuals
        .iter()
        .map(|annual| ReusePotential {
            year: annual.year,
            total_sediment_kg: annual.total_sediment_kg,
            dose_kg_ha: config.reference_dose_kg_ha,
            reuse_area_ha: reuse_area(annual.total_sediment_kg, config.reference_dose_kg_ha),
            recovered_n_kg_ha: annual.recovered_n_kg_ha,
            recovered_p_kg_ha: annual.recovered_p_kg_ha,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// State dose sweep
// ---------------------------------------------------------------------------

/// Supply pooled across a state's full record, using the same validity
/// partitioning as the regional aggregator.
struct StateSupply {
    sediment_kg: f64,
    particulate_n_kg: f64,
    particulate_p_kg: f64,
}

fn pool_by_state(station_years: &[StationYear]) -> BTreeMap<String, StateSupply> {
    let mut pools: BTreeMap<String, StateSupply> = BTreeMap::new();
    for row in station_years {
        let pool = pools.entry(row.state.clone()).or_insert(StateSupply {
            sediment_kg: 0.0,
            particulate_n_kg: 0.0,
            particulate_p_kg: 0.0,
        });
        if row.validity.sediment {
            pool.sediment_kg += row.sediment_kg;
        }
        if row.validity.nitrogen {
            pool.particulate_n_kg += row.particulate_n_kg;
        }
        if row.validity.phosphorus {
            pool.particulate_p_kg += row.particulate_p_kg;
        }
    }
    pools
}

/// One `DoseOutcome` per (state, candidate dose), states sorted, doses in
/// configured order.
///
/// The demand-capped value is min(gross, fully-replaced hectares at the
/// full per-hectare fertilizer price): value can exceed neither the raw
/// worth of the usable nutrient supply nor what the covered land could
/// actually absorb agronomically.
pub fn state_dose_sweep(
    station_years: &[StationYear],
    config: &AnalysisConfig,
) -> Vec<DoseOutcome> {
    let pools = pool_by_state(station_years);
    let cost_per_ha = config.fertilizer_cost_per_ha();
    let mut outcomes = Vec::with_capacity(pools.len() * config.candidate_doses_kg_ha.len());

    for (state, supply) in &pools {
        let grade_n = grade(supply.particulate_n_kg, supply.sediment_kg);
        let grade_p = grade(supply.particulate_p_kg, supply.sediment_kg);

        for &dose_kg_ha in &config.candidate_doses_kg_ha {
            let coverable_area_ha = reuse_area(supply.sediment_kg, dose_kg_ha);

            let applied_n_kg_ha = grade_n.map(|g| g / 1000.0 * dose_kg_ha);
            let applied_p_kg_ha = grade_p.map(|g| g / 1000.0 * dose_kg_ha);
            let usable_n_kg_ha = applied_n_kg_ha
                .map(|a| (a * config.recovery_efficiency * config.availability_n).max(0.0));
            let usable_p_kg_ha = applied_p_kg_ha
                .map(|a| (a * config.recovery_efficiency * config.availability_p).max(0.0));

            let demand_met_n = usable_n_kg_ha.map(|u| (u / config.fert_n_demand_kg_ha).min(1.0));
            let demand_met_p = usable_p_kg_ha.map(|u| (u / config.fert_p_demand_kg_ha).min(1.0));
            let limiting_fraction = match (demand_met_n, demand_met_p) {
                (Some(n), Some(p)) => Some(n.min(p)),
                _ => None,
            };

            let fully_replaced_ha = coverable_area_ha * limiting_fraction.unwrap_or(0.0);
            let gross_value_usd = usable_n_kg_ha.unwrap_or(0.0)
                * coverable_area_ha
                * config.price_n_usd_kg
                + usable_p_kg_ha.unwrap_or(0.0) * coverable_area_ha * config.price_p_usd_kg;
            let demand_capped_value_usd = gross_value_usd.min(fully_replaced_ha * cost_per_ha);

            outcomes.push(DoseOutcome {
                state: state.clone(),
                dose_kg_ha,
                total_sediment_kg: supply.sediment_kg,
                coverable_area_ha,
                applied_n_kg_ha,
                applied_p_kg_ha,
                usable_n_kg_ha,
                usable_p_kg_ha,
                demand_met_n,
                demand_met_p,
                limiting_fraction,
                fully_replaced_ha,
                gross_value_usd,
                demand_capped_value_usd,
            });
        }
    }
    outcomes
}

fn grade(particulate_kg: f64, sediment_kg: f64) -> Option<f64> {
    if sediment_kg > 0.0 {
        Some(particulate_kg / sediment_kg * 1000.0)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
