/// Per-station economics at the P-limited optimized dose.
///
/// Unlike the regional valuation, this variant asks a siting question: if a
/// single field's accumulated sediment were applied at the highest dose
/// whose plant-available P stays within agronomic demand, what would one
/// amended hectare be worth? Stations are pooled across all years they were
/// monitored (region membership does not apply here) and ranked by total
/// per-hectare value so the most promising capture sites surface first.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::AnalysisConfig;
use crate::model::{EventLoads, SiteEconomics};

#[derive(Debug, Default)]
struct SiteTotals {
    event_count: usize,
    years: BTreeSet<i32>,
    sediment_kg: f64,
    particulate_n_kg: f64,
    particulate_p_kg: f64,
}

/// Rank stations by the per-hectare value of their captured sediment.
///
/// Stations whose all-years sediment total does not exceed the minimum load
/// are dropped before any ratio is formed, which keeps every grade
/// denominator strictly positive.
pub fn site_economics(loads: &[EventLoads], config: &AnalysisConfig) -> Vec<SiteEconomics> {
    let mut totals: BTreeMap<String, SiteTotals> = BTreeMap::new();
    for load in loads {
        let entry = totals.entry(load.station_id.clone()).or_default();
        entry.event_count += 1;
        entry.years.insert(load.year);
        if let Some(kg) = load.sediment_kg {
            entry.sediment_kg += kg;
        }
        if let Some(kg) = load.particulate_n_kg {
            entry.particulate_n_kg += kg;
        }
        if let Some(kg) = load.particulate_p_kg {
            entry.particulate_p_kg += kg;
        }
    }

    let mut sites: Vec<SiteEconomics> = totals
        .into_iter()
        .filter(|(_, t)| t.sediment_kg > config.min_site_load_kg)
        .map(|(station_id, t)| value_site(station_id, &t, config))
        .collect();

    // Highest value first; equal values fall back to station id so the
    // ranking is reproducible run to run.
    sites.sort_by(|a, b| {
        b.total_value_usd_ha
            .partial_cmp(&a.total_value_usd_ha)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.station_id.cmp(&b.station_id))
    });
    for (index, site) in sites.iter_mut().enumerate() {
        site.rank = index + 1;
    }
    sites
}

fn value_site(station_id: String, totals: &SiteTotals, config: &AnalysisConfig) -> SiteEconomics {
    let years_monitored = totals.years.len();
    let avg_annual_load_kg = totals.sediment_kg / years_monitored as f64;

    let grade_n_g_kg = totals.particulate_n_kg / totals.sediment_kg * 1000.0;
    let grade_p_g_kg = totals.particulate_p_kg / totals.sediment_kg * 1000.0;

    // The dose is pushed up until plant-available P meets P demand, then
    // clipped at the physical spreading cap. A P-free sediment admits no
    // P-limited dose at all.
    let effective_p_kg_per_kg = grade_p_g_kg / 1000.0 * config.availability_p;
    let max_dose_kg_ha = if effective_p_kg_per_kg > 0.0 {
        config.fert_p_demand_kg_ha / effective_p_kg_per_kg
    } else {
        0.0
    };
    let optimized_dose_kg_ha = max_dose_kg_ha.min(config.physical_dose_cap_kg_ha);

    let potential_reuse_area_ha = if optimized_dose_kg_ha > 0.0 {
        avg_annual_load_kg / optimized_dose_kg_ha
    } else {
        0.0
    };

    let applied_n_kg_ha = grade_n_g_kg / 1000.0 * optimized_dose_kg_ha;
    let applied_p_kg_ha = grade_p_g_kg / 1000.0 * optimized_dose_kg_ha;
    let available_n_kg_ha = applied_n_kg_ha * config.availability_n;
    let available_p_kg_ha = applied_p_kg_ha * config.availability_p;

    let value_n_usd_ha = available_n_kg_ha.min(config.fert_n_demand_kg_ha) * config.price_n_usd_kg;
    let value_p_usd_ha = available_p_kg_ha.min(config.fert_p_demand_kg_ha) * config.price_p_usd_kg;

    SiteEconomics {
        rank: 0, // assigned after the sort
        station_id,
        event_count: totals.event_count,
        years_monitored,
        total_sediment_kg: totals.sediment_kg,
        avg_annual_load_kg,
        grade_n_g_kg,
        grade_p_g_kg,
        optimized_dose_kg_ha,
        potential_reuse_area_ha,
        applied_n_kg_ha,
        applied_p_kg_ha,
        available_n_kg_ha,
        available_p_kg_ha,
        value_n_usd_ha,
        value_p_usd_ha,
        total_value_usd_ha: value_n_usd_ha + value_p_usd_ha,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn load(station: &str, year: i32, sediment: f64, part_n: f64, part_p: f64) -> EventLoads {
        EventLoads {
            station_id: station.to_string(),
            year,
            sediment_kg: Some(sediment),
            total_n_kg: None,
            total_p_kg: None,
            particulate_n_kg: Some(part_n),
            particulate_p_kg: Some(part_p),
            has_sediment_conc: true,
            has_n_conc: true,
            has_p_conc: true,
            sediment_yield_lbs_ac: None,
            n_yield_lbs_ac: None,
            p_yield_lbs_ac: None,
        }
    }

    #[test]
    fn test_p_limited_dose_saturates_available_p_exactly_at_demand() {
        // 1000 kg sediment over two years, grades N 10 g/kg and P 2 g/kg.
        let loads = vec![
            load("04000001", 2019, 600.0, 6.0, 1.2),
            load("04000001", 2020, 400.0, 4.0, 0.8),
        ];
        let sites = site_economics(&loads, &AnalysisConfig::default());
        assert_eq!(sites.len(), 1);
        let site = &sites[0];

        assert_eq!(site.event_count, 2);
        assert_eq!(site.years_monitored, 2);
        assert_eq!(site.avg_annual_load_kg, 500.0);
        assert!((site.grade_n_g_kg - 10.0).abs() < 1e-12);
        assert!((site.grade_p_g_kg - 2.0).abs() < 1e-12);

        // effective P = 0.002 x 0.8 = 0.0016 kg/kg, dose = 22 / 0.0016
        assert!((site.optimized_dose_kg_ha - 13_750.0).abs() < 1e-9);
        assert!((site.potential_reuse_area_ha - 500.0 / 13_750.0).abs() < 1e-12);

        // At the unconstrained optimum, available P lands exactly on demand.
        assert!((site.applied_p_kg_ha - 27.5).abs() < 1e-9);
        assert!(
            (site.available_p_kg_ha - 22.0).abs() < 1e-9,
            "available P should saturate P demand at the optimized dose"
        );
        assert!((site.value_p_usd_ha - 22.0 * 5.37).abs() < 1e-9);

        assert!((site.applied_n_kg_ha - 137.5).abs() < 1e-9);
        assert!((site.available_n_kg_ha - 68.75).abs() < 1e-9);
        assert!((site.value_n_usd_ha - 68.75 * 1.89).abs() < 1e-9);
        assert!(
            (site.total_value_usd_ha - (22.0 * 5.37 + 68.75 * 1.89)).abs() < 1e-9
        );
    }

    #[test]
    fn test_physical_cap_binds_for_low_grade_sediment() {
        // Grade P of 0.001 g/kg wants a dose of 27,500,000 kg/ha.
        let loads = vec![load("04000002", 2019, 1_000.0, 1.0, 0.001)];
        let sites = site_economics(&loads, &AnalysisConfig::default());
        let site = &sites[0];

        assert_eq!(site.optimized_dose_kg_ha, 100_000.0);
        // With the cap binding, available P falls short of demand.
        assert!(site.available_p_kg_ha < 22.0);
        assert!((site.available_p_kg_ha - 0.001 / 1000.0 * 100_000.0 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_p_free_sediment_gets_zero_dose_and_zero_value() {
        let loads = vec![load("04000003", 2019, 1_000.0, 5.0, 0.0)];
        let sites = site_economics(&loads, &AnalysisConfig::default());
        let site = &sites[0];

        assert_eq!(site.optimized_dose_kg_ha, 0.0);
        assert_eq!(site.potential_reuse_area_ha, 0.0);
        assert_eq!(site.applied_n_kg_ha, 0.0);
        assert_eq!(site.total_value_usd_ha, 0.0);
    }

    #[test]
    fn test_minimum_load_filter_is_strict() {
        let loads = vec![
            load("04000004", 2019, 100.0, 1.0, 0.2),  // exactly at the floor
            load("04000005", 2019, 100.1, 1.0, 0.2),  // just over
        ];
        let sites = site_economics(&loads, &AnalysisConfig::default());
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].station_id, "04000005");
    }

    #[test]
    fn test_ranking_is_value_descending_with_id_tiebreak() {
        let loads = vec![
            // Richer grades at station ...7 should outrank station ...6.
            load("04000006", 2019, 1_000.0, 5.0, 1.0),
            load("04000007", 2019, 1_000.0, 20.0, 2.0),
            // ...8 duplicates ...7's totals exactly: tie broken by id.
            load("04000008", 2019, 1_000.0, 20.0, 2.0),
        ];
        let sites = site_economics(&loads, &AnalysisConfig::default());
        assert_eq!(sites.len(), 3);
        assert_eq!(sites[0].station_id, "04000007");
        assert_eq!(sites[0].rank, 1);
        assert_eq!(sites[1].station_id, "04000008");
        assert_eq!(sites[1].rank, 2);
        assert_eq!(sites[2].station_id, "04000006");
        assert_eq!(sites[2].rank, 3);
        assert!(sites[0].total_value_usd_ha >= sites[2].total_value_usd_ha);
    }

    #[test]
    fn test_missing_event_masses_contribute_nothing() {
        let mut sparse = load("04000009", 2019, 150.0, 2.0, 0.4);
        sparse.particulate_n_kg = None;
        let loads = vec![sparse, load("04000009", 2020, 150.0, 2.0, 0.4)];

        let sites = site_economics(&loads, &AnalysisConfig::default());
        let site = &sites[0];
        assert_eq!(site.total_sediment_kg, 300.0);
        // Only the second event's particulate N entered the grade.
        assert!((site.grade_n_g_kg - 2.0 / 300.0 * 1000.0).abs() < 1e-12);
        assert!((site.grade_p_g_kg - 0.8 / 300.0 * 1000.0).abs() < 1e-12);
    }
}
