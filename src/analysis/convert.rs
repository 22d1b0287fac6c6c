/// Unit and mass converter: derives kilogram-based loads per storm event.
///
/// Everything here is per-event and pure. The particulate partitioning
/// rules and the year-extraction rule live in this module and nowhere
/// else; aggregation stages consume the derived `EventLoads` and never
/// look back at source units.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::config::AnalysisConfig;
use crate::model::{EventLoads, StormEvent};

// ---------------------------------------------------------------------------
// Year extraction
// ---------------------------------------------------------------------------

// Timestamp shapes observed across USGS export revisions, tried in order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Calendar year of a storm-start timestamp, or `None` when the text is
/// empty or matches no accepted shape. Events without a year are excluded
/// from all downstream aggregation — never imputed.
pub fn extract_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.year());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.year());
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.year())
}

// ---------------------------------------------------------------------------
// Mass conversion
// ---------------------------------------------------------------------------

/// Nutrient mass in kg from a concentration (mg/L) and runoff volume (L).
/// Missing either operand means no mass — not zero.
fn conc_mass_kg(conc_mgl: Option<f64>, volume_l: Option<f64>) -> Option<f64> {
    match (conc_mgl, volume_l) {
        (Some(conc), Some(volume)) => Some(conc * volume / 1_000_000.0),
        _ => None,
    }
}

/// Particulate phosphorus concentration, mg/L: total unfiltered P minus
/// dissolved orthophosphate, clamped at zero (sampling noise can push the
/// difference negative). Without an orthophosphate reading the total is
/// kept whole as an upper bound. Zero-fill of a missing total is
/// intentional here and only here.
fn particulate_p_conc(event: &StormEvent) -> f64 {
    match event.orthophosphate_mgl {
        Some(ortho) => (event.total_p_mgl.unwrap_or(0.0) - ortho).max(0.0),
        None => event.total_p_mgl.unwrap_or(0.0),
    }
}

/// Particulate nitrogen concentration, mg/L: total Kjeldahl N minus
/// ammonia+ammonium, clamped at zero. The subtraction needs both
/// readings; missing either one falls back to total N as an upper bound.
fn particulate_n_conc(event: &StormEvent) -> f64 {
    match (event.tkn_mgl, event.ammonia_mgl) {
        (Some(tkn), Some(ammonia)) => (tkn - ammonia).max(0.0),
        _ => event.total_n_mgl.unwrap_or(0.0),
    }
}

/// Derives the kg-based loads for one event, or `None` when the
/// storm-start timestamp cannot be assigned to a year.
pub fn derive_event_loads(event: &StormEvent, config: &AnalysisConfig) -> Option<EventLoads> {
    let year = extract_year(&event.storm_start)?;

    Some(EventLoads {
        station_id: event.station_id.clone(),
        year,
        sediment_kg: event.sediment_load_lbs.map(|lbs| lbs * config.lbs_to_kg),
        total_n_kg: conc_mass_kg(event.total_n_mgl, event.runoff_volume_l),
        total_p_kg: conc_mass_kg(event.total_p_mgl, event.runoff_volume_l),
        particulate_n_kg: conc_mass_kg(Some(particulate_n_conc(event)), event.runoff_volume_l),
        particulate_p_kg: conc_mass_kg(Some(particulate_p_conc(event)), event.runoff_volume_l),
        has_sediment_conc: event.suspended_sediment_mgl.is_some(),
        has_n_conc: event.total_n_mgl.is_some(),
        has_p_conc: event.total_p_mgl.is_some(),
        sediment_yield_lbs_ac: event.sediment_yield_lbs_ac,
        n_yield_lbs_ac: event.n_yield_lbs_ac,
        p_yield_lbs_ac: event.p_yield_lbs_ac,
    })
}

/// Result of converting a whole event table.
pub struct ConversionOutcome {
    pub loads: Vec<EventLoads>,
    /// Events excluded because no year could be extracted.
    pub dropped_no_year: usize,
}

/// Converts every event, counting the ones dropped for lack of a year.
pub fn convert_events(events: &[StormEvent], config: &AnalysisConfig) -> ConversionOutcome {
    let mut loads = Vec::with_capacity(events.len());
    let mut dropped_no_year = 0;
    for event in events {
        match derive_event_loads(event, config) {
            Some(derived) => loads.push(derived),
            None => dropped_no_year += 1,
        }
    }
    ConversionOutcome {
        loads,
        dropped_no_year,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base_event() -> StormEvent {
        StormEvent {
            station_id: "04085108".to_string(),
            storm_start: "2019-05-01 14:30".to_string(),
            runoff_volume_l: Some(1_000_000.0),
            sediment_load_lbs: None,
            total_p_mgl: None,
            total_n_mgl: None,
            suspended_sediment_mgl: None,
            orthophosphate_mgl: None,
            tkn_mgl: None,
            ammonia_mgl: None,
            sediment_yield_lbs_ac: None,
            n_yield_lbs_ac: None,
            p_yield_lbs_ac: None,
        }
    }

    #[test]
    fn test_year_extraction_accepted_shapes() {
        assert_eq!(extract_year("2019-05-01 14:30:00"), Some(2019));
        assert_eq!(extract_year("2019-05-01 14:30"), Some(2019));
        assert_eq!(extract_year("2019-05-01"), Some(2019));
        assert_eq!(extract_year("5/1/2019 14:30"), Some(2019));
        assert_eq!(extract_year("5/1/2019"), Some(2019));
        assert_eq!(extract_year("2019-05-01T14:30:00Z"), Some(2019));
    }

    #[test]
    fn test_year_extraction_rejects_garbage() {
        assert_eq!(extract_year(""), None);
        assert_eq!(extract_year("   "), None);
        assert_eq!(extract_year("unknown"), None);
        assert_eq!(extract_year("2019/05/01"), None);
    }

    #[test]
    fn test_sediment_pounds_to_kg() {
        let event = StormEvent {
            sediment_load_lbs: Some(1000.0),
            ..base_event()
        };
        let loads = derive_event_loads(&event, &AnalysisConfig::default()).unwrap();
        let sediment = loads.sediment_kg.expect("sediment mass should be derived");
        assert!(
            (sediment - 453.59237).abs() < 1e-9,
            "1000 lbs should be 453.59237 kg, got {}",
            sediment
        );
    }

    #[test]
    fn test_concentration_times_volume_mass() {
        // 2 mg/L over 1,000,000 L = 2 kg
        let event = StormEvent {
            total_n_mgl: Some(2.0),
            ..base_event()
        };
        let loads = derive_event_loads(&event, &AnalysisConfig::default()).unwrap();
        assert_eq!(loads.total_n_kg, Some(2.0));
    }

    #[test]
    fn test_missing_volume_leaves_masses_missing_but_flags_set() {
        let event = StormEvent {
            runoff_volume_l: None,
            total_n_mgl: Some(2.0),
            suspended_sediment_mgl: Some(150.0),
            ..base_event()
        };
        let loads = derive_event_loads(&event, &AnalysisConfig::default()).unwrap();
        assert_eq!(loads.total_n_kg, None, "no volume means no mass, not zero");
        assert_eq!(loads.particulate_n_kg, None);
        assert!(
            loads.has_n_conc && loads.has_sediment_conc,
            "concentration presence must be recorded independently of mass"
        );
    }

    #[test]
    fn test_particulate_p_is_clamped_at_zero() {
        // orthophosphate above total P can happen with sampling noise
        let event = StormEvent {
            total_p_mgl: Some(0.3),
            orthophosphate_mgl: Some(0.5),
            ..base_event()
        };
        let loads = derive_event_loads(&event, &AnalysisConfig::default()).unwrap();
        assert_eq!(loads.particulate_p_kg, Some(0.0));
    }

    #[test]
    fn test_particulate_p_falls_back_to_total_without_orthophosphate() {
        let event = StormEvent {
            total_p_mgl: Some(0.8),
            ..base_event()
        };
        let loads = derive_event_loads(&event, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            loads.particulate_p_kg,
            Some(0.8),
            "total P is the upper-bound fallback"
        );
    }

    #[test]
    fn test_particulate_n_subtraction_needs_both_fields() {
        let with_both = StormEvent {
            tkn_mgl: Some(3.0),
            ammonia_mgl: Some(1.0),
            total_n_mgl: Some(5.0),
            ..base_event()
        };
        let loads = derive_event_loads(&with_both, &AnalysisConfig::default()).unwrap();
        assert_eq!(loads.particulate_n_kg, Some(2.0));

        let missing_ammonia = StormEvent {
            tkn_mgl: Some(3.0),
            total_n_mgl: Some(5.0),
            ..base_event()
        };
        let loads = derive_event_loads(&missing_ammonia, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            loads.particulate_n_kg,
            Some(5.0),
            "missing ammonia falls back to total N, not to TKN alone"
        );
    }

    #[test]
    fn test_particulate_falls_to_zero_when_everything_missing() {
        let event = base_event();
        let loads = derive_event_loads(&event, &AnalysisConfig::default()).unwrap();
        assert_eq!(loads.particulate_n_kg, Some(0.0));
        assert_eq!(loads.particulate_p_kg, Some(0.0));
        // but totals stay missing, the zero-fill is particulate-only
        assert_eq!(loads.total_n_kg, None);
        assert_eq!(loads.total_p_kg, None);
    }

    #[test]
    fn test_convert_events_counts_dropped() {
        let events = vec![
            base_event(),
            StormEvent {
                storm_start: "not a date".to_string(),
                ..base_event()
            },
            StormEvent {
                storm_start: String::new(),
                ..base_event()
            },
        ];
        let outcome = convert_events(&events, &AnalysisConfig::default());
        assert_eq!(outcome.loads.len(), 1);
        assert_eq!(outcome.dropped_no_year, 2);
    }
}
