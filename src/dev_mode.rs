/// Development mode utilities for running without a data download.
///
/// When the USGS export is unavailable, use this module to materialize a
/// small synthetic pair of input tables so the pipeline can run end-to-end
/// on a fresh checkout. The fixture is deterministic and doubles as the
/// integration-test input.

use std::fs;
use std::path::Path;

use crate::model::PipelineError;

/// Three monitored fields: two in-region (OH, WI) and one outside (IL).
const SAMPLE_SITE_TABLE: &str = "\
USGS_Station_Number,State,Area,Site_Type
04087088,OH,247.105,Field
04087089,WI,98.84,Field
05534500,IL,123.55,Field
";

/// Seven storm events with deliberate gaps in the optional fields:
/// a nutrient sampler outage at 04087089 (row 4), a missing total-N cell
/// (row 2), a missing orthophosphate cell (row 3), an event at a station
/// absent from the site table (row 6), and an unparseable timestamp
/// (row 7). Rows 1-3 give station 04087088 two monitored years.
const SAMPLE_EVENT_TABLE: &str = "\
USGS_Station_Number,Storm_Start_Date,runoff_volume,suspended_sediment_load_pounds,suspended_sediment_conc_mgL,total_nitrogen_conc_mgL,total_phosphorus_unfiltered_conc_mgL,orthophosphate_conc_mgL,total_Kjeldahl_nitrogen_unfiltered_conc_mgL,ammonia_plus_ammonium_conc_mgL,suspended_sediment_yield_pounds_per_acre,total_nitrogen_yield_pounds_per_acre,total_phosphorus_unfiltered_yield_pounds_per_acre
04087088,2019-04-12 06:30:00,2000000,4409.25,1100,2.5,0.25,0.05,2.0,0.1,18.0,0.05,0.005
04087088,2019-06-20 14:00:00,1500000,2204.62,900,null,0.30,0.06,1.8,0.2,12.5,0.04,0.004
04087088,2020-05-02 09:15:00,1800000,3306.93,1000,2.2,0.28,,1.9,0.15,15.0,0.045,0.0045
04087089,2019-05-30 18:45:00,800000,1102.31,750,NA,NA,NA,NA,NA,9.0,,
05534500,2019-07-04 02:00:00,900000,1653.47,800,1.9,0.22,0.04,1.6,0.12,10.0,0.03,0.003
99999999,2019-08-11 11:30:00,500000,661.39,600,1.5,0.18,0.03,1.2,0.09,7.0,0.02,0.002
04087088,not recorded,1000000,2204.62,950,2.1,0.24,0.05,1.7,0.1,11.0,0.035,0.0035
";

/// Writes the synthetic site and event tables to the given paths.
pub fn write_sample_inputs(site_path: &Path, event_path: &Path) -> Result<(), PipelineError> {
    fs::write(site_path, SAMPLE_SITE_TABLE)?;
    fs::write(event_path, SAMPLE_EVENT_TABLE)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
