/// Storm-event table reader.
///
/// Reads `All_EOF_StormEventLoadsRainCalculated.csv` into raw
/// `StormEvent`s. Station id, the storm-start column (located by
/// heuristic), runoff volume, and the sediment load column must exist;
/// every concentration and yield column is optional and reads as missing
/// when absent. Values stay in source units — conversion is the analysis
/// layer's job.

use std::path::Path;

use csv::ReaderBuilder;

use crate::ingest::schema::{
    parse_field, TableSchema, COL_AMMONIA_CONC, COL_N_YIELD, COL_ORTHO_P_CONC, COL_P_YIELD,
    COL_RUNOFF_VOLUME, COL_SEDIMENT_LOAD_LBS, COL_SEDIMENT_YIELD, COL_SS_CONC, COL_STATION,
    COL_TKN_CONC, COL_TOTAL_N_CONC, COL_TOTAL_P_CONC, EVENT_TABLE,
};
use crate::logging::{self, Stage};
use crate::model::{PipelineError, StormEvent};

pub fn read_event_table(path: &Path) -> Result<Vec<StormEvent>, PipelineError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let schema = TableSchema::from_headers(EVENT_TABLE, &headers);

    let station_idx = schema.require(COL_STATION)?;
    let storm_idx = schema.storm_start_column()?;
    let volume_idx = schema.require(COL_RUNOFF_VOLUME)?;
    let sediment_idx = schema.require(COL_SEDIMENT_LOAD_LBS)?;
    logging::debug(
        Stage::Events,
        None,
        &format!("storm-start column: '{}'", schema.column_name(storm_idx)),
    );

    let total_p_idx = schema.optional(COL_TOTAL_P_CONC);
    let total_n_idx = schema.optional(COL_TOTAL_N_CONC);
    let ss_conc_idx = schema.optional(COL_SS_CONC);
    let ortho_p_idx = schema.optional(COL_ORTHO_P_CONC);
    let tkn_idx = schema.optional(COL_TKN_CONC);
    let ammonia_idx = schema.optional(COL_AMMONIA_CONC);
    let sediment_yield_idx = schema.optional(COL_SEDIMENT_YIELD);
    let n_yield_idx = schema.optional(COL_N_YIELD);
    let p_yield_idx = schema.optional(COL_P_YIELD);

    let mut events = Vec::new();
    for record in reader.records() {
        let record = record?;
        let station_id = record.get(station_idx).unwrap_or("").trim().to_string();
        if station_id.is_empty() {
            continue;
        }

        // Optional columns read as missing for every row when absent.
        let field = |idx: Option<usize>| -> Option<f64> {
            idx.and_then(|i| parse_field(record.get(i).unwrap_or("")))
        };

        events.push(StormEvent {
            station_id,
            storm_start: record.get(storm_idx).unwrap_or("").trim().to_string(),
            runoff_volume_l: parse_field(record.get(volume_idx).unwrap_or("")),
            sediment_load_lbs: parse_field(record.get(sediment_idx).unwrap_or("")),
            total_p_mgl: field(total_p_idx),
            total_n_mgl: field(total_n_idx),
            suspended_sediment_mgl: field(ss_conc_idx),
            orthophosphate_mgl: field(ortho_p_idx),
            tkn_mgl: field(tkn_idx),
            ammonia_mgl: field(ammonia_idx),
            sediment_yield_lbs_ac: field(sediment_yield_idx),
            n_yield_lbs_ac: field(n_yield_idx),
            p_yield_lbs_ac: field(p_yield_idx),
        });
    }
    Ok(events)
}
