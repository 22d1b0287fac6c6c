/// Site table reader.
///
/// Reads `EOF_Site_Table.csv` into raw `SiteRow`s. Stays deliberately
/// dumb: no area conversion, no uniqueness check — the station catalog
/// owns those. Rows with a blank station id are skipped (trailing blank
/// lines occur in hand-edited exports).

use std::path::Path;

use csv::ReaderBuilder;

use crate::ingest::schema::{
    parse_field, TableSchema, COL_AREA, COL_SITE_TYPE, COL_STATION, COL_STATE, SITE_TABLE,
};
use crate::model::{PipelineError, SiteRow};

pub fn read_site_table(path: &Path) -> Result<Vec<SiteRow>, PipelineError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let schema = TableSchema::from_headers(SITE_TABLE, &headers);

    let station_idx = schema.require(COL_STATION)?;
    let state_idx = schema.require(COL_STATE)?;
    let area_idx = schema.require(COL_AREA)?;
    let site_type_idx = schema.require(COL_SITE_TYPE)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let station_id = record.get(station_idx).unwrap_or("").trim().to_string();
        if station_id.is_empty() {
            continue;
        }
        rows.push(SiteRow {
            station_id,
            state: record.get(state_idx).unwrap_or("").trim().to_string(),
            area_acres: parse_field(record.get(area_idx).unwrap_or("")),
            site_type: record.get(site_type_idx).unwrap_or("").trim().to_string(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create fixture");
        file.write_all(contents.as_bytes()).expect("write fixture");
        path
    }

    #[test]
    fn test_reads_rows_with_missing_area() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(
            &dir,
            "sites.csv",
            "USGS_Station_Number,State,Area,Site_Type\n\
             04085108,WI,35.4,field\n\
             0422026250,NY,,field\n",
        );

        let rows = read_site_table(&path).expect("site table should read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].station_id, "04085108");
        assert_eq!(rows[0].area_acres, Some(35.4));
        assert_eq!(rows[1].station_id, "0422026250");
        assert_eq!(
            rows[1].area_acres, None,
            "blank area cell should be missing, not zero"
        );
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(
            &dir,
            "sites.csv",
            "USGS_Station_Number,State,Site_Type\n04085108,WI,field\n",
        );

        let err = read_site_table(&path).expect_err("missing Area column should fail");
        assert_eq!(
            err,
            PipelineError::MissingColumn {
                table: SITE_TABLE.to_string(),
                column: COL_AREA.to_string(),
            }
        );
    }

    #[test]
    fn test_blank_station_rows_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(
            &dir,
            "sites.csv",
            "USGS_Station_Number,State,Area,Site_Type\n\
             04085108,WI,35.4,field\n\
             ,,,\n",
        );

        let rows = read_site_table(&path).expect("site table should read");
        assert_eq!(rows.len(), 1, "blank station id row should be dropped");
    }
}
