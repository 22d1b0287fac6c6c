/// Station catalog for the edge-of-field monitoring network.
///
/// Built at runtime from the site table rather than hardcoded: the network
/// spans hundreds of USGS edge-of-field stations across several states and
/// grows as sites are commissioned. This is the single source of truth for
/// station metadata — all other modules resolve state and catchment area
/// from here rather than re-reading the site table.

use std::collections::BTreeMap;

use crate::config::AreaFactor;
use crate::model::{PipelineError, SiteRow};

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single monitored edge-of-field station.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// USGS station number, kept as text to preserve leading zeros.
    pub station_id: String,
    /// Two-letter state code.
    pub state: String,
    /// Monitored catchment area in hectares. A few site records carry no
    /// drainage area; their loads still count, their area contributes zero.
    pub area_ha: Option<f64>,
    /// Site classification from the site table (field, subsurface tile, ...).
    pub site_type: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// All stations in the network, keyed by station id. Iteration order is
/// the id order, which keeps every downstream report deterministic.
#[derive(Debug)]
pub struct StationCatalog {
    stations: BTreeMap<String, Station>,
}

impl StationCatalog {
    /// Builds the catalog from parsed site-table rows. Acre areas are
    /// converted to hectares here so the rest of the pipeline only ever
    /// sees SI units.
    ///
    /// A duplicate station id is a fatal input error: silently keeping
    /// either copy would double- or under-count that station's area.
    pub fn from_site_rows(
        rows: &[SiteRow],
        area_factor: AreaFactor,
    ) -> Result<Self, PipelineError> {
        let mut stations = BTreeMap::new();
        for row in rows {
            let station = Station {
                station_id: row.station_id.clone(),
                state: row.state.clone(),
                area_ha: row
                    .area_acres
                    .map(|acres| acres * area_factor.acres_to_hectares()),
                site_type: row.site_type.clone(),
            };
            if stations.insert(row.station_id.clone(), station).is_some() {
                return Err(PipelineError::DuplicateStation(row.station_id.clone()));
            }
        }
        Ok(StationCatalog { stations })
    }

    /// Looks up a station by id. Returns `None` if not in the catalog.
    pub fn find(&self, station_id: &str) -> Option<&Station> {
        self.stations.get(station_id)
    }

    /// Stations in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Number of stations per state, for startup reporting.
    pub fn state_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for station in self.stations.values() {
            *counts.entry(station.state.clone()).or_insert(0) += 1;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
