//! FIRMS hotspot records and CSV parsing
//!
//! The FIRMS area API returns one CSV row per detection. Column order
//! differs between products (VIIRS vs MODIS), so fields are located by
//! header name rather than position.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One satellite-detected thermal anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Fire radiative power (MW), never negative
    pub radiative_power_mw: f64,
    /// Acquisition date as published by FIRMS (`YYYY-MM-DD`)
    pub acquisition_date: String,
    /// Product-specific confidence label (`l`/`n`/`h` for VIIRS, 0-100 for MODIS)
    pub confidence: String,
}

impl HotspotRecord {
    pub fn new(latitude: f64, longitude: f64, radiative_power_mw: f64) -> Self {
        Self {
            latitude,
            longitude,
            radiative_power_mw: sanitize_frp(radiative_power_mw),
            acquisition_date: String::new(),
            confidence: "unknown".to_string(),
        }
    }
}

fn sanitize_frp(frp: f64) -> f64 {
    if frp.is_finite() && frp > 0.0 {
        frp
    } else {
        0.0
    }
}

fn parse_coord(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Column positions resolved from the header row
struct Columns {
    latitude: Option<usize>,
    longitude: Option<usize>,
    frp: Option<usize>,
    acq_date: Option<usize>,
    confidence: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Self {
            latitude: find("latitude"),
            longitude: find("longitude"),
            frp: find("frp"),
            acq_date: find("acq_date"),
            confidence: find("confidence"),
        }
    }
}

/// Parse a FIRMS area CSV payload
///
/// Rows without a numeric latitude/longitude are skipped. A missing or
/// unreadable `frp` counts as 0 MW.
pub fn parse_firms_csv(text: &str) -> Vec<HotspotRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.trim().as_bytes());

    let columns = match reader.headers() {
        Ok(headers) => Columns::from_headers(headers),
        Err(_) => return Vec::new(),
    };

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = match row {
            Ok(r) => r,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i));

        let (latitude, longitude) = match (
            parse_coord(field(columns.latitude)),
            parse_coord(field(columns.longitude)),
        ) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let frp = field(columns.frp)
            .and_then(|s| s.parse::<f64>().ok())
            .map(sanitize_frp)
            .unwrap_or(0.0);

        let confidence = match field(columns.confidence) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => "unknown".to_string(),
        };

        records.push(HotspotRecord {
            latitude,
            longitude,
            radiative_power_mw: frp,
            acquisition_date: field(columns.acq_date).unwrap_or_default().to_string(),
            confidence,
        });
    }

    if skipped > 0 {
        debug!("Skipped {} malformed FIRMS rows", skipped);
    }

    records
}

/// Load hotspots from a FIRMS CSV file on disk
pub fn read_firms_csv(path: impl AsRef<Path>) -> Result<Vec<HotspotRecord>> {
    let path = path.as_ref();
    info!("Loading hotspots from {:?}", path);

    let text = fs::read_to_string(path)?;
    let records = parse_firms_csv(&text);

    info!("Loaded {} hotspots", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIIRS_SAMPLE: &str = "\
latitude,longitude,bright_ti4,scan,track,acq_date,acq_time,satellite,instrument,confidence,version,bright_ti5,frp,daynight
-33.81,151.10,330.5,0.4,0.37,2026-10-15,0342,N20,VIIRS,n,2.0NRT,290.1,12.4,D
-34.02,150.88,345.2,0.5,0.41,2026-10-15,0342,N20,VIIRS,h,2.0NRT,295.7,48.9,D
";

    #[test]
    fn test_parse_viirs_rows() {
        let records = parse_firms_csv(VIIRS_SAMPLE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].latitude, -33.81);
        assert_eq!(records[0].longitude, 151.10);
        assert_eq!(records[0].radiative_power_mw, 12.4);
        assert_eq!(records[0].acquisition_date, "2026-10-15");
        assert_eq!(records[1].confidence, "h");
    }

    #[test]
    fn test_header_order_is_irrelevant() {
        let csv = "frp,confidence,longitude,latitude\n5.5,80,145.0,-37.5\n";
        let records = parse_firms_csv(csv);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latitude, -37.5);
        assert_eq!(records[0].longitude, 145.0);
        assert_eq!(records[0].radiative_power_mw, 5.5);
        assert_eq!(records[0].confidence, "80");
    }

    #[test]
    fn test_skips_rows_with_bad_coordinates() {
        let csv = "latitude,longitude,frp\nabc,150.0,1.0\n-33.0,,2.0\n-33.0,150.0,3.0\n";
        let records = parse_firms_csv(csv);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].radiative_power_mw, 3.0);
    }

    #[test]
    fn test_missing_frp_and_confidence_default() {
        let csv = "latitude,longitude,frp,confidence\n-33.0,150.0,,\n-34.0,151.0\n";
        let records = parse_firms_csv(csv);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.radiative_power_mw == 0.0));
        assert!(records.iter().all(|r| r.confidence == "unknown"));
        assert!(records.iter().all(|r| r.acquisition_date.is_empty()));
    }

    #[test]
    fn test_negative_frp_clamped() {
        let csv = "latitude,longitude,frp\n-33.0,150.0,-4.2\n";
        let records = parse_firms_csv(csv);
        assert_eq!(records[0].radiative_power_mw, 0.0);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let csv = " latitude , longitude , frp \n -33.5 , 150.5 , 7.0 \n";
        let records = parse_firms_csv(csv);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latitude, -33.5);
    }

    #[test]
    fn test_header_only_or_empty() {
        assert!(parse_firms_csv("").is_empty());
        assert!(parse_firms_csv("latitude,longitude,frp\n").is_empty());
        assert!(parse_firms_csv("Invalid MAP_KEY.").is_empty());
    }
}
