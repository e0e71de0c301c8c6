//! Airport reference table and free-text location resolution
//!
//! This module resolves a user-supplied place name to a canonical location
//! code + region code pair using a bundled reference dataset. The dataset is
//! loaded once and shared read-only for the lifetime of the process.

use serde::Deserialize;
use std::sync::OnceLock;
use tracing::debug;

use crate::PlanError;

/// Bundled reference dataset, loaded lazily on first use
const EMBEDDED_DATASET: &str = include_str!("../data/airport-codes.json");

static GLOBAL_TABLE: OnceLock<AirportTable> = OnceLock::new();

/// Classification of a reference-dataset row.
///
/// The ordering encodes the domain rule that a city-level aggregate code, or
/// failing that the largest airport, is the canonical representative when a
/// place name is ambiguous across multiple rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirportKind {
    CityCode,
    LargeAirport,
    MediumAirport,
    SmallAirport,
    Other,
}

impl AirportKind {
    /// Disambiguation rank; lower wins. Unknown types sort last.
    pub fn priority(self) -> u8 {
        match self {
            AirportKind::CityCode => 0,
            AirportKind::LargeAirport => 1,
            AirportKind::MediumAirport => 2,
            AirportKind::SmallAirport => 3,
            AirportKind::Other => 4,
        }
    }

    /// A blank type in the dataset marks a city-level aggregate code.
    fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some("city_code") => AirportKind::CityCode,
            Some("large_airport") => AirportKind::LargeAirport,
            Some("medium_airport") => AirportKind::MediumAirport,
            Some("small_airport") => AirportKind::SmallAirport,
            Some(_) => AirportKind::Other,
        }
    }
}

/// One row of the reference dataset
#[derive(Debug, Clone, Deserialize)]
pub struct AirportRecord {
    pub name: String,
    #[serde(default)]
    pub municipality: String,
    #[serde(default)]
    pub iata_code: String,
    pub iso_country: String,
    #[serde(default, rename = "type")]
    kind_raw: Option<String>,
}

impl AirportRecord {
    pub fn new(
        name: &str,
        municipality: &str,
        iata_code: &str,
        iso_country: &str,
        kind_raw: Option<&str>,
    ) -> Self {
        Self {
            name: name.to_string(),
            municipality: municipality.to_string(),
            iata_code: iata_code.to_string(),
            iso_country: iso_country.to_string(),
            kind_raw: kind_raw.map(|k| k.to_string()),
        }
    }

    pub fn kind(&self) -> AirportKind {
        AirportKind::from_raw(self.kind_raw.as_deref())
    }
}

/// A resolved place name: location code + region code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationResolution {
    /// IATA-style location code (airport or city-level aggregate)
    pub location_code: String,
    /// Two-letter country code of the matched row
    pub region_code: String,
}

/// Immutable, process-wide airport reference table
pub struct AirportTable {
    records: Vec<AirportRecord>,
}

impl AirportTable {
    /// Build a table from raw dataset rows.
    ///
    /// Rows without a location code and rows for closed airports carry no
    /// resolvable code and are dropped up front; the remaining rows keep
    /// their original dataset order.
    pub fn from_records(records: Vec<AirportRecord>) -> Self {
        let records = records
            .into_iter()
            .filter(|r| !r.iata_code.is_empty() && r.kind_raw.as_deref() != Some("closed"))
            .collect();
        Self { records }
    }

    /// Parse the bundled reference dataset
    pub fn load_embedded() -> Result<Self, PlanError> {
        let records: Vec<AirportRecord> = serde_json::from_str(EMBEDDED_DATASET)?;
        Ok(Self::from_records(records))
    }

    /// Shared process-wide table, loaded on first use
    pub fn global() -> &'static AirportTable {
        GLOBAL_TABLE.get_or_init(|| {
            AirportTable::load_embedded().expect("bundled airport dataset is valid JSON")
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve a free-text place name to its canonical codes.
    ///
    /// Matching is exact (case-insensitive) on the municipality column, not a
    /// substring search. When several rows match, the row with the lowest
    /// [`AirportKind::priority`] wins; rank ties keep the first row in
    /// dataset order. Absence of a match is a normal outcome, not an error.
    pub fn resolve(&self, place_name: &str) -> Option<LocationResolution> {
        let wanted = place_name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }

        let best = self
            .records
            .iter()
            .filter(|r| r.municipality.to_lowercase() == wanted)
            .min_by_key(|r| r.kind().priority())?;

        debug!(
            place = place_name,
            code = %best.iata_code,
            country = %best.iso_country,
            matched = %best.name,
            "Resolved place name"
        );

        Some(LocationResolution {
            location_code: best.iata_code.clone(),
            region_code: best.iso_country.clone(),
        })
    }
}
