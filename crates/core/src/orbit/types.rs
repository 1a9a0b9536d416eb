use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ParseError;

/// Fixed-width timestamp layout used by granule and orbit file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

const TIMESTAMP_LEN: usize = 15;

/// A second-resolution instant in the `YYYYMMDDTHHMMSS` layout.
///
/// Names carry no timezone; values are compared as flat elapsed time, so the
/// ordering matches the lexicographic ordering of the formatted strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        if value.len() != TIMESTAMP_LEN {
            return Err(ParseError::Timestamp {
                value: value.to_string(),
                reason: format!("expected {} characters", TIMESTAMP_LEN),
            });
        }
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|e| ParseError::Timestamp {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// Shift by a signed number of seconds.
    pub fn shifted(&self, seconds: i64) -> Result<Self, ParseError> {
        self.0
            .checked_add_signed(chrono::TimeDelta::seconds(seconds))
            .map(Self)
            .ok_or_else(|| ParseError::OutOfRange(format!("{} {:+}s", self, seconds)))
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl FromStr for Timestamp {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// Orbit product type.
///
/// Variants are declared in preference order: precise orbits are the most
/// accurate, predicted orbits the least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrbitType {
    #[serde(rename = "AUX_POEORB")]
    Precise,
    #[serde(rename = "AUX_RESORB")]
    Restituted,
    #[serde(rename = "AUX_PREORB")]
    Predicted,
}

impl OrbitType {
    pub const ALL: [OrbitType; 3] = [Self::Precise, Self::Restituted, Self::Predicted];

    /// Storage namespace and upstream product type.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Precise => "AUX_POEORB",
            Self::Restituted => "AUX_RESORB",
            Self::Predicted => "AUX_PREORB",
        }
    }

    /// Key under which a mirrored file is stored.
    pub fn storage_key(&self, filename: &str) -> String {
        format!("{}/{}", self.namespace(), filename)
    }
}

impl fmt::Display for OrbitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

impl FromStr for OrbitType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.namespace().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownOrbitType(s.to_string()))
    }
}

/// One satellite acquisition, identified by its standardized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Granule {
    name: String,
    platform: String,
    acquisition_start: Timestamp,
    acquisition_end: Timestamp,
}

impl Granule {
    /// Parse a granule name such as
    /// `S1A_IW_GRDH_1SDV_20230515T075514_20230515T075542_048541_05D6B8_579B`.
    pub fn parse(name: &str) -> Result<Self, ParseError> {
        let slice = |range: std::ops::Range<usize>| {
            name.get(range)
                .ok_or_else(|| ParseError::Granule(name.to_string()))
        };

        let platform = slice(0..3)?.to_string();
        let acquisition_start = Timestamp::parse(slice(17..32)?)?;
        let acquisition_end = Timestamp::parse(slice(33..48)?)?;

        Ok(Self {
            name: name.to_string(),
            platform,
            acquisition_start,
            acquisition_end,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mission and unit code, e.g. `S1A`.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn acquisition_start(&self) -> Timestamp {
        self.acquisition_start
    }

    pub fn acquisition_end(&self) -> Timestamp {
        self.acquisition_end
    }
}

impl FromStr for Granule {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A candidate orbit product found in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrbitFile {
    pub orbit_type: OrbitType,
    pub platform: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub validity_start: Timestamp,
    #[serde(serialize_with = "serialize_timestamp")]
    pub validity_end: Timestamp,
    /// Full storage key, including the namespace prefix.
    pub key: String,
}

fn serialize_timestamp<S: serde::Serializer>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(ts)
}

impl OrbitFile {
    /// Parse an orbit file from its storage key.
    ///
    /// Only the basename is inspected. Layout:
    /// `S1A_OPER_AUX_POEORB_OPOD_20230604T080854_V20230514T225942_20230516T005942.EOF`
    /// with the validity interval at offsets 42..57 and 58..73.
    pub fn parse(key: &str, orbit_type: OrbitType) -> Result<Self, ParseError> {
        let filename = basename(key);
        let slice = |range: std::ops::Range<usize>| {
            filename
                .get(range)
                .ok_or_else(|| ParseError::OrbitFile(key.to_string()))
        };

        let platform = slice(0..3)?.to_string();
        let validity_start = Timestamp::parse(slice(42..57)?)?;
        let validity_end = Timestamp::parse(slice(58..73)?)?;

        if validity_start > validity_end {
            return Err(ParseError::OrbitFile(format!(
                "{}: validity starts after it ends",
                key
            )));
        }

        Ok(Self {
            orbit_type,
            platform,
            validity_start,
            validity_end,
            key: key.to_string(),
        })
    }

    /// Whether the validity interval fully contains `[start, end]`.
    pub fn covers(&self, start: Timestamp, end: Timestamp) -> bool {
        self.validity_start <= start && start <= end && end <= self.validity_end
    }

    pub fn filename(&self) -> &str {
        basename(&self.key)
    }
}

/// Last path segment of a storage key.
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRANULE: &str = "S1A_IW_GRDH_1SDV_20230515T075514_20230515T075542_048541_05D6B8_579B";
    const ORBIT_KEY: &str =
        "AUX_POEORB/S1A_OPER_AUX_POEORB_OPOD_20230604T080854_V20230514T225942_20230516T005942.EOF";

    #[test]
    fn test_timestamp_round_trips_through_display() {
        let ts = Timestamp::parse("20230515T075514").unwrap();
        assert_eq!(ts.to_string(), "20230515T075514");
    }

    #[test]
    fn test_timestamp_rejects_bad_input() {
        assert!(matches!(
            Timestamp::parse("2023-05-15T07:55"),
            Err(ParseError::Timestamp { .. })
        ));
        assert!(matches!(
            Timestamp::parse("20231315T075514"),
            Err(ParseError::Timestamp { .. })
        ));
    }

    #[test]
    fn test_timestamp_order_matches_string_order() {
        let a = Timestamp::parse("20221231T235959").unwrap();
        let b = Timestamp::parse("20230101T000000").unwrap();
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn test_orbit_type_namespaces() {
        assert_eq!(OrbitType::Precise.namespace(), "AUX_POEORB");
        assert_eq!(OrbitType::Restituted.namespace(), "AUX_RESORB");
        assert_eq!(OrbitType::Predicted.namespace(), "AUX_PREORB");
        assert_eq!(
            OrbitType::Restituted.storage_key("file.EOF"),
            "AUX_RESORB/file.EOF"
        );
    }

    #[test]
    fn test_orbit_type_priority() {
        assert!(OrbitType::Precise < OrbitType::Restituted);
        assert!(OrbitType::Restituted < OrbitType::Predicted);
    }

    #[test]
    fn test_orbit_type_from_str() {
        assert_eq!("AUX_POEORB".parse::<OrbitType>().unwrap(), OrbitType::Precise);
        assert_eq!("aux_resorb".parse::<OrbitType>().unwrap(), OrbitType::Restituted);
        assert!(matches!(
            "AUX_FOO".parse::<OrbitType>(),
            Err(ParseError::UnknownOrbitType(_))
        ));
    }

    #[test]
    fn test_orbit_type_serde_uses_namespace() {
        let json = serde_json::to_string(&OrbitType::Predicted).unwrap();
        assert_eq!(json, "\"AUX_PREORB\"");
        let parsed: OrbitType = serde_json::from_str("\"AUX_POEORB\"").unwrap();
        assert_eq!(parsed, OrbitType::Precise);
    }

    #[test]
    fn test_granule_parse() {
        let granule = Granule::parse(GRANULE).unwrap();
        assert_eq!(granule.platform(), "S1A");
        assert_eq!(granule.acquisition_start().to_string(), "20230515T075514");
        assert_eq!(granule.acquisition_end().to_string(), "20230515T075542");
        assert_eq!(granule.name(), GRANULE);
    }

    #[test]
    fn test_granule_too_short() {
        assert!(matches!(
            Granule::parse("S1A_IW_GRDH"),
            Err(ParseError::Granule(_))
        ));
    }

    #[test]
    fn test_orbit_file_parse() {
        let orbit = OrbitFile::parse(ORBIT_KEY, OrbitType::Precise).unwrap();
        assert_eq!(orbit.platform, "S1A");
        assert_eq!(orbit.validity_start.to_string(), "20230514T225942");
        assert_eq!(orbit.validity_end.to_string(), "20230516T005942");
        assert_eq!(orbit.key, ORBIT_KEY);
        assert_eq!(
            orbit.filename(),
            "S1A_OPER_AUX_POEORB_OPOD_20230604T080854_V20230514T225942_20230516T005942.EOF"
        );
    }

    #[test]
    fn test_orbit_file_rejects_short_name() {
        assert!(matches!(
            OrbitFile::parse("AUX_POEORB/README.txt", OrbitType::Precise),
            Err(ParseError::OrbitFile(_))
        ));
    }

    #[test]
    fn test_orbit_file_rejects_inverted_interval() {
        let key = "S1A_OPER_AUX_POEORB_OPOD_20230604T080854_V20230516T005942_20230514T225942.EOF";
        assert!(matches!(
            OrbitFile::parse(key, OrbitType::Precise),
            Err(ParseError::OrbitFile(_))
        ));
    }

    #[test]
    fn test_covers_is_inclusive() {
        let orbit = OrbitFile::parse(ORBIT_KEY, OrbitType::Precise).unwrap();
        let start = orbit.validity_start;
        let end = orbit.validity_end;
        assert!(orbit.covers(start, end));
        assert!(!orbit.covers(start.shifted(-1).unwrap(), end));
        assert!(!orbit.covers(start, end.shifted(1).unwrap()));
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("a/b/c.EOF"), "c.EOF");
        assert_eq!(basename("c.EOF"), "c.EOF");
        assert_eq!(basename("bar/hello/world/f"), "f");
    }
}
