// Static per-resort reference data: parks, experience metadata and drop-time tables

use crate::model::{ExperienceType, Land, Park};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResortDataError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Drop times for park {park} are not sorted: {times:?}")]
    UnsortedDropTimes { park: String, times: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resort {
    #[serde(rename = "WDW")]
    WaltDisneyWorld,
    #[serde(rename = "DLR")]
    Disneyland,
}

impl Resort {
    pub fn from_origin(origin: &str) -> Option<Self> {
        match origin.trim_end_matches('/') {
            "https://disneyworld.disney.go.com" => Some(Resort::WaltDisneyWorld),
            "https://disneyland.disney.go.com" => Some(Resort::Disneyland),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Resort::WaltDisneyWorld => "WDW",
            Resort::Disneyland => "DLR",
        }
    }

    pub fn itinerary_api_name(self) -> &'static str {
        match self {
            Resort::WaltDisneyWorld => "wdw-itinerary-api",
            Resort::Disneyland => "dlr-itinerary-web-api",
        }
    }

    // File stem of the resort's reference data
    pub fn data_file_name(self) -> String {
        format!("{}.json", self.code().to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceData {
    pub name: String,
    pub park: String,
    #[serde(default)]
    pub land: Option<Land>,
    #[serde(default)]
    pub geo: Option<(f64, f64)>,
    #[serde(default, rename = "type")]
    pub experience_type: Option<ExperienceType>,
    // bit i set => queue opens at the park's i-th drop time
    #[serde(default, rename = "pdtMask")]
    pub drop_mask: u32,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub sort: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResortData {
    pub parks: Vec<Park>,
    pub experiences: HashMap<String, ExperienceData>,
    #[serde(default, rename = "pdts")]
    pub drop_times: HashMap<String, Vec<String>>,
}

impl ResortData {
    pub fn from_json(json: &str) -> Result<Self, ResortDataError> {
        let data: ResortData = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResortDataError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    // Lookup relies on lexicographic order of zero-padded HH:MM strings
    fn validate(&self) -> Result<(), ResortDataError> {
        for (park, times) in &self.drop_times {
            if times.windows(2).any(|pair| pair[0] > pair[1]) {
                return Err(ResortDataError::UnsortedDropTimes {
                    park: park.clone(),
                    times: times.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn park(&self, id: &str) -> Option<&Park> {
        self.parks.iter().find(|park| park.id == id)
    }

    pub fn experience(&self, id: &str) -> Option<&ExperienceData> {
        self.experiences.get(id)
    }

    pub fn drop_times(&self, park_id: &str) -> &[String] {
        self.drop_times
            .get(park_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First scheduled drop time at or after `now` ("HH:MM"), if any remain today.
    pub fn next_drop_time(&self, park_id: &str, now: &str) -> Option<&str> {
        self.drop_times(park_id)
            .iter()
            .map(String::as_str)
            .find(|time| *time >= now)
    }

    /// Whether an experience's queue opens at the given drop time. A drop time
    /// absent from the park's list never matches.
    pub fn is_drop(&self, park_id: &str, drop_mask: u32, drop_time: Option<&str>) -> bool {
        let Some(drop_time) = drop_time else {
            return false;
        };
        self.drop_times(park_id)
            .iter()
            .position(|time| time == drop_time)
            .and_then(|idx| u32::try_from(idx).ok())
            .and_then(|idx| 1u32.checked_shl(idx))
            .map_or(false, |bit| drop_mask & bit != 0)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use test_case::test_case;

    #[test_case("09:00", Some("11:30"); "before first drop")]
    #[test_case("11:30", Some("11:30"); "exactly at a drop")]
    #[test_case("11:31", Some("13:30"); "between drops")]
    #[test_case("15:31", None; "after last drop")]
    fn test_next_drop_time(now: &str, expected: Option<&str>) {
        let data = resort_data();
        assert_eq!(data.next_drop_time(MK, now), expected);
    }

    #[test]
    fn test_next_drop_time_for_park_without_table() {
        assert_eq!(resort_data().next_drop_time(EPCOT, "08:00"), None);
    }

    #[test_case(0b01, Some("11:30"), true; "first bit at first drop")]
    #[test_case(0b10, Some("11:30"), false; "second bit at first drop")]
    #[test_case(0b10, Some("13:30"), true; "second bit at second drop")]
    #[test_case(u32::MAX, Some("12:00"), false; "unknown drop time never matches")]
    #[test_case(u32::MAX, None, false; "no drop time left")]
    fn test_is_drop(mask: u32, drop_time: Option<&str>, expected: bool) {
        assert_eq!(resort_data().is_drop(MK, mask, drop_time), expected);
    }

    #[test_case("https://disneyworld.disney.go.com", Some(Resort::WaltDisneyWorld); "wdw")]
    #[test_case("https://disneyland.disney.go.com/", Some(Resort::Disneyland); "dlr trailing slash")]
    #[test_case("https://example.com", None; "unknown origin")]
    fn test_resort_from_origin(origin: &str, expected: Option<Resort>) {
        assert_eq!(Resort::from_origin(origin), expected);
    }

    #[test]
    fn test_from_json_rejects_unsorted_drop_times() {
        let json = r#"{
            "parks": [],
            "experiences": {},
            "pdts": {"80007944": ["13:30", "11:30"]}
        }"#;
        let result = ResortData::from_json(json);
        assert!(matches!(
            result,
            Err(ResortDataError::UnsortedDropTimes { .. })
        ));
    }

    #[test]
    fn test_from_json_reads_reference_tables() {
        let json = r#"{
            "parks": [{
                "id": "80007944",
                "name": "Magic Kingdom",
                "icon": "🏰",
                "geo": {"n": 28.4212, "s": 28.4146, "e": -81.5764, "w": -81.5865},
                "theme": {"bg": "bg-blue-600", "text": "text-blue-600"}
            }],
            "experiences": {
                "80010208": {"name": "Haunted Mansion", "park": "80007944", "geo": [28.4208, -81.5822], "pdtMask": 3},
                "80010153": {"name": "Jungle Cruise", "park": "80007944", "type": "ATTRACTION", "priority": 1}
            },
            "pdts": {"80007944": ["11:30", "13:30"]}
        }"#;
        let data = ResortData::from_json(json).unwrap();
        assert_eq!(data.park(MK).map(|p| p.name.as_str()), Some("Magic Kingdom"));
        assert_eq!(data.experience(HAUNTED_MANSION).map(|e| e.drop_mask), Some(3));
        assert_eq!(
            data.experience(JUNGLE_CRUISE).and_then(|e| e.priority),
            Some(1)
        );
        assert!(data.is_drop(MK, 3, Some("13:30")));
    }
}
