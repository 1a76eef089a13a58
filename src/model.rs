// Domain model: parks, experiences, guests, offers and bookings

use crate::clock::{DateTimeStrings, PartialDateTime};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

const AVATAR_BASE_URL: &str = "https://cdn1.parksmedia.wdprapps.disney.com/media/dpep/avatars";

/// Returns the part of a composite upstream id (`"<id>;<suffix>"`) before the
/// first `;`. Plain ids are returned unchanged.
pub fn id_num(raw: &str) -> &str {
    raw.split_once(';').map_or(raw, |(id, _)| id)
}

pub fn avatar_url(character_id: Option<&str>) -> Option<String> {
    character_id
        .filter(|id| !id.is_empty())
        .map(|id| format!("{}/{}.png", AVATAR_BASE_URL, id_num(id)))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub n: f64,
    pub s: f64,
    pub e: f64,
    pub w: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub bg: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Park {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub geo: GeoBounds,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperienceType {
    Attraction,
    Entertainment,
    Character,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StandbyUnavailableReason {
    TemporarilyDown,
    NotStandbyEnabled,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standby {
    #[serde(default)]
    pub available: bool,
    pub unavailable_reason: Option<StandbyUnavailableReason>,
    pub wait_time: Option<u32>,
    pub display_next_show_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexAvailability {
    #[serde(default)]
    pub available: bool,
    pub next_available_time: Option<String>,
    pub enrollment_start_time: Option<String>,
    #[serde(default)]
    pub preexisting_plan: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualAvailability {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub display_price: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Land {
    pub name: String,
    pub sort: u32,
}

// Reference record merged with a per-request availability record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    pub name: String,
    pub park: String,
    pub land: Option<Land>,
    pub geo: Option<(f64, f64)>,
    #[serde(rename = "type")]
    pub experience_type: ExperienceType,
    pub standby: Standby,
    pub additional_show_times: Option<Vec<String>>,
    pub flex: Option<FlexAvailability>,
    pub individual: Option<IndividualAvailability>,
    pub priority: Option<u32>,
    pub sort: Option<u32>,
    pub experienced: bool,
    pub drop: bool,
}

static NO_FLEX: FlexAvailability = FlexAvailability {
    available: false,
    next_available_time: None,
    enrollment_start_time: None,
    preexisting_plan: false,
};

/// An [`Experience`] known to carry a flex (Lightning Lane) availability block.
#[derive(Debug, Clone, PartialEq)]
pub struct PlusExperience(Experience);

impl PlusExperience {
    pub fn flex(&self) -> &FlexAvailability {
        // always Some after TryFrom
        self.0.flex.as_ref().unwrap_or(&NO_FLEX)
    }
}

impl TryFrom<Experience> for PlusExperience {
    type Error = Experience;

    fn try_from(experience: Experience) -> Result<Self, Self::Error> {
        if experience.flex.is_some() {
            Ok(Self(experience))
        } else {
            Err(experience)
        }
    }
}

impl Deref for PlusExperience {
    type Target = Experience;

    fn deref(&self) -> &Experience {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperienceRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IneligibleReason {
    InvalidParkAdmission,
    ParkReservationNeeded,
    #[serde(rename = "GENIE_PLUS_NEEDED")]
    LightningLaneNeeded,
    ExperienceLimitReached,
    TooEarly,
    TooEarlyForParkHopping,
    NotInParty,
    #[serde(other)]
    Unknown,
}

impl IneligibleReason {
    pub fn description(self) -> &'static str {
        match self {
            IneligibleReason::InvalidParkAdmission => "No park admission",
            IneligibleReason::ParkReservationNeeded => "Park reservation needed",
            IneligibleReason::LightningLaneNeeded => "Lightning Lane needed",
            IneligibleReason::ExperienceLimitReached => "Experience limit reached",
            IneligibleReason::TooEarly => "Too early",
            IneligibleReason::TooEarlyForParkHopping => "Too early to park hop",
            IneligibleReason::NotInParty => "Not in party",
            IneligibleReason::Unknown => "Ineligible",
        }
    }

    /// Reasons under which the upstream service may have listed someone who
    /// is not really a member of the party for the day.
    pub fn excludes_party_membership(self) -> bool {
        match self {
            IneligibleReason::InvalidParkAdmission
            | IneligibleReason::ParkReservationNeeded
            | IneligibleReason::LightningLaneNeeded => true,
            IneligibleReason::ExperienceLimitReached
            | IneligibleReason::TooEarly
            | IneligibleReason::TooEarlyForParkHopping
            | IneligibleReason::NotInParty
            | IneligibleReason::Unknown => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub primary: bool,
    pub avatar_image_url: Option<String>,
    pub ineligible_reason: Option<IneligibleReason>,
    pub eligible_after: Option<String>,
    #[serde(default)]
    pub transactional: bool,
}

impl Guest {
    pub fn is_eligible(&self) -> bool {
        self.ineligible_reason.is_none()
    }

    pub fn cause(&self) -> Option<&'static str> {
        self.ineligible_reason.map(IneligibleReason::description)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitledGuest {
    #[serde(flatten)]
    pub guest: Guest,
    pub entitlement_id: String,
    pub booking_id: Option<String>,
    pub redemptions: Option<u32>,
}

impl Deref for EntitledGuest {
    type Target = Guest;

    fn deref(&self) -> &Guest {
        &self.guest
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guests {
    pub eligible: Vec<Guest>,
    pub ineligible: Vec<Guest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferExperience {
    pub id: String,
    pub park: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub start: DateTimeStrings,
    pub end: DateTimeStrings,
    pub active: bool,
    pub changed: bool,
    pub guests: Guests,
    pub experience: OfferExperience,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightningLaneType {
    #[serde(rename = "G+")]
    Plus,
    #[serde(rename = "ILL")]
    Individual,
    #[serde(rename = "MULTI")]
    Multi,
    #[serde(rename = "DAS")]
    Das,
    #[serde(rename = "OTHER")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightningLane {
    pub booking_id: String,
    pub subtype: LightningLaneType,
    pub experience: ExperienceRef,
    pub park: Park,
    pub start: PartialDateTime,
    pub end: PartialDateTime,
    pub cancellable: bool,
    pub modifiable: bool,
    pub guests: Vec<EntitledGuest>,
    pub choices: Option<Vec<ExperienceRef>>,
}

impl LightningLane {
    pub fn replace_guests(&mut self, guests: Vec<EntitledGuest>) {
        self.guests = guests;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationType {
    Dining,
    Activity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub booking_id: String,
    pub subtype: ReservationType,
    pub experience: ExperienceRef,
    pub park: Park,
    pub start: DateTimeStrings,
    pub guests: Vec<Guest>,
}

impl Reservation {
    pub fn replace_guests(&mut self, guests: Vec<Guest>) {
        self.guests = guests;
    }
}

/// An itinerary entry. Shared fields are reachable through the accessors;
/// kind-specific fields require matching on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Booking {
    #[serde(rename = "LL")]
    LightningLane(LightningLane),
    #[serde(rename = "RES")]
    Reservation(Reservation),
}

impl Booking {
    pub fn booking_id(&self) -> &str {
        match self {
            Booking::LightningLane(ll) => &ll.booking_id,
            Booking::Reservation(res) => &res.booking_id,
        }
    }

    pub fn experience(&self) -> &ExperienceRef {
        match self {
            Booking::LightningLane(ll) => &ll.experience,
            Booking::Reservation(res) => &res.experience,
        }
    }

    pub fn park(&self) -> &Park {
        match self {
            Booking::LightningLane(ll) => &ll.park,
            Booking::Reservation(res) => &res.park,
        }
    }

    pub fn start(&self) -> PartialDateTime {
        match self {
            Booking::LightningLane(ll) => ll.start.clone(),
            Booking::Reservation(res) => res.start.clone().into(),
        }
    }

    pub fn end(&self) -> Option<&PartialDateTime> {
        match self {
            Booking::LightningLane(ll) => Some(&ll.end),
            Booking::Reservation(_) => None,
        }
    }

    pub fn start_date(&self) -> Option<&str> {
        match self {
            Booking::LightningLane(ll) => ll.start.date.as_deref(),
            Booking::Reservation(res) => Some(&res.start.date),
        }
    }

    pub fn cancellable(&self) -> bool {
        match self {
            Booking::LightningLane(ll) => ll.cancellable,
            Booking::Reservation(_) => false,
        }
    }

    pub fn modifiable(&self) -> bool {
        match self {
            Booking::LightningLane(ll) => ll.modifiable,
            Booking::Reservation(_) => false,
        }
    }

    pub fn guests(&self) -> Vec<&Guest> {
        match self {
            Booking::LightningLane(ll) => ll.guests.iter().map(|g| &g.guest).collect(),
            Booking::Reservation(res) => res.guests.iter().collect(),
        }
    }

    pub fn as_lightning_lane(&self) -> Option<&LightningLane> {
        match self {
            Booking::LightningLane(ll) => Some(ll),
            Booking::Reservation(_) => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use test_case::test_case;

    #[test_case("80010208;entityType=Attraction", "80010208"; "composite id")]
    #[test_case("80010208", "80010208"; "plain id")]
    #[test_case("a;b;c", "a"; "first separator only")]
    #[test_case("", ""; "empty")]
    fn test_id_num(raw: &str, expected: &str) {
        assert_eq!(id_num(raw), expected);
    }

    #[test]
    fn test_plus_experience_narrowing() {
        let experience = Experience {
            id: "80010190".to_string(),
            name: "Haunted Mansion".to_string(),
            park: "80007944".to_string(),
            land: None,
            geo: None,
            experience_type: ExperienceType::Attraction,
            standby: Standby::default(),
            additional_show_times: None,
            flex: None,
            individual: None,
            priority: None,
            sort: None,
            experienced: false,
            drop: false,
        };
        let experience = PlusExperience::try_from(experience).unwrap_err();

        let plus = PlusExperience::try_from(Experience {
            flex: Some(FlexAvailability {
                available: true,
                next_available_time: Some("11:30:00".to_string()),
                ..Default::default()
            }),
            ..experience
        })
        .unwrap();
        assert_eq!(plus.flex().next_available_time.as_deref(), Some("11:30:00"));
        assert_eq!(plus.name, "Haunted Mansion");
    }

    #[test]
    fn test_booking_accessors_follow_kind() {
        let lane = lane("80010190", true, true);
        assert!(lane.cancellable());
        assert!(lane.modifiable());
        assert!(lane.end().is_some());

        let reservation = Booking::Reservation(Reservation {
            booking_id: "res-1".to_string(),
            subtype: ReservationType::Dining,
            experience: ExperienceRef {
                id: "90001".to_string(),
                name: "Be Our Guest".to_string(),
            },
            park: park("80007944"),
            start: DateTimeStrings {
                date: "2026-10-19".to_string(),
                time: "12:30:00".to_string(),
            },
            guests: vec![],
        });
        assert!(!reservation.cancellable());
        assert!(!reservation.modifiable());
        assert!(reservation.end().is_none());
        assert_eq!(reservation.start_date(), Some("2026-10-19"));
        assert!(reservation.as_lightning_lane().is_none());
    }

    #[test]
    fn test_booking_serializes_with_discriminant() {
        let value = serde_json::to_value(lane("80010190", true, false)).unwrap();
        assert_eq!(value["type"], "LL");
        assert_eq!(value["subtype"], "G+");
    }

    #[test]
    fn test_cache_admission_reasons() {
        assert!(IneligibleReason::InvalidParkAdmission.excludes_party_membership());
        assert!(IneligibleReason::LightningLaneNeeded.excludes_party_membership());
        assert!(!IneligibleReason::ExperienceLimitReached.excludes_party_membership());
        assert!(!IneligibleReason::NotInParty.excludes_party_membership());
        assert!(!IneligibleReason::Unknown.excludes_party_membership());
    }

    #[test]
    fn test_unrecognised_upstream_codes_fall_back() {
        let reason: IneligibleReason = serde_json::from_str(r#""NO_VALID_TICKET""#).unwrap();
        assert_eq!(reason, IneligibleReason::Unknown);
        assert_eq!(reason.description(), "Ineligible");

        let kind: ExperienceType = serde_json::from_str(r#""CHARACTER_MEET""#).unwrap();
        assert_eq!(kind, ExperienceType::Other);
        let kind: ExperienceType = serde_json::from_str(r#""ENTERTAINMENT""#).unwrap();
        assert_eq!(kind, ExperienceType::Entertainment);
    }
}
