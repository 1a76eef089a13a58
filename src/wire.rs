// Upstream payload shapes, deserialized as-is before normalization

use crate::model::{
    ExperienceType, FlexAvailability, IndividualAvailability, IneligibleReason, Standby,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGuest {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub primary: bool,
    pub character_id: Option<String>,
    pub ineligible_reason: Option<IneligibleReason>,
    pub eligible_after: Option<String>,
    #[serde(default)]
    pub transactional: bool,
}

impl ApiGuest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestsResponse {
    #[serde(default)]
    pub guests: Vec<ApiGuest>,
    #[serde(default)]
    pub ineligible_guests: Vec<ApiGuest>,
    pub primary_guest_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiExperience {
    pub id: String,
    #[serde(rename = "type")]
    pub experience_type: Option<ExperienceType>,
    #[serde(default)]
    pub standby: Standby,
    pub additional_show_times: Option<Vec<String>>,
    pub flex: Option<FlexAvailability>,
    pub individual: Option<IndividualAvailability>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EligibilityTime {
    pub time: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EligibilityWindow {
    pub time: EligibilityTime,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    #[serde(default)]
    pub flex_eligibility_windows: Vec<EligibilityWindow>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperiencesResponse {
    #[serde(default)]
    pub available_experiences: Vec<ApiExperience>,
    pub eligibility: Option<Eligibility>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    #[serde(rename = "NONE")]
    Unchanged,
    Changed,
    ParkHopping,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Active,
    Deleted,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOffer {
    pub id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub change_status: ChangeStatus,
    pub status: OfferStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    pub offer: ApiOffer,
    #[serde(default)]
    pub eligible_guests: Vec<ApiGuest>,
    #[serde(default)]
    pub ineligible_guests: Vec<ApiGuest>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageDetails {
    #[serde(default)]
    pub modifiable: bool,
    #[serde(default)]
    pub redeemable: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEntitlement {
    pub id: String,
    pub guest_id: String,
    #[serde(default)]
    pub usage_details: UsageDetails,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleExperienceDetails {
    pub experience_id: String,
    pub park_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookingResponse {
    pub id: String,
    pub start_date_time: Option<String>,
    pub end_date_time: Option<String>,
    #[serde(default)]
    pub entitlements: Vec<ApiEntitlement>,
    pub single_experience_details: SingleExperienceDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FastPassKind {
    Flex,
    Standard,
    Das,
    Fds,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemAsset {
    pub content: String,
    #[serde(default)]
    pub excluded: bool,
    #[serde(default)]
    pub original: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemGuest {
    pub id: String,
    #[serde(default)]
    pub entitlement_id: String,
    pub booking_id: Option<String>,
    pub redemptions_remaining: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FastPassItem {
    pub id: String,
    pub kind: FastPassKind,
    pub facility: String,
    #[serde(default)]
    pub assets: Vec<ItemAsset>,
    pub display_start_date: Option<String>,
    pub display_start_time: Option<String>,
    pub display_end_date: Option<String>,
    pub display_end_time: Option<String>,
    #[serde(default)]
    pub cancellable: bool,
    #[serde(default)]
    pub modifiable: bool,
    #[serde(default)]
    pub multiple_experiences: bool,
    #[serde(default)]
    pub guests: Vec<ItemGuest>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReservationGuest {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationItem {
    pub id: String,
    pub start_date_time: Option<String>,
    pub asset: Option<String>,
    #[serde(default)]
    pub guests: Vec<ReservationGuest>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ItineraryItem {
    #[serde(rename = "FASTPASS")]
    FastPass(FastPassItem),
    #[serde(rename = "DINING")]
    Dining(ReservationItem),
    #[serde(rename = "ACTIVITY")]
    Activity(ReservationItem),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Asset {
    #[serde(default)]
    pub name: String,
    pub facility: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileName {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: ProfileName,
    pub avatar_id: Option<String>,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name.first_name, self.name.last_name)
            .trim()
            .to_string()
    }
}

// Items stay raw so one malformed entry cannot sink the whole itinerary
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Itinerary {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub assets: HashMap<String, Asset>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}
