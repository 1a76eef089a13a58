// Lightning Lane client: offers, bookings, itinerary and eligibility against the park API

use crate::auth::AuthStore;
use crate::clock::{
    split_date_time, time_of_day, today, tomorrow, Clock, DateTimeStrings, PartialDateTime,
    SystemClock,
};
use crate::guests::GuestResolver;
use crate::model::{
    avatar_url, id_num, Booking, EntitledGuest, Experience, ExperienceRef, ExperienceType, Guest,
    Guests, LightningLane, LightningLaneType, Offer, OfferExperience, Park, PlusExperience,
    Reservation, ReservationType,
};
use crate::resort::{Resort, ResortData, ResortDataError};
use crate::storage::KeyValueStore;
use crate::tracker::{BookingTracker, EligibilitySource};
use crate::transport::{FetchRequest, Method, ReqwestTransport, Transport, TransportError};
use crate::wire::{
    ApiExperience, ChangeStatus, ExperiencesResponse, FastPassItem, FastPassKind, GuestsResponse,
    Itinerary, ItineraryItem, NewBookingResponse, OfferResponse, OfferStatus, ReservationItem,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MAX_PARTY_SIZE: usize = 12;

const GUESTS_PATH: &str = "/ea-vas/api/v1/guests";
const OFFER_PATH: &str = "/ea-vas/api/v2/products/flex/offers";
const MODIFY_OFFER_PATH: &str = "/ea-vas/api/v1/products/flex/offers/modify";
const BOOKING_PATH: &str = "/ea-vas/api/v2/products/flex/bookings";

// Reservations that started longer ago than this are hidden
const STALE_RESERVATION_MINUTES: i64 = 30;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {status} - {body}")]
    RequestError { status: u16, body: Value },

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),

    #[error("Unexpected response shape: {0}")]
    DecodeError(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Unsupported origin: {0}")]
    UnknownOrigin(String),

    #[error("Experience {0} missing from reference data")]
    UnknownExperience(String),

    #[error("Park {0} missing from reference data")]
    UnknownPark(String),

    #[error("Reference data error: {0}")]
    ResortDataError(#[from] ResortDataError),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub origin: String,
    pub timeout_ms: u64,
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: "https://disneyworld.disney.go.com".to_string(),
            timeout_ms: 30000,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            origin: std::env::var("LL_ORIGIN").unwrap_or(defaults.origin),
            timeout_ms: std::env::var("LL_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_ms),
            data_dir: std::env::var("LL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }
}

pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// Experience and park an eligibility query is scoped to. The neutral
/// context ("0"/"0") lists the whole party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityContext {
    pub experience_id: String,
    pub park_id: String,
}

impl EligibilityContext {
    pub fn neutral() -> Self {
        Self::new("0", "0")
    }

    pub fn new(experience_id: impl Into<String>, park_id: impl Into<String>) -> Self {
        Self {
            experience_id: experience_id.into(),
            park_id: park_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExperienceListing {
    pub experiences: Vec<Experience>,
    // earliest time-of-day at which any guest may book again
    pub next_book_time: Option<String>,
}

impl ExperienceListing {
    pub fn plus(&self) -> Vec<PlusExperience> {
        self.experiences
            .iter()
            .cloned()
            .filter_map(|exp| PlusExperience::try_from(exp).ok())
            .collect()
    }
}

struct ApiRequest {
    path: String,
    method: Method,
    params: Vec<(String, String)>,
    data: Option<Value>,
    key: Option<&'static str>,
    user_id: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            params: Vec::new(),
            data: None,
            key: None,
            user_id: true,
        }
    }

    fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    fn post(path: impl Into<String>, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::new(Method::Post, path)
        }
    }

    fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    fn key(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }

    fn without_user_id(mut self) -> Self {
        self.user_id = false;
        self
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::DecodeError(e.to_string()))
}

pub struct LightningLaneClient {
    origin: String,
    resort: Resort,
    data: ResortData,
    auth: Arc<dyn AuthStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    resolver: GuestResolver,
    tracker: BookingTracker,
    primary_guest_id: RwLock<Option<String>>,
    on_unauthorized: RwLock<Option<UnauthorizedHook>>,
}

impl LightningLaneClient {
    pub fn new(
        config: &ClientConfig,
        data: ResortData,
        auth: Arc<dyn AuthStore>,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ApiError> {
        let resort = Resort::from_origin(&config.origin)
            .ok_or_else(|| ApiError::UnknownOrigin(config.origin.clone()))?;
        let tracker = BookingTracker::load(storage, clock.clone());
        Ok(Self {
            origin: config.origin.trim_end_matches('/').to_string(),
            resort,
            data,
            auth,
            transport,
            clock,
            resolver: GuestResolver::new(),
            tracker,
            primary_guest_id: RwLock::new(None),
            on_unauthorized: RwLock::new(None),
        })
    }

    /// Builds a client with the resort's reference data from
    /// `<data_dir>/<resort>.json`, an HTTP transport and the system clock.
    pub fn load(
        config: &ClientConfig,
        auth: Arc<dyn AuthStore>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        let resort = Resort::from_origin(&config.origin)
            .ok_or_else(|| ApiError::UnknownOrigin(config.origin.clone()))?;
        let data = ResortData::load(config.data_dir.join(resort.data_file_name()))?;
        let transport =
            ReqwestTransport::new(std::time::Duration::from_millis(config.timeout_ms))?;
        info!(resort = resort.code(), parks = data.parks.len(), "lightning lane client loaded");
        Self::new(
            config,
            data,
            auth,
            Arc::new(transport),
            storage,
            Arc::new(SystemClock),
        )
    }

    pub fn resort(&self) -> Resort {
        self.resort
    }

    pub fn parks(&self) -> &[Park] {
        &self.data.parks
    }

    pub fn max_party_size(&self) -> usize {
        MAX_PARTY_SIZE
    }

    pub fn set_on_unauthorized(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_unauthorized.write() = Some(Arc::new(hook));
    }

    pub fn set_party_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolver.set_party_ids(ids);
    }

    pub fn experienced(&self, experience_id: &str) -> bool {
        self.tracker.experienced(experience_id)
    }

    pub fn tracker(&self) -> &BookingTracker {
        &self.tracker
    }

    pub fn next_drop_time(&self, park_id: &str) -> Option<String> {
        self.data
            .next_drop_time(park_id, &time_of_day(self.clock.as_ref()))
            .map(str::to_string)
    }

    pub fn log_out(&self) {
        let hook = self.on_unauthorized.read().clone();
        log_out(self.auth.as_ref(), hook);
    }

    // Runs after the failing call has returned its own error
    fn schedule_log_out(&self) {
        let auth = self.auth.clone();
        let hook = self.on_unauthorized.read().clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    log_out(auth.as_ref(), hook);
                });
            }
            Err(_) => log_out(auth.as_ref(), hook),
        }
    }

    async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let auth = self.auth.data().ok_or(ApiError::NotAuthenticated)?;
        let url = format!("{}{}", self.origin, request.path);
        let mut params = request.params;
        if request.user_id {
            params.push(("userId".to_string(), auth.swid.clone()));
        }
        let fetch = FetchRequest {
            method: request.method,
            params,
            data: request.data,
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("BEARER {}", auth.access_token),
                ),
                ("x-user-id".to_string(), auth.swid),
            ],
        };

        let response = self.transport.fetch_json(&url, fetch).await?;
        debug!(
            method = request.method.as_str(),
            path = %request.path,
            status = response.status,
            "upstream request"
        );

        if response.status == 401 {
            warn!(path = %request.path, "unauthorized, logging out");
            self.schedule_log_out();
        } else if response.is_success()
            && request
                .key
                .map_or(true, |key| response.data.get(key).is_some_and(|v| !v.is_null()))
        {
            return Ok(response.data);
        }
        Err(ApiError::RequestError {
            status: response.status,
            body: response.data,
        })
    }

    /// Availability for a park merged with reference data. Experiences
    /// missing from the reference tables are left out.
    pub async fn experiences(&self, park_id: &str) -> Result<ExperienceListing, ApiError> {
        // the endpoint annotates eligibility for the guest ids we pass
        match self.primary_guest_id(None).await {
            Ok(_) => {}
            // logout is already scheduled
            Err(e @ ApiError::RequestError { status: 401, .. }) => return Err(e),
            Err(e) => warn!(error = %e, "could not prime guest cache"),
        }
        let path = format!(
            "/tipboard-vas/api/v1/parks/{}/experiences",
            urlencoding::encode(park_id)
        );
        let body = self
            .request(
                ApiRequest::get(path)
                    .param("eligibilityGuestIds", self.resolver.cached_ids().join(",")),
            )
            .await?;
        let response: ExperiencesResponse = decode(body)?;

        let next_book_time = response
            .eligibility
            .iter()
            .flat_map(|e| e.flex_eligibility_windows.iter())
            .map(|window| window.time.time.clone())
            .min();
        let drop_time = self.next_drop_time(park_id);
        let experiences = response
            .available_experiences
            .into_iter()
            .filter_map(|exp| self.merge_experience(park_id, exp, drop_time.as_deref()))
            .collect();

        Ok(ExperienceListing {
            experiences,
            next_book_time,
        })
    }

    fn merge_experience(
        &self,
        park_id: &str,
        exp: ApiExperience,
        drop_time: Option<&str>,
    ) -> Option<Experience> {
        let Some(data) = self.data.experience(&exp.id) else {
            debug!(experience_id = %exp.id, "skipping experience without reference data");
            return None;
        };
        Some(Experience {
            name: data.name.clone(),
            park: data.park.clone(),
            land: data.land.clone(),
            geo: data.geo,
            experience_type: data
                .experience_type
                .or(exp.experience_type)
                .unwrap_or(ExperienceType::Attraction),
            standby: exp.standby,
            additional_show_times: exp.additional_show_times,
            flex: exp.flex,
            individual: exp.individual,
            priority: data.priority,
            sort: data.sort,
            experienced: self.tracker.experienced(&exp.id),
            drop: self.data.is_drop(park_id, data.drop_mask, drop_time),
            id: exp.id,
        })
    }

    pub async fn guests(&self, context: Option<&EligibilityContext>) -> Result<Guests, ApiError> {
        let neutral = EligibilityContext::neutral();
        let context = context.unwrap_or(&neutral);
        let body = self
            .request(
                ApiRequest::get(GUESTS_PATH)
                    .param("productType", "FLEX")
                    .param("experienceId", context.experience_id.as_str())
                    .param("parkId", context.park_id.as_str()),
            )
            .await?;
        let response: GuestsResponse = decode(body)?;
        if let Some(id) = response.primary_guest_id.filter(|id| !id.is_empty()) {
            *self.primary_guest_id.write() = Some(id);
        }
        Ok(self
            .resolver
            .resolve(&response.guests, &response.ineligible_guests))
    }

    pub async fn primary_guest_id(
        &self,
        context: Option<&EligibilityContext>,
    ) -> Result<String, ApiError> {
        let known = self.primary_guest_id.read().clone();
        if let Some(id) = known {
            return Ok(id);
        }
        self.guests(context).await?;
        Ok(self.primary_guest_id.read().clone().unwrap_or_default())
    }

    /// Requests a return-time offer. When modifying, the existing booking's
    /// guests are used and `guests` is ignored.
    pub async fn offer(
        &self,
        experience: &PlusExperience,
        guests: &[Guest],
        booking_to_modify: Option<&LightningLane>,
    ) -> Result<Offer, ApiError> {
        let context = EligibilityContext::new(experience.id.as_str(), experience.park.as_str());
        let primary_guest_id = self.primary_guest_id(Some(&context)).await?;

        let guest_ids: Vec<&str> = match booking_to_modify {
            Some(booking) => booking.guests.iter().map(|g| g.id.as_str()).collect(),
            None => guests.iter().map(|g| g.id.as_str()).collect(),
        };
        let mut data = json!({
            "guestIds": guest_ids,
            "ineligibleGuests": [],
            "primaryGuestId": primary_guest_id,
            "parkId": experience.park,
            "experienceId": experience.id,
            "selectedTime": experience.flex().next_available_time,
        });
        let path = match booking_to_modify {
            Some(booking) => {
                let modification_type = if booking.experience.id == experience.id {
                    "TIME"
                } else {
                    "EXPERIENCE"
                };
                data["modificationType"] = json!(modification_type);
                MODIFY_OFFER_PATH
            }
            None => OFFER_PATH,
        };

        let body = self
            .request(ApiRequest::post(path, data).key("offer").without_user_id())
            .await?;
        let response: OfferResponse = decode(body)?;
        let offer = response.offer;
        debug!(offer_id = %offer.id, experience_id = %experience.id, "offer received");

        Ok(Offer {
            start: DateTimeStrings {
                date: offer.date.clone(),
                time: offer.start_time,
            },
            end: DateTimeStrings {
                date: offer.date,
                time: offer.end_time,
            },
            active: offer.status == OfferStatus::Active,
            changed: offer.change_status != ChangeStatus::Unchanged,
            guests: self
                .resolver
                .resolve(&response.eligible_guests, &response.ineligible_guests),
            experience: OfferExperience {
                id: experience.id.clone(),
                park: experience.park.clone(),
            },
            id: offer.id,
        })
    }

    pub async fn cancel_offer(&self, offer: &Offer) -> Result<(), ApiError> {
        let path = format!("/ea-vas/api/v1/offers/{}", urlencoding::encode(&offer.id));
        self.request(
            ApiRequest::delete(path)
                .param("productType", "FLEX")
                .without_user_id(),
        )
        .await?;
        Ok(())
    }

    /// Confirms an offer. For modifications, guests of the original booking
    /// in the modify set (default: the offer's eligible guests) have their
    /// entitlements replaced and the rest are dropped from the booking.
    pub async fn book(
        &self,
        offer: &Offer,
        booking_to_modify: Option<&LightningLane>,
        guests_to_modify: Option<&[Guest]>,
    ) -> Result<LightningLane, ApiError> {
        let mut data = json!({ "offerId": offer.id });
        if let Some(booking) = booking_to_modify {
            let modify_ids: HashSet<&str> = guests_to_modify
                .unwrap_or(offer.guests.eligible.as_slice())
                .iter()
                .map(|g| g.id.as_str())
                .collect();
            let (kept, dropped): (Vec<&EntitledGuest>, Vec<&EntitledGuest>) = booking
                .guests
                .iter()
                .partition(|g| modify_ids.contains(g.id.as_str()));
            data["entitlementsToModify"] = json!(kept
                .iter()
                .map(|g| g.entitlement_id.as_str())
                .collect::<Vec<_>>());
            data["excludedGuestIds"] =
                json!(dropped.iter().map(|g| g.id.as_str()).collect::<Vec<_>>());
        }

        let mut body = self
            .request(
                ApiRequest::post(BOOKING_PATH, data)
                    .key("booking")
                    .without_user_id(),
            )
            .await?;
        let response: NewBookingResponse = decode(body["booking"].take())?;
        info!(booking_id = %response.id, "lightning lane booked");

        if let Err(e) = self.bookings().await {
            warn!(error = %e, "itinerary refresh after booking failed");
        }
        self.booked_lane(response)
    }

    fn booked_lane(&self, response: NewBookingResponse) -> Result<LightningLane, ApiError> {
        let details = response.single_experience_details;
        let experience = self
            .data
            .experience(&details.experience_id)
            .ok_or_else(|| ApiError::UnknownExperience(details.experience_id.clone()))?;
        let park = self
            .data
            .park(&details.park_id)
            .or_else(|| self.data.park(&experience.park))
            .cloned()
            .ok_or_else(|| ApiError::UnknownPark(details.park_id.clone()))?;
        let when = |value: Option<String>| -> PartialDateTime {
            value
                .as_deref()
                .and_then(split_date_time)
                .map(Into::into)
                .unwrap_or_default()
        };

        Ok(LightningLane {
            subtype: LightningLaneType::Plus,
            experience: ExperienceRef {
                id: details.experience_id.clone(),
                name: experience.name.clone(),
            },
            park,
            start: when(response.start_date_time),
            end: when(response.end_date_time),
            cancellable: true,
            modifiable: response
                .entitlements
                .iter()
                .any(|e| e.usage_details.modifiable),
            guests: response
                .entitlements
                .iter()
                .map(|e| EntitledGuest {
                    guest: self.resolver.guest_from_cache(&e.guest_id),
                    entitlement_id: e.id.clone(),
                    booking_id: Some(response.id.clone()),
                    redemptions: None,
                })
                .collect(),
            choices: None,
            booking_id: response.id,
        })
    }

    pub async fn cancel_booking(&self, guests: &[EntitledGuest]) -> Result<(), ApiError> {
        if guests.is_empty() {
            return Ok(());
        }
        let ids = guests
            .iter()
            .map(|g| urlencoding::encode(&g.entitlement_id).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        self.request(ApiRequest::delete(format!("/ea-vas/api/v1/entitlements/{}", ids)).without_user_id())
            .await?;
        Ok(())
    }

    /// Today's itinerary: lanes plus dining/activity reservations, in
    /// upstream order. Records that cannot be resolved against reference
    /// data are left out. Refreshes the booking tracker.
    pub async fn bookings(&self) -> Result<Vec<Booking>, ApiError> {
        let swid = self.auth.data().ok_or(ApiError::NotAuthenticated)?.swid;
        let path = format!(
            "/plan/{}/api/v1/itinerary-items/{}",
            self.resort.itinerary_api_name(),
            urlencoding::encode(&swid)
        );
        let today = today(self.clock.as_ref());
        let body = self
            .request(
                ApiRequest::get(path)
                    .param("destination", self.resort.code())
                    .param("fields", "items,profiles,assets")
                    .param("item-types", "FASTPASS")
                    .param("item-types", "DINING")
                    .param("item-types", "ACTIVITY")
                    .param("guest-locators", format!("{};type=swid", swid))
                    .param("guest-locator-groups", "MY_FAMILY")
                    .param("start-date", today.as_str())
                    .param("end-date", tomorrow(self.clock.as_ref()))
                    .param("show-friends", "false")
                    .without_user_id(),
            )
            .await?;
        let itinerary: Itinerary = decode(body)?;
        let earliest = self.clock.now() - Duration::minutes(STALE_RESERVATION_MINUTES);

        let mut bookings = Vec::new();
        for raw in &itinerary.items {
            let item = match serde_json::from_value::<ItineraryItem>(raw.clone()) {
                Ok(item) => item,
                Err(e) => {
                    debug!(error = %e, "skipping malformed itinerary item");
                    continue;
                }
            };
            let booking = match item {
                ItineraryItem::FastPass(fp) => {
                    self.lightning_lane(fp, &itinerary).map(Booking::LightningLane)
                }
                ItineraryItem::Dining(res) => self
                    .reservation(res, ReservationType::Dining, &itinerary, earliest)
                    .map(Booking::Reservation),
                ItineraryItem::Activity(res) => self
                    .reservation(res, ReservationType::Activity, &itinerary, earliest)
                    .map(Booking::Reservation),
                ItineraryItem::Unknown => None,
            };
            bookings.extend(booking);
        }
        bookings.retain(|b| b.start_date().map_or(true, |date| date == today));

        if let Err(e) = self.tracker.update(&bookings, self).await {
            warn!(error = %e, "booking tracker update failed");
        }
        Ok(bookings)
    }

    fn lightning_lane(&self, fp: FastPassItem, itinerary: &Itinerary) -> Option<LightningLane> {
        let flex = fp.kind == FastPassKind::Flex;
        let subtype = if fp.multiple_experiences {
            LightningLaneType::Multi
        } else {
            match fp.kind {
                FastPassKind::Flex => LightningLaneType::Plus,
                FastPassKind::Standard => LightningLaneType::Individual,
                FastPassKind::Das | FastPassKind::Fds => LightningLaneType::Das,
                FastPassKind::Other => LightningLaneType::Other,
            }
        };

        let shown = if fp.multiple_experiences {
            fp.assets
                .iter()
                .find(|asset| asset.original)
                .map_or(fp.facility.as_str(), |asset| asset.content.as_str())
        } else {
            fp.facility.as_str()
        };
        let Some(experience) = self.experience_ref(shown, itinerary) else {
            debug!(item_id = %fp.id, facility = %shown, "dropping lane for unknown experience");
            return None;
        };
        let Some(park) = self.lane_park(shown, &experience.id, itinerary) else {
            debug!(item_id = %fp.id, "dropping lane without resolvable park");
            return None;
        };

        let choices = fp.multiple_experiences.then(|| {
            let mut choices: Vec<ExperienceRef> = fp
                .assets
                .iter()
                .filter(|asset| !asset.excluded && !asset.original)
                .filter_map(|asset| self.experience_ref(&asset.content, itinerary))
                .collect();
            choices.sort_by(|a, b| a.name.cmp(&b.name));
            choices
        });

        let guests = fp
            .guests
            .iter()
            .map(|g| EntitledGuest {
                guest: self.itinerary_guest(&g.id, itinerary),
                entitlement_id: g.entitlement_id.clone(),
                booking_id: g.booking_id.clone(),
                redemptions: g.redemptions_remaining,
            })
            .collect();

        Some(LightningLane {
            booking_id: fp.id,
            subtype,
            experience,
            park,
            start: PartialDateTime {
                date: fp.display_start_date,
                time: fp.display_start_time,
            },
            end: PartialDateTime {
                date: fp.display_end_date,
                time: fp.display_end_time,
            },
            // only flex lanes can be changed from here
            cancellable: flex && fp.cancellable,
            modifiable: flex && fp.modifiable,
            guests,
            choices,
        })
    }

    fn experience_ref(&self, raw_id: &str, itinerary: &Itinerary) -> Option<ExperienceRef> {
        let id = id_num(raw_id);
        let name = self
            .data
            .experience(id)
            .map(|exp| exp.name.clone())
            .or_else(|| {
                itinerary
                    .assets
                    .get(raw_id)
                    .map(|asset| asset.name.clone())
                    .filter(|name| !name.is_empty())
            })?;
        Some(ExperienceRef {
            id: id.to_string(),
            name,
        })
    }

    fn lane_park(&self, raw_id: &str, experience_id: &str, itinerary: &Itinerary) -> Option<Park> {
        itinerary
            .assets
            .get(raw_id)
            .and_then(|asset| asset.location.as_deref())
            .and_then(|location| self.data.park(id_num(location)))
            .or_else(|| {
                self.data
                    .experience(experience_id)
                    .and_then(|exp| self.data.park(&exp.park))
            })
            .cloned()
    }

    fn reservation(
        &self,
        item: ReservationItem,
        subtype: ReservationType,
        itinerary: &Itinerary,
        earliest: NaiveDateTime,
    ) -> Option<Reservation> {
        let activity_id = item.asset.as_deref()?;
        let resolved = itinerary.assets.get(activity_id).and_then(|activity| {
            let facility = itinerary.assets.get(activity.facility.as_deref()?)?;
            let park = self.data.park(id_num(facility.location.as_deref()?))?;
            Some((activity, park))
        });
        let Some((activity, park)) = resolved else {
            debug!(item_id = %item.id, "dropping reservation with incomplete location chain");
            return None;
        };

        let start = item.start_date_time.as_deref().and_then(split_date_time)?;
        if start.to_naive().map_or(true, |at| at < earliest) {
            debug!(item_id = %item.id, "dropping past reservation");
            return None;
        }

        Some(Reservation {
            booking_id: item.id,
            subtype,
            experience: ExperienceRef {
                id: id_num(activity_id).to_string(),
                name: activity.name.clone(),
            },
            park: park.clone(),
            start,
            guests: item
                .guests
                .iter()
                .map(|g| self.itinerary_guest(&g.id, itinerary))
                .collect(),
        })
    }

    // Profile from the itinerary, falling back to the guest cache
    fn itinerary_guest(&self, raw_id: &str, itinerary: &Itinerary) -> Guest {
        let id = id_num(raw_id);
        match itinerary
            .profiles
            .get(raw_id)
            .or_else(|| itinerary.profiles.get(id))
        {
            Some(profile) => Guest {
                id: id.to_string(),
                name: profile.full_name(),
                avatar_image_url: avatar_url(profile.avatar_id.as_deref()),
                ..Default::default()
            },
            None => self.resolver.guest_from_cache(id),
        }
    }
}

#[async_trait]
impl EligibilitySource for LightningLaneClient {
    async fn experience_guests(&self, experience_id: &str) -> Result<Guests, ApiError> {
        let park_id = self
            .data
            .experience(experience_id)
            .map_or("0", |exp| exp.park.as_str());
        self.guests(Some(&EligibilityContext::new(experience_id, park_id)))
            .await
    }
}

fn log_out(auth: &dyn AuthStore, hook: Option<UnauthorizedHook>) {
    auth.delete_data();
    if let Some(hook) = hook {
        hook();
    }
}
