// Lightning Lane booking client library

pub mod auth;
pub mod client;
pub mod clock;
pub mod guests;
pub mod model;
pub mod resort;
pub mod storage;
pub mod tracker;
pub mod transport;
pub mod wire; // upstream payload shapes

// Re-export key types for convenience
pub use auth::{AuthData, AuthStore, MemoryAuthStore};
pub use client::{
    ApiError, ClientConfig, EligibilityContext, ExperienceListing, LightningLaneClient,
    MAX_PARTY_SIZE,
};
pub use clock::{Clock, DateTimeStrings, FixedClock, PartialDateTime, SystemClock};
pub use guests::GuestResolver;
pub use model::{
    Booking, EntitledGuest, Experience, Guest, Guests, IneligibleReason, LightningLane,
    LightningLaneType, Offer, Park, PlusExperience, Reservation,
};
pub use resort::{Resort, ResortData, ResortDataError};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use tracker::{BookingTracker, TrackerError};
pub use transport::{ReqwestTransport, Transport, TransportError};
