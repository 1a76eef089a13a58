// Day-scoped inference of which experiences each party has already used up

use crate::client::ApiError;
use crate::clock::{today, Clock};
use crate::model::{Booking, Guests, IneligibleReason};
use crate::storage::{KeyValueStore, StorageError};
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const TRACKER_KEY: &str = "bg1.genie.tracker";

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Persisted tracker state. Only meaningful for `date`; any other day's
/// record is treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerRecord {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub exp_ids: BTreeSet<String>,
    #[serde(default)]
    pub experienced_exp_ids: BTreeSet<String>,
}

impl TrackerRecord {
    fn reset(&mut self, date: String) {
        self.date = date;
        self.exp_ids.clear();
        self.experienced_exp_ids.clear();
    }
}

// Seam for the targeted eligibility re-query
#[async_trait]
pub trait EligibilitySource: Send + Sync {
    async fn experience_guests(&self, experience_id: &str) -> Result<Guests, ApiError>;
}

pub struct BookingTracker {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
    state: Mutex<TrackerRecord>,
    // one update at a time per instance
    updating: tokio::sync::Mutex<()>,
}

impl BookingTracker {
    pub fn load(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::load_with_key(storage, clock, TRACKER_KEY)
    }

    pub fn load_with_key(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let mut record = match storage.get(&key) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "discarding unreadable tracker record");
                TrackerRecord::default()
            }),
            Ok(None) => TrackerRecord::default(),
            Err(e) => {
                warn!(key = %key, error = %e, "tracker storage unavailable, starting empty");
                TrackerRecord::default()
            }
        };
        let today = today(clock.as_ref());
        if record.date != today {
            record.reset(today);
        }
        Self {
            storage,
            clock,
            key,
            state: Mutex::new(record),
            updating: tokio::sync::Mutex::new(()),
        }
    }

    /// Whether the experience is known to be used up for today.
    pub fn experienced(&self, experience_id: &str) -> bool {
        let state = self.state.lock();
        state.date == today(self.clock.as_ref()) && state.experienced_exp_ids.contains(experience_id)
    }

    pub fn record(&self) -> TrackerRecord {
        self.state.lock().clone()
    }

    /// Reconciles tracked state against a fresh itinerary.
    ///
    /// A cancellable lane that is no longer modifiable marks its experience
    /// as experienced right away. A tracked lane that vanished is confirmed
    /// with an eligibility re-query: "experience limit reached" for any guest
    /// marks it, anything else clears it. Failed re-queries leave that
    /// experience untouched and tracked so the next update retries it.
    pub async fn update(
        &self,
        bookings: &[Booking],
        source: &dyn EligibilitySource,
    ) -> Result<(), TrackerError> {
        let _updating = self.updating.lock().await;
        let today = today(self.clock.as_ref());

        let (previous, mut experienced) = {
            let mut state = self.state.lock();
            if state.date != today {
                info!(from = %state.date, to = %today, "booking tracker day rollover");
                state.reset(today.clone());
            }
            (state.exp_ids.clone(), state.experienced_exp_ids.clone())
        };

        let mut current = BTreeSet::new();
        for lane in bookings
            .iter()
            .filter_map(Booking::as_lightning_lane)
            .filter(|lane| lane.cancellable)
        {
            let id = lane.experience.id.clone();
            if lane.modifiable {
                experienced.remove(&id);
            } else if experienced.insert(id.clone()) {
                debug!(experience_id = %id, "lane no longer modifiable, marking experienced");
            }
            current.insert(id);
        }

        let vanished: Vec<&String> = previous.difference(&current).collect();
        let checks = join_all(vanished.into_iter().map(|id| async move {
            (id, source.experience_guests(id).await)
        }))
        .await;

        let mut retry = Vec::new();
        for (id, result) in checks {
            match result {
                Ok(guests) => {
                    let limit_reached = guests.ineligible.iter().any(|guest| {
                        guest.ineligible_reason == Some(IneligibleReason::ExperienceLimitReached)
                    });
                    if limit_reached {
                        info!(experience_id = %id, "lane gone and limit reached, marking experienced");
                        experienced.insert(id.clone());
                    } else {
                        debug!(experience_id = %id, "lane gone without limit, clearing");
                        experienced.remove(id);
                    }
                }
                Err(e) => {
                    warn!(experience_id = %id, error = %e, "eligibility re-query failed, will retry");
                    retry.push(id.clone());
                }
            }
        }
        current.extend(retry);

        let record = {
            let mut state = self.state.lock();
            state.date = today;
            state.exp_ids = current;
            state.experienced_exp_ids = experienced;
            state.clone()
        };
        self.storage
            .set(&self.key, &serde_json::to_string(&record)?)?;
        Ok(())
    }
}
