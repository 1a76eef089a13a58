// Guest eligibility resolution and the guest name/avatar cache

use crate::model::{avatar_url, Guest, Guests, IneligibleReason};
use crate::wire::ApiGuest;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedGuest {
    pub name: String,
    pub character_id: Option<String>,
}

/// Turns upstream guest lists into eligible/ineligible groups.
///
/// Every guest seen is remembered by id (name and avatar source) because
/// booking confirmations come back with bare guest ids. Guests whose
/// ineligibility suggests they are not really in the party are only
/// remembered when they are the primary guest.
#[derive(Debug, Default)]
pub struct GuestResolver {
    cache: DashMap<String, CachedGuest>,
    party_ids: RwLock<HashSet<String>>,
}

impl GuestResolver {
    pub fn new() -> Self {
        Self::default()
    }

    // An empty set lifts the restriction
    pub fn set_party_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.party_ids.write() = ids.into_iter().map(Into::into).collect();
    }

    pub fn cached(&self, id: &str) -> Option<CachedGuest> {
        self.cache.get(id).map(|entry| entry.value().clone())
    }

    // Sorted for stable request parameters
    pub fn cached_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cache.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Builds a guest from the cache alone, for payloads that only carry ids.
    pub fn guest_from_cache(&self, id: &str) -> Guest {
        let cached = self.cached(id);
        Guest {
            id: id.to_string(),
            name: cached.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
            avatar_image_url: avatar_url(cached.as_ref().and_then(|c| c.character_id.as_deref())),
            ..Default::default()
        }
    }

    pub fn convert(&self, guest: &ApiGuest) -> Guest {
        let name = guest.full_name();
        self.remember(guest, &name);

        let mut ineligible_reason = guest.ineligible_reason;
        let mut eligible_after = guest.eligible_after.clone();
        {
            let party = self.party_ids.read();
            if !party.is_empty() && !party.contains(&guest.id) {
                ineligible_reason = Some(IneligibleReason::NotInParty);
                eligible_after = None;
            }
        }

        Guest {
            id: guest.id.clone(),
            name,
            primary: guest.primary,
            avatar_image_url: avatar_url(guest.character_id.as_deref()),
            ineligible_reason,
            eligible_after,
            transactional: guest.transactional,
        }
    }

    fn remember(&self, guest: &ApiGuest, name: &str) {
        let admit = match guest.ineligible_reason {
            Some(reason) if reason.excludes_party_membership() => guest.primary,
            _ => true,
        };
        if admit {
            self.cache
                .entry(guest.id.clone())
                .or_insert_with(|| CachedGuest {
                    name: name.to_string(),
                    character_id: guest.character_id.clone(),
                });
        }
    }

    /// Resolves both upstream lists. Ids are unique across the result; a
    /// guest listed as eligible but carrying any ineligible reason after
    /// conversion lands in the ineligible group.
    pub fn resolve(&self, eligible: &[ApiGuest], ineligible: &[ApiGuest]) -> Guests {
        let mut seen = HashSet::new();
        let mut result = Guests::default();

        for guest in ineligible {
            if seen.insert(guest.id.clone()) {
                result.ineligible.push(self.convert(guest));
            }
        }
        for guest in eligible {
            if !seen.insert(guest.id.clone()) {
                continue;
            }
            let guest = self.convert(guest);
            if guest.is_eligible() {
                result.eligible.push(guest);
            } else {
                result.ineligible.push(guest);
            }
        }

        result.ineligible.sort_by(compare_ineligible);
        result
    }
}

fn primary_then_name(a: &Guest, b: &Guest) -> Ordering {
    b.primary
        .cmp(&a.primary)
        .then_with(|| a.name.cmp(&b.name))
}

/// Ordering of the ineligible group: guests who become eligible later come
/// first (earliest first), then "experience limit reached", then other
/// reasons, with "not in party" last. Ties go to the primary guest, then name.
pub fn compare_ineligible(a: &Guest, b: &Guest) -> Ordering {
    match (&a.eligible_after, &b.eligible_after) {
        (Some(x), Some(y)) => return x.cmp(y).then_with(|| primary_then_name(a, b)),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => {}
    }
    if a.ineligible_reason == b.ineligible_reason {
        return primary_then_name(a, b);
    }
    use IneligibleReason::{ExperienceLimitReached, NotInParty};
    match (a.ineligible_reason, b.ineligible_reason) {
        (Some(NotInParty), _) => Ordering::Greater,
        (_, Some(NotInParty)) => Ordering::Less,
        (Some(ExperienceLimitReached), _) => Ordering::Less,
        (_, Some(ExperienceLimitReached)) => Ordering::Greater,
        _ => primary_then_name(a, b),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn api_guest(id: &str, name: &str) -> ApiGuest {
        ApiGuest {
            id: id.to_string(),
            first_name: name.to_string(),
            last_name: String::new(),
            character_id: Some(format!("char-{}", id)),
            ..Default::default()
        }
    }

    pub fn ineligible(id: &str, name: &str, reason: IneligibleReason) -> ApiGuest {
        ApiGuest {
            ineligible_reason: Some(reason),
            ..api_guest(id, name)
        }
    }
}
