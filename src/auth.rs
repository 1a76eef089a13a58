// Session credentials consumed by the request pipeline

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub swid: String,
    pub access_token: String,
}

// Port for the login session store
pub trait AuthStore: Send + Sync + 'static {
    fn data(&self) -> Option<AuthData>;
    fn delete_data(&self);
}

#[derive(Debug, Default)]
pub struct MemoryAuthStore {
    data: RwLock<Option<AuthData>>,
}

impl MemoryAuthStore {
    pub fn new(swid: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            data: RwLock::new(Some(AuthData {
                swid: swid.into(),
                access_token: access_token.into(),
            })),
        }
    }

    pub fn set_data(&self, data: AuthData) {
        *self.data.write() = Some(data);
    }
}

impl AuthStore for MemoryAuthStore {
    fn data(&self) -> Option<AuthData> {
        self.data.read().clone()
    }

    fn delete_data(&self) {
        *self.data.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_data_clears_session() {
        let store = MemoryAuthStore::new("{SWID}", "token");
        assert_eq!(store.data().map(|d| d.swid), Some("{SWID}".to_string()));

        store.delete_data();
        assert!(store.data().is_none());

        store.set_data(AuthData {
            swid: "{OTHER}".to_string(),
            access_token: "t2".to_string(),
        });
        assert_eq!(store.data().map(|d| d.access_token), Some("t2".to_string()));
    }
}
