//! User profiles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A user as exposed to the API layer.
///
/// Built from a profile map; keys that are not first-class fields land in
/// `other_key_values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub github_username: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub slack_id: Option<String>,
    #[serde(default)]
    pub employee_type: Option<String>,
    #[serde(default)]
    pub manager_fullname: Option<String>,
    #[serde(default)]
    pub manager_email: Option<String>,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(flatten)]
    pub other_key_values: BTreeMap<String, serde_json::Value>,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Minimal profile where both email and user id are `id`.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            email: Some(id.clone()),
            user_id: Some(id),
            is_active: true,
            ..Self::default()
        }
    }

    /// Build a user from a loosely-typed profile map.
    pub fn from_profile(
        profile: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(profile))
    }

    /// Dedup key: `user_id` when present and non-empty, otherwise `email`.
    pub fn identity_key(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(self.email.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reader {
    pub user: User,
    pub read_count: i64,
}
