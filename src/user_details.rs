//! Pluggable user-detail resolution.
//!
//! The proxy turns a bare user id into a `User` through a
//! `UserDetailResolver`. The default resolver knows nothing beyond the id;
//! deployments inject their own (directory lookup, HR feed, ...) with
//! `AtlasProxy::with_user_details`.

use metadata_types::User;
use serde_json::{json, Map, Value};
use tracing::warn;

pub trait UserDetailResolver: Send + Sync {
    /// Profile map for `user_id`. Keys follow the `User` field names.
    fn user_details(&self, user_id: &str) -> anyhow::Result<Map<String, Value>>;
}

/// `{email: id, user_id: id}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUserDetails;

impl UserDetailResolver for DefaultUserDetails {
    fn user_details(&self, user_id: &str) -> anyhow::Result<Map<String, Value>> {
        let mut profile = Map::new();
        profile.insert("email".into(), json!(user_id));
        profile.insert("user_id".into(), json!(user_id));
        Ok(profile)
    }
}

/// Resolver backed by a closure.
pub struct FnUserDetails<F>(pub F);

impl<F> FnUserDetails<F>
where
    F: Fn(&str) -> anyhow::Result<Map<String, Value>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> UserDetailResolver for FnUserDetails<F>
where
    F: Fn(&str) -> anyhow::Result<Map<String, Value>> + Send + Sync,
{
    fn user_details(&self, user_id: &str) -> anyhow::Result<Map<String, Value>> {
        (self.0)(user_id)
    }
}

/// Resolve `user_id`, falling back to the default profile when the resolver
/// fails or returns something unusable.
pub(crate) fn resolve_user(resolver: &dyn UserDetailResolver, user_id: &str) -> User {
    match resolver.user_details(user_id) {
        Ok(profile) if !profile.is_empty() => match User::from_profile(profile) {
            Ok(user) => user,
            Err(e) => {
                warn!(user_id, error = %e, "user profile rejected, using default");
                User::from_id(user_id)
            }
        },
        Ok(_) => {
            warn!(user_id, "empty user profile, using default");
            User::from_id(user_id)
        }
        Err(e) => {
            warn!(user_id, error = %e, "user detail lookup failed, using default");
            User::from_id(user_id)
        }
    }
}
