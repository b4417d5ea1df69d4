use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// Persisted account record, one-to-one with a credential identity.
///
/// The record id always equals the provider uid of the credential it was
/// created for. Records are created lazily on first resolution and are
/// never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh record with default profile fields.
    pub fn new(id: String) -> Self {
        Self {
            id,
            email: String::new(),
            name: String::new(),
            image: String::new(),
            role: Role::Customer,
            is_anonymous: false,
            created_at: Utc::now(),
        }
    }

    /// Apply a patch in place. Absent fields keep their current value;
    /// the role only changes when the patch carries one explicitly.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(ref email) = patch.email {
            self.email = email.clone();
        }
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(ref image) = patch.image {
            self.image = image.clone();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(is_anonymous) = patch.is_anonymous {
            self.is_anonymous = is_anonymous;
        }
    }
}

/// Partial update for a user record. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_anonymous: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.image.is_none()
            && self.role.is_none()
            && self.is_anonymous.is_none()
    }
}
