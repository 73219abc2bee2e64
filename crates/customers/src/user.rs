//! Customer records keyed by the front end's numeric user id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Profile (identity source input)
// ─────────────────────────────────────────────────────────────────────────────

/// Profile fields as delivered by the identity source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A storefront customer.
///
/// # Invariants
/// - `first_name` is never blank.
/// - `registered_at` is fixed at first registration; profile refreshes keep it.
/// - Admin/active flags only change through their explicit setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: Option<String>,
    first_name: String,
    last_name: Option<String>,
    phone: Option<String>,
    is_admin: bool,
    is_active: bool,
    registered_at: DateTime<Utc>,
}

impl User {
    /// Register a new customer: active, not an admin.
    pub fn register(profile: UserProfile, registered_at: DateTime<Utc>) -> DomainResult<Self> {
        let first_name = required_first_name(&profile.first_name)?;
        Ok(Self {
            id: profile.id,
            username: clean(profile.username),
            first_name,
            last_name: clean(profile.last_name),
            phone: clean(profile.phone),
            is_admin: false,
            is_active: true,
            registered_at,
        })
    }

    /// Refresh profile fields from the identity source.
    ///
    /// A missing phone in the profile keeps the stored one; the front end only
    /// sends it when the customer shares it.
    pub fn refresh(&mut self, profile: UserProfile) -> DomainResult<()> {
        if profile.id != self.id {
            return Err(DomainError::invariant("user id mismatch"));
        }
        self.first_name = required_first_name(&profile.first_name)?;
        self.username = clean(profile.username);
        self.last_name = clean(profile.last_name);
        if let Some(phone) = clean(profile.phone) {
            self.phone = Some(phone);
        }
        Ok(())
    }

    pub fn id_typed(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// First name, plus last name when known.
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn set_phone(&mut self, phone: Option<String>) {
        self.phone = clean(phone);
    }

    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn required_first_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("first name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
