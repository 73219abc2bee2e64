//! Customer Directory: user records fed by the identity source.

use std::sync::Arc;

use tracing::instrument;

use storefront_core::{DomainError, UserId};
use storefront_customers::{User, UserProfile};

use crate::clock::Clock;
use crate::error::CommerceResult;
use crate::storage::Storage;

pub struct CustomerDirectory<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> CustomerDirectory<S>
where
    S: Storage,
{
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Create the user on first contact, refresh the profile afterwards.
    #[instrument(skip(self, profile), fields(user_id = %profile.id))]
    pub fn register(&self, profile: UserProfile) -> CommerceResult<User> {
        let now = self.clock.now();
        let (user, created) = self.storage.transaction(|tx| -> CommerceResult<_> {
            match tx.user(profile.id) {
                Some(mut user) => {
                    user.refresh(profile)?;
                    tx.put_user(user.clone());
                    Ok((user, false))
                }
                None => {
                    let user = User::register(profile, now)?;
                    tx.put_user(user.clone());
                    Ok((user, true))
                }
            }
        })?;

        if created {
            tracing::info!(user_id = %user.id_typed(), "user registered");
        }
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> CommerceResult<User> {
        let user = self.storage.read(|view| view.user(id))?;
        Ok(user.ok_or(DomainError::not_found("user"))?)
    }

    #[instrument(skip(self, phone))]
    pub fn set_phone(&self, id: UserId, phone: Option<String>) -> CommerceResult<User> {
        self.update(id, |user| user.set_phone(phone))
    }

    #[instrument(skip(self))]
    pub fn set_admin(&self, id: UserId, is_admin: bool) -> CommerceResult<User> {
        self.update(id, |user| user.set_admin(is_admin))
    }

    #[instrument(skip(self))]
    pub fn set_active(&self, id: UserId, is_active: bool) -> CommerceResult<User> {
        self.update(id, |user| user.set_active(is_active))
    }

    fn update(&self, id: UserId, change: impl FnOnce(&mut User)) -> CommerceResult<User> {
        self.storage.transaction(|tx| -> CommerceResult<User> {
            let mut user = tx.user(id).ok_or(DomainError::not_found("user"))?;
            change(&mut user);
            tx.put_user(user.clone());
            Ok(user)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::clock::ManualClock;
    use crate::error::CommerceError;
    use crate::storage::InMemoryStorage;

    fn profile(id: i64, first_name: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            username: None,
            first_name: first_name.to_string(),
            last_name: None,
            phone: None,
        }
    }

    #[test]
    fn second_registration_refreshes_profile_only() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let directory = CustomerDirectory::new(Arc::new(InMemoryStorage::new()), clock.clone());

        let first = directory.register(profile(10, "Ann")).unwrap();
        directory.set_admin(first.id_typed(), true).unwrap();

        clock.advance(Duration::days(1));
        let again = directory.register(profile(10, "Anna")).unwrap();

        assert_eq!(again.first_name(), "Anna");
        assert!(again.is_admin());
        assert_eq!(again.registered_at(), first.registered_at());
    }

    #[test]
    fn unknown_user_is_not_found() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let directory = CustomerDirectory::new(Arc::new(InMemoryStorage::new()), clock);
        assert_eq!(
            directory.set_phone(UserId::new(1), Some("+1".to_string())),
            Err(CommerceError::Domain(DomainError::NotFound("user")))
        );
    }
}
