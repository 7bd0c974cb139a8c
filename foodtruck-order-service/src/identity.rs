//! Resolves a request's session token into the caller's identity.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::{OrderingError, OrderingResult, StoreResult};
use crate::models::UserRole;
use crate::store::OrderingStore;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i32,
    pub role: UserRole,
}

impl Principal {
    pub fn require_customer(&self) -> OrderingResult<i32> {
        match self.role {
            UserRole::Customer => Ok(self.user_id),
            UserRole::TruckOwner => Err(OrderingError::forbidden(
                "Access denied. Only customers can access this endpoint.",
            )),
        }
    }

    pub fn require_truck_owner(&self) -> OrderingResult<i32> {
        match self.role {
            UserRole::TruckOwner => Ok(self.user_id),
            UserRole::Customer => Err(OrderingError::forbidden(
                "Access denied. Only truck owners can access this endpoint.",
            )),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Authenticated(Principal),
    Unauthenticated,
    Expired,
}

/// Looks up `token` in the session table. Missing, malformed and unknown
/// tokens are all `Unauthenticated`.
pub fn resolve_identity<S: OrderingStore>(
    store: &mut S,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> StoreResult<Identity> {
    let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
        return Ok(Identity::Unauthenticated);
    };
    let Ok(token) = Uuid::parse_str(token) else {
        debug!("malformed session token");
        return Ok(Identity::Unauthenticated);
    };

    let Some((session, user)) = store.find_session(token)? else {
        return Ok(Identity::Unauthenticated);
    };
    if session.expires_at < now {
        debug!(user_id = user.id, "session expired");
        return Ok(Identity::Expired);
    }

    Ok(Identity::Authenticated(Principal {
        user_id: user.id,
        role: user.role,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rstest::rstest;

    use super::*;
    use crate::store::MemoryStore;

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("not-a-uuid"))]
    #[case(Some("8c5a8c4e-2f5e-4f0e-9d59-7d9a1a1b2c3d"))]
    fn unknown_tokens_are_unauthenticated(#[case] token: Option<&str>) {
        let mut store = MemoryStore::new();
        let identity = resolve_identity(&mut store, token, Utc::now()).unwrap();
        assert_eq!(identity, Identity::Unauthenticated);
    }

    #[test]
    fn expired_session_is_reported() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        let user = store.add_user("Nour", UserRole::Customer);
        let session = store.add_session(user.id, now - Duration::minutes(1));

        let token = session.token.to_string();
        let identity = resolve_identity(&mut store, Some(&token), now).unwrap();
        assert_eq!(identity, Identity::Expired);
    }

    #[test]
    fn live_session_yields_principal() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        let user = store.add_user("Omar", UserRole::TruckOwner);
        let session = store.add_session(user.id, now + Duration::hours(5));

        let token = session.token.to_string();
        let identity = resolve_identity(&mut store, Some(&token), now).unwrap();
        assert_eq!(
            identity,
            Identity::Authenticated(Principal {
                user_id: user.id,
                role: UserRole::TruckOwner,
            })
        );
    }

    #[test]
    fn role_guards() {
        let owner = Principal {
            user_id: 3,
            role: UserRole::TruckOwner,
        };
        assert_eq!(owner.require_truck_owner().unwrap(), 3);
        assert!(matches!(
            owner.require_customer(),
            Err(OrderingError::Forbidden(_))
        ));
    }
}
