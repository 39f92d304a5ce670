use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use uuid::Uuid;

use crate::directory::{NewProfile, Role};

use super::{IdentityClaims, Session, SessionId};

/// Generate a cryptographically random session ID.
pub fn generate_session_id() -> SessionId {
    let id: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    SessionId::new(id)
}

/// Check if a session has expired.
pub fn is_session_expired(session: &Session, now: DateTime<Utc>) -> bool {
    session.expires_at <= now
}

/// Calculate session expiry from creation time and TTL.
///
/// Saturates at the latest representable instant instead of overflowing.
pub fn calculate_expiry(created_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    created_at
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Build a fresh session for a linked profile.
pub fn new_session(user_id: Uuid, role: Role, now: DateTime<Utc>, ttl: Duration) -> Session {
    Session {
        id: generate_session_id(),
        user_id,
        role,
        created_at: now,
        expires_at: calculate_expiry(now, ttl),
    }
}

/// Profile fields for an identity seen for the first time.
///
/// New profiles are always active; `role` is fixed here and never changed by
/// later logins.
pub fn new_profile_from_claims(claims: &IdentityClaims, role: Role) -> NewProfile {
    NewProfile {
        external_id: claims.external_id.clone(),
        email: claims.email.clone(),
        first_name: claims.first_name.clone(),
        last_name: claims.last_name.clone(),
        display_name: claims.display_name.clone(),
        active: true,
        role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Session {
        Session {
            id: generate_session_id(),
            user_id: Uuid::new_v4(),
            role: Role::User,
            created_at,
            expires_at,
        }
    }

    #[test]
    fn generate_session_id_produces_32_char_alphanumeric() {
        let id = generate_session_id();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generate_session_id_is_unique() {
        let id1 = generate_session_id();
        let id2 = generate_session_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn is_session_expired_returns_false_for_future_expiry() {
        let now = Utc::now();
        assert!(!is_session_expired(&session(now, now + Duration::hours(1)), now));
    }

    #[test]
    fn is_session_expired_returns_true_for_past_expiry() {
        let now = Utc::now();
        let s = session(now - Duration::hours(2), now - Duration::hours(1));
        assert!(is_session_expired(&s, now));
    }

    #[test]
    fn is_session_expired_returns_true_at_exact_expiry() {
        let now = Utc::now();
        assert!(is_session_expired(&session(now - Duration::hours(1), now), now));
    }

    #[test]
    fn calculate_expiry_adds_ttl_to_created_at() {
        let created = Utc::now();
        let ttl = Duration::days(7);
        assert_eq!(calculate_expiry(created, ttl), created + ttl);
    }

    #[test]
    fn calculate_expiry_saturates_instead_of_overflowing() {
        let created = Utc::now();
        assert_eq!(
            calculate_expiry(created, Duration::MAX),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn new_session_links_user_and_role() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let session = new_session(user_id, Role::Staff, now, Duration::days(1));

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.role, Role::Staff);
        assert_eq!(session.created_at, now);
        assert_eq!(session.expires_at, now + Duration::days(1));
    }

    #[test]
    fn new_profile_is_active_with_target_role() {
        let claims = IdentityClaims {
            external_id: "abc123".to_string(),
            email: "a@x.com".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            display_name: String::new(),
        };

        let profile = new_profile_from_claims(&claims, Role::User);

        assert_eq!(
            profile,
            NewProfile {
                external_id: "abc123".to_string(),
                email: "a@x.com".to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                display_name: String::new(),
                active: true,
                role: Role::User,
            }
        );
    }
}
