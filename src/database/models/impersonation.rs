use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted impersonation session row.
///
/// Immutable once created; there is no update path. "Active" is decided
/// at read time by comparing `expires_at` against the current instant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImpersonationSession {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub impersonated_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ImpersonationSession {
    /// Expiry predicate used everywhere a row is judged active.
    pub fn is_current(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        expires_at > now
    }
}

/// A session row joined with both identities' display data, as returned
/// to the admin UI and the presence banner.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActiveImpersonation {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub impersonated_id: Uuid,
    pub admin_email: String,
    pub user_email: String,
    pub user_role: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn current_strictly_before_expiry() {
        let now = Utc::now();
        let expires = now + Duration::seconds(3600);

        assert!(ImpersonationSession::is_current(expires, now));
        assert!(ImpersonationSession::is_current(
            expires,
            expires - Duration::seconds(1)
        ));
        // Exactly at expiry the session is no longer active
        assert!(!ImpersonationSession::is_current(expires, expires));
        assert!(!ImpersonationSession::is_current(
            expires,
            expires + Duration::seconds(1)
        ));
    }
}
