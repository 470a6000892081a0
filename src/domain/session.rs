use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// One login. The session id travels inside the token as its `jti`
/// claim; deleting the row is what invalidates the token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: Uuid, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            expires_at: now + Duration::seconds(ttl_secs),
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_not_expired() {
        let session = Session::new(Uuid::new_v4(), 3600);
        assert!(!session.is_expired());
    }

    #[test]
    fn session_with_elapsed_ttl_is_expired() {
        let session = Session::new(Uuid::new_v4(), -1);
        assert!(session.is_expired());
    }
}
