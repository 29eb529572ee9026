use serde::{Deserialize, Serialize};

use crate::types::internal::identity::User;

/// Token lifetime in seconds
pub const TOKEN_TTL_SECONDS: i64 = 15 * 60;

/// Claims carried inside an encrypted session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id, decimal
    #[serde(rename = "userId")]
    pub user_id: String,

    pub username: String,

    pub email: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Claims for `user` valid from `now` for `TOKEN_TTL_SECONDS`
    pub fn for_user(user: &User, now: i64) -> Self {
        Self {
            user_id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            exp: now + TOKEN_TTL_SECONDS,
            iat: now,
            nbf: now,
        }
    }

    /// Parsed subject id, `None` when the claim is not a positive integer
    pub fn subject_id(&self) -> Option<u64> {
        self.user_id.parse::<u64>().ok().filter(|id| *id > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::internal::identity::PasswordHash;

    fn sample_user() -> User {
        User {
            id: 42,
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: PasswordHash::new("digest"),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_claims_window_is_fifteen_minutes() {
        let claims = Claims::for_user(&sample_user(), 1_000);

        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.nbf, 1_000);
        assert_eq!(claims.exp, 1_900);
        assert_eq!(claims.subject_id(), Some(42));
    }

    #[test]
    fn test_claims_serialize_user_id_in_camel_case() {
        let json = serde_json::to_value(Claims::for_user(&sample_user(), 0)).unwrap();

        assert_eq!(json["userId"], "42");
        assert_eq!(json["username"], "alice");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_subject_id_rejects_garbage() {
        let mut claims = Claims::for_user(&sample_user(), 0);
        claims.user_id = "abc".to_string();
        assert_eq!(claims.subject_id(), None);
        claims.user_id = "0".to_string();
        assert_eq!(claims.subject_id(), None);
    }
}
