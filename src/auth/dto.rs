use serde::{Deserialize, Serialize};

/// The authenticated caller as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of the session endpoint. `user` is null for anonymous sessions.
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub user: Option<Identity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authenticated_session() {
        let body = r#"{"user":{"id":"u1","email":"a@b.c"},"expires":"2030-01-01"}"#;
        let session: SessionResponse = serde_json::from_str(body).unwrap();
        let user = session.user.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email.as_deref(), Some("a@b.c"));
        assert!(user.name.is_none());
    }

    #[test]
    fn parses_anonymous_session() {
        let null_user: SessionResponse = serde_json::from_str(r#"{"user":null}"#).unwrap();
        assert!(null_user.user.is_none());

        let empty: SessionResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.user.is_none());
    }
}
