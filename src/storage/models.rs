use std::fmt;

/// Read-only view of the signed-in session, injected into whatever needs
/// to call the API on the user's behalf.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    token: String,
    username: String,
}

impl AuthContext {
    /// Both fields are trimmed; a blank token or username means no session.
    pub fn new(token: &str, username: &str) -> Option<Self> {
        let token = token.trim();
        let username = username.trim();
        if token.is_empty() || username.is_empty() {
            return None;
        }

        Some(Self {
            token: token.to_string(),
            username: username.to_string(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("username", &self.username)
            .field("token", &mask_token(&self.token))
            .finish()
    }
}

/// Show only the last four characters of a token.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let visible = chars.len().min(4);
    let tail: String = chars[chars.len() - visible..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - visible), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_mean_no_session() {
        assert!(AuthContext::new("", "alice").is_none());
        assert!(AuthContext::new("tok", "   ").is_none());

        let auth = AuthContext::new(" tok ", " alice ").unwrap();
        assert_eq!(auth.token(), "tok");
        assert_eq!(auth.username(), "alice");
    }

    #[test]
    fn debug_output_hides_the_token() {
        let auth = AuthContext::new("secret-token", "alice").unwrap();
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("oken"));
        assert_eq!(mask_token("ab"), "ab");
    }
}
