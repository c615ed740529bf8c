//! Access credential value type

use common::Secret;

/// Short-lived access credential authorizing API calls.
///
/// The token is held in a `Secret` so queue drains, logs, and error paths
/// never print it. Cloning is cheap enough for drain fan-out (one clone per
/// settled waiter).
#[derive(Clone, Debug)]
pub struct Credential {
    token: Secret<String>,
}

impl Credential {
    /// Wrap a raw access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
        }
    }

    /// The raw token value, for building an authorization header.
    pub fn token(&self) -> &str {
        self.token.expose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let credential = Credential::new("at_abc");
        assert_eq!(credential.token(), "at_abc");
    }

    #[test]
    fn debug_never_prints_the_token() {
        let credential = Credential::new("at_super_secret");
        let debug = format!("{credential:?}");
        assert!(
            !debug.contains("at_super_secret"),
            "token leaked into Debug output: {debug}"
        );
    }

    #[test]
    fn clones_share_the_same_token() {
        let credential = Credential::new("at_abc");
        let cloned = credential.clone();
        assert_eq!(cloned.token(), credential.token());
    }
}
