//! Credentials consumed from the host's authentication subsystem

use crate::location::ServiceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved credential
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Credential {
    /// No authentication header
    #[default]
    Default,
    /// HTTP basic authentication
    Static {
        username: String,
        password: String,
        #[serde(default)]
        domain: Option<String>,
    },
}

impl Credential {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential::Static {
            username: username.into(),
            password: password.into(),
            domain: None,
        }
    }

    pub fn with_domain(self, domain: impl Into<String>) -> Self {
        match self {
            Credential::Static {
                username, password, ..
            } => Credential::Static {
                username,
                password,
                domain: Some(domain.into()),
            },
            Credential::Default => Credential::Default,
        }
    }

    /// User name and password for basic authentication
    ///
    /// The user name is `domain\username` when a non-empty domain is set.
    pub fn basic_auth(&self) -> Option<(String, &str)> {
        match self {
            Credential::Default => None,
            Credential::Static {
                username,
                password,
                domain,
            } => {
                let user = match domain.as_deref() {
                    Some(domain) if !domain.is_empty() => format!("{}\\{}", domain, username),
                    _ => username.clone(),
                };
                Some((user, password.as_str()))
            }
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Default => f.write_str("Default"),
            Credential::Static {
                username, domain, ..
            } => f
                .debug_struct("Static")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("domain", domain)
                .finish(),
        }
    }
}

/// Resolves the credential used to fetch a service description
pub trait CredentialSource: Send + Sync {
    fn credential_for(&self, location: &ServiceLocation) -> Credential;
}

impl CredentialSource for Credential {
    fn credential_for(&self, _location: &ServiceLocation) -> Credential {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_user_name() {
        assert_eq!(Credential::Default.basic_auth(), None);

        let credential = Credential::basic("ana", "secret");
        assert_eq!(credential.basic_auth(), Some(("ana".to_string(), "secret")));

        let credential = credential.with_domain("CORP");
        assert_eq!(
            credential.basic_auth(),
            Some(("CORP\\ana".to_string(), "secret"))
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let shown = format!("{:?}", Credential::basic("ana", "secret"));
        assert!(shown.contains("ana"));
        assert!(!shown.contains("secret"));
    }
}
