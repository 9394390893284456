//! Provider credentials, resolved on every call.

use secrecy::{ExposeSecret, SecretString};

/// What a provider needs to authenticate a call.
#[derive(Clone)]
pub enum Credentials {
    /// The provider is public.
    NotRequired,
    /// API key passed as a query parameter.
    ApiKeyQuery { param: String, key: SecretString },
    /// HTTP basic auth.
    Basic {
        username: String,
        password: SecretString,
    },
    /// The provider needs credentials and none are configured.
    Missing,
}

impl Credentials {
    pub fn api_key(param: impl Into<String>, key: impl Into<String>) -> Self {
        let key: String = key.into();
        Credentials::ApiKeyQuery {
            param: param.into(),
            key: SecretString::new(key.into_boxed_str()),
        }
    }

    /// Basic auth from an optional id/secret pair. Either half absent or
    /// blank yields [`Credentials::Missing`].
    pub fn basic_from_parts(username: Option<String>, password: Option<String>) -> Self {
        match (username, password) {
            (Some(u), Some(p)) if !u.trim().is_empty() && !p.trim().is_empty() => {
                Credentials::Basic {
                    username: u,
                    password: SecretString::new(p.into_boxed_str()),
                }
            }
            _ => Credentials::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Credentials::Missing)
    }

    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Credentials::ApiKeyQuery { param, key } => {
                builder.query(&[(param.as_str(), key.expose_secret())])
            }
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
            Credentials::NotRequired | Credentials::Missing => builder,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::NotRequired => f.write_str("NotRequired"),
            Credentials::ApiKeyQuery { param, .. } => f
                .debug_struct("ApiKeyQuery")
                .field("param", param)
                .field("key", &"[REDACTED]")
                .finish(),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Credentials::Missing => f.write_str("Missing"),
        }
    }
}

/// Where a client reads its credentials from at call time.
pub trait CredentialSource: Send + Sync {
    fn resolve(&self) -> Credentials;
}

impl CredentialSource for Credentials {
    fn resolve(&self) -> Credentials {
        self.clone()
    }
}
