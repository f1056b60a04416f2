use std::env;

/// Environment variable [`EnvCredentials`] reads by default.
pub const API_KEY_VAR: &str = "IMAGIFY_API_KEY";

/// Source of the API key when the caller does not pass one explicitly.
///
/// The builder consults the provider once, at construction time; the
/// resolved key is immutable afterwards.
///
/// ```
/// use imagify_api::{Client, EnvCredentials};
///
/// let client = Client::builder().credentials(EnvCredentials::new()).build();
/// # let _ = client;
/// ```
pub trait CredentialProvider {
    fn api_key(&self) -> Option<String>;
}

/// Reads the API key from the environment, `IMAGIFY_API_KEY` by default.
/// Empty values count as absent.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self {
            var: API_KEY_VAR.to_owned(),
        }
    }

    /// Look the key up under a different variable name.
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvCredentials {
    fn api_key(&self) -> Option<String> {
        env::var(&self.var).ok().filter(|key| !key.is_empty())
    }
}

/// Host-side bookkeeping for a referral/partner code.
///
/// When installed on the client, [`create_user`](crate::Client::create_user)
/// sends the current code with the request and calls [`clear`](Self::clear)
/// once the account exists, so the code is not redeemed twice. Failed
/// creations leave the code in place.
pub trait PartnerHook: Send + Sync {
    /// The pending partner code, if any.
    fn code(&self) -> Option<String>;

    /// Called after a successful account creation.
    fn clear(&self);
}
