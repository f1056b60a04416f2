use crate::{
    auth::{CredentialProvider, PartnerHook},
    error::{Error, Result},
    types::OptimizeOptions,
};
use log::debug;
use reqwest::{
    Method, StatusCode,
    blocking::multipart::{Form, Part},
    header,
};
use serde::Serialize;
use serde_json::Value;
use std::{path::Path, sync::Arc, time::Duration};

/// Production endpoint of the Imagify REST API.
pub const BASE_URL: &str = "https://app.imagify.io/api/";

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

// The lightweight probes get short deadlines so a slow API cannot stall a
// caller that only wanted a health signal.
const ACCOUNT_TIMEOUT: Duration = Duration::from_secs(10);
const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking client for the Imagify image optimization API.
///
/// Every method issues exactly one HTTP request and returns the decoded JSON
/// body, or a typed [`Error`]. Nothing is retried. The client holds no
/// mutable state, so it is `Send + Sync` and can be shared behind an `Arc`
/// by callers that bring their own concurrency.
pub struct Client {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    partner: Option<Arc<dyn PartnerHook>>,
}

/// Configures and builds a [`Client`].
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    partner: Option<Arc<dyn PartnerHook>>,
    credentials: Option<Box<dyn CredentialProvider>>,
}

impl ClientBuilder {
    fn new() -> Self {
        Self {
            api_key: None,
            base_url: BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            partner: None,
            credentials: None,
        }
    }

    /// Use this key for every request. Wins over [`credentials`](Self::credentials).
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Resolve the key through `provider` when no explicit key is set.
    pub fn credentials(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.credentials = Some(Box::new(provider));
        self
    }

    /// Point the client at a different endpoint, e.g. a mock server in
    /// tests. A missing trailing slash is added.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Replace the 45 second default request deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Partner-code bookkeeping consulted by [`Client::create_user`].
    pub fn partner(mut self, hook: impl PartnerHook + 'static) -> Self {
        self.partner = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<Client> {
        let api_key = self
            .api_key
            .or_else(|| self.credentials.as_ref().and_then(|provider| provider.api_key()))
            .ok_or(Error::MissingApiKey)?;

        let mut base_url = self.base_url;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("imagify-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Client {
            http,
            base_url,
            api_key,
            timeout: self.timeout,
            partner: self.partner,
        })
    }
}

/// Outgoing request body. A payload carrying a file forces the multipart
/// transport; everything else goes out as a single JSON body.
enum Payload<'a> {
    Empty,
    Json(Value),
    File { path: &'a Path, fields: Value },
}

impl Client {
    /// Client against the production API with an explicit key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Account information for the configured key (`GET users/me`).
    pub fn user(&self) -> Result<Value> {
        self.send(Method::GET, "users/me", Payload::Empty, ACCOUNT_TIMEOUT, &self.api_key)
    }

    /// Create an Imagify account (`POST users`).
    ///
    /// `data` must serialize to a JSON object. `from_plugin` and any pending
    /// partner code are merged into it; a successful creation clears the
    /// partner hook.
    pub fn create_user<T: Serialize>(&self, data: &T) -> Result<Value> {
        let mut body = serde_json::to_value(data)?;
        let fields = body.as_object_mut().ok_or(Error::InvalidBody)?;
        fields.insert("from_plugin".to_owned(), Value::Bool(true));
        if let Some(code) = self.partner.as_ref().and_then(|hook| hook.code()) {
            fields.insert("partner".to_owned(), Value::String(code));
        }

        let user = self.send(Method::POST, "users", Payload::Json(body), self.timeout, &self.api_key)?;
        if let Some(hook) = &self.partner {
            hook.clear();
        }
        Ok(user)
    }

    /// Update the account attached to the configured key (`PUT users/me`).
    pub fn update_user<T: Serialize>(&self, data: &T) -> Result<Value> {
        let body = serde_json::to_value(data)?;
        self.send(Method::PUT, "users/me", Payload::Json(body), ACCOUNT_TIMEOUT, &self.api_key)
    }

    /// Validity and quota status of `candidate_key` (`GET status`).
    ///
    /// Authenticates with the candidate key instead of the configured one,
    /// so a key can be checked before committing to it.
    pub fn key_status(&self, candidate_key: &str) -> Result<Value> {
        self.send(Method::GET, "status", Payload::Empty, ACCOUNT_TIMEOUT, candidate_key)
    }

    /// Version of the remote API (`GET version`).
    pub fn api_version(&self) -> Result<Value> {
        self.send(Method::GET, "version", Payload::Empty, VERSION_TIMEOUT, &self.api_key)
    }

    /// Public plans and pricing summary (`GET public-info`).
    pub fn public_info(&self) -> Result<Value> {
        self.get("public-info")
    }

    /// Optimize a local image by uploading its bytes (`POST upload`).
    ///
    /// The file is read up front; a missing or unreadable path fails with
    /// [`Error::ImageFile`] before anything touches the network.
    pub fn upload_image(&self, image: &Path, options: &OptimizeOptions) -> Result<Value> {
        let payload = Payload::File {
            path: image,
            fields: serde_json::to_value(options.payload())?,
        };
        self.send(Method::POST, "upload", payload, options.timeout, &self.api_key)
    }

    /// Optimize an image the API downloads itself from `url` (`POST fetch`).
    pub fn fetch_image(&self, url: &str, options: &OptimizeOptions) -> Result<Value> {
        let mut payload = options.payload();
        payload.url = Some(url);
        let body = serde_json::to_value(payload)?;
        self.send(Method::POST, "fetch", Payload::Json(body), self.timeout, &self.api_key)
    }

    /// Subscription plan prices (`GET pricing/plan`).
    pub fn plan_prices(&self) -> Result<Value> {
        self.get("pricing/plan")
    }

    /// One-time pack prices (`GET pricing/pack`).
    pub fn pack_prices(&self) -> Result<Value> {
        self.get("pricing/pack")
    }

    /// Plan and pack prices combined (`GET pricing/all`).
    pub fn all_prices(&self) -> Result<Value> {
        self.get("pricing/all")
    }

    /// Validity of a coupon code (`GET coupons/{code}`).
    pub fn check_coupon(&self, coupon: &str) -> Result<Value> {
        self.get(&format!("coupons/{coupon}"))
    }

    /// The currently running discount, if any (`GET pricing/discount`).
    pub fn check_discount(&self) -> Result<Value> {
        self.get("pricing/discount")
    }

    fn get(&self, route: &str) -> Result<Value> {
        self.send(Method::GET, route, Payload::Empty, self.timeout, &self.api_key)
    }

    fn send(
        &self,
        method: Method,
        route: &str,
        payload: Payload<'_>,
        timeout: Duration,
        api_key: &str,
    ) -> Result<Value> {
        debug!("{method} {route}");

        let mut request = self
            .http
            .request(method, format!("{}{}", self.base_url, route))
            .timeout(timeout)
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, format!("token {api_key}"));

        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&body),
            Payload::File { path, fields } => request.multipart(multipart(path, &fields)?),
        };

        let response = request.send()?;
        let status = response.status();

        // A failure while draining the body is reported alongside the status
        // code instead of masking it.
        let (body, transport_error) = match response.text() {
            Ok(text) => (text, None),
            Err(err) => (String::new(), Some(err.to_string())),
        };

        normalize(status, &body, transport_error.as_deref())
    }
}

/// The file goes out as its own `image` part, the optimization settings as a
/// JSON-encoded sibling `data` part.
fn multipart(path: &Path, fields: &Value) -> Result<Form> {
    let bytes = fs_err::read(path).map_err(Error::ImageFile)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());

    Ok(Form::new()
        .part("image", Part::bytes(bytes).file_name(file_name))
        .text("data", serde_json::to_string(fields)?))
}

/// Uniform response contract, applied to every operation. The server's own
/// structured error wins over anything derived from the status line, and 413
/// is special-cased because the server may not return JSON for it.
fn normalize(status: StatusCode, body: &str, transport_error: Option<&str>) -> Result<Value> {
    let parsed = serde_json::from_str::<Value>(body).ok();

    if status == StatusCode::OK {
        return Ok(parsed.unwrap_or(Value::Null));
    }

    if let Some(value) = &parsed {
        if let (Some(code), Some(detail)) = (
            value.get("code").and_then(Value::as_i64),
            value.get("detail").and_then(Value::as_str),
        ) {
            return Err(Error::Api {
                code,
                detail: detail.to_owned(),
            });
        }
    }

    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return Err(Error::PayloadTooLarge);
    }

    Err(Error::Http {
        status: status.as_u16(),
        reason: transport_error
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map(str::to_owned),
    })
}
