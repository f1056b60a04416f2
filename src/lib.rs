//! Client library for the [Imagify](https://imagify.io) image optimization
//! REST API: account management, API key validation, pricing and coupon
//! lookups, and image optimization by direct upload or by URL.
//!
//! Calls are blocking. Each method maps to exactly one HTTP request and
//! returns either the decoded JSON response (its shape is defined by the
//! API and passed through untouched) or a typed [`Error`]. Nothing is
//! retried.
//!
//! ```no_run
//! use imagify_api::{Client, Level, OptimizeOptions};
//! use std::path::Path;
//!
//! fn main() -> imagify_api::Result<()> {
//!     let client = Client::new("your-api-key")?;
//!
//!     let user = client.user()?;
//!     println!("remaining quota: {}", user["quota"]);
//!
//!     let options = OptimizeOptions {
//!         level: Level::Ultra,
//!         ..Default::default()
//!     };
//!     let optimized = client.upload_image(Path::new("photo.jpg"), &options)?;
//!     println!("optimized: {}", optimized["image"]);
//!     Ok(())
//! }
//! ```
//!
//! Errors are values; branch on them instead of parsing messages:
//!
//! ```no_run
//! use imagify_api::{Client, Error};
//!
//! # fn main() -> imagify_api::Result<()> {
//! let client = Client::new("placeholder")?;
//! match client.key_status("candidate-key") {
//!     Ok(status) => println!("key accepted: {status}"),
//!     Err(Error::Api { code, detail }) => eprintln!("rejected ({code}): {detail}"),
//!     Err(err) => eprintln!("could not reach the API: {err}"),
//! }
//! # Ok(())
//! # }
//! ```

mod auth;
mod cache;
mod client;
mod error;
mod types;

pub use auth::{API_KEY_VAR, CredentialProvider, EnvCredentials, PartnerHook};
pub use cache::ProbeCache;
pub use client::{BASE_URL, Client, ClientBuilder, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use types::{Level, OptimizeOptions, Resize};
