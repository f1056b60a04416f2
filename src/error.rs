use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything an API call can fail with.
///
/// Callers branch on the variant (or on [`code`](Error::code)) rather than
/// parsing messages. One call produces at most one error; there are no
/// partial-success states.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be sent or no usable response came back
    /// (DNS, connect, TLS, or timeout failure).
    #[error("request to the Imagify API failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered non-200 with its own structured `{code, detail}`
    /// body. Surfaced verbatim.
    #[error("{detail} (code {code})")]
    Api { code: i64, detail: String },

    /// HTTP 413 without a structured body. The server does not always manage
    /// a JSON answer for oversized uploads, so the message is fixed.
    #[error("your image is too big to be uploaded on our server")]
    PayloadTooLarge,

    /// Any other non-200 status, with whatever error text the transport
    /// reported alongside it.
    #[error("unknown error occurred ({status}{})", reason_suffix(.reason))]
    Http { status: u16, reason: Option<String> },

    /// The image passed to `upload_image` is missing or unreadable. Raised
    /// before any network traffic.
    #[error("cannot read image to upload: {0}")]
    ImageFile(std::io::Error),

    /// The request body could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Json(#[from] serde_json::Error),

    /// `create_user` was handed data that does not serialize to a JSON
    /// object, so the plugin fields cannot be merged in.
    #[error("user data must serialize to a JSON object")]
    InvalidBody,

    /// Construction found no API key, neither explicit nor from a provider.
    #[error("no Imagify API key was provided or resolved")]
    MissingApiKey,
}

impl Error {
    /// The numeric code for errors that carry one: the server's own code for
    /// [`Api`](Error::Api), the HTTP status otherwise.
    pub fn code(&self) -> Option<i64> {
        match self {
            Error::Api { code, .. } => Some(*code),
            Error::PayloadTooLarge => Some(413),
            Error::Http { status, .. } => Some(i64::from(*status)),
            _ => None,
        }
    }

    /// True when the request never reached a usable HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(" - {reason}"),
        None => String::new(),
    }
}
