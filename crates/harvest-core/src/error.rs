//! Error types for single requests and whole fetches

/// Failure of one HTTP attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Server answered with a status other than 200
    Status { status: u16, message: String },
    /// Connection, DNS, timeout or body read failure
    Transport(String),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, message } if message.is_empty() => write!(f, "HTTP {status}"),
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    /// Create from a reqwest error.
    ///
    /// The URL is stripped so tokens passed as query parameters never reach the logs.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        let e = e.without_url();
        match e.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Self::Transport(e.to_string()),
        }
    }

    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

/// Definitive failure of a fetch. Aborts the pagination it occurs in.
#[derive(Debug)]
pub enum FetchError {
    /// Every attempt for `url` failed
    Exhausted {
        url: String,
        attempts: u32,
        last: RequestError,
    },
    /// Response body was not the expected JSON shape
    Malformed { url: String, message: String },
    /// Shutdown was requested while waiting
    Interrupted,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted {
                url,
                attempts,
                last,
            } => write!(f, "{url}: failed after {attempts} attempts (last: {last})"),
            Self::Malformed { url, message } => write!(f, "{url}: malformed response: {message}"),
            Self::Interrupted => write!(f, "interrupted by shutdown request"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}

impl FetchError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}
