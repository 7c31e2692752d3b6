//! Harvest Core - resilient fetch engine for paginated HTTP APIs
//!
//! Provides the retrying requester, the page-walking accumulator and the
//! shared logging / progress / shutdown plumbing used by the crawler.

pub mod error;
pub mod http;
pub mod logging;
pub mod paginate;
pub mod progress;
pub mod retry;
pub mod shutdown;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports for convenience
pub use error::{FetchError, RequestError};
pub use http::{HttpConfig, HttpTransport, RawResponse, RequestHeaders, SHARED_RUNTIME, Transport};
pub use logging::{IndicatifLogger, Verbosity, init_logging};
pub use paginate::{PAGE_FIELD, PROJECT_ID_FIELD, PageOptions, PageShape, fetch_all_pages, page_url};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use retry::{Requester, RetryPolicy};
pub use shutdown::{
    install_signal_handlers, is_shutdown_requested, shutdown_flag, sleep_unless_shutdown,
};
