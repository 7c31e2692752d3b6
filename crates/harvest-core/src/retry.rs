//! Resilient GET with a flat retry cooldown.
//!
//! Every attempt is followed by a short throttle pause, whatever its outcome.
//! Failed attempts additionally wait a long fixed cooldown before the same URL
//! is tried again. No jitter and no exponential growth: the remote rate-limit
//! window is coarse and known.

use std::time::Duration;

use serde_json::Value;

use crate::error::{FetchError, RequestError};
use crate::http::{RequestHeaders, Transport};
use crate::shutdown::sleep_unless_shutdown;

/// Default attempt budget per URL
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Pause after every request
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(1);

/// Pause between failed attempts (10 minutes)
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(600);

/// Longest body excerpt kept in a logged status error
const BODY_EXCERPT_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub throttle: Duration,
    pub cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            throttle: DEFAULT_THROTTLE,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl RetryPolicy {
    /// No pauses at all; for tests and local mirrors.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            throttle: Duration::ZERO,
            cooldown: Duration::ZERO,
        }
    }

    /// Attempt budget, never below one
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Issues GETs with a fixed header set under a [`RetryPolicy`].
pub struct Requester<T> {
    transport: T,
    headers: RequestHeaders,
    policy: RetryPolicy,
}

impl<T: Transport> Requester<T> {
    pub fn new(transport: T, headers: RequestHeaders, policy: RetryPolicy) -> Self {
        Self {
            transport,
            headers,
            policy,
        }
    }

    /// GET `url` and parse the 200 body as JSON.
    ///
    /// Returns [`FetchError::Exhausted`] once the attempt budget is spent.
    /// A 200 with an unparseable body is [`FetchError::Malformed`] and is not retried.
    pub fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let max = self.policy.attempts();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = self.transport.get(url, &self.headers);
            if !sleep_unless_shutdown(self.policy.throttle) {
                return Err(FetchError::Interrupted);
            }

            let err = match result {
                Ok(resp) if resp.status == 200 => {
                    return serde_json::from_str(&resp.body).map_err(|e| FetchError::Malformed {
                        url: url.to_string(),
                        message: e.to_string(),
                    });
                }
                Ok(resp) => RequestError::Status {
                    status: resp.status,
                    message: excerpt(&resp.body),
                },
                Err(e) => e,
            };
            log::warn!("{url}: attempt {attempt}/{max} failed: {err}");

            if attempt >= max {
                log::error!("{url}: giving up after {max} attempts");
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last: err,
                });
            }

            log::info!("Retrying in {}s...", self.policy.cooldown.as_secs());
            if !sleep_unless_shutdown(self.policy.cooldown) {
                return Err(FetchError::Interrupted);
            }
        }
    }
}

/// First line of a response body, truncated on a char boundary
fn excerpt(body: &str) -> String {
    let line = body.lines().next().unwrap_or("").trim();
    match line.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::http::RawResponse;

    fn requester(transport: &ScriptedTransport, attempts: u32) -> Requester<&ScriptedTransport> {
        Requester::new(
            transport,
            RequestHeaders::new().with("Accept", "application/json"),
            RetryPolicy::immediate(attempts),
        )
    }

    #[test]
    fn default_policy_matches_rate_limit_window() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.throttle, Duration::from_secs(1));
        assert_eq!(policy.cooldown, Duration::from_secs(600));
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::immediate(0).attempts(), 1);
    }

    #[test]
    fn success_on_first_attempt() {
        let transport = ScriptedTransport::new().respond("u", RawResponse::ok(r#"{"a":1}"#));
        let value = requester(&transport, 5).get_json("u").unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn recovers_after_transient_failures() {
        let transport = ScriptedTransport::new()
            .fail("u", RequestError::Transport("reset".into()))
            .respond(
                "u",
                RawResponse {
                    status: 502,
                    body: "bad gateway".into(),
                },
            )
            .respond("u", RawResponse::ok("[1,2]"));
        let value = requester(&transport, 5).get_json("u").unwrap();
        assert_eq!(value, serde_json::json!([1, 2]));
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn exhausts_after_exact_attempt_budget() {
        let transport = ScriptedTransport::new().always_fail(403);
        let err = requester(&transport, 3).get_json("u").unwrap_err();
        assert_eq!(transport.calls(), 3);
        match err {
            FetchError::Exhausted {
                url,
                attempts,
                last,
            } => {
                assert_eq!(url, "u");
                assert_eq!(attempts, 3);
                assert_eq!(last.status(), Some(403));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[test]
    fn throttles_every_call_and_cools_down_between_failures() {
        let transport = ScriptedTransport::new()
            .respond("u", RawResponse { status: 500, body: String::new() })
            .fail("u", RequestError::Transport("reset".into()))
            .respond("u", RawResponse::ok("{}"));
        let policy = RetryPolicy {
            max_attempts: 5,
            throttle: Duration::from_millis(20),
            cooldown: Duration::from_millis(100),
        };
        let requester = Requester::new(&transport, RequestHeaders::new(), policy);

        let start = std::time::Instant::now();
        requester.get_json("u").unwrap();
        assert_eq!(transport.calls(), 3);
        assert!(start.elapsed() >= 3 * policy.throttle + 2 * policy.cooldown);
    }

    #[test]
    fn final_failure_skips_cooldown() {
        let transport = ScriptedTransport::new().always_fail(503);
        let policy = RetryPolicy {
            max_attempts: 1,
            throttle: Duration::from_millis(20),
            cooldown: Duration::from_secs(5),
        };
        let requester = Requester::new(&transport, RequestHeaders::new(), policy);

        let start = std::time::Instant::now();
        assert!(requester.get_json("u").is_err());
        let elapsed = start.elapsed();
        assert!(elapsed >= policy.throttle);
        assert!(elapsed < policy.cooldown);
    }

    #[test]
    fn non_200_success_codes_are_failures() {
        let transport = ScriptedTransport::new().respond(
            "u",
            RawResponse {
                status: 204,
                body: String::new(),
            },
        );
        let err = requester(&transport, 1).get_json("u").unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 1, .. }));
    }

    #[test]
    fn malformed_body_is_not_retried() {
        let transport = ScriptedTransport::new()
            .respond("u", RawResponse::ok("<html>"))
            .respond("u", RawResponse::ok("[]"));
        let err = requester(&transport, 5).get_json("u").unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn sends_configured_headers() {
        let transport = ScriptedTransport::new().respond("u", RawResponse::ok("{}"));
        requester(&transport, 1).get_json("u").unwrap();
        let seen = transport.last_headers().unwrap();
        assert_eq!(seen.get("Accept"), Some("application/json"));
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let body = "x".repeat(500);
        let short = excerpt(&body);
        assert_eq!(short.len(), BODY_EXCERPT_LEN + 3);
        assert!(short.ends_with("..."));
        assert_eq!(excerpt("line one\nline two"), "line one");
        assert_eq!(excerpt(""), "");
    }
}
