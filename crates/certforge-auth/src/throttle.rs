//! Per-client sliding-window throttle for the login endpoint.
//!
//! Each client key (normally the client address) owns one counter and
//! the instant its window started. Every login attempt is recorded,
//! including attempts that end up blocked, so a client that trips the
//! limit stays blocked for the rest of its window. Once more than
//! `window` has elapsed since the window started, the next attempt
//! opens a fresh window.
//!
//! State lives in process memory only. It is not persisted and is not
//! shared between server instances.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::warn;

use crate::config::AuthConfig;

/// Expired entries are purged after this many recorded attempts.
const PURGE_EVERY: u64 = 1_000;

/// Throttle limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Attempts allowed per window; the next one is blocked.
    pub max_attempts: u32,
    pub window: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl From<&AuthConfig> for ThrottleConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            max_attempts: config.max_login_attempts,
            window: config.login_window(),
        }
    }
}

/// Outcome of recording one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    /// Rejected; the window ends in roughly this many minutes
    /// (rounded up, at least 1).
    Blocked { retry_after_minutes: u64 },
}

#[derive(Debug, Clone, Copy)]
struct ThrottleEntry {
    attempts: u32,
    window_start: Instant,
}

/// In-memory login throttle keyed by client.
pub struct LoginThrottle {
    config: ThrottleConfig,
    entries: DashMap<String, ThrottleEntry>,
    recorded: AtomicU64,
}

impl LoginThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            recorded: AtomicU64::new(0),
        }
    }

    /// Record an attempt from `client_key` and decide whether it may
    /// proceed.
    pub fn check_and_record(&self, client_key: &str) -> ThrottleDecision {
        self.check_and_record_at(client_key, Instant::now())
    }

    /// Same as [`check_and_record`](Self::check_and_record) with an
    /// explicit clock reading.
    pub fn check_and_record_at(&self, client_key: &str, now: Instant) -> ThrottleDecision {
        // The entry guard holds the shard lock, so reset-or-increment is
        // a single step per key.
        let snapshot = match self.entries.entry(client_key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if now.saturating_duration_since(entry.window_start) > self.config.window {
                    *entry = ThrottleEntry {
                        attempts: 1,
                        window_start: now,
                    };
                } else {
                    entry.attempts = entry.attempts.saturating_add(1);
                }
                *entry
            }
            Entry::Vacant(vacant) => *vacant.insert(ThrottleEntry {
                attempts: 1,
                window_start: now,
            }),
        };

        if self.recorded.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            self.purge_expired_at(now);
        }

        if snapshot.attempts <= self.config.max_attempts {
            return ThrottleDecision::Allowed;
        }

        let elapsed = now.saturating_duration_since(snapshot.window_start);
        let remaining = self.config.window.saturating_sub(elapsed);
        let retry_after_minutes = remaining.as_secs().div_ceil(60).max(1);

        warn!(
            client = %client_key,
            attempts = snapshot.attempts,
            retry_after_minutes,
            "Login rate limit hit"
        );

        ThrottleDecision::Blocked {
            retry_after_minutes,
        }
    }

    /// Drop entries whose window has elapsed.
    pub fn purge_expired(&self) {
        self.purge_expired_at(Instant::now());
    }

    fn purge_expired_at(&self, now: Instant) {
        let window = self.config.window;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.window_start) <= window);
    }

    /// Forget every client.
    pub fn reset(&self) {
        self.entries.clear();
    }

    /// Number of tracked client keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}

/// Derive the throttle key for a request: the first entry of a
/// forwarded-for header when present and non-blank, else the peer
/// address, else `"unknown"`.
pub fn client_key(forwarded_for: Option<&str>, peer: Option<SocketAddr>) -> String {
    if let Some(first) = forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
    {
        return first.to_owned();
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;

    fn throttle() -> LoginThrottle {
        LoginThrottle::default()
    }

    #[test]
    fn ten_attempts_are_allowed() {
        let t = throttle();
        let now = Instant::now();
        for i in 0..10 {
            assert_eq!(
                t.check_and_record_at("10.0.0.1", now),
                ThrottleDecision::Allowed,
                "attempt {} should be allowed",
                i + 1
            );
        }
    }

    #[test]
    fn eleventh_attempt_is_blocked_for_whole_window() {
        let t = throttle();
        let start = Instant::now();
        for _ in 0..10 {
            t.check_and_record_at("10.0.0.1", start);
        }

        assert_eq!(
            t.check_and_record_at("10.0.0.1", start),
            ThrottleDecision::Blocked {
                retry_after_minutes: 15
            }
        );

        // Blocked attempts keep counting, so the block holds later on.
        let later = start + Duration::from_secs(14 * 60 + 30);
        assert_eq!(
            t.check_and_record_at("10.0.0.1", later),
            ThrottleDecision::Blocked {
                retry_after_minutes: 1
            }
        );
    }

    #[test]
    fn retry_estimate_rounds_up() {
        let t = throttle();
        let start = Instant::now();
        for _ in 0..10 {
            t.check_and_record_at("k", start);
        }
        // 4m 10s elapsed → 10m 50s remaining → 11 minutes.
        let now = start + Duration::from_secs(4 * 60 + 10);
        assert_eq!(
            t.check_and_record_at("k", now),
            ThrottleDecision::Blocked {
                retry_after_minutes: 11
            }
        );
    }

    #[test]
    fn window_resets_after_expiry() {
        let t = throttle();
        let start = Instant::now();
        for _ in 0..12 {
            t.check_and_record_at("10.0.0.1", start);
        }
        assert!(matches!(
            t.check_and_record_at("10.0.0.1", start),
            ThrottleDecision::Blocked { .. }
        ));

        let after = start + Duration::from_secs(15 * 60 + 1);
        assert_eq!(
            t.check_and_record_at("10.0.0.1", after),
            ThrottleDecision::Allowed
        );
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let t = throttle();
        let start = Instant::now();
        for _ in 0..10 {
            t.check_and_record_at("k", start);
        }
        // Exactly one window later is still the same window.
        let edge = start + Duration::from_secs(15 * 60);
        assert!(matches!(
            t.check_and_record_at("k", edge),
            ThrottleDecision::Blocked { .. }
        ));
    }

    #[test]
    fn new_window_starts_even_when_not_exhausted() {
        let t = throttle();
        let start = Instant::now();
        for _ in 0..5 {
            t.check_and_record_at("k", start);
        }
        let next = start + Duration::from_secs(16 * 60);
        for _ in 0..10 {
            assert_eq!(t.check_and_record_at("k", next), ThrottleDecision::Allowed);
        }
        assert!(matches!(
            t.check_and_record_at("k", next),
            ThrottleDecision::Blocked { .. }
        ));
    }

    #[test]
    fn keys_are_independent() {
        let t = throttle();
        let now = Instant::now();
        for _ in 0..11 {
            t.check_and_record_at("a", now);
        }
        assert_eq!(t.check_and_record_at("b", now), ThrottleDecision::Allowed);
    }

    #[test]
    fn concurrent_attempts_never_exceed_limit() {
        let t = Arc::new(LoginThrottle::new(ThrottleConfig {
            max_attempts: 10,
            window: Duration::from_secs(900),
        }));
        let allowed = Arc::new(AtomicU32::new(0));
        let now = Instant::now();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let t = Arc::clone(&t);
                let allowed = Arc::clone(&allowed);
                scope.spawn(move || {
                    for _ in 0..50 {
                        if t.check_and_record_at("shared", now) == ThrottleDecision::Allowed {
                            allowed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        assert_eq!(allowed.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn purge_and_reset() {
        let t = throttle();
        let start = Instant::now();
        t.check_and_record_at("old", start);
        t.check_and_record_at("new", start + Duration::from_secs(20 * 60));
        assert_eq!(t.len(), 2);

        t.purge_expired_at(start + Duration::from_secs(20 * 60));
        assert_eq!(t.len(), 1);

        t.reset();
        assert!(t.is_empty());
    }

    #[test]
    fn client_key_prefers_first_forwarded_address() {
        let peer: SocketAddr = "192.168.1.5:51000".parse().unwrap();
        assert_eq!(
            client_key(Some("203.0.113.7, 10.0.0.1"), Some(peer)),
            "203.0.113.7"
        );
        assert_eq!(client_key(Some("   "), Some(peer)), "192.168.1.5");
        assert_eq!(client_key(None, Some(peer)), "192.168.1.5");
        assert_eq!(client_key(None, None), "unknown");
    }
}
