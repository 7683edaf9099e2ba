//! Core rate limiter implementation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::LimiterSettings;

use super::key::EntryKey;
use super::window::WindowEntry;

/// Category used when a caller does not name one, and the fallback for
/// categories with no registered limit.
pub const DEFAULT_CATEGORY: &str = "default";

/// Limit applied if the `default` category has somehow not been seeded.
const FALLBACK_LIMIT: LimitConfig = LimitConfig {
    window: Duration::from_secs(60),
    max_requests: 100,
};

/// Configuration for a rate limit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitConfig {
    /// Length of the fixed window
    pub window: Duration,
    /// Maximum admitted requests per window
    pub max_requests: u32,
}

impl LimitConfig {
    /// Create a new limit configuration.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
        }
    }
}

/// The outcome of a rate limit check.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    /// Whether the request was admitted
    pub allowed: bool,
    /// Quota left in the current window, computed after this request
    pub remaining: u32,
    /// When the current window ends
    pub reset_at: Instant,
    /// Whole seconds until the window ends, rounded up. Present only on
    /// refusal; intended for a `Retry-After` header.
    pub retry_after: Option<u64>,
}

/// A snapshot of limiter state for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterStats {
    /// Number of currently tracked entries
    pub total_entries: usize,
    /// Number of distinct identifiers across all categories
    pub active_identifiers: usize,
    /// Registered category names, in registration order
    pub categories: Vec<String>,
}

/// Category registry preserving registration order.
struct LimitRegistry {
    configs: HashMap<String, LimitConfig>,
    order: Vec<String>,
}

impl LimitRegistry {
    fn new() -> Self {
        Self {
            configs: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn insert(&mut self, category: &str, config: LimitConfig) {
        if self.configs.insert(category.to_string(), config).is_none() {
            self.order.push(category.to_string());
        }
    }

    fn resolve(&self, category: &str) -> LimitConfig {
        self.configs
            .get(category)
            .or_else(|| self.configs.get(DEFAULT_CATEGORY))
            .copied()
            .unwrap_or(FALLBACK_LIMIT)
    }
}

/// The core rate limiter: per-identifier, per-category fixed-window counters.
///
/// This struct is thread-safe and can be shared across tasks behind an
/// `Arc`. Each `check` is a single read-modify-write under the per-key lock
/// of the entry map, so concurrent checks for the same key cannot corrupt
/// the count. Construct one instance at application startup and pass it to
/// the request handlers that need it.
pub struct RateLimiter {
    /// Window state indexed by (category, identifier)
    entries: DashMap<EntryKey, WindowEntry>,
    /// Registered limits per category
    limits: RwLock<LimitRegistry>,
}

impl RateLimiter {
    /// Create a new rate limiter seeded with the default category limits.
    pub fn new() -> Self {
        let limiter = Self {
            entries: DashMap::new(),
            limits: RwLock::new(LimitRegistry::new()),
        };

        // Seeded before any traffic; `default` must always exist.
        let minute = Duration::from_secs(60);
        limiter.register_limit(DEFAULT_CATEGORY, LimitConfig::new(minute, 100));
        limiter.register_limit("api:query", LimitConfig::new(minute, 500));
        limiter.register_limit("api:mutation", LimitConfig::new(minute, 100));
        limiter.register_limit("api:ai", LimitConfig::new(minute, 20));
        limiter.register_limit("api:export", LimitConfig::new(Duration::from_secs(300), 10));
        limiter.register_limit("auth:login", LimitConfig::new(Duration::from_secs(300), 5));
        limiter.register_limit(
            "auth:password-reset",
            LimitConfig::new(Duration::from_secs(3600), 3),
        );

        limiter
    }

    /// Create a rate limiter with category limits from loaded settings
    /// layered over the seeded defaults.
    pub fn with_settings(settings: &LimiterSettings) -> Self {
        let limiter = Self::new();
        for category in &settings.categories {
            limiter.register_limit(
                &category.name,
                LimitConfig::new(
                    Duration::from_millis(category.window_ms),
                    category.max_requests,
                ),
            );
        }
        limiter
    }

    /// Insert or overwrite the limit for a category.
    ///
    /// The caller is trusted internal code; values are not validated here
    /// (file-loaded settings are validated at parse time instead). A changed
    /// limit applies to the next `check`; an existing entry keeps its
    /// current window boundary and picks up the new window length on its
    /// next rollover.
    pub fn register_limit(&self, category: &str, config: LimitConfig) {
        debug!(
            category = %category,
            window_ms = config.window.as_millis() as u64,
            max_requests = config.max_requests,
            "Registering rate limit"
        );
        self.limits.write().insert(category, config);
    }

    /// Check the rate limit for an identifier within a category.
    ///
    /// Admits the request iff the current window still has quota, counting
    /// it on admission. Unregistered categories fall back to `default`.
    pub fn check(&self, identifier: &str, category: &str) -> Decision {
        let config = self.limits.read().resolve(category);
        let key = EntryKey::new(category, identifier);
        let now = Instant::now();

        trace!(key = %key, "Checking rate limit");

        let (allowed, remaining, reset_at, retry_after) = {
            let mut entry = self.entries.entry(key.clone()).or_insert_with(|| {
                debug!(
                    key = %key,
                    max_requests = config.max_requests,
                    window_ms = config.window.as_millis() as u64,
                    "Creating new rate limit entry"
                );
                WindowEntry::new(now, config.window)
            });

            if entry.is_expired(now) {
                entry.restart(now, config.window);
            }

            let allowed = entry.admit(config.max_requests);
            let retry_after = (!allowed).then(|| entry.retry_after(now));
            (
                allowed,
                entry.remaining(config.max_requests),
                entry.reset_at(),
                retry_after,
            )
        };

        if let Some(secs) = retry_after {
            debug!(key = %key, retry_after = secs, "Rate limit exceeded");
        }

        Decision {
            allowed,
            remaining,
            reset_at,
            retry_after,
        }
    }

    /// Check against the `default` category.
    pub fn check_default(&self, identifier: &str) -> Decision {
        self.check(identifier, DEFAULT_CATEGORY)
    }

    /// Remove the entry for one identifier in one category.
    ///
    /// The next `check` for the pair starts a fresh window immediately,
    /// not at the old boundary.
    pub fn reset(&self, identifier: &str, category: &str) {
        let key = EntryKey::new(category, identifier);
        if self.entries.remove(&key).is_some() {
            debug!(key = %key, "Reset rate limit entry");
        }
    }

    /// Remove an identifier's entries across all categories.
    ///
    /// Used for administrative overrides, e.g. unblocking a user after
    /// manual review.
    pub fn reset_all(&self, identifier: &str) {
        // Counted inside the closure: concurrent checks may insert entries
        // mid-retain, so comparing map lengths can underflow.
        let removed = AtomicUsize::new(0);
        self.entries.retain(|key, _| {
            if key.identifier == identifier {
                removed.fetch_add(1, Ordering::Relaxed);
                false
            } else {
                true
            }
        });
        let removed = removed.into_inner();
        if removed > 0 {
            debug!(identifier = %identifier, removed, "Reset rate limit entries");
        }
    }

    /// Remove entries whose window has already ended.
    ///
    /// Returns the number of entries removed. Purely a memory bound for
    /// identifiers that stop sending traffic; `check` treats an expired
    /// entry as expired whether or not it has been swept.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let removed = AtomicUsize::new(0);
        self.entries.retain(|_, entry| {
            if entry.is_expired(now) {
                removed.fetch_add(1, Ordering::Relaxed);
                false
            } else {
                true
            }
        });
        removed.into_inner()
    }

    /// Snapshot the limiter state.
    pub fn stats(&self) -> LimiterStats {
        let identifiers: HashSet<String> = self
            .entries
            .iter()
            .map(|entry| entry.key().identifier.clone())
            .collect();

        LimiterStats {
            total_entries: self.entries.len(),
            active_identifiers: identifiers.len(),
            categories: self.limits.read().order.clone(),
        }
    }

    /// Get the number of tracked entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Clear all entries.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
