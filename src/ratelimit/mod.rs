//! Rate limiting logic and state management.

mod key;
mod limiter;
mod sweeper;
mod window;

pub use key::EntryKey;
pub use limiter::{Decision, LimitConfig, LimiterStats, RateLimiter, DEFAULT_CATEGORY};
pub use sweeper::{Sweeper, DEFAULT_SWEEP_INTERVAL};
pub use window::WindowEntry;
