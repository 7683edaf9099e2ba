//! Turnstile - In-Process Rate Limiting
//!
//! This crate implements a fixed-window rate limiter with per-category
//! quotas. Request-handling code derives a stable identifier (client IP,
//! user id, API key), picks the category matching the operation being
//! throttled, and calls [`ratelimit::RateLimiter::check`] before doing
//! work. A refused request carries a retry hint in whole seconds.

pub mod config;
pub mod error;
pub mod ratelimit;
