//! HTTP client module
//!
//! Provides the HTTP client with retry, rate limiting, and backoff.
//!
//! # Features
//!
//! - **Automatic Retries**: fixed attempt budget, quadratic backoff capped at a maximum
//! - **Rate Limiting**: token bucket rate limiter using governor
//! - **Error Classification**: transient faults vs. remote logical errors

mod client;
mod rate_limit;
mod retry;

pub use client::{HttpClient, HttpClientConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};

#[cfg(test)]
mod tests;
