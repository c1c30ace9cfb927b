//! HTTP middleware for request correlation and authentication.
//!
//! - **Correlation**: per-request id, `request` span, entry/exit logs and
//!   timing headers
//! - **API Key Authentication**: `X-API-Key` gate with constant-time comparison
//!
//! # Architecture
//!
//! ```text
//! Request → Correlation → CORS → Auth → Catch Panic → Body Limit → Handler
//!               ↓                  ↓
//!     X-Correlation-ID      401 Unauthorized
//!     X-Process-Time
//! ```

pub mod auth;
pub mod client_ip;
pub mod correlation;

pub use auth::{API_KEY_HEADER, ApiKeyAuth};
pub use client_ip::client_ip;
pub use correlation::{CORRELATION_ID_HEADER, CorrelationLayer, PROCESS_TIME_HEADER, RequestContext};
