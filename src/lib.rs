//! # Image Analysis API
//!
//! An HTTP service that accepts face images, stores them on the local
//! filesystem and returns a mock skin analysis for a stored image:
//!
//! - **Uploads**: multipart upload with MIME allow-list and size ceiling
//! - **Analysis**: reproducible pseudo-random skin assessment plus real
//!   image metadata
//! - **Security**: `X-API-Key` authentication with public path allow-list
//! - **Observability**: per-request correlation ids, structured JSON logs,
//!   Prometheus metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Correlation → CORS → Auth → Catch Panic)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, upload, analyze)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  UploadPolicy │ ImageStore │ AnalysisEngine                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Upload directory ({image_id}{ext})                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image_analysis_api::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config);
//!     state.store.ensure_dir().await?;
//!
//!     let app = build_router(state);
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::{Config, LogFormat};
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use services::{AnalysisEngine, ImageStore};
pub use state::AppState;
pub use validation::UploadPolicy;
