mod analyze;
mod fallback;
mod health;
mod upload;

pub use analyze::analyze_image;
pub use fallback::{method_not_allowed, route_not_found};
pub use health::{health_check, root};
pub use upload::{FILE_FIELD, upload_image};
