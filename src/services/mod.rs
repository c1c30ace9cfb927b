pub mod analysis;
pub mod store;

pub use analysis::{AnalysisEngine, SkinAssessment, assess, read_metadata};
pub use store::ImageStore;
