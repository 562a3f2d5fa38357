pub mod adapters;
pub mod detect;
pub mod enrich;
pub mod error;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod stats;

pub use error::ReportError;
