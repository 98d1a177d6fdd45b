pub mod weighting;
pub mod fusion;

pub use weighting::*;
pub use fusion::*;
