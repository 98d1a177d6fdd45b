pub mod tick;
pub mod prediction;
pub mod state;

pub use tick::*;
pub use prediction::*;
pub use state::*;
