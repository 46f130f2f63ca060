pub mod class;
pub mod classify;
pub mod detect;
pub mod model;
pub mod state;

pub use class::*;
pub use classify::*;
pub use detect::*;
pub use model::*;
pub use state::*;
