pub mod phase;
pub mod preview;
pub mod track;

pub use phase::*;
pub use track::*;
