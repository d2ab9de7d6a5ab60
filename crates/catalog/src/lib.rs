pub mod poi;
pub mod session;

pub use poi::*;
pub use session::*;
