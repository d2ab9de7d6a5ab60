pub mod symbology;
pub mod sync;
pub mod viewport;

pub use symbology::*;
pub use sync::*;
pub use viewport::*;
