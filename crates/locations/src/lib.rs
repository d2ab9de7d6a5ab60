pub mod fetch;
pub mod request;
pub mod store;

pub use fetch::*;
pub use request::*;
pub use store::*;
