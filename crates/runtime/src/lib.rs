pub mod metrics;
pub mod progress;
pub mod sampler;
pub mod signal;

pub use metrics::*;
pub use progress::*;
pub use sampler::*;
pub use signal::*;
