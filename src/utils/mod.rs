pub mod headers;
pub mod logging;

pub use logging::*;
