mod config;
mod reduce;

pub use config::*;
pub use reduce::*;
