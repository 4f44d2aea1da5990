#![doc = include_str!("../README.md")]

mod engine;
mod error;
mod fork;
mod panic;
mod reduce;
mod source;

pub use crate::engine::*;
pub use crate::error::*;
pub use crate::fork::*;
pub use crate::reduce::*;
pub use crate::source::*;
