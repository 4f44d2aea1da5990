mod func;
mod interface;
mod word;

pub use func::*;
pub use interface::*;
pub use word::*;
