mod characteristics;
mod interface;
mod iter;
mod slice;
mod split;

pub use characteristics::*;
pub use interface::*;
pub use iter::*;
pub use slice::*;
pub use split::*;
