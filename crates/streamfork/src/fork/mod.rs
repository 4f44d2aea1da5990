mod forker;
mod queue;
mod results;
#[cfg(test)]
mod tests;

pub use forker::*;
pub use queue::ForkSource;
pub use results::*;
