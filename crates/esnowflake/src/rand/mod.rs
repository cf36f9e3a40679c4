mod interface;
mod native;
mod pool;

pub use interface::*;
pub use native::*;
pub use pool::*;
