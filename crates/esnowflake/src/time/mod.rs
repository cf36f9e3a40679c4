mod interface;
mod system_clock;
mod wait;

pub use interface::*;
pub use system_clock::*;
pub use wait::*;
