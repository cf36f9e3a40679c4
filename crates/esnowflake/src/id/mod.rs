mod layout;
mod raw;

pub use layout::*;
pub use raw::*;
