mod lock;
mod mutex;
mod options;
mod state;

pub use lock::*;
pub(crate) use mutex::*;
pub use options::*;
pub(crate) use state::*;
