mod format_error;
mod summary;

pub use self::{format_error::*, summary::*};
