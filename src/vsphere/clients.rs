mod fake;
mod http;

pub use self::{fake::*, http::*};
