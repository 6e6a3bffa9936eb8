mod prepare;

pub use self::prepare::*;
