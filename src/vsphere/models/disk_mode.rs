use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a disk backing's `diskMode`, e.g. `persistent` or
/// `independent_nonpersistent`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VsphereDiskMode(String);

impl VsphereDiskMode {
    pub const PERSISTENT: &'static str = "persistent";

    pub fn new(mode: impl AsRef<str>) -> Self {
        Self(mode.as_ref().into())
    }

    pub fn persistent() -> Self {
        Self::new(Self::PERSISTENT)
    }

    pub fn is_persistent(&self) -> bool {
        self.0 == Self::PERSISTENT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VsphereDiskMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
