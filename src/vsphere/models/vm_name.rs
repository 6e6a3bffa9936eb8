use serde::Deserialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct VsphereVmName(String);

impl VsphereVmName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the lowercase form of this name, or `None` if the name is
    /// lowercase already (names without any cased characters included).
    pub fn normalized(&self) -> Option<Self> {
        let lowercase = self.0.to_lowercase();

        if lowercase == self.0 {
            None
        } else {
            Some(Self(lowercase))
        }
    }
}

impl fmt::Display for VsphereVmName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
