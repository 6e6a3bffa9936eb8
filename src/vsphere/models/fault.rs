use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Error payload of a failed task (`LocalizedMethodFault`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereFault {
    #[serde(default)]
    pub localized_message: Option<String>,

    #[serde(default)]
    pub fault: Option<Value>,
}

impl VsphereFault {
    #[cfg(test)]
    pub fn new(message: impl AsRef<str>) -> Self {
        Self {
            localized_message: Some(message.as_ref().into()),
            fault: None,
        }
    }

    /// Used when a task ended in the `error` state without telling us why.
    pub fn unknown() -> Self {
        Self {
            localized_message: None,
            fault: None,
        }
    }

    fn fault_type(&self) -> Option<&str> {
        self.fault.as_ref()?.get("_typeName")?.as_str()
    }
}

impl fmt::Display for VsphereFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let message = self
            .localized_message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty());

        match (message, self.fault_type()) {
            (Some(message), _) => write!(f, "{}", message),
            (None, Some(fault_type)) => write!(f, "{}", fault_type),
            (None, None) => write!(f, "unknown fault"),
        }
    }
}
