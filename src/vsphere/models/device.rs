use crate::vsphere::VsphereDiskMode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single entry of the virtual machine's `config.hardware.device` list.
///
/// Only the fields we look at are typed; everything else is kept in `extra`,
/// so that an edited device can be sent back to vSphere as a whole.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereDevice {
    #[serde(rename = "_typeName")]
    pub type_name: String,

    pub key: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<VsphereDeviceInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backing: Option<VsphereDeviceBacking>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VsphereDevice {
    pub const VIRTUAL_DISK: &'static str = "VirtualDisk";

    pub fn is_virtual_disk(&self) -> bool {
        self.type_name == Self::VIRTUAL_DISK
    }

    pub fn label(&self) -> String {
        self.device_info
            .as_ref()
            .map(|info| info.label.clone())
            .unwrap_or_else(|| format!("device {}", self.key))
    }

    /// Returns the backing's disk mode; `None` for backings that don't carry
    /// one (e.g. some raw device mappings).
    pub fn disk_mode(&self) -> Option<&VsphereDiskMode> {
        self.backing.as_ref()?.disk_mode.as_ref()
    }

    pub fn with_disk_mode(&self, mode: VsphereDiskMode) -> Self {
        let mut this = self.clone();

        if let Some(backing) = &mut this.backing {
            backing.disk_mode = Some(mode);
        }

        this
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VsphereDeviceInfo {
    pub label: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereDeviceBacking {
    #[serde(rename = "_typeName")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_mode: Option<VsphereDiskMode>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
