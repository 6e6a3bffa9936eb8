use crate::vsphere::VsphereDevice;
use serde::Serialize;
use std::fmt;

/// A `VirtualMachineConfigSpec`: the delta submitted to `ReconfigVM_Task`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereConfigSpec {
    #[serde(rename = "_typeName")]
    type_name: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_tracking_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub device_change: Vec<VsphereDeviceChange>,
}

impl VsphereConfigSpec {
    fn empty() -> Self {
        Self {
            type_name: "VirtualMachineConfigSpec",
            change_tracking_enabled: None,
            device_change: Default::default(),
        }
    }

    pub fn enable_change_tracking() -> Self {
        Self {
            change_tracking_enabled: Some(true),
            ..Self::empty()
        }
    }

    /// Replaces exactly one device (matched by its key) with given one.
    pub fn edit_device(device: VsphereDevice) -> Self {
        Self {
            device_change: vec![VsphereDeviceChange {
                type_name: "VirtualDeviceConfigSpec",
                operation: "edit",
                device,
            }],
            ..Self::empty()
        }
    }
}

impl fmt::Display for VsphereConfigSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut changes = Vec::new();

        if let Some(enabled) = self.change_tracking_enabled {
            changes.push(format!("changeTrackingEnabled={}", enabled));
        }

        for change in &self.device_change {
            let mut line = format!("{} device {}", change.operation, change.device.key);

            if let Some(mode) = change.device.disk_mode() {
                line.push_str(&format!(" (diskMode={})", mode));
            }

            changes.push(line);
        }

        write!(f, "{}", changes.join(", "))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VsphereDeviceChange {
    #[serde(rename = "_typeName")]
    type_name: &'static str,

    pub operation: &'static str,
    pub device: VsphereDevice,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vsphere::utils::*;
    use crate::vsphere::VsphereDiskMode;
    use pretty_assertions as pa;
    use serde_json::json;

    #[test]
    fn enable_change_tracking() {
        let spec = VsphereConfigSpec::enable_change_tracking();

        pa::assert_eq!(
            json!({
                "_typeName": "VirtualMachineConfigSpec",
                "changeTrackingEnabled": true
            }),
            serde_json::to_value(&spec).unwrap()
        );

        assert_eq!("changeTrackingEnabled=true", spec.to_string());
    }

    #[test]
    fn edit_device() {
        let spec = VsphereConfigSpec::edit_device(
            disk(2000, "Hard disk 1", Some("nonpersistent"))
                .with_disk_mode(VsphereDiskMode::persistent()),
        );

        pa::assert_eq!(
            json!({
                "_typeName": "VirtualMachineConfigSpec",
                "deviceChange": [
                    {
                        "_typeName": "VirtualDeviceConfigSpec",
                        "operation": "edit",
                        "device": {
                            "_typeName": "VirtualDisk",
                            "key": 2000,
                            "deviceInfo": { "label": "Hard disk 1" },
                            "backing": {
                                "_typeName": "VirtualDiskFlatVer2BackingInfo",
                                "diskMode": "persistent"
                            }
                        }
                    }
                ]
            }),
            serde_json::to_value(&spec).unwrap()
        );

        assert_eq!("edit device 2000 (diskMode=persistent)", spec.to_string());
    }
}
