mod clients;
mod error;
mod models;

pub use self::{clients::*, error::*, models::*};

/// Remote side of the management endpoint.
///
/// Every mutating call returns a task handle right away; use
/// [`crate::tasks::TaskWaiter`] to block until the task finishes.
pub trait VsphereClient {
    /// Returns all virtual machines known to the endpoint, in no particular
    /// order.
    fn vms(&mut self) -> VsphereResult<Vec<VsphereVm>>;

    fn rename_vm(&mut self, vm: &VsphereVmId, name: &VsphereVmName)
        -> VsphereResult<VsphereTaskId>;

    /// Returns `None` if the machine has no snapshots.
    fn snapshot_info(&mut self, vm: &VsphereVmId) -> VsphereResult<Option<VsphereSnapshotInfo>>;

    fn remove_all_snapshots(&mut self, vm: &VsphereVmId) -> VsphereResult<VsphereTaskId>;

    fn devices(&mut self, vm: &VsphereVmId) -> VsphereResult<Vec<VsphereDevice>>;

    fn reconfigure_vm(
        &mut self,
        vm: &VsphereVmId,
        spec: &VsphereConfigSpec,
    ) -> VsphereResult<VsphereTaskId>;

    fn task_info(&mut self, task: &VsphereTaskId) -> VsphereResult<VsphereTaskInfo>;
}

#[cfg(test)]
pub mod utils {
    use super::*;
    use serde_json::Map;

    pub fn vm_id(id: impl AsRef<str>) -> VsphereVmId {
        VsphereVmId::new(id)
    }

    pub fn vm_name(name: impl AsRef<str>) -> VsphereVmName {
        VsphereVmName::new(name)
    }

    pub fn vm(id: impl AsRef<str>, name: impl AsRef<str>) -> VsphereVm {
        VsphereVm {
            id: vm_id(id),
            name: vm_name(name),
        }
    }

    pub fn snapshots(roots: Vec<VsphereSnapshotTree>) -> VsphereSnapshotInfo {
        VsphereSnapshotInfo { roots }
    }

    pub fn snapshot(
        name: impl AsRef<str>,
        children: Vec<VsphereSnapshotTree>,
    ) -> VsphereSnapshotTree {
        VsphereSnapshotTree {
            name: name.as_ref().into(),
            children,
        }
    }

    /// Builds a virtual disk; `mode: None` means a backing without the
    /// `diskMode` attribute.
    pub fn disk(key: i32, label: impl AsRef<str>, mode: Option<&str>) -> VsphereDevice {
        VsphereDevice {
            type_name: VsphereDevice::VIRTUAL_DISK.into(),
            key,
            device_info: Some(VsphereDeviceInfo {
                label: label.as_ref().into(),
                extra: Map::new(),
            }),
            backing: Some(VsphereDeviceBacking {
                type_name: "VirtualDiskFlatVer2BackingInfo".into(),
                disk_mode: mode.map(VsphereDiskMode::new),
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }

    pub fn device(type_name: impl AsRef<str>, key: i32, label: impl AsRef<str>) -> VsphereDevice {
        VsphereDevice {
            type_name: type_name.as_ref().into(),
            key,
            device_info: Some(VsphereDeviceInfo {
                label: label.as_ref().into(),
                extra: Map::new(),
            }),
            backing: None,
            extra: Map::new(),
        }
    }
}
