use crate::vsphere::{VsphereVmId, VsphereVmName};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VsphereVm {
    pub id: VsphereVmId,
    pub name: VsphereVmName,
}
