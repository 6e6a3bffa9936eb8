use crate::vsphere::VsphereFault;
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct VsphereTaskInfo {
    pub state: VsphereTaskState,

    #[serde(default)]
    pub error: Option<VsphereFault>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VsphereTaskState {
    Queued,
    Running,
    Success,
    Error,
}
