use crate::vsphere::{VsphereTaskId, VsphereVmId};
use std::result;
use thiserror::Error;

pub type VsphereResult<T> = result::Result<T, VsphereError>;

#[derive(Debug, Error)]
pub enum VsphereError {
    #[error("No such virtual machine: {vm}")]
    NoSuchVm { vm: VsphereVmId },

    #[error("No such device: {key} (on virtual machine `{vm}`)")]
    NoSuchDevice { vm: VsphereVmId, key: i32 },

    #[error("No such task: {task}")]
    NoSuchTask { task: VsphereTaskId },

    #[error("Invalid user name or password")]
    InvalidCredentials,

    #[error("Not connected to the endpoint")]
    NotConnected,

    #[error("Endpoint returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[cfg(test)]
    #[error("InjectedError")]
    InjectedError,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
impl PartialEq<VsphereError> for VsphereError {
    fn eq(&self, other: &VsphereError) -> bool {
        self.to_string() == other.to_string()
    }
}
