use crate::prelude::*;

#[derive(Debug, PartialEq, Eq)]
pub enum VmLookup {
    Found(VsphereVm),
    NotFound,
    Ambiguous(Vec<VsphereVm>),
}

/// Finds the machine called exactly `name` (case-sensitive).
pub fn find_vm(vms: Vec<VsphereVm>, name: &VsphereVmName) -> VmLookup {
    let mut matching: Vec<_> = vms.into_iter().filter(|vm| &vm.name == name).collect();

    match matching.len() {
        0 => VmLookup::NotFound,
        1 => VmLookup::Found(matching.remove(0)),
        _ => VmLookup::Ambiguous(matching),
    }
}
