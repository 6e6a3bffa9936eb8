use crate::vsphere::*;
use std::collections::BTreeMap;

#[cfg(test)]
use std::collections::{HashMap, HashSet};

#[cfg(test)]
use std::fmt;

/// In-memory endpoint; mutations are applied as soon as they're requested and
/// the returned tasks finish on their first poll.
#[derive(Debug, Default)]
pub struct VsphereFakeClient {
    vms: BTreeMap<VsphereVmId, VsphereFakeVmState>,
    tasks: BTreeMap<VsphereTaskId, VsphereFakeTask>,

    #[cfg(test)]
    journal: Vec<String>,

    #[cfg(test)]
    errors: HashSet<VsphereFakeError<'static>>,

    #[cfg(test)]
    task_failures: HashMap<VsphereFakeError<'static>, String>,

    #[cfg(test)]
    task_delay: usize,
}

impl VsphereFakeClient {
    /// Copies given endpoint's inventory; details (snapshots, devices) are
    /// copied only for the machines called `name`.
    pub fn clone_from(other: &mut dyn VsphereClient, name: &VsphereVmName) -> VsphereResult<Self> {
        let mut this = Self::default();

        for vm in other.vms()? {
            let mut state = VsphereFakeVmState {
                name: vm.name.clone(),
                snapshots: None,
                devices: Default::default(),
                change_tracking: false,
            };

            if &vm.name == name {
                state.snapshots = other.snapshot_info(&vm.id)?;
                state.devices = other.devices(&vm.id)?;
            }

            this.vms.insert(vm.id, state);
        }

        Ok(this)
    }

    #[cfg(test)]
    pub fn add(&mut self, vm: VsphereFakeVm<'_>) {
        self.vms.insert(
            VsphereVmId::new(vm.id),
            VsphereFakeVmState {
                name: VsphereVmName::new(vm.name),
                snapshots: vm.snapshots,
                devices: vm.devices,
                change_tracking: false,
            },
        );
    }

    /// Makes the call itself fail (as if the endpoint rejected the request).
    #[cfg(test)]
    pub fn inject_error(&mut self, error: VsphereFakeError<'static>) {
        self.errors.insert(error);
    }

    /// Makes the call succeed, but the task it starts end up in the `error`
    /// state; the change is not applied then.
    #[cfg(test)]
    pub fn fail_task(&mut self, error: VsphereFakeError<'static>, message: &str) {
        self.task_failures.insert(error, message.into());
    }

    /// Makes every task report `running` for given number of polls before
    /// finishing.
    #[cfg(test)]
    pub fn set_task_delay(&mut self, polls: usize) {
        self.task_delay = polls;
    }

    /// Mutating calls accepted so far, oldest first.
    #[cfg(test)]
    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    #[cfg(test)]
    pub fn polls(&self, task: &str) -> usize {
        self.tasks
            .get(&VsphereTaskId::new(task))
            .map(|task| task.polls)
            .unwrap_or_default()
    }

    /// Handles the test-only knobs for a mutating call: injected errors
    /// (returned as `Err`) and failing tasks (returned as `Ok(Some(task))`).
    #[cfg(test)]
    fn intercept(
        &mut self,
        call: VsphereFakeError<'_>,
        description: String,
    ) -> VsphereResult<Option<VsphereTaskId>> {
        if self.errors.contains(&call) {
            return Err(VsphereError::InjectedError);
        }

        self.journal.push(description);

        if let Some(message) = self.task_failures.get(&call) {
            let fault = VsphereFault::new(message);

            return Ok(Some(self.start_task(Some(fault))));
        }

        Ok(None)
    }

    fn get_mut(&mut self, vm: &VsphereVmId) -> VsphereResult<&mut VsphereFakeVmState> {
        self.vms
            .get_mut(vm)
            .ok_or_else(|| VsphereError::NoSuchVm { vm: vm.to_owned() })
    }

    fn start_task(&mut self, fault: Option<VsphereFault>) -> VsphereTaskId {
        let id = VsphereTaskId::new(format!("task-{}", self.tasks.len() + 1));

        #[cfg(test)]
        let pending_polls = self.task_delay;

        #[cfg(not(test))]
        let pending_polls = 0;

        self.tasks.insert(
            id.clone(),
            VsphereFakeTask {
                pending_polls,
                fault,

                #[cfg(test)]
                polls: 0,
            },
        );

        id
    }
}

impl VsphereClient for VsphereFakeClient {
    fn vms(&mut self) -> VsphereResult<Vec<VsphereVm>> {
        #[cfg(test)]
        if self.errors.contains(&VsphereFakeError::OnVms) {
            return Err(VsphereError::InjectedError);
        }

        let vms = self
            .vms
            .iter()
            .map(|(id, vm)| VsphereVm {
                id: id.clone(),
                name: vm.name.clone(),
            })
            .collect();

        Ok(vms)
    }

    fn rename_vm(
        &mut self,
        vm: &VsphereVmId,
        name: &VsphereVmName,
    ) -> VsphereResult<VsphereTaskId> {
        self.get_mut(vm)?;

        #[cfg(test)]
        if let Some(task) = self.intercept(
            VsphereFakeError::OnRename { vm: vm.as_str() },
            format!("rename {} -> {}", vm, name),
        )? {
            return Ok(task);
        }

        self.get_mut(vm)?.name = name.to_owned();

        Ok(self.start_task(None))
    }

    fn snapshot_info(&mut self, vm: &VsphereVmId) -> VsphereResult<Option<VsphereSnapshotInfo>> {
        #[cfg(test)]
        if self
            .errors
            .contains(&VsphereFakeError::OnSnapshotInfo { vm: vm.as_str() })
        {
            return Err(VsphereError::InjectedError);
        }

        Ok(self.get_mut(vm)?.snapshots.clone())
    }

    fn remove_all_snapshots(&mut self, vm: &VsphereVmId) -> VsphereResult<VsphereTaskId> {
        self.get_mut(vm)?;

        #[cfg(test)]
        if let Some(task) = self.intercept(
            VsphereFakeError::OnRemoveAllSnapshots { vm: vm.as_str() },
            format!("remove-all-snapshots {}", vm),
        )? {
            return Ok(task);
        }

        self.get_mut(vm)?.snapshots = None;

        Ok(self.start_task(None))
    }

    fn devices(&mut self, vm: &VsphereVmId) -> VsphereResult<Vec<VsphereDevice>> {
        #[cfg(test)]
        if self
            .errors
            .contains(&VsphereFakeError::OnDevices { vm: vm.as_str() })
        {
            return Err(VsphereError::InjectedError);
        }

        Ok(self.get_mut(vm)?.devices.clone())
    }

    fn reconfigure_vm(
        &mut self,
        vm: &VsphereVmId,
        spec: &VsphereConfigSpec,
    ) -> VsphereResult<VsphereTaskId> {
        let vm_obj = self.get_mut(vm)?;

        for change in &spec.device_change {
            if !vm_obj
                .devices
                .iter()
                .any(|device| device.key == change.device.key)
            {
                return Err(VsphereError::NoSuchDevice {
                    vm: vm.to_owned(),
                    key: change.device.key,
                });
            }
        }

        #[cfg(test)]
        if let Some(task) = self.intercept(
            VsphereFakeError::OnReconfigure { vm: vm.as_str() },
            format!("reconfigure {}: {}", vm, spec),
        )? {
            return Ok(task);
        }

        let vm_obj = self.get_mut(vm)?;

        if let Some(enabled) = spec.change_tracking_enabled {
            vm_obj.change_tracking = enabled;
        }

        for change in &spec.device_change {
            for device in &mut vm_obj.devices {
                if device.key == change.device.key {
                    *device = change.device.clone();
                }
            }
        }

        Ok(self.start_task(None))
    }

    fn task_info(&mut self, task: &VsphereTaskId) -> VsphereResult<VsphereTaskInfo> {
        let task_obj = self
            .tasks
            .get_mut(task)
            .ok_or_else(|| VsphereError::NoSuchTask {
                task: task.to_owned(),
            })?;

        #[cfg(test)]
        {
            task_obj.polls += 1;
        }

        if task_obj.pending_polls > 0 {
            task_obj.pending_polls -= 1;

            return Ok(VsphereTaskInfo {
                state: VsphereTaskState::Running,
                error: None,
            });
        }

        let info = match &task_obj.fault {
            Some(fault) => VsphereTaskInfo {
                state: VsphereTaskState::Error,
                error: Some(fault.clone()),
            },

            None => VsphereTaskInfo {
                state: VsphereTaskState::Success,
                error: None,
            },
        };

        Ok(info)
    }
}

#[cfg(test)]
impl fmt::Display for VsphereFakeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_snapshots(
            f: &mut fmt::Formatter<'_>,
            depth: usize,
            snapshots: &[VsphereSnapshotTree],
        ) -> fmt::Result {
            for snapshot in snapshots {
                writeln!(f, "{}-> snapshot: {}", "  ".repeat(depth), snapshot.name)?;
                write_snapshots(f, depth + 1, &snapshot.children)?;
            }

            Ok(())
        }

        for (idx, (id, vm)) in self.vms.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }

            writeln!(f, "{} {}", id, vm.name)?;

            if let Some(snapshots) = &vm.snapshots {
                write_snapshots(f, 0, &snapshots.roots)?;
            }

            for device in &vm.devices {
                if !device.is_virtual_disk() {
                    continue;
                }

                let mode = device
                    .disk_mode()
                    .map(|mode| mode.as_str())
                    .unwrap_or("-");

                writeln!(f, "-> disk {} ({}): {}", device.key, device.label(), mode)?;
            }

            if vm.change_tracking {
                writeln!(f, "-> change tracking: enabled")?;
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug)]
struct VsphereFakeVmState {
    name: VsphereVmName,
    snapshots: Option<VsphereSnapshotInfo>,
    devices: Vec<VsphereDevice>,
    change_tracking: bool,
}

#[derive(Clone, Debug)]
struct VsphereFakeTask {
    pending_polls: usize,
    fault: Option<VsphereFault>,

    #[cfg(test)]
    polls: usize,
}

#[cfg(test)]
#[derive(Clone, Debug)]
pub struct VsphereFakeVm<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub snapshots: Option<VsphereSnapshotInfo>,
    pub devices: Vec<VsphereDevice>,
}

#[cfg(test)]
impl Default for VsphereFakeVm<'static> {
    fn default() -> Self {
        Self {
            id: "vm-1",
            name: "",
            snapshots: None,
            devices: Default::default(),
        }
    }
}

#[cfg(test)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VsphereFakeError<'a> {
    OnVms,
    OnRename { vm: &'a str },
    OnSnapshotInfo { vm: &'a str },
    OnRemoveAllSnapshots { vm: &'a str },
    OnDevices { vm: &'a str },
    OnReconfigure { vm: &'a str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vsphere::utils::*;
    use crate::{assert_vsphere, prelude::*};

    fn client() -> VsphereFakeClient {
        let mut client = VsphereFakeClient::default();

        client.add(VsphereFakeVm {
            id: "vm-1",
            name: "Web01",
            snapshots: Some(snapshots(vec![snapshot(
                "base",
                vec![snapshot("nested", vec![])],
            )])),
            devices: vec![
                device("VirtualIDEController", 200, "IDE 0"),
                disk(2000, "Hard disk 1", Some("nonpersistent")),
                disk(2001, "Hard disk 2", None),
            ],
        });

        client.add(VsphereFakeVm {
            id: "vm-2",
            name: "db01",
            snapshots: Some(snapshots(vec![snapshot("nightly", vec![])])),
            devices: vec![disk(2000, "Hard disk 1", Some("persistent"))],
        });

        client
    }

    #[test]
    fn clone_from() {
        let mut source = client();

        let target = VsphereFakeClient::clone_from(&mut source, &vm_name("Web01")).unwrap();

        assert_vsphere!(
            r#"
            vm-1 Web01
            -> snapshot: base
              -> snapshot: nested
            -> disk 2000 (Hard disk 1): nonpersistent
            -> disk 2001 (Hard disk 2): -

            vm-2 db01
            "#,
            target
        );
    }

    #[test]
    fn vms() {
        pa::assert_eq!(
            vec![vm("vm-1", "Web01"), vm("vm-2", "db01")],
            client().vms().unwrap()
        );
    }

    mod rename_vm {
        use super::*;

        #[test]
        fn ok() {
            let mut client = client();
            let task = client.rename_vm(&vm_id("vm-1"), &vm_name("web01")).unwrap();

            assert_eq!(VsphereTaskState::Success, client.task_info(&task).unwrap().state);
            assert_eq!(vec!["rename vm-1 -> web01"], client.journal());

            pa::assert_eq!(
                vec![vm("vm-1", "web01"), vm("vm-2", "db01")],
                client.vms().unwrap()
            );
        }

        #[test]
        fn given_unknown_vm() {
            let actual = client()
                .rename_vm(&vm_id("vm-3"), &vm_name("web01"))
                .unwrap_err();

            pa::assert_eq!(VsphereError::NoSuchVm { vm: vm_id("vm-3") }, actual);
        }

        #[test]
        fn given_injected_error() {
            let mut client = client();

            client.inject_error(VsphereFakeError::OnRename { vm: "vm-1" });

            let actual = client
                .rename_vm(&vm_id("vm-1"), &vm_name("web01"))
                .unwrap_err();

            pa::assert_eq!(VsphereError::InjectedError, actual);
            assert!(client.journal().is_empty());
        }

        #[test]
        fn given_failing_task() {
            let mut client = client();

            client.fail_task(VsphereFakeError::OnRename { vm: "vm-1" }, "Name already in use");

            let task = client.rename_vm(&vm_id("vm-1"), &vm_name("web01")).unwrap();
            let info = client.task_info(&task).unwrap();

            assert_eq!(VsphereTaskState::Error, info.state);
            assert_eq!(Some(VsphereFault::new("Name already in use")), info.error);

            pa::assert_eq!(
                vec![vm("vm-1", "Web01"), vm("vm-2", "db01")],
                client.vms().unwrap()
            );
        }
    }

    mod remove_all_snapshots {
        use super::*;

        #[test]
        fn ok() {
            let mut client = client();

            client.remove_all_snapshots(&vm_id("vm-1")).unwrap();

            assert_eq!(None, client.snapshot_info(&vm_id("vm-1")).unwrap());
            assert!(client.snapshot_info(&vm_id("vm-2")).unwrap().is_some());
        }
    }

    mod reconfigure_vm {
        use super::*;

        #[test]
        fn edit_device() {
            let mut client = client();

            let spec = VsphereConfigSpec::edit_device(
                disk(2000, "Hard disk 1", Some("nonpersistent"))
                    .with_disk_mode(VsphereDiskMode::persistent()),
            );

            client.reconfigure_vm(&vm_id("vm-1"), &spec).unwrap();

            assert_vsphere!(
                r#"
                vm-1 Web01
                -> snapshot: base
                  -> snapshot: nested
                -> disk 2000 (Hard disk 1): persistent
                -> disk 2001 (Hard disk 2): -

                vm-2 db01
                -> snapshot: nightly
                -> disk 2000 (Hard disk 1): persistent
                "#,
                client
            );
        }

        #[test]
        fn enable_change_tracking() {
            let mut client = client();

            client
                .reconfigure_vm(&vm_id("vm-2"), &VsphereConfigSpec::enable_change_tracking())
                .unwrap();

            assert_eq!(
                vec!["reconfigure vm-2: changeTrackingEnabled=true"],
                client.journal()
            );

            assert_vsphere!(
                r#"
                vm-1 Web01
                -> snapshot: base
                  -> snapshot: nested
                -> disk 2000 (Hard disk 1): nonpersistent
                -> disk 2001 (Hard disk 2): -

                vm-2 db01
                -> snapshot: nightly
                -> disk 2000 (Hard disk 1): persistent
                -> change tracking: enabled
                "#,
                client
            );
        }

        #[test]
        fn given_unknown_device() {
            let mut client = client();

            let spec =
                VsphereConfigSpec::edit_device(disk(3000, "Hard disk 9", Some("persistent")));
            let actual = client.reconfigure_vm(&vm_id("vm-1"), &spec).unwrap_err();

            pa::assert_eq!(
                VsphereError::NoSuchDevice {
                    vm: vm_id("vm-1"),
                    key: 3000
                },
                actual
            );

            assert!(client.journal().is_empty());
        }
    }

    mod task_info {
        use super::*;

        #[test]
        fn given_delay() {
            let mut client = client();

            client.set_task_delay(2);

            let task = client.remove_all_snapshots(&vm_id("vm-2")).unwrap();

            assert_eq!(VsphereTaskState::Running, client.task_info(&task).unwrap().state);
            assert_eq!(VsphereTaskState::Running, client.task_info(&task).unwrap().state);
            assert_eq!(VsphereTaskState::Success, client.task_info(&task).unwrap().state);
            assert_eq!(3, client.polls(task.as_str()));
        }

        #[test]
        fn given_unknown_task() {
            let actual = client()
                .task_info(&VsphereTaskId::new("task-404"))
                .unwrap_err();

            pa::assert_eq!(
                VsphereError::NoSuchTask {
                    task: VsphereTaskId::new("task-404")
                },
                actual
            );
        }
    }
}
