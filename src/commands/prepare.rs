mod find_disks_to_persist;
mod find_vm;

use self::{find_disks_to_persist::*, find_vm::*};
use crate::prelude::*;
use thiserror::Error;

/// Why a single step didn't go through.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Remote(#[from] VsphereError),

    #[error(transparent)]
    Task(#[from] TaskError),
}

impl StepError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Task(err) if err.is_cancelled())
    }
}

/// Prepares a virtual machine for migration: lowercases its name, deletes its
/// snapshots, makes its disks persistent and enables change tracking.
///
/// A failing step is reported and the next one runs anyway; only an
/// interruption stops the whole thing.
pub struct Prepare<'a, 'b> {
    env: &'a mut Environment<'b>,
    summary: Summary,
}

impl<'a, 'b> Prepare<'a, 'b> {
    pub fn new(env: &'a mut Environment<'b>) -> Self {
        Self {
            env,
            summary: Summary::default(),
        }
    }

    pub fn run(mut self, name: &VsphereVmName) -> Result<()> {
        let vms = self
            .env
            .vsphere
            .vms()
            .context("Couldn't list virtual machines")?;

        let vm = match find_vm(vms, name) {
            VmLookup::Found(vm) => vm,

            VmLookup::NotFound => {
                writeln!(self.env.stdout, "VM '{}' not found.", name)?;
                return Ok(());
            }

            VmLookup::Ambiguous(vms) => {
                bail!(
                    "Found {} virtual machines named `{}` ({}), refusing to pick one",
                    vms.len(),
                    name,
                    vms.iter().map(|vm| vm.id.as_str()).join(", ")
                );
            }
        };

        tracing::info!(vm = %vm.id, "preparing virtual machine");

        writeln!(self.env.stdout, "{} ({})", vm.name.as_str().bold(), vm.id)?;

        self.rename(&vm)?;
        self.delete_snapshots(&vm)?;
        self.normalize_disks(&vm)?;
        self.enable_change_tracking(&vm)?;

        writeln!(self.env.stdout)?;
        write!(self.env.stdout, "{}", self.summary)?;

        Ok(())
    }

    fn rename(&mut self, vm: &VsphereVm) -> Result<()> {
        let new_name = if let Some(new_name) = vm.name.normalized() {
            new_name
        } else {
            writeln!(
                self.env.stdout,
                "  - name already lowercase, no need to rename"
            )?;

            return Ok(());
        };

        write!(
            self.env.stdout,
            "  - renaming to: {}",
            new_name.as_str().italic()
        )?;

        let result = self.run_task(|vsphere| vsphere.rename_vm(&vm.id, &new_name));

        if self
            .report(result, "Couldn't rename the virtual machine")?
            .is_some()
        {
            self.summary.set_renamed();
        }

        Ok(())
    }

    fn delete_snapshots(&mut self, vm: &VsphereVm) -> Result<()> {
        let result = self.env.vsphere.snapshot_info(&vm.id);

        let snapshots = self.fetch(
            "looking up snapshots",
            "Couldn't retrieve snapshots",
            result,
        )?;

        let snapshots = match snapshots {
            Some(Some(snapshots)) => snapshots,

            Some(None) => {
                writeln!(self.env.stdout, "  - no snapshots found")?;
                return Ok(());
            }

            None => {
                return Ok(());
            }
        };

        let count = snapshots.count();

        write!(
            self.env.stdout,
            "  - found {} {}, deleting them",
            count.to_string().italic(),
            if count == 1 { "snapshot" } else { "snapshots" },
        )?;

        let result = self.run_task(|vsphere| vsphere.remove_all_snapshots(&vm.id));

        if self.report(result, "Couldn't delete snapshots")?.is_some() {
            self.summary.add_deleted_snapshots(count);
        }

        Ok(())
    }

    fn normalize_disks(&mut self, vm: &VsphereVm) -> Result<()> {
        let result = self.env.vsphere.devices(&vm.id);

        let devices = self.fetch("looking up disks", "Couldn't retrieve devices", result)?;

        let devices = match devices {
            Some(devices) => devices,
            None => return Ok(()),
        };

        let disks = find_disks_to_persist(&devices);

        if disks.is_empty() {
            writeln!(self.env.stdout, "  - all disks are persistent already")?;
            return Ok(());
        }

        let persistent = VsphereDiskMode::persistent();

        for (disk, mode) in disks {
            let label = disk.label();

            write!(
                self.env.stdout,
                "  - disk {} is in {} mode, updating it to {}",
                label.as_str().italic(),
                mode.as_str().italic(),
                persistent.as_str().italic(),
            )?;

            let spec = VsphereConfigSpec::edit_device(disk.with_disk_mode(persistent.clone()));
            let result = self.run_task(|vsphere| vsphere.reconfigure_vm(&vm.id, &spec));

            if self
                .report(result, &format!("Couldn't update disk: {}", label))?
                .is_some()
            {
                self.summary.add_updated_disk();
            }
        }

        Ok(())
    }

    fn enable_change_tracking(&mut self, vm: &VsphereVm) -> Result<()> {
        write!(self.env.stdout, "  - enabling change tracking")?;

        let spec = VsphereConfigSpec::enable_change_tracking();
        let result = self.run_task(|vsphere| vsphere.reconfigure_vm(&vm.id, &spec));

        if self
            .report(result, "Couldn't enable change tracking")?
            .is_some()
        {
            self.summary.set_change_tracking();
        }

        Ok(())
    }

    /// Starts a task and blocks until it finishes.
    fn run_task(
        &mut self,
        start: impl FnOnce(&mut dyn VsphereClient) -> VsphereResult<VsphereTaskId>,
    ) -> Result<(), StepError> {
        // No new changes once we've been interrupted
        if self.env.tasks.is_cancelled() {
            return Err(TaskError::Cancelled.into());
        }

        let task = start(&mut *self.env.vsphere)?;

        tracing::debug!(%task, "task started");

        self.env.tasks.wait(&mut *self.env.vsphere, &task)?;

        Ok(())
    }

    /// Passes a successful read through; a failed one gets reported the same
    /// way a failed step does.
    fn fetch<T>(
        &mut self,
        what: &str,
        context: &str,
        result: VsphereResult<T>,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),

            Err(err) => {
                write!(self.env.stdout, "  - {}", what)?;
                self.report(Err(err.into()), context)
            }
        }
    }

    /// Prints the outcome of a step; returns `Err` only when the workflow has
    /// to stop.
    fn report<T>(&mut self, result: Result<T, StepError>, context: &str) -> Result<Option<T>> {
        let err = match result {
            Ok(value) => {
                writeln!(self.env.stdout, " {}", "[ OK ]".green())?;
                return Ok(Some(value));
            }

            Err(err) => err,
        };

        self.summary.add_error();

        writeln!(self.env.stdout, " {}", "[ FAILED ]".red())?;
        writeln!(self.env.stdout)?;

        let cancelled = err.is_cancelled();
        let err = format_error(&anyhow::Error::new(err).context(context.to_owned()));

        for line in err.lines() {
            writeln!(self.env.stdout, "    {}", line)?;
        }

        writeln!(self.env.stdout)?;

        if cancelled {
            bail!("Interrupted, skipping the remaining steps");
        }

        Ok(None)
    }
}
