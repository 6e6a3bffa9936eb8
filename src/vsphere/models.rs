mod config_spec;
mod device;
mod disk_mode;
mod fault;
mod snapshot;
mod task_id;
mod task_info;
mod vm;
mod vm_id;
mod vm_name;

pub use self::{
    config_spec::*, device::*, disk_mode::*, fault::*, snapshot::*, task_id::*, task_info::*,
    vm::*, vm_id::*, vm_name::*,
};
