use crate::prelude::*;

/// Returns virtual disks whose backing carries a disk mode other than
/// `persistent`, together with that mode; disks without the attribute are
/// left alone.
pub fn find_disks_to_persist(devices: &[VsphereDevice]) -> Vec<(&VsphereDevice, &VsphereDiskMode)> {
    devices
        .iter()
        .filter(|device| device.is_virtual_disk())
        .filter_map(|device| Some((device, device.disk_mode()?)))
        .filter(|(_, mode)| !mode.is_persistent())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vsphere::utils::*;

    #[test]
    fn returns_only_non_persistent_disks() {
        let devices = vec![
            device("VirtualLsiLogicController", 1000, "SCSI controller 0"),
            disk(2000, "Hard disk 1", Some("persistent")),
            disk(2001, "Hard disk 2", Some("nonpersistent")),
            disk(2002, "Hard disk 3", None),
            disk(2003, "Hard disk 4", Some("independent_persistent")),
            device("VirtualVmxnet3", 4000, "Network adapter 1"),
        ];

        let actual: Vec<_> = find_disks_to_persist(&devices)
            .into_iter()
            .map(|(disk, mode)| (disk.key, mode.as_str()))
            .collect();

        pa::assert_eq!(
            vec![(2001, "nonpersistent"), (2003, "independent_persistent")],
            actual
        );
    }

    #[test]
    fn given_only_persistent_disks() {
        let devices = vec![
            disk(2000, "Hard disk 1", Some("persistent")),
            disk(2001, "Hard disk 2", None),
        ];

        assert!(find_disks_to_persist(&devices).is_empty());
    }
}
