use serde::Deserialize;

/// The `snapshot` property of a virtual machine; absent when the machine has
/// no snapshots at all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct VsphereSnapshotInfo {
    #[serde(rename = "rootSnapshotList", default)]
    pub roots: Vec<VsphereSnapshotTree>,
}

impl VsphereSnapshotInfo {
    /// Total number of snapshots, nested ones included.
    pub fn count(&self) -> usize {
        count(&self.roots)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VsphereSnapshotTree {
    pub name: String,

    // vSphere omits the list for leaf snapshots
    #[serde(rename = "childSnapshotList", default)]
    pub children: Vec<VsphereSnapshotTree>,
}

fn count(snapshots: &[VsphereSnapshotTree]) -> usize {
    snapshots
        .iter()
        .map(|snapshot| 1 + count(&snapshot.children))
        .sum()
}
