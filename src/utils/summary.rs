use colored::Colorize;
use std::fmt;

#[derive(Debug, Default)]
pub struct Summary {
    renamed: bool,
    deleted_snapshots: usize,
    updated_disks: usize,
    change_tracking: bool,
    errors: usize,
}

impl Summary {
    pub fn set_renamed(&mut self) {
        self.renamed = true;
    }

    pub fn add_deleted_snapshots(&mut self, n: usize) {
        self.deleted_snapshots += n;
    }

    pub fn add_updated_disk(&mut self) {
        self.updated_disks += 1;
    }

    pub fn set_change_tracking(&mut self) {
        self.change_tracking = true;
    }

    pub fn add_error(&mut self) {
        self.errors += 1;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = "Summary";

        writeln!(f, "{}", title.bold())?;
        writeln!(f, "{}", "-".repeat(title.chars().count()))?;
        writeln!(f, "  renamed: {}", if self.renamed { "yes" } else { "no" })?;
        writeln!(f, "  deleted snapshots: {}", self.deleted_snapshots)?;
        writeln!(f, "  updated disks: {}", self.updated_disks)?;

        writeln!(
            f,
            "  change tracking: {}",
            if self.change_tracking {
                "enabled"
            } else {
                "not enabled"
            }
        )?;

        if self.errors > 0 {
            writeln!(f, "  errors: {}", self.errors.to_string().red())?;
        } else {
            writeln!(f, "  errors: 0")?;
        }

        Ok(())
    }
}
