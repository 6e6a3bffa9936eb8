use crate::prelude::*;

pub struct Environment<'a> {
    pub stdout: &'a mut dyn Write,
    pub vsphere: &'a mut dyn VsphereClient,
    pub tasks: TaskWaiter,
}

impl<'a> Environment<'a> {
    #[cfg(test)]
    pub fn test(stdout: &'a mut dyn Write, vsphere: &'a mut dyn VsphereClient) -> Self {
        use std::time::Duration;

        colored::control::set_override(true);

        Self {
            stdout,
            vsphere,
            tasks: TaskWaiter::new(
                Duration::ZERO,
                Duration::from_secs(60),
                CancellationToken::default(),
            ),
        }
    }
}
