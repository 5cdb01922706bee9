use crate::toolchain::process::{CommandOutput, Invocation};
use crate::traits::CommandRunner;
use std::io;
use std::sync::Mutex;

/// Records every call; fails any invocation whose arguments mention `fail_on`.
#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    fail_on: Option<String>,
    missing: bool,
}

impl RecordingRunner {
    pub(crate) fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Default::default()
        }
    }

    /// Every program fails to start, as if GDAL were not installed.
    pub(crate) fn missing() -> Self {
        Self {
            missing: true,
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        if self.missing {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        let fails = self.fail_on.as_deref().is_some_and(|needle| {
            invocation
                .args
                .iter()
                .any(|a| a.to_string_lossy().contains(needle))
        });
        Ok(CommandOutput {
            status: Some(if fails { 1 } else { 0 }),
            stdout: "GDAL 3.9.1, released 2024/06/22\n".to_string(),
            stderr: if fails {
                "ERROR 4: not a raster\n".into()
            } else {
                String::new()
            },
        })
    }
}
