use crate::toolchain::process::{CommandOutput, Invocation};
use std::io;

/// Runs an external program to completion and hands back what it printed.
///
/// An `Err` means the program could not be started at all; a program that
/// ran and failed is an `Ok` with a non-zero status.
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}
