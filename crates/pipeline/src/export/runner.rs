//! Subprocess execution for external export tools

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// A fully specified tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable
    pub program: PathBuf,
    /// Arguments after the program
    pub args: Vec<OsString>,
    /// Complete environment; nothing is inherited from this process
    pub env: BTreeMap<String, String>,
    /// Kill the process after this long
    pub timeout: Duration,
}

impl CommandSpec {
    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone().into_os_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// How a command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Exited with a status code
    Exited(i32),
    /// Killed by a signal
    Terminated,
    /// Killed after exceeding its timeout
    TimedOut,
}

impl CommandOutcome {
    /// True for exit status 0
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Exited(0))
    }
}

/// Runs external commands
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion or timeout
    fn run(&self, command: &CommandSpec) -> io::Result<CommandOutcome>;
}

/// Runs commands as child processes, polling for exit
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    poll_interval: Duration,
}

impl ShellCommandRunner {
    /// Runner polling every 50ms
    pub fn new() -> Self {
        ShellCommandRunner {
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &CommandSpec) -> io::Result<CommandOutcome> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .env_clear()
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(match status.code() {
                    Some(code) => CommandOutcome::Exited(code),
                    None => CommandOutcome::Terminated,
                });
            }
            if started.elapsed() >= command.timeout {
                // Already-exited races surface as an error from kill; wait reaps either way
                let _ = child.kill();
                child.wait()?;
                return Ok(CommandOutcome::TimedOut);
            }
            thread::sleep(self.poll_interval);
        }
    }
}
