//! Backend abstraction for external host services.
//!
//! Every mutation and query against the host's external collaborators
//! (`dnf`/`rpm`, `getent`/`useradd`, `systemctl`, `firewall-cmd`,
//! `dconf`, `chown`) goes through the [`Backend`] trait, so probes and
//! executors can be tested against a recording mock instead of a live
//! host.

pub mod system;

use anyhow::Result;

/// Captured output of one external command.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    pub success: bool,
}

impl CmdOutput {
    /// Convenience constructor for tests and synthetic results.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            code: Some(0),
            success: true,
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            code: Some(code),
            success: false,
        }
    }
}

/// Runs external commands on behalf of probes and executors.
///
/// `run` only errors when the command could not be spawned at all; a
/// non-zero exit lands in [`CmdOutput`] for the caller to interpret
/// (several collaborators use exit codes as answers, e.g. `getent`
/// exits 2 for "no such entry").
pub trait Backend: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput>;

    /// Run a command and treat any non-zero exit as an error.
    fn run_checked(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = self.run(program, args)?;
        if !output.success {
            let stderr = output.stderr.trim();
            anyhow::bail!(
                "{program} {} failed: {}",
                args.join(" "),
                if stderr.is_empty() {
                    "no error output"
                } else {
                    stderr
                }
            );
        }
        Ok(output.stdout)
    }
}

/// Get the default backend (real command execution).
pub fn default_backend() -> system::SystemBackend {
    system::SystemBackend
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{Backend, CmdOutput};
    use anyhow::Result;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Backend with canned responses that records every invocation.
    pub struct MockBackend {
        responses: HashMap<String, CmdOutput>,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Register a response for `program arg1 arg2 ...`.
        pub fn respond(mut self, command: &str, output: CmdOutput) -> Self {
            self.responses.insert(command.to_string(), output);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Backend for MockBackend {
        fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput> {
            let command = std::iter::once(program)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls.lock().unwrap().push(command.clone());
            match self.responses.get(&command) {
                Some(output) => Ok(output.clone()),
                None => anyhow::bail!("no mock response for '{command}'"),
            }
        }
    }
}
