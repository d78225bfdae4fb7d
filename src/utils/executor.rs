//! Command execution abstraction for testability
//!
//! Database services describe what to run as an [`Invocation`] and hand it
//! to a [`CommandExecutor`]. Tests swap in [`mock::MockExecutor`].

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A file connected to one end of a child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: PathBuf,
    /// gzip-encode stdout / gzip-decode stdin in process
    pub gzip: bool,
}

/// One external tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub stdin: Option<Redirect>,
    pub stdout: Option<Redirect>,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn stdin_from(mut self, path: impl AsRef<Path>, gunzip: bool) -> Self {
        self.stdin = Some(Redirect {
            path: path.as_ref().to_path_buf(),
            gzip: gunzip,
        });
        self
    }

    pub fn stdout_to(mut self, path: impl AsRef<Path>, gzip: bool) -> Self {
        self.stdout = Some(Redirect {
            path: path.as_ref().to_path_buf(),
            gzip,
        });
        self
    }

    /// Printable command line; environment values are left out since they
    /// carry passwords
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        if let Some(ref r) = self.stdin {
            line.push_str(&format!(" < {}", r.path.display()));
        }
        if let Some(ref r) = self.stdout {
            line.push_str(&format!(" > {}", r.path.display()));
        }
        line
    }
}

/// How a child process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
    pub stderr: String,
}

impl Completion {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Turn a completion into a result
///
/// With `ignore_exit_code`, a non-zero exit is logged and accepted. A child
/// killed by a signal is always an error.
pub fn check(tool: &str, completion: Completion, ignore_exit_code: bool) -> Result<()> {
    if completion.success() {
        return Ok(());
    }

    if ignore_exit_code && completion.code.is_some() {
        warn!(
            "{} returned {}, ignored as requested: {}",
            tool,
            completion.status(),
            completion.stderr
        );
        return Ok(());
    }

    Err(Error::ExternalTool {
        tool: tool.to_string(),
        status: completion.status(),
        stderr: completion.stderr,
    })
}

/// Abstraction for command execution, enabling mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run to completion. Errors only when the process cannot be started or
    /// its input/output cannot be moved.
    fn execute(&self, invocation: &Invocation) -> Result<Completion>;
}

/// Default implementation using real subprocess calls
#[derive(Debug, Clone, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<Completion> {
        super::command::run(invocation)
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use crate::utils::command::{open_source, Sink};
    use std::collections::HashMap;
    use std::io::{Read, Write};
    use std::sync::{Arc, Mutex};

    /// Recorded command invocation
    #[derive(Clone, Debug)]
    pub struct CommandCall {
        pub invocation: Invocation,
        /// Bytes the tool would have read on stdin (after gunzip)
        pub stdin_data: Vec<u8>,
    }

    impl CommandCall {
        pub fn program(&self) -> &str {
            &self.invocation.program
        }

        pub fn args(&self) -> &[String] {
            &self.invocation.args
        }

        pub fn has_arg(&self, arg: &str) -> bool {
            self.invocation.args.iter().any(|a| a == arg)
        }

        pub fn env(&self, key: &str) -> Option<&str> {
            self.invocation
                .envs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Response configuration for mock
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        /// Exit 0, writing `stdout` to the stdout redirect if any
        Success { stdout: String, stderr: String },
        Failure { stderr: String, exit_code: i32 },
        /// The process could not be started
        NotFound,
    }

    impl Default for MockResponse {
        fn default() -> Self {
            MockResponse::Success {
                stdout: String::new(),
                stderr: String::new(),
            }
        }
    }

    impl MockResponse {
        pub fn output(stdout: &str) -> Self {
            MockResponse::Success {
                stdout: stdout.to_string(),
                stderr: String::new(),
            }
        }

        pub fn exit(exit_code: i32, stderr: &str) -> Self {
            MockResponse::Failure {
                stderr: stderr.to_string(),
                exit_code,
            }
        }
    }

    /// Mock executor for testing
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Recorded command invocations
        pub calls: Arc<Mutex<Vec<CommandCall>>>,
        /// Pre-configured responses: program name -> response
        responses: Arc<Mutex<HashMap<String, MockResponse>>>,
        /// Default response when no specific response is configured
        default_response: Arc<Mutex<MockResponse>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure a response for a specific program
        pub fn expect(self, program: &str, response: MockResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(program.to_string(), response);
            self
        }

        /// Set the default response for unconfigured programs
        pub fn with_default_response(self, response: MockResponse) -> Self {
            *self.default_response.lock().unwrap() = response;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<CommandCall> {
            self.calls.lock().unwrap().clone()
        }

        /// The most recent call, if any
        pub fn last_call(&self) -> Option<CommandCall> {
            self.calls.lock().unwrap().last().cloned()
        }

        /// Check if a program was called
        pub fn was_called(&self, program: &str) -> bool {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .any(|c| c.invocation.program == program)
        }

        /// Get number of calls to a specific program
        pub fn call_count(&self, program: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.invocation.program == program)
                .count()
        }

        fn get_response(&self, program: &str) -> MockResponse {
            self.responses
                .lock()
                .unwrap()
                .get(program)
                .cloned()
                .unwrap_or_else(|| self.default_response.lock().unwrap().clone())
        }
    }

    fn io_error(program: &str, e: std::io::Error) -> Error {
        Error::ExternalTool {
            tool: program.to_string(),
            status: "mock i/o".to_string(),
            stderr: e.to_string(),
        }
    }

    impl CommandExecutor for MockExecutor {
        fn execute(&self, invocation: &Invocation) -> Result<Completion> {
            let program = invocation.program.as_str();

            let mut stdin_data = Vec::new();
            if let Some(ref redirect) = invocation.stdin {
                open_source(redirect)
                    .and_then(|mut source| source.read_to_end(&mut stdin_data))
                    .map_err(|e| io_error(program, e))?;
            }

            self.calls.lock().unwrap().push(CommandCall {
                invocation: invocation.clone(),
                stdin_data,
            });

            match self.get_response(program) {
                MockResponse::Success { stdout, stderr } => {
                    if let Some(ref redirect) = invocation.stdout {
                        let mut sink = Sink::create(redirect).map_err(|e| io_error(program, e))?;
                        sink.write_all(stdout.as_bytes())
                            .and_then(|_| sink.finish())
                            .map_err(|e| io_error(program, e))?;
                    }
                    Ok(Completion { code: Some(0), stderr })
                }
                MockResponse::Failure { stderr, exit_code } => Ok(Completion {
                    code: Some(exit_code),
                    stderr,
                }),
                MockResponse::NotFound => Err(Error::ExternalTool {
                    tool: program.to_string(),
                    status: "not found".to_string(),
                    stderr: format!("{} is not installed", program),
                }),
            }
        }
    }
}
