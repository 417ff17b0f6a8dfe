use crate::secret_string::SecretString;
use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// One invocation of an external tool (docker, aws). Environment values are
/// wrapped as secrets so a Debug print of an invocation never leaks them;
/// stdin is used for material that must not appear in the argument list.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, SecretString)>,
    pub stdin: Option<SecretString>,
}

impl ToolInvocation {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: Vec::new(),
            stdin: None,
        }
    }

    pub fn with_env(mut self, env: Vec<(String, SecretString)>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn with_stdin(mut self, data: SecretString) -> Self {
        self.stdin = Some(data);
        self
    }

    /// Rendering used for log lines. Arguments are safe to print; env values
    /// and stdin never are.
    pub fn command_line(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code as reported by the OS, None if terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// External tools are reached exclusively through this trait so that the
/// pipeline steps can be exercised against a scripted stand-in.
pub trait ToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

/// Production runner backed by child processes.
pub struct ProcessToolRunner;

impl ToolRunner for ProcessToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        debug!("Running external tool: {}", invocation.command_line());

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        for (key, value) in &invocation.env {
            command.env(key, value.expose_secret());
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn external tool {}", invocation.program))?;

        if let Some(data) = &invocation.stdin {
            let mut stdin = child
                .stdin
                .take()
                .context("Child process stdin handle was not piped")?;
            stdin
                .write_all(data.expose_secret().as_bytes())
                .await
                .with_context(|| format!("Failed to write stdin to {}", invocation.program))?;
            // Dropping the handle closes the pipe so the child sees EOF
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("Failed to wait for {}", invocation.program))?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted runner for tests: hands out canned outputs in invocation
    /// order and records every invocation it sees. An exhausted script
    /// answers with a clean exit and empty output.
    pub struct ScriptedRunner {
        invocations: Mutex<Vec<ToolInvocation>>,
        script: Mutex<VecDeque<ToolOutput>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self {
                invocations: Mutex::new(Vec::new()),
                script: Mutex::new(VecDeque::new()),
            }
        }

        pub fn push_ok(&self, stdout: &str) {
            self.script.lock().unwrap().push_back(ToolOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            });
        }

        pub fn push_exit(&self, code: i32, stderr: &str) {
            self.script.lock().unwrap().push_back(ToolOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            });
        }

        pub fn invocations(&self) -> Vec<ToolInvocation> {
            self.invocations.lock().unwrap().clone()
        }

        pub fn command_lines(&self) -> Vec<String> {
            self.invocations()
                .iter()
                .map(ToolInvocation::command_line)
                .collect()
        }
    }

    impl ToolRunner for ScriptedRunner {
        async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
            self.invocations.lock().unwrap().push(invocation.clone());
            Ok(self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ToolOutput {
                    code: Some(0),
                    stdout: String::new(),
                    stderr: String::new(),
                }))
        }
    }
}
