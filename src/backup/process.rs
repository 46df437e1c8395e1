//! Blocking invocation of the external tools the pipeline relies on.

use std::io;
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};

/// What a finished external tool reported.
#[derive(Debug)]
pub struct ToolOutcome {
    pub status: ExitStatus,
    pub stderr: String,
}

impl ToolOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// `exit status: 2: <stderr>` style description used in error messages.
    pub fn describe(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.status.to_string()
        } else {
            format!("{}: {}", self.status, stderr)
        }
    }
}

/// Runs `cmd` to completion with no timeout, feeding `stdin` when given.
///
/// Stdout is discarded; stderr is captured for the error message.
pub fn run_tool(cmd: &mut Command, stdin: Option<&[u8]>) -> io::Result<ToolOutcome> {
    cmd.stdout(Stdio::null()).stderr(Stdio::piped());
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = cmd.spawn()?;
    if let Some(input) = stdin {
        if let Some(mut pipe) = child.stdin.take() {
            // a tool that exits without reading stdin reports through its status
            match pipe.write_all(input) {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                res => res?,
            }
        }
    }

    let output = child.wait_with_output()?;
    Ok(ToolOutcome {
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
