//! Running external tools (native build tools, contributed exporters).
//!
//! Tool output is forwarded line by line as it arrives: stdout at `info`,
//! stderr at `error`. A non-zero exit is reported with the tool's exit code.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use crate::error::{Result, TrellisError};

/// Run `command` to completion, optionally feeding `input` on stdin.
pub fn run_tool(command: &mut Command, tool: &str, input: Option<&[u8]>) -> Result<()> {
    debug!(tool, command = ?command, "running tool");

    let mut child = command
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| TrellisError::Build {
            message: format!("Failed to start {}: {}", tool, e),
            help: Some(format!("Is {} installed and on PATH?", tool)),
        })?;

    let stdout = child.stdout.take().map(|out| forward(out, false));
    let stderr = child.stderr.take().map(|err| forward(err, true));

    if let (Some(bytes), Some(mut stdin)) = (input, child.stdin.take()) {
        match stdin.write_all(bytes) {
            // The tool may exit without reading its input; its exit code
            // tells the rest.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Err(e) => return Err(TrellisError::Build {
                message: format!("Failed to write to {}: {}", tool, e),
                help: None,
            }),
            Ok(()) => {}
        }
    }

    let status = child.wait()?;
    for handle in [stdout, stderr].into_iter().flatten() {
        let _ = handle.join();
    }

    if status.success() {
        Ok(())
    } else {
        Err(TrellisError::ExternalTool {
            tool: tool.to_string(),
            code: status.code().unwrap_or(1),
        })
    }
}

fn forward<R: Read + Send + 'static>(stream: R, is_stderr: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(stream).lines().map_while(|l| l.ok()) {
            if is_stderr {
                error!("{}", line);
            } else {
                info!("{}", line);
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo building; echo warning >&2"]);

        run_tool(&mut command, "sh", None).unwrap();
    }

    #[test]
    fn test_exit_code_propagated() {
        let mut command = Command::new("sh");
        command.args(["-c", "exit 7"]);

        let err = run_tool(&mut command, "sh", None).unwrap_err();
        assert_eq!(err.exit_code(), 7);
        assert!(matches!(err, TrellisError::ExternalTool { code: 7, .. }));
    }

    #[test]
    fn test_input_on_stdin() {
        let mut command = Command::new("sh");
        command.args(["-c", "read line; test \"$line\" = hello"]);

        run_tool(&mut command, "sh", Some(b"hello\n")).unwrap();
    }

    #[test]
    fn test_missing_tool() {
        let mut command = Command::new("trellis-no-such-tool");

        let err = run_tool(&mut command, "trellis-no-such-tool", None).unwrap_err();
        assert!(matches!(err, TrellisError::Build { .. }));
    }
}
