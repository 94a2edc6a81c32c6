//! Collaborator that turns a CSV table into an NVS partition image.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::ExternalToolError;

/// Produces an NVS image file from a CSV description.
///
/// The real implementation shells out to ESP-IDF's partition generator;
/// tests substitute [`MockGenerator`](super::mock::MockGenerator).
pub trait NvsImageGenerator {
    /// Human-readable name used in logs and errors.
    fn name(&self) -> &str;

    /// Generate an image of `partition_size` bytes at `output_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be started, exits unsuccessfully,
    /// runs past its timeout, or leaves no output file behind.
    fn generate(
        &self,
        csv_path: &Path,
        output_path: &Path,
        partition_size: u32,
    ) -> Result<(), ExternalToolError>;
}

impl<G: NvsImageGenerator + ?Sized> NvsImageGenerator for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(
        &self,
        csv_path: &Path,
        output_path: &Path,
        partition_size: u32,
    ) -> Result<(), ExternalToolError> {
        (**self).generate(csv_path, output_path, partition_size)
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `<program> <args...> generate <csv> <output> <size>` as a child process.
#[derive(Debug, Clone)]
pub struct ExternalGenerator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ExternalGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl NvsImageGenerator for ExternalGenerator {
    fn name(&self) -> &str {
        &self.program
    }

    fn generate(
        &self,
        csv_path: &Path,
        output_path: &Path,
        partition_size: u32,
    ) -> Result<(), ExternalToolError> {
        let size_arg = format!("{partition_size:#x}");
        info!(
            program = %self.program,
            csv = %csv_path.display(),
            output = %output_path.display(),
            size = %size_arg,
            "Running NVS partition generator"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("generate")
            .arg(csv_path)
            .arg(output_path)
            .arg(&size_arg)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExternalToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // stderr is drained on its own thread; the pipe must not fill while we poll.
        let stderr_pipe = child.stderr.take();
        let stderr_reader = thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut pipe) = stderr_pipe {
                let _ = pipe.read_to_string(&mut text);
            }
            text
        });

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExternalToolError::Spawn {
                        program: self.program.clone(),
                        source,
                    });
                }
            }

            if start.elapsed() >= self.timeout {
                warn!(program = %self.program, timeout_secs = self.timeout.as_secs(), "Generator timed out");
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExternalToolError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stderr = stderr_reader.join().unwrap_or_default();
        debug!(
            status = ?status.code(),
            elapsed_ms = start.elapsed().as_millis(),
            "Generator finished"
        );

        if !status.success() {
            return Err(ExternalToolError::Failed {
                program: self.program.clone(),
                status: status.code(),
                stderr,
            });
        }
        if !output_path.is_file() {
            return Err(ExternalToolError::MissingOutput {
                program: self.program.clone(),
                path: output_path.display().to_string(),
            });
        }
        Ok(())
    }
}
