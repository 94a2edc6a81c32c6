//! Mock NVS generator for tests.
//!
//! Records every invocation and writes a deterministic fake image instead of
//! running the real partition tool.
//!
//! # Example
//!
//! ```rust,ignore
//! use m5cfg::nvs::mock::MockGenerator;
//!
//! let mock = MockGenerator::new();
//! let packer = Packer::new(dir, Box::new(mock.clone()))?;
//! packer.pack_uiflow2_nvs(&options, None, None)?;
//! assert_eq!(mock.invocations().len(), 1);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use super::NvsImageGenerator;
use crate::error::ExternalToolError;

/// One recorded call to [`MockGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub csv_path: PathBuf,
    /// CSV file contents at call time.
    pub csv: String,
    pub output_path: PathBuf,
    pub partition_size: u32,
}

/// How the mock responds.
#[derive(Debug, Clone, Default)]
pub enum MockBehavior {
    /// Write an image: the CSV bytes followed by 0xFF up to the partition size.
    #[default]
    Succeed,
    /// Write an image of this many bytes regardless of the requested size.
    WrongSize(usize),
    /// Exit with a status code and stderr text.
    Fail { status: i32, stderr: String },
    /// Write this many bytes of the image, then exit with status 1.
    FailPartway(usize),
    /// Behave as if the tool hung past its deadline.
    Timeout,
}

/// A shareable, recording stand-in for the partition tool.
///
/// Clones share state, so a test can hand one clone to a packer and keep
/// another to inspect.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    behavior: Arc<Mutex<MockBehavior>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        let mock = Self::new();
        mock.set_behavior(behavior);
        mock
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        self.invocations.lock().unwrap().last().cloned()
    }
}

impl NvsImageGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn generate(
        &self,
        csv_path: &Path,
        output_path: &Path,
        partition_size: u32,
    ) -> Result<(), ExternalToolError> {
        let csv = fs::read_to_string(csv_path).unwrap_or_default();
        debug!(csv = %csv_path.display(), output = %output_path.display(), "Mock generate");
        self.invocations.lock().unwrap().push(Invocation {
            csv_path: csv_path.to_path_buf(),
            csv: csv.clone(),
            output_path: output_path.to_path_buf(),
            partition_size,
        });

        let behavior = self.behavior.lock().unwrap().clone();
        let size = match behavior {
            MockBehavior::Succeed => partition_size as usize,
            MockBehavior::WrongSize(size) => size,
            MockBehavior::Fail { status, stderr } => {
                return Err(ExternalToolError::Failed {
                    program: "mock".to_string(),
                    status: Some(status),
                    stderr,
                });
            }
            MockBehavior::FailPartway(written) => {
                let mut partial = csv.into_bytes();
                partial.resize(written, 0xFF);
                let _ = fs::write(output_path, partial);
                return Err(ExternalToolError::Failed {
                    program: "mock".to_string(),
                    status: Some(1),
                    stderr: "interrupted".to_string(),
                });
            }
            MockBehavior::Timeout => {
                return Err(ExternalToolError::Timeout {
                    program: "mock".to_string(),
                    timeout: Duration::from_secs(60),
                });
            }
        };

        let mut image = csv.into_bytes();
        image.resize(size, 0xFF);
        fs::write(output_path, image).map_err(|source| ExternalToolError::Spawn {
            program: "mock".to_string(),
            source,
        })
    }
}
