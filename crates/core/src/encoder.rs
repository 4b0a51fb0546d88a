//! Location of the external encoder binary.
//!
//! The encoder ships as `video_processor` (with the platform executable
//! suffix, i.e. `video_processor.exe` on Windows). In a development layout
//! it sits next to the running application; a packaged install keeps it in
//! a resources directory.

use std::path::PathBuf;

use crate::error::CoreError;

/// Base name of the encoder executable, without platform suffix.
pub const ENCODER_BASE_NAME: &str = "video_processor";

/// Encoder executable file name for the current platform.
pub fn encoder_file_name() -> String {
    format!("{ENCODER_BASE_NAME}{}", std::env::consts::EXE_SUFFIX)
}

/// Where to look for the encoder binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderLocation {
    /// Use this exact path.
    Explicit(PathBuf),
    /// Packaged layout: `{dir}/video_processor[.exe]`.
    Resources(PathBuf),
    /// Development layout: next to the running executable.
    AppDir,
}

impl EncoderLocation {
    /// Pick a location from optional overrides, most specific first.
    pub fn from_overrides(explicit: Option<PathBuf>, resources_dir: Option<PathBuf>) -> Self {
        match (explicit, resources_dir) {
            (Some(path), _) => Self::Explicit(path),
            (None, Some(dir)) => Self::Resources(dir),
            (None, None) => Self::AppDir,
        }
    }

    /// Resolve to a concrete binary path.
    ///
    /// Existence is not checked here; a missing binary surfaces as a spawn
    /// failure for the job that tries to use it.
    pub fn resolve(&self) -> Result<PathBuf, CoreError> {
        match self {
            Self::Explicit(path) => Ok(path.clone()),
            Self::Resources(dir) => Ok(dir.join(encoder_file_name())),
            Self::AppDir => {
                let exe = std::env::current_exe().map_err(|e| {
                    CoreError::Internal(format!("cannot locate running executable: {e}"))
                })?;
                let dir = exe.parent().ok_or_else(|| {
                    CoreError::Internal(format!("{} has no parent directory", exe.display()))
                })?;
                Ok(dir.join(encoder_file_name()))
            }
        }
    }
}
