//! Output file naming convention.
//!
//! The encoded copy of a dropped file is written next to the source, with a
//! suffix spliced in before the first `.` of the file name.

use std::path::Path;

use crate::error::CoreError;

/// Default suffix inserted into output file names.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_unsafe";

/// Derive the destination path for `source_path`.
///
/// Convention: `{dir}/{stem_before_first_dot}{suffix}.{rest}`. A file name
/// without a dot gets the suffix appended, so the output never aliases the
/// input.
///
/// # Examples
///
/// ```
/// use encodrop_core::naming::destination_path;
///
/// assert_eq!(destination_path("/v/a.mp4", "_unsafe").unwrap(), "/v/a_unsafe.mp4");
/// assert_eq!(destination_path("/v/clip.final.mkv", "_x").unwrap(), "/v/clip_x.final.mkv");
/// assert_eq!(destination_path("/v/raw", "_unsafe").unwrap(), "/v/raw_unsafe");
/// ```
pub fn destination_path(source_path: &str, suffix: &str) -> Result<String, CoreError> {
    let path = Path::new(source_path);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CoreError::Validation(format!("'{source_path}' has no file name")))?;

    let renamed = match file_name.find('.') {
        Some(dot) => format!("{}{suffix}{}", &file_name[..dot], &file_name[dot..]),
        None => format!("{file_name}{suffix}"),
    };

    let destination = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(renamed),
        _ => renamed.into(),
    };

    if destination.as_path() == path {
        return Err(CoreError::Validation(format!(
            "destination for '{source_path}' would overwrite the source"
        )));
    }

    Ok(destination.to_string_lossy().into_owned())
}
