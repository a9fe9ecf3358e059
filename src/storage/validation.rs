//! Path segment validation for usernames and file names.
//!
//! Both end up as a single component of a filesystem path, so anything that
//! could escape the parent directory or collide with a device name is rejected.

use thiserror::Error;

/// Maximum length of a path segment in bytes.
pub const MAX_SEGMENT_LENGTH: usize = 255;

/// Windows device names that cannot be used as a file or directory name.
const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reasons a path segment is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// Segment is empty.
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Segment is `.` or `..`.
    #[error("{0} cannot be a relative path component")]
    DotComponent(&'static str),

    /// Segment starts with `.` where that is not allowed.
    #[error("{0} cannot start with '.'")]
    LeadingDot(&'static str),

    /// Segment contains a path separator.
    #[error("{0} cannot contain path separators")]
    Separator(&'static str),

    /// Segment contains NUL or another control character.
    #[error("{0} cannot contain control characters")]
    ControlChar(&'static str),

    /// Segment is longer than [`MAX_SEGMENT_LENGTH`].
    #[error("{0} must be at most {MAX_SEGMENT_LENGTH} bytes")]
    TooLong(&'static str),

    /// Segment is a reserved device name.
    #[error("{0} is a reserved name")]
    Reserved(&'static str),
}

fn is_reserved_device_name(segment: &str) -> bool {
    let stem = segment.split('.').next().unwrap_or(segment);
    RESERVED_DEVICE_NAMES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(stem))
}

fn validate_segment(kind: &'static str, segment: &str) -> Result<(), SegmentError> {
    if segment.is_empty() {
        return Err(SegmentError::Empty(kind));
    }
    if segment == "." || segment == ".." {
        return Err(SegmentError::DotComponent(kind));
    }
    if segment.len() > MAX_SEGMENT_LENGTH {
        return Err(SegmentError::TooLong(kind));
    }
    if segment.contains('/') || segment.contains('\\') {
        return Err(SegmentError::Separator(kind));
    }
    if segment.chars().any(|c| c.is_control()) {
        return Err(SegmentError::ControlChar(kind));
    }
    if is_reserved_device_name(segment) {
        return Err(SegmentError::Reserved(kind));
    }
    Ok(())
}

/// Validate a username before it becomes a directory name.
///
/// Usernames may not start with `.`; the uploads root keeps its own
/// bookkeeping entries (such as restore staging directories) under dot names.
///
/// # Examples
///
/// ```
/// use filenest::storage::validate_username;
///
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("../etc").is_err());
/// assert!(validate_username(".restore").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), SegmentError> {
    validate_segment("username", username)?;
    if username.starts_with('.') {
        return Err(SegmentError::LeadingDot("username"));
    }
    Ok(())
}

/// Validate a file name before it is joined onto an upload directory.
///
/// Dot files are allowed.
pub fn validate_file_name(name: &str) -> Result<(), SegmentError> {
    validate_segment("file name", name)
}
