// h12-core/src/version.rs
use crate::RuntimeError;

/// Runtime version; generated code must come from a transform with the same
/// major and minor version.
pub const RUNTIME_VERSION: &str = "2.2.0";

fn major_minor(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.trim().trim_start_matches('v').split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor))
}

/// Compare the transform version stamped into generated code with
/// [`RUNTIME_VERSION`]. Patch levels may differ.
pub fn check_transform_version(found: &str) -> Result<(), RuntimeError> {
    match (major_minor(found), major_minor(RUNTIME_VERSION)) {
        (Some(a), Some(b)) if a == b => Ok(()),
        _ => Err(RuntimeError::VersionMismatch {
            found: found.to_string(),
            runtime: RUNTIME_VERSION,
        }),
    }
}
