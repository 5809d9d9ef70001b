//! Key path helpers.
//!
//! Keys are `/`-delimited absolute paths such as `/parameters/default_speed`. Segments must be
//! non-empty and must not contain `.`, which is reserved for attribute paths on read.

use crate::RegistrationError;

pub const SEPARATOR: char = '/';
pub const ROOT: &str = "/";

/// Normalise a namespace: leading separator, no trailing separator. `""` and `"/"` are the root.
pub fn namespace(raw: &str) -> Result<String, RegistrationError> {
    let trimmed = raw.trim_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Ok(ROOT.to_string());
    }
    let path = format!("{SEPARATOR}{trimmed}");
    validate(&path).map(|_| path)
}

/// Resolve `name` against `namespace`.
///
/// Absolute names are returned as-is, wherever they point. Relative names are joined onto the
/// namespace and may not climb out of it with `..`.
pub fn resolve(namespace: &str, name: &str) -> Result<String, RegistrationError> {
    if name.starts_with(SEPARATOR) {
        let path = name.trim_end_matches(SEPARATOR).to_string();
        return validate(&path).map(|_| path);
    }
    if name.split(SEPARATOR).any(|segment| segment == "..") {
        return Err(RegistrationError::NotInNamespace {
            key: name.to_string(),
            namespace: namespace.to_string(),
        });
    }
    let path = if namespace == ROOT {
        format!("{SEPARATOR}{name}")
    } else {
        format!("{namespace}{SEPARATOR}{name}")
    };
    validate(&path).map(|_| path)
}

/// Normalise a remap target. Targets are always treated as absolute.
pub fn absolute(raw: &str) -> Result<String, RegistrationError> {
    let path = format!("{SEPARATOR}{}", raw.trim_matches(SEPARATOR));
    validate(&path).map(|_| path)
}

pub fn is_in_namespace(key: &str, namespace: &str) -> bool {
    if namespace == ROOT {
        return true;
    }
    key == namespace
        || key
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

fn validate(path: &str) -> Result<(), RegistrationError> {
    let malformed = path.len() <= 1
        || path
            .split(SEPARATOR)
            .skip(1)
            .any(|segment| segment.is_empty() || segment.contains('.') || segment.trim() != segment);
    if malformed {
        Err(RegistrationError::MalformedKey(path.to_string()))
    } else {
        Ok(())
    }
}
