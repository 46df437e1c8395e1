//! Validation functions for configuration values.

use validator::ValidationError;

use std::path::Path;

pub fn validate_not_blank_path<P: AsRef<Path>>(path: P) -> Result<(), ValidationError> {
    if path.as_ref().as_os_str().is_empty() {
        return Err(ValidationError::new("EmptyPath").with_message("path must not be empty".into()));
    }

    Ok(())
}

pub fn validate_http_url<S: AsRef<str>>(url: S) -> Result<(), ValidationError> {
    let url = url.as_ref();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or_default();
    if rest.is_empty() {
        return Err(ValidationError::new("InvalidUrl")
            .with_message(format!("expected an http(s) URL, got {:?}", url).into()));
    }

    Ok(())
}

pub fn validate_dir_exist_or_created<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ValidationError::new("InvalidDirectory")
                .with_message(format!("{:?} is not a directory", dir).into()));
        }
    } else {
        return std::fs::create_dir_all(dir).map_err(|e| {
            ValidationError::new("InvalidDirectory").with_message(
                format!("cannot create or access tmp_dir path {:?}: {}", dir, e).into(),
            )
        });
    }

    Ok(())
}

pub fn validate_writable_dir<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    validate_dir_exist_or_created(dir)?;
    let md = std::fs::metadata(dir).map_err(|e| {
        ValidationError::new("InvalidDirectory")
            .with_message(format!("cannot access metadata for {:?}: {}", dir, e).into())
    })?;
    if md.permissions().readonly() {
        Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("cannot write to dir {:?}", dir).into()))
    } else {
        Ok(())
    }
}
