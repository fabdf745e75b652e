use log::debug;

use crate::client::{FileInfo, WikiClient};
use crate::error::JobError;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "gif", "jpg", "jpeg", "tiff", "tif"];

/// Lower-cased text after the last dot of `title`.
pub fn file_extension(title: &str) -> Option<String> {
    let (_, extension) = title.rsplit_once('.')?;
    let extension = extension.trim();
    if extension.is_empty() {
        None
    } else {
        Some(extension.to_lowercase())
    }
}

pub fn check_format(title: &str) -> Result<String, JobError> {
    let extension = file_extension(title)
        .ok_or_else(|| JobError::Format(format!("{title} has no file extension")))?;
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(JobError::Format(format!(
            "{extension} is not one of {}",
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }
    Ok(extension)
}

/// Format check, then size check against the wiki's metadata. The fetched
/// metadata is handed back so the download can reuse its URL.
pub fn validate_request<W: WikiClient>(
    client: &mut W,
    title: &str,
    width: u32,
) -> Result<FileInfo, JobError> {
    check_format(title)?;

    let info = client
        .get_file_info(title)
        .map_err(|error| JobError::Format(format!("{error:#}")))?;
    if info.width == 0 || info.height == 0 {
        return Err(JobError::Format(format!(
            "{title} has no pixel dimensions ({}x{})",
            info.width, info.height
        )));
    }
    if width >= info.width {
        debug!(
            "{title}: requested {width}px, current {}x{}px",
            info.width, info.height
        );
        return Err(JobError::Size {
            requested: width,
            actual: info.width,
        });
    }
    Ok(info)
}
