use crate::error::JobError;
use crate::profile::SiteProfile;
use crate::wikitext::TemplateInvocation;

pub const LOG_TOKEN: &str = "log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeRequest {
    pub width: u32,
    /// Append the file's upload history to the page after a successful resize.
    pub log: bool,
}

/// Read the request from the first invocation of this site's trigger
/// template. Every failure is a `Params` error.
pub fn parse_request(
    profile: &SiteProfile,
    templates: &[TemplateInvocation],
) -> Result<ResizeRequest, JobError> {
    let invocation = templates
        .iter()
        .find(|template| profile.is_trigger_template(&template.name))
        .ok_or_else(|| {
            JobError::Params(format!("no {} invocation on page", profile.template_name))
        })?;

    let (first, rest) = invocation
        .params
        .split_first()
        .ok_or_else(|| JobError::Params("width parameter is missing".to_string()))?;

    let width = first
        .trim()
        .parse::<u32>()
        .map_err(|error| JobError::Params(format!("width {first:?} is not a number: {error}")))?;
    if width == 0 {
        return Err(JobError::Params("width must be positive".to_string()));
    }

    Ok(ResizeRequest {
        width,
        log: rest.iter().any(|param| param.trim() == LOG_TOKEN),
    })
}
