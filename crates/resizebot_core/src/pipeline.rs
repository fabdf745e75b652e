use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;

use crate::attribution::attribute_request;
use crate::audit::{AuditRecord, AuditStore, STATUS_ATTEMPTED};
use crate::client::WikiClient;
use crate::error::JobError;
use crate::profile::SiteProfile;
use crate::request::parse_request;
use crate::resize::{ImageResizer, ResizeFailure};
use crate::validate::validate_request;
use crate::wikitext::{extract_templates, log_appendix};

/// Terminal state of one job; selects the edit summary written to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOutcome {
    Success,
    SuccessWithLog,
    ParamsError,
    DownloadError,
    UploadError,
    SizeError { requested: u32, actual: u32 },
    FormatError,
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::SuccessWithLog)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::SuccessWithLog => "success_log",
            Self::ParamsError => "params_error",
            Self::DownloadError => "download_error",
            Self::UploadError => "upload_error",
            Self::SizeError { .. } => "size_error",
            Self::FormatError => "format_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub title: String,
    pub outcome: PipelineOutcome,
    pub summary: String,
    pub requester: Option<String>,
}

struct Fulfilment {
    outcome: PipelineOutcome,
    appendix: Option<String>,
    requester: String,
}

/// One site's resize pipeline. Site differences live entirely in `profile`.
pub struct Pipeline<'a, W, R, S> {
    client: &'a mut W,
    resizer: &'a R,
    audit: &'a mut S,
    profile: &'a SiteProfile,
    work_dir: &'a Path,
}

impl<'a, W, R, S> Pipeline<'a, W, R, S>
where
    W: WikiClient,
    R: ImageResizer,
    S: AuditStore,
{
    pub fn new(
        client: &'a mut W,
        resizer: &'a R,
        audit: &'a mut S,
        profile: &'a SiteProfile,
        work_dir: &'a Path,
    ) -> Self {
        Self {
            client,
            resizer,
            audit,
            profile,
            work_dir,
        }
    }

    /// Run one page through the pipeline and write the outcome back to it.
    ///
    /// Typed job failures still end in a saved page with the trigger template
    /// removed. Anything else is returned as `Err` and the page is left as it
    /// was, so the next sweep finds it again.
    pub fn process_page(&mut self, title: &str) -> Result<PageReport> {
        let text = self
            .client
            .get_page_text(title)
            .with_context(|| format!("failed to load {title}"))?;

        let fulfilment = match self.fulfil(title, &text) {
            Ok(fulfilment) => fulfilment,
            Err(JobError::Unexpected(error)) => {
                return Err(error.context(format!("{title}: job aborted")));
            }
            Err(error) => {
                let Some(outcome) = error.outcome() else {
                    return Err(error.into());
                };
                warn!("[{}] {title}: {error}", self.profile.key);
                Fulfilment {
                    outcome,
                    appendix: None,
                    requester: String::new(),
                }
            }
        };

        let summary = self.finalize(title, &fulfilment)?;
        info!(
            "[{}] {title}: {} ({summary})",
            self.profile.key,
            fulfilment.outcome.as_str()
        );
        Ok(PageReport {
            title: title.to_string(),
            requester: (!fulfilment.requester.is_empty()).then_some(fulfilment.requester),
            outcome: fulfilment.outcome,
            summary,
        })
    }

    fn fulfil(&mut self, title: &str, text: &str) -> Result<Fulfilment, JobError> {
        let request = parse_request(self.profile, &extract_templates(text))?;
        let info = validate_request(self.client, title, request.width)?;
        let attribution = attribute_request(self.client, self.profile, title)?;

        let record = AuditRecord {
            datetime: Utc::now(),
            username: attribution.requester.clone(),
            width: request.width,
            filename: title.to_string(),
            status: STATUS_ATTEMPTED,
            log: request.log,
            site: self.profile.key.clone(),
        };
        self.audit.insert(&record)?;
        info!("[{}] recorded {record}", self.profile.key);

        let source = self.work_dir.join(local_file_name(title));
        self.client
            .download_file(&info.url, &source)
            .map_err(|error| JobError::Download(format!("{error:#}")))?;
        let thumb = self.resize(&source, request.width)?;

        self.client.authenticate()?;
        if let Some(revision) = &attribution.revision
            && let Err(error) = self.client.thank(revision.id)
        {
            debug!("[{}] thanking revision {} failed: {error:#}", self.profile.key, revision.id);
        }

        let uploaded = self
            .client
            .upload_file(
                &upload_target_name(title),
                &thumb,
                &self.profile.upload_description_for(&attribution.requester),
                true,
            )
            .map_err(|error| JobError::Upload(format!("{error:#}")))?;
        if !uploaded {
            return Err(JobError::Upload(format!("{title}: wiki did not accept the upload")));
        }

        let appendix = if request.log {
            match self.client.get_file_history(title) {
                Ok(versions) => Some(log_appendix(&self.profile.log_section, &versions)),
                Err(error) => {
                    warn!("[{}] {title}: file history unavailable: {error:#}", self.profile.key);
                    None
                }
            }
        } else {
            None
        };

        Ok(Fulfilment {
            outcome: if appendix.is_some() {
                PipelineOutcome::SuccessWithLog
            } else {
                PipelineOutcome::Success
            },
            appendix,
            requester: attribution.requester,
        })
    }

    fn resize(&self, source: &Path, width: u32) -> Result<PathBuf, JobError> {
        let bytes = fs::read(source).map_err(|error| {
            JobError::Download(format!("failed to read {}: {error}", source.display()))
        })?;
        let resized = self
            .resizer
            .resize_to_width(&bytes, width)
            .map_err(|failure| match failure {
                ResizeFailure::TooSmall { requested, actual } => {
                    JobError::Size { requested, actual }
                }
                ResizeFailure::Image(error) => JobError::Download(error.to_string()),
            })?;

        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let thumb = source.with_file_name(thumb_file_name(&file_name));
        fs::write(&thumb, resized).map_err(|error| {
            JobError::Download(format!("failed to write {}: {error}", thumb.display()))
        })?;
        Ok(thumb)
    }

    fn finalize(&mut self, title: &str, fulfilment: &Fulfilment) -> Result<String> {
        let current = self
            .client
            .get_page_text(title)
            .with_context(|| format!("failed to reload {title}"))?;
        let mut text = self.profile.strip_triggers(&current);
        if let Some(appendix) = &fulfilment.appendix {
            text.push_str(appendix);
        }

        let summary = self.profile.summary_for(&fulfilment.outcome);
        self.client
            .save_page(title, &text, &summary, true)
            .with_context(|| format!("failed to save {title}"))?;
        Ok(summary)
    }
}

fn strip_namespace(title: &str) -> &str {
    match title.split_once(':') {
        Some((_, rest)) => rest.trim(),
        None => title.trim(),
    }
}

/// Work-directory name for a downloaded file.
pub fn local_file_name(title: &str) -> String {
    strip_namespace(title)
        .chars()
        .map(|ch| match ch {
            ':' | '*' | '?' | '/' | '\\' | ' ' => '_',
            other => other,
        })
        .collect()
}

pub fn thumb_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) => format!("{stem}_thumb.{extension}"),
        None => format!("{file_name}_thumb"),
    }
}

pub fn upload_target_name(title: &str) -> String {
    strip_namespace(title).to_string()
}
