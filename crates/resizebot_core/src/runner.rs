use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::audit::AuditStore;
use crate::client::{Credentials, MediaWikiClient, MediaWikiClientConfig, WikiClient};
use crate::config::BotConfig;
use crate::pipeline::{PageReport, Pipeline};
use crate::profile::SiteProfile;
use crate::resize::ImageResizer;
use crate::scanner::discover_pages;

/// A site profile paired with the client that talks to that site.
pub struct SiteSession<W> {
    pub profile: SiteProfile,
    pub client: W,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteSweep {
    pub site: String,
    pub discovered: usize,
    pub pages: Vec<PageReport>,
    /// Pages skipped after an unexpected error, with the error text.
    pub failed: Vec<(String, String)>,
    pub scan_error: Option<String>,
    pub requests: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub sites: Vec<SiteSweep>,
}

impl SweepReport {
    pub fn processed(&self) -> usize {
        self.sites.iter().map(|site| site.pages.len()).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.sites
            .iter()
            .flat_map(|site| &site.pages)
            .filter(|page| page.outcome.is_success())
            .count()
    }

    pub fn failures(&self) -> usize {
        self.sites
            .iter()
            .map(|site| site.failed.len() + usize::from(site.scan_error.is_some()))
            .sum()
    }
}

/// One pass over every site. Failures are contained to the page (or, for a
/// scan failure, the site) they happened on.
pub fn run_sweep<W, R, S>(
    sessions: &mut [SiteSession<W>],
    resizer: &R,
    audit: &mut S,
    work_dir: &Path,
) -> SweepReport
where
    W: WikiClient,
    R: ImageResizer,
    S: AuditStore,
{
    let mut report = SweepReport::default();
    for session in sessions.iter_mut() {
        report
            .sites
            .push(sweep_site(session, resizer, audit, work_dir));
    }
    report
}

fn sweep_site<W, R, S>(
    session: &mut SiteSession<W>,
    resizer: &R,
    audit: &mut S,
    work_dir: &Path,
) -> SiteSweep
where
    W: WikiClient,
    R: ImageResizer,
    S: AuditStore,
{
    let key = session.profile.key.clone();
    let requests_before = session.client.request_count();
    let mut sweep = SiteSweep {
        site: key.clone(),
        ..SiteSweep::default()
    };

    let titles = match discover_pages(&mut session.client, &session.profile) {
        Ok(titles) => titles,
        Err(scan_error) => {
            error!("[{key}] scan failed: {scan_error:#}");
            sweep.scan_error = Some(format!("{scan_error:#}"));
            sweep.requests = session.client.request_count() - requests_before;
            return sweep;
        }
    };
    sweep.discovered = titles.len();
    info!("[{key}] {} page(s) with resize requests", titles.len());

    let mut pipeline = Pipeline::new(
        &mut session.client,
        resizer,
        audit,
        &session.profile,
        work_dir,
    );
    for title in titles {
        match pipeline.process_page(&title) {
            Ok(page) => sweep.pages.push(page),
            Err(page_error) => {
                error!("[{key}] {title}: {page_error:#}");
                sweep.failed.push((title, format!("{page_error:#}")));
            }
        }
    }
    drop(pipeline);

    sweep.requests = session.client.request_count() - requests_before;
    info!(
        "[{key}] sweep done: {} processed, {} skipped, {} request(s)",
        sweep.pages.len(),
        sweep.failed.len(),
        sweep.requests
    );
    sweep
}

/// Delete regular files directly inside `work_dir`; returns how many were
/// removed. A missing directory counts as empty.
pub fn purge_work_dir(work_dir: &Path) -> Result<usize> {
    if !work_dir.exists() {
        return Ok(0);
    }
    let mut removed = 0usize;
    for entry in WalkDir::new(work_dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to walk {}", work_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        fs::remove_file(entry.path())
            .with_context(|| format!("failed to remove {}", entry.path().display()))?;
        removed += 1;
    }
    Ok(removed)
}

/// Build one authenticated-capable client per enabled site.
pub fn connect_sites(
    config: &BotConfig,
    profiles: Vec<SiteProfile>,
) -> Result<Vec<SiteSession<MediaWikiClient>>> {
    let credentials = Credentials::from_env();
    if credentials.is_none() {
        warn!("WIKI_BOT_USER / WIKI_BOT_PASS not set; uploads and edits will fail");
    }
    let user_agent = config.user_agent();

    profiles
        .into_iter()
        .map(|profile| {
            let client = MediaWikiClient::new(
                MediaWikiClientConfig::for_site(&profile.api_url, &user_agent),
                credentials.clone(),
            )
            .with_context(|| format!("failed to create client for {}", profile.key))?;
            Ok(SiteSession { profile, client })
        })
        .collect()
}

/// Sweep, purge, sleep. Stops after `max_sweeps` when given, otherwise runs
/// until an error escapes.
pub fn run_loop<W, R, S>(
    sessions: &mut [SiteSession<W>],
    resizer: &R,
    audit: &mut S,
    work_dir: &Path,
    interval: Duration,
    max_sweeps: Option<usize>,
) -> Result<()>
where
    W: WikiClient,
    R: ImageResizer,
    S: AuditStore,
{
    let mut completed = 0usize;
    loop {
        fs::create_dir_all(work_dir)
            .with_context(|| format!("failed to create {}", work_dir.display()))?;

        let report = run_sweep(sessions, resizer, audit, work_dir);
        let purged = purge_work_dir(work_dir)?;
        info!(
            "sweep finished: {} page(s), {} succeeded, {} failure(s), {purged} temp file(s) removed",
            report.processed(),
            report.succeeded(),
            report.failures()
        );

        completed += 1;
        if max_sweeps.is_some_and(|max| completed >= max) {
            return Ok(());
        }
        thread::sleep(interval);
    }
}

pub fn run_forever<W, R, S>(
    sessions: &mut [SiteSession<W>],
    resizer: &R,
    audit: &mut S,
    work_dir: &Path,
    interval: Duration,
) -> Result<()>
where
    W: WikiClient,
    R: ImageResizer,
    S: AuditStore,
{
    run_loop(sessions, resizer, audit, work_dir, interval, None)
}
