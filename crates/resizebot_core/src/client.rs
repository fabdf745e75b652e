use std::env;
use std::fs::{self, File};
use std::path::Path;
use std::thread::sleep;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use reqwest::blocking::{Client, Response, multipart};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NS_FILE: i32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PageRef {
    pub title: String,
    pub namespace: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub id: i64,
    /// `None` when the author has been suppressed.
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVersion {
    pub timestamp: String,
    pub user: String,
    pub width: u32,
    pub height: u32,
    pub size: u64,
    pub comment: String,
}

/// Operations the resize pipeline needs from a wiki.
pub trait WikiClient {
    fn find_pages_transcluding(&mut self, template: &str) -> Result<Vec<PageRef>>;
    fn get_page_text(&mut self, title: &str) -> Result<String>;
    fn save_page(&mut self, title: &str, text: &str, summary: &str, minor: bool) -> Result<()>;
    /// Revisions of `title`, newest first.
    fn get_revisions(&mut self, title: &str) -> Result<Vec<Revision>>;
    fn get_revision_text(&mut self, revision_id: i64) -> Result<String>;
    fn get_file_info(&mut self, title: &str) -> Result<FileInfo>;
    /// Upload history of a file, newest first.
    fn get_file_history(&mut self, title: &str) -> Result<Vec<FileVersion>>;
    fn download_file(&mut self, url: &str, destination: &Path) -> Result<()>;
    /// Returns `false` when the wiki did not report a successful upload.
    fn upload_file(
        &mut self,
        filename: &str,
        source: &Path,
        comment: &str,
        ignore_warnings: bool,
    ) -> Result<bool>;
    fn thank(&mut self, revision_id: i64) -> Result<()>;
    fn authenticate(&mut self) -> Result<()>;
    fn request_count(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Bot credentials from WIKI_BOT_USER / WIKI_BOT_PASS; `None` if either is blank.
    pub fn from_env() -> Option<Self> {
        let username = env::var("WIKI_BOT_USER").ok()?;
        let password = env::var("WIKI_BOT_PASS").ok()?;
        if username.trim().is_empty() || password.trim().is_empty() {
            return None;
        }
        Some(Self {
            username: username.trim().to_string(),
            password: password.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MediaWikiClientConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub rate_limit_read_ms: u64,
    pub rate_limit_write_ms: u64,
    pub max_retries: usize,
    pub max_write_retries: usize,
    pub retry_delay_ms: u64,
}

impl MediaWikiClientConfig {
    pub fn for_site(api_url: &str, user_agent: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            user_agent: user_agent.to_string(),
            timeout_ms: env_value_u64("WIKI_HTTP_TIMEOUT_MS", 60_000),
            rate_limit_read_ms: env_value_u64("WIKI_RATE_LIMIT_READ", 300),
            rate_limit_write_ms: env_value_u64("WIKI_RATE_LIMIT_WRITE", 1_000),
            max_retries: env_value_usize("WIKI_HTTP_RETRIES", 2),
            max_write_retries: env_value_usize("WIKI_HTTP_WRITE_RETRIES", 1),
            retry_delay_ms: env_value_u64("WIKI_HTTP_RETRY_DELAY_MS", 500),
        }
    }
}

pub struct MediaWikiClient {
    client: Client,
    config: MediaWikiClientConfig,
    credentials: Option<Credentials>,
    logged_in: bool,
    last_request_at: Option<Instant>,
    request_count: usize,
    csrf_token: Option<String>,
}

impl MediaWikiClient {
    pub fn new(config: MediaWikiClientConfig, credentials: Option<Credentials>) -> Result<Self> {
        Url::parse(&config.api_url)
            .with_context(|| format!("invalid api_url: {}", config.api_url))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .cookie_store(true)
            .build()
            .context("failed to build MediaWiki HTTP client")?;

        Ok(Self {
            client,
            config,
            credentials,
            logged_in: false,
            last_request_at: None,
            request_count: 0,
            csrf_token: None,
        })
    }

    fn request_json_get(&mut self, params: &[(&str, String)]) -> Result<Value> {
        let base_url = Url::parse(&self.config.api_url)
            .with_context(|| format!("invalid api_url: {}", self.config.api_url))?;
        let pairs = api_pairs(params);

        for attempt in 0..=self.config.max_retries {
            self.apply_rate_limit(false);
            let response = self
                .client
                .get(base_url.clone())
                .header("User-Agent", self.config.user_agent.clone())
                .query(&pairs)
                .send();

            match response {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        if attempt < self.config.max_retries && is_retryable_status(status) {
                            self.wait_before_retry(attempt, false);
                            continue;
                        }
                        bail!("MediaWiki API request failed with HTTP {status}");
                    }
                    return decode_api_payload(response);
                }
                Err(error) => {
                    if attempt < self.config.max_retries && is_retryable_error(&error) {
                        self.wait_before_retry(attempt, false);
                        continue;
                    }
                    return Err(error).context("failed to call MediaWiki API");
                }
            }
        }

        bail!("MediaWiki API request exhausted retry budget")
    }

    fn request_json_post(&mut self, params: &[(&str, String)], is_write: bool) -> Result<Value> {
        self.request_form_post(&api_pairs(params), is_write)
    }

    fn request_form_post(&mut self, pairs: &[(String, String)], is_write: bool) -> Result<Value> {
        let max_retries = if is_write {
            self.config.max_write_retries
        } else {
            self.config.max_retries
        };

        for attempt in 0..=max_retries {
            self.apply_rate_limit(is_write);
            let response = self
                .client
                .post(&self.config.api_url)
                .header("User-Agent", self.config.user_agent.clone())
                .form(pairs)
                .send();

            match response {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        if attempt < max_retries && is_retryable_status(status) {
                            self.wait_before_retry(attempt, is_write);
                            continue;
                        }
                        bail!("MediaWiki API request failed with HTTP {status}");
                    }
                    return decode_api_payload(response);
                }
                Err(error) => {
                    if attempt < max_retries && is_retryable_error(&error) {
                        self.wait_before_retry(attempt, is_write);
                        continue;
                    }
                    return Err(error).context("failed to call MediaWiki API");
                }
            }
        }

        bail!("MediaWiki API request exhausted retry budget")
    }

    fn apply_rate_limit(&mut self, is_write: bool) {
        let delay = if is_write {
            Duration::from_millis(self.config.rate_limit_write_ms)
        } else {
            Duration::from_millis(self.config.rate_limit_read_ms)
        };
        if let Some(last) = self.last_request_at {
            let elapsed = last.elapsed();
            if elapsed < delay {
                sleep(delay - elapsed);
            }
        }
        self.last_request_at = Some(Instant::now());
        self.request_count += 1;
    }

    fn wait_before_retry(&self, attempt: usize, is_write: bool) {
        let exponent = u32::try_from(attempt).unwrap_or(16);
        let base = self
            .config
            .retry_delay_ms
            .saturating_mul(2u64.saturating_pow(exponent));
        let jitter = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| u64::from(duration.subsec_millis() % 100))
            .unwrap_or(0);
        let multiplier = if is_write { 2u64 } else { 1u64 };
        sleep(Duration::from_millis(
            base.saturating_mul(multiplier).saturating_add(jitter),
        ));
    }

    fn ensure_csrf_token(&mut self) -> Result<String> {
        if let Some(token) = &self.csrf_token {
            return Ok(token.clone());
        }
        let response = self.request_json_get(&[
            ("action", "query".to_string()),
            ("meta", "tokens".to_string()),
        ])?;
        let parsed: TokenQueryResponse =
            serde_json::from_value(response).context("failed to decode csrf token response")?;
        let token = parsed
            .query
            .tokens
            .and_then(|tokens| tokens.csrftoken)
            .ok_or_else(|| anyhow::anyhow!("failed to get MediaWiki csrf token"))?;
        self.csrf_token = Some(token.clone());
        Ok(token)
    }

    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let token_response = self.request_json_get(&[
            ("action", "query".to_string()),
            ("meta", "tokens".to_string()),
            ("type", "login".to_string()),
        ])?;
        let token_payload: TokenQueryResponse = serde_json::from_value(token_response)
            .context("failed to decode login token response")?;
        let login_token = token_payload
            .query
            .tokens
            .and_then(|tokens| tokens.logintoken)
            .ok_or_else(|| anyhow::anyhow!("failed to get MediaWiki login token"))?;

        let login_response = self.request_json_post(
            &[
                ("action", "login".to_string()),
                ("lgname", username.to_string()),
                ("lgpassword", password.to_string()),
                ("lgtoken", login_token),
            ],
            true,
        )?;
        let login_payload: LoginResponse =
            serde_json::from_value(login_response).context("failed to decode login response")?;
        match login_payload.login.result.as_deref() {
            Some("Success") => {
                self.csrf_token = None;
                Ok(())
            }
            other => bail!(
                "MediaWiki login failed: {}",
                login_payload
                    .login
                    .reason
                    .or_else(|| other.map(ToString::to_string))
                    .unwrap_or_else(|| "unknown error".to_string())
            ),
        }
    }

    fn query_single_page(&mut self, params: Vec<(&str, String)>, what: &str) -> Result<PageQueryItem> {
        let response = self.request_json_get(&params)?;
        let parsed: QueryResponse = serde_json::from_value(response)
            .with_context(|| format!("failed to decode {what} response"))?;
        single_page(parsed)
    }
}

impl WikiClient for MediaWikiClient {
    fn find_pages_transcluding(&mut self, template: &str) -> Result<Vec<PageRef>> {
        let mut pages = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("action", "query".to_string()),
                ("list", "embeddedin".to_string()),
                ("eititle", template.to_string()),
                ("einamespace", NS_FILE.to_string()),
                ("eilimit", "500".to_string()),
            ];
            if let Some(token) = &continue_token {
                params.push(("eicontinue", token.clone()));
            }

            let response = self.request_json_get(&params)?;
            let parsed: QueryResponse = serde_json::from_value(response)
                .context("failed to decode embeddedin API response")?;
            for item in parsed.query.embeddedin {
                pages.push(PageRef {
                    title: item.title,
                    namespace: item.ns,
                });
            }

            continue_token = parsed.continuation.and_then(|cont| cont.eicontinue);
            if continue_token.is_none() {
                break;
            }
        }

        Ok(pages)
    }

    fn get_page_text(&mut self, title: &str) -> Result<String> {
        let page = self.query_single_page(
            vec![
                ("action", "query".to_string()),
                ("titles", title.to_string()),
                ("prop", "revisions".to_string()),
                ("rvprop", "content|ids".to_string()),
                ("rvslots", "main".to_string()),
            ],
            "page content",
        )?;
        if page.missing.unwrap_or(false) {
            bail!("page does not exist: {title}");
        }
        revision_content(&page)
            .ok_or_else(|| anyhow::anyhow!("no content returned for {title}"))
    }

    fn save_page(&mut self, title: &str, text: &str, summary: &str, minor: bool) -> Result<()> {
        self.authenticate()?;
        let token = self.ensure_csrf_token()?;
        let form = edit_form(title, text, summary, minor, token);
        let response = self.request_form_post(&form, true)?;
        let edit_payload: EditResponse =
            serde_json::from_value(response).context("failed to decode edit response")?;
        let edit = edit_payload
            .edit
            .ok_or_else(|| anyhow::anyhow!("missing edit payload in API response"))?;
        if edit.result.as_deref() != Some("Success") {
            bail!(
                "MediaWiki edit failed for {}: {}",
                title,
                edit.result.unwrap_or_else(|| "unknown".to_string())
            );
        }
        Ok(())
    }

    fn get_revisions(&mut self, title: &str) -> Result<Vec<Revision>> {
        let mut revisions = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("action", "query".to_string()),
                ("titles", title.to_string()),
                ("prop", "revisions".to_string()),
                ("rvprop", "ids|user".to_string()),
                ("rvdir", "older".to_string()),
                ("rvlimit", "max".to_string()),
            ];
            if let Some(token) = &continue_token {
                params.push(("rvcontinue", token.clone()));
            }

            let response = self.request_json_get(&params)?;
            let parsed: QueryResponse = serde_json::from_value(response)
                .context("failed to decode revision history response")?;
            continue_token = parsed
                .continuation
                .as_ref()
                .and_then(|cont| cont.rvcontinue.clone());
            let page = single_page(parsed)?;
            if page.missing.unwrap_or(false) {
                bail!("page does not exist: {title}");
            }
            revisions.extend(page.revisions.into_iter().map(|item| Revision {
                id: item.revid,
                user: item.user,
            }));

            if continue_token.is_none() {
                break;
            }
        }

        Ok(revisions)
    }

    fn get_revision_text(&mut self, revision_id: i64) -> Result<String> {
        let page = self.query_single_page(
            vec![
                ("action", "query".to_string()),
                ("revids", revision_id.to_string()),
                ("prop", "revisions".to_string()),
                ("rvprop", "content|ids".to_string()),
                ("rvslots", "main".to_string()),
            ],
            "revision content",
        )?;
        revision_content(&page)
            .ok_or_else(|| anyhow::anyhow!("no content returned for revision {revision_id}"))
    }

    fn get_file_info(&mut self, title: &str) -> Result<FileInfo> {
        let page = self.query_single_page(
            vec![
                ("action", "query".to_string()),
                ("titles", title.to_string()),
                ("prop", "imageinfo".to_string()),
                ("iiprop", "url|size".to_string()),
            ],
            "imageinfo",
        )?;
        file_info_from_page(page)
            .with_context(|| format!("no file metadata available for {title}"))
    }

    fn get_file_history(&mut self, title: &str) -> Result<Vec<FileVersion>> {
        let page = self.query_single_page(
            vec![
                ("action", "query".to_string()),
                ("titles", title.to_string()),
                ("prop", "imageinfo".to_string()),
                ("iiprop", "timestamp|user|size|comment".to_string()),
                ("iilimit", "max".to_string()),
            ],
            "file history",
        )?;
        Ok(page
            .imageinfo
            .into_iter()
            .map(|item| FileVersion {
                timestamp: item.timestamp.unwrap_or_default(),
                user: item.user.unwrap_or_default(),
                width: item.width.unwrap_or(0),
                height: item.height.unwrap_or(0),
                size: item.size.unwrap_or(0),
                comment: item.comment.unwrap_or_default(),
            })
            .collect())
    }

    fn download_file(&mut self, url: &str, destination: &Path) -> Result<()> {
        self.apply_rate_limit(false);
        let mut response = self
            .client
            .get(url)
            .header("User-Agent", self.config.user_agent.clone())
            .send()
            .with_context(|| format!("failed to request {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("download of {url} failed with HTTP {status}");
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut file = File::create(destination)
            .with_context(|| format!("failed to create {}", destination.display()))?;
        response
            .copy_to(&mut file)
            .with_context(|| format!("failed to write {}", destination.display()))?;
        Ok(())
    }

    fn upload_file(
        &mut self,
        filename: &str,
        source: &Path,
        comment: &str,
        ignore_warnings: bool,
    ) -> Result<bool> {
        self.authenticate()?;
        let token = self.ensure_csrf_token()?;

        let mut form = multipart::Form::new()
            .text("action", "upload")
            .text("format", "json")
            .text("formatversion", "2")
            .text("filename", filename.to_string())
            .text("comment", comment.to_string())
            .text("token", token);
        if ignore_warnings {
            form = form.text("ignorewarnings", "1");
        }
        let form = form
            .file("file", source)
            .with_context(|| format!("failed to read {}", source.display()))?;

        // Multipart bodies are consumed on send, so uploads get a single attempt.
        self.apply_rate_limit(true);
        let response = self
            .client
            .post(&self.config.api_url)
            .header("User-Agent", self.config.user_agent.clone())
            .multipart(form)
            .send()
            .context("failed to send upload request")?;
        let status = response.status();
        if !status.is_success() {
            bail!("MediaWiki upload failed with HTTP {status}");
        }
        let payload = decode_api_payload(response)?;
        let parsed: UploadResponse =
            serde_json::from_value(payload).context("failed to decode upload response")?;
        Ok(parsed
            .upload
            .and_then(|upload| upload.result)
            .as_deref()
            == Some("Success"))
    }

    fn thank(&mut self, revision_id: i64) -> Result<()> {
        let token = self.ensure_csrf_token()?;
        let response = self.request_json_post(
            &[
                ("action", "thank".to_string()),
                ("rev", revision_id.to_string()),
                ("source", "resizebot".to_string()),
                ("token", token),
            ],
            true,
        )?;
        let success = response
            .get("result")
            .and_then(|result| result.get("success"))
            .map(|value| value.as_i64() == Some(1) || value.as_bool() == Some(true))
            .unwrap_or(false);
        if !success {
            bail!("thank for revision {revision_id} was not acknowledged");
        }
        Ok(())
    }

    fn authenticate(&mut self) -> Result<()> {
        if self.logged_in {
            return Ok(());
        }
        let credentials = self.credentials.clone().ok_or_else(|| {
            anyhow::anyhow!("WIKI_BOT_USER and WIKI_BOT_PASS are required to edit")
        })?;
        self.login(&credentials.username, &credentials.password)
            .with_context(|| format!("login to {} failed", self.config.api_url))?;
        self.logged_in = true;
        Ok(())
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

fn api_pairs(params: &[(&str, String)]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len() + 2);
    pairs.push(("format".to_string(), "json".to_string()));
    pairs.push(("formatversion".to_string(), "2".to_string()));
    for (key, value) in params {
        if !value.is_empty() {
            pairs.push(((*key).to_string(), value.clone()));
        }
    }
    pairs
}

/// Form for `action=edit`. `text` is sent even when empty, since blanking a
/// page is a legitimate result of removing the only template on it.
fn edit_form(
    title: &str,
    text: &str,
    summary: &str,
    minor: bool,
    token: String,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("action", "edit".to_string()),
        ("title", title.to_string()),
        ("summary", summary.to_string()),
        ("bot", "1".to_string()),
        ("nocreate", "1".to_string()),
        ("token", token),
    ];
    if minor {
        params.push(("minor", "1".to_string()));
    }
    let mut pairs = api_pairs(&params);
    pairs.push(("text".to_string(), text.to_string()));
    pairs
}

fn decode_api_payload(response: Response) -> Result<Value> {
    let payload: Value = response
        .json()
        .context("failed to decode MediaWiki API JSON response")?;
    check_api_error(&payload)?;
    Ok(payload)
}

fn check_api_error(payload: &Value) -> Result<()> {
    if let Some(error) = payload.get("error") {
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        let info = error
            .get("info")
            .and_then(Value::as_str)
            .unwrap_or("unknown info");
        bail!("MediaWiki API error [{code}]: {info}");
    }
    Ok(())
}

fn single_page(parsed: QueryResponse) -> Result<PageQueryItem> {
    parsed
        .query
        .pages
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("MediaWiki API returned no pages"))
}

fn revision_content(page: &PageQueryItem) -> Option<String> {
    page.revisions
        .first()
        .and_then(|revision| revision.slots.as_ref())
        .and_then(|slots| slots.main.as_ref())
        .map(|slot| slot.content.clone())
}

fn file_info_from_page(page: PageQueryItem) -> Result<FileInfo> {
    if page.missing.unwrap_or(false) && page.imageinfo.is_empty() {
        bail!("file page is missing");
    }
    let info = page
        .imageinfo
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("imageinfo is empty"))?;
    match (info.width, info.url) {
        (Some(width), Some(url)) if width > 0 => Ok(FileInfo {
            width,
            height: info.height.unwrap_or(0),
            url,
        }),
        _ => bail!("imageinfo has no width or url"),
    }
}

fn env_value_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_value_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

#[derive(Debug, Deserialize, Default)]
struct QueryResponse {
    #[serde(default)]
    query: QueryPayload,
    #[serde(default, rename = "continue")]
    continuation: Option<ContinuationPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct QueryPayload {
    #[serde(default)]
    embeddedin: Vec<EmbeddedInItem>,
    #[serde(default)]
    pages: Vec<PageQueryItem>,
}

#[derive(Debug, Deserialize, Default)]
struct ContinuationPayload {
    eicontinue: Option<String>,
    rvcontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedInItem {
    ns: i32,
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageQueryItem {
    missing: Option<bool>,
    #[serde(default)]
    revisions: Vec<RevisionQueryItem>,
    #[serde(default)]
    imageinfo: Vec<ImageInfoItem>,
}

#[derive(Debug, Deserialize)]
struct RevisionQueryItem {
    revid: i64,
    user: Option<String>,
    slots: Option<RevisionSlotContainer>,
}

#[derive(Debug, Deserialize)]
struct RevisionSlotContainer {
    main: Option<RevisionMainSlot>,
}

#[derive(Debug, Deserialize)]
struct RevisionMainSlot {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ImageInfoItem {
    width: Option<u32>,
    height: Option<u32>,
    size: Option<u64>,
    url: Option<String>,
    timestamp: Option<String>,
    user: Option<String>,
    comment: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TokenQueryResponse {
    #[serde(default)]
    query: TokenQueryPayload,
}

#[derive(Debug, Deserialize, Default)]
struct TokenQueryPayload {
    tokens: Option<TokenPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct TokenPayload {
    logintoken: Option<String>,
    csrftoken: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LoginResponse {
    #[serde(default)]
    login: LoginPayload,
}

#[derive(Debug, Deserialize, Default)]
struct LoginPayload {
    result: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct EditResponse {
    edit: Option<EditPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct EditPayload {
    result: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct UploadResponse {
    upload: Option<UploadPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct UploadPayload {
    result: Option<String>,
}
