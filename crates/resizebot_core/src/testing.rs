use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Result, bail};

use crate::audit::{AuditRecord, AuditStore};
use crate::client::{FileInfo, FileVersion, NS_FILE, PageRef, Revision, WikiClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEdit {
    pub title: String,
    pub text: String,
    pub summary: String,
    pub minor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCall {
    pub filename: String,
    pub comment: String,
    pub bytes: Vec<u8>,
    pub ignore_warnings: bool,
}

#[derive(Default)]
pub struct MockWiki {
    pub transclusions: Vec<PageRef>,
    pub pages: BTreeMap<String, String>,
    pub revisions: BTreeMap<String, Vec<Revision>>,
    pub revision_texts: BTreeMap<i64, String>,
    pub file_info: BTreeMap<String, FileInfo>,
    pub file_history: BTreeMap<String, Vec<FileVersion>>,
    pub file_bytes: BTreeMap<String, Vec<u8>>,
    pub fail_scan: bool,
    pub fail_upload: bool,
    pub reject_upload: bool,
    pub fail_thank: bool,
    pub fail_authenticate: bool,
    pub saves: Vec<SavedEdit>,
    pub uploads: Vec<UploadCall>,
    pub thanked: Vec<i64>,
    pub authenticated: bool,
    pub request_count: usize,
}

impl MockWiki {
    pub fn add_page(&mut self, title: &str, text: &str) {
        self.pages.insert(title.to_string(), text.to_string());
        self.transclusions.push(PageRef {
            title: title.to_string(),
            namespace: NS_FILE,
        });
    }

    pub fn add_file(&mut self, title: &str, width: u32, height: u32, bytes: Vec<u8>) {
        let url = format!("https://upload.test/{}", title.replace(' ', "_"));
        self.file_info.insert(
            title.to_string(),
            FileInfo {
                width,
                height,
                url: url.clone(),
            },
        );
        self.file_bytes.insert(url, bytes);
    }

    /// History entries are `(revision id, author, text)`, newest first.
    pub fn add_history(&mut self, title: &str, entries: &[(i64, &str, &str)]) {
        let mut revisions = Vec::new();
        for (id, user, text) in entries {
            revisions.push(Revision {
                id: *id,
                user: Some((*user).to_string()),
            });
            self.revision_texts.insert(*id, (*text).to_string());
        }
        self.revisions.insert(title.to_string(), revisions);
    }
}

impl WikiClient for MockWiki {
    fn find_pages_transcluding(&mut self, _template: &str) -> Result<Vec<PageRef>> {
        self.request_count += 1;
        if self.fail_scan {
            bail!("embeddedin query failed");
        }
        Ok(self.transclusions.clone())
    }

    fn get_page_text(&mut self, title: &str) -> Result<String> {
        self.request_count += 1;
        self.pages
            .get(title)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("page does not exist: {title}"))
    }

    fn save_page(&mut self, title: &str, text: &str, summary: &str, minor: bool) -> Result<()> {
        self.request_count += 1;
        self.pages.insert(title.to_string(), text.to_string());
        self.saves.push(SavedEdit {
            title: title.to_string(),
            text: text.to_string(),
            summary: summary.to_string(),
            minor,
        });
        Ok(())
    }

    fn get_revisions(&mut self, title: &str) -> Result<Vec<Revision>> {
        self.request_count += 1;
        Ok(self.revisions.get(title).cloned().unwrap_or_default())
    }

    fn get_revision_text(&mut self, revision_id: i64) -> Result<String> {
        self.request_count += 1;
        self.revision_texts
            .get(&revision_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown revision {revision_id}"))
    }

    fn get_file_info(&mut self, title: &str) -> Result<FileInfo> {
        self.request_count += 1;
        self.file_info
            .get(title)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no imageinfo for {title}"))
    }

    fn get_file_history(&mut self, title: &str) -> Result<Vec<FileVersion>> {
        self.request_count += 1;
        Ok(self.file_history.get(title).cloned().unwrap_or_default())
    }

    fn download_file(&mut self, url: &str, destination: &Path) -> Result<()> {
        self.request_count += 1;
        let bytes = self
            .file_bytes
            .get(url)
            .ok_or_else(|| anyhow::anyhow!("download of {url} failed with HTTP 404 Not Found"))?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(destination, bytes)?;
        Ok(())
    }

    fn upload_file(
        &mut self,
        filename: &str,
        source: &Path,
        comment: &str,
        ignore_warnings: bool,
    ) -> Result<bool> {
        self.request_count += 1;
        if self.fail_upload {
            bail!("MediaWiki API error [fileexists-no-change]: duplicate");
        }
        if self.reject_upload {
            return Ok(false);
        }
        self.uploads.push(UploadCall {
            filename: filename.to_string(),
            comment: comment.to_string(),
            bytes: fs::read(source)?,
            ignore_warnings,
        });
        Ok(true)
    }

    fn thank(&mut self, revision_id: i64) -> Result<()> {
        self.request_count += 1;
        if self.fail_thank {
            bail!("MediaWiki API error [invalidrecipient]: bots cannot be thanked");
        }
        self.thanked.push(revision_id);
        Ok(())
    }

    fn authenticate(&mut self) -> Result<()> {
        self.request_count += 1;
        if self.fail_authenticate {
            bail!("MediaWiki login failed: wrong password");
        }
        self.authenticated = true;
        Ok(())
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

#[derive(Default)]
pub struct MemoryAuditStore {
    pub records: Vec<AuditRecord>,
}

impl AuditStore for MemoryAuditStore {
    fn insert(&mut self, record: &AuditRecord) -> Result<i64> {
        self.records.push(record.clone());
        Ok(i64::try_from(self.records.len())?)
    }
}

/// Encoded PNG of the given size with a simple gradient.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut cursor = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .expect("encode png fixture");
    cursor.into_inner()
}
