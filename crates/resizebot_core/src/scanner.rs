use std::collections::BTreeSet;

use anyhow::{Context, Result};
use log::debug;

use crate::client::{NS_FILE, WikiClient};
use crate::profile::SiteProfile;

/// File pages currently transcluding the site's trigger template, sorted and
/// deduplicated.
pub fn discover_pages<W: WikiClient>(
    client: &mut W,
    profile: &SiteProfile,
) -> Result<BTreeSet<String>> {
    let pages = client
        .find_pages_transcluding(&profile.template_name)
        .with_context(|| {
            format!(
                "failed to list pages transcluding {} on {}",
                profile.template_name, profile.key
            )
        })?;

    let mut titles = BTreeSet::new();
    for page in pages {
        if page.namespace != NS_FILE {
            debug!("[{}] skipping non-file page {}", profile.key, page.title);
            continue;
        }
        titles.insert(page.title);
    }
    Ok(titles)
}
