use anyhow::{Context, Result};
use log::warn;

use crate::client::{Revision, WikiClient};
use crate::profile::SiteProfile;

pub const UNKNOWN_REQUESTER: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub requester: String,
    /// Revision that introduced the trigger template; target of the thank.
    pub revision: Option<Revision>,
}

impl Attribution {
    pub fn unknown() -> Self {
        Self {
            requester: UNKNOWN_REQUESTER.to_string(),
            revision: None,
        }
    }
}

/// Walk history newest to oldest until a revision without the trigger
/// template shows up; the revision just after it added the template.
///
/// Each revision's text is fetched separately, so this costs one request per
/// revision examined.
pub fn attribute_request<W: WikiClient>(
    client: &mut W,
    profile: &SiteProfile,
    title: &str,
) -> Result<Attribution> {
    let revisions = client
        .get_revisions(title)
        .with_context(|| format!("failed to load revision history of {title}"))?;

    let mut last_matching: Option<Revision> = None;
    for (position, revision) in revisions.into_iter().enumerate() {
        let text = client
            .get_revision_text(revision.id)
            .with_context(|| format!("failed to load revision {} of {title}", revision.id))?;

        if !profile.contains_trigger(&text) {
            if position == 0 {
                warn!("{title}: latest revision has no trigger template; requester unknown");
            }
            return Ok(match last_matching {
                Some(revision) => Attribution {
                    requester: revision
                        .user
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_REQUESTER.to_string()),
                    revision: Some(revision),
                },
                None => Attribution::unknown(),
            });
        }
        last_matching = Some(revision);
    }

    Ok(Attribution::unknown())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::builtin_sections;
    use crate::testing::MockWiki;

    fn uk() -> SiteProfile {
        SiteProfile::from_section(&builtin_sections()[0]).expect("profile")
    }

    #[test]
    fn requester_is_author_of_revision_that_added_template() {
        let mut wiki = MockWiki::default();
        wiki.add_history(
            "File:Example.png",
            &[
                (7, "Bob", "{{User:LRBot/resize|800}} fixed typo"),
                (6, "Carol", "{{User:LRBot/resize|800}} categories"),
                (5, "Alice", "{{User:LRBot/resize|800}}"),
                (4, "Uploader", "== Summary =="),
                (3, "Uploader", "{{User:LRBot/resize|100}} earlier request"),
            ],
        );

        let attribution = attribute_request(&mut wiki, &uk(), "File:Example.png").expect("walk");
        assert_eq!(attribution.requester, "Alice");
        assert_eq!(attribution.revision.map(|revision| revision.id), Some(5));
        // history list + texts of revisions 7, 6, 5, 4
        assert_eq!(wiki.request_count, 5);
    }

    #[test]
    fn template_present_since_creation_is_unknown() {
        let mut wiki = MockWiki::default();
        wiki.add_history(
            "File:Example.png",
            &[
                (2, "Bob", "{{User:LRBot/resize|800}} edited"),
                (1, "Alice", "{{User:LRBot/resize|800}}"),
            ],
        );

        let attribution = attribute_request(&mut wiki, &uk(), "File:Example.png").expect("walk");
        assert_eq!(attribution, Attribution::unknown());
    }

    #[test]
    fn latest_revision_without_template_is_unknown() {
        let mut wiki = MockWiki::default();
        wiki.add_history(
            "File:Example.png",
            &[
                (9, "Dave", "template removed by hand"),
                (8, "Alice", "{{User:LRBot/resize|800}}"),
            ],
        );

        let attribution = attribute_request(&mut wiki, &uk(), "File:Example.png").expect("walk");
        assert_eq!(attribution, Attribution::unknown());
    }

    #[test]
    fn hidden_author_is_unknown_but_revision_is_kept() {
        let mut wiki = MockWiki::default();
        wiki.add_history(
            "File:Example.png",
            &[(5, "Alice", "{{User:LRBot/resize|800}}"), (4, "Bob", "")],
        );
        wiki.revisions
            .get_mut("File:Example.png")
            .expect("history")[0]
            .user = None;

        let attribution = attribute_request(&mut wiki, &uk(), "File:Example.png").expect("walk");
        assert_eq!(attribution.requester, UNKNOWN_REQUESTER);
        assert_eq!(attribution.revision.map(|revision| revision.id), Some(5));
    }

    #[test]
    fn missing_revision_text_is_an_error() {
        let mut wiki = MockWiki::default();
        wiki.add_history("File:Example.png", &[(5, "Alice", "{{User:LRBot/resize|800}}")]);
        wiki.revision_texts.clear();

        let error = attribute_request(&mut wiki, &uk(), "File:Example.png").expect_err("must fail");
        assert!(error.to_string().contains("failed to load revision 5"));
    }
}
