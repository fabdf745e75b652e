use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::config::{BotConfig, SiteSection};
use crate::pipeline::PipelineOutcome;
use crate::validate::SUPPORTED_EXTENSIONS;
use crate::wikitext::{extract_templates, strip_templates, strip_trigger};

/// Localized edit summaries, one per pipeline outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMessages {
    pub success: String,
    pub success_log: String,
    pub params_error: String,
    pub download_error: String,
    pub upload_error: String,
    pub size_error: String,
    pub format_error: String,
}

/// Everything that differs between wikis: endpoint, trigger template and
/// the localized strings written back to pages.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub key: String,
    pub api_url: String,
    pub user_namespace: String,
    pub template_name: String,
    pub template_aliases: Vec<String>,
    pub trigger_pattern: Regex,
    pub upload_description: String,
    pub log_section: String,
    pub messages: SiteMessages,
}

impl SiteProfile {
    pub fn from_section(section: &SiteSection) -> Result<Self> {
        let key = section.key.trim().to_string();
        if key.is_empty() {
            bail!("site profile requires a non-empty key");
        }
        let template_name = require(&key, "template_name", &section.template_name)?;
        let user_namespace = section
            .user_namespace
            .clone()
            .unwrap_or_else(|| "User".to_string());

        let mut template_aliases = vec![template_name.clone()];
        if let Some((_, page)) = template_name.split_once(':') {
            template_aliases.push(format!("User:{}", page.trim()));
            if !user_namespace.trim().is_empty() {
                template_aliases.push(format!("{}:{}", user_namespace.trim(), page.trim()));
            }
        }
        for alias in &section.template_aliases {
            template_aliases.push(alias.clone());
        }
        let mut seen = Vec::new();
        template_aliases.retain(|alias| {
            let normalized = normalize_template_name(alias);
            if seen.contains(&normalized) {
                false
            } else {
                seen.push(normalized);
                true
            }
        });

        let pattern_source = match &section.template_pattern {
            Some(pattern) if !pattern.trim().is_empty() => pattern.clone(),
            _ => default_trigger_pattern(&template_aliases),
        };
        let trigger_pattern = Regex::new(&pattern_source)
            .with_context(|| format!("invalid template_pattern for site {key}"))?;

        let api_url = match &section.api_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => default_api_url(&key)?,
        };

        Ok(Self {
            api_url,
            user_namespace,
            template_aliases,
            trigger_pattern,
            upload_description: require(&key, "upload_description", &section.upload_description)?,
            log_section: require(&key, "log_section", &section.log_section)?,
            messages: SiteMessages {
                success: require(&key, "success", &section.success)?,
                success_log: require(&key, "success_log", &section.success_log)?,
                params_error: require(&key, "params_error", &section.params_error)?,
                download_error: require(&key, "download_error", &section.download_error)?,
                upload_error: require(&key, "upload_error", &section.upload_error)?,
                size_error: require(&key, "size_error", &section.size_error)?,
                format_error: require(&key, "format_error", &section.format_error)?,
            },
            template_name,
            key,
        })
    }

    /// True when `text` invokes the trigger template under any alias, with
    /// or without nested templates in its parameters.
    pub fn contains_trigger(&self, text: &str) -> bool {
        self.trigger_pattern.is_match(text)
            || extract_templates(text)
                .iter()
                .any(|template| self.is_trigger_template(&template.name))
    }

    /// Remove every trigger invocation. Parsed templates go first so nested
    /// parameters are removed with their parent; the pattern then catches
    /// anything the parser cannot see. Repeats until the text settles, so
    /// `contains_trigger` is false on the result.
    pub fn strip_triggers(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let parsed = strip_templates(&current, |template| {
                self.is_trigger_template(&template.name)
            });
            let next = strip_trigger(&self.trigger_pattern, &parsed);
            if next == current {
                return next;
            }
            current = next;
        }
    }

    pub fn is_trigger_template(&self, name: &str) -> bool {
        let normalized = normalize_template_name(name);
        self.template_aliases
            .iter()
            .any(|alias| normalize_template_name(alias) == normalized)
    }

    pub fn upload_description_for(&self, requester: &str) -> String {
        self.upload_description.replace("{user}", requester)
    }

    /// Edit summary written when saving the page after a job.
    pub fn summary_for(&self, outcome: &PipelineOutcome) -> String {
        let messages = &self.messages;
        match outcome {
            PipelineOutcome::Success => messages.success.clone(),
            PipelineOutcome::SuccessWithLog => {
                format!("{}{}", messages.success, messages.success_log)
            }
            PipelineOutcome::ParamsError => messages.params_error.clone(),
            PipelineOutcome::DownloadError => messages.download_error.clone(),
            PipelineOutcome::UploadError => messages.upload_error.clone(),
            PipelineOutcome::SizeError { requested, actual } => messages
                .size_error
                .replace("{requested}", &requested.to_string())
                .replace("{actual}", &actual.to_string()),
            PipelineOutcome::FormatError => messages
                .format_error
                .replace("{formats}", &SUPPORTED_EXTENSIONS.join(", ")),
        }
    }
}

/// Resolve built-in profiles, apply `[[site]]` overrides and keep the sites
/// enabled under `[bot].sites` (all known sites when that list is empty).
pub fn resolve_profiles(config: &BotConfig) -> Result<Vec<SiteProfile>> {
    let mut sections: BTreeMap<String, SiteSection> = builtin_sections()
        .into_iter()
        .map(|section| (section.key.clone(), section))
        .collect();

    for overlay in &config.sites {
        let key = overlay.key.trim().to_string();
        let merged = match sections.remove(&key) {
            Some(base) => base.merged_with(overlay),
            None => overlay.clone(),
        };
        sections.insert(key, merged);
    }

    let selected: Vec<&SiteSection> = if config.bot.sites.is_empty() {
        sections.values().collect()
    } else {
        let mut out = Vec::new();
        for key in &config.bot.sites {
            let section = sections
                .get(key.trim())
                .ok_or_else(|| anyhow::anyhow!("unknown site in [bot].sites: {key}"))?;
            out.push(section);
        }
        out
    };

    selected
        .into_iter()
        .map(SiteProfile::from_section)
        .collect()
}

pub fn builtin_sections() -> Vec<SiteSection> {
    vec![
        SiteSection {
            key: "uk.wikipedia".to_string(),
            user_namespace: Some("Користувач".to_string()),
            template_name: Some("Користувач:LRBot/resize".to_string()),
            upload_description: Some(
                "Зменшення розміру зображення за запитом користувача [[User:{user}|{user}]]"
                    .to_string(),
            ),
            log_section: Some("Журнал завантажень".to_string()),
            success: Some("Зображення зменшено".to_string()),
            success_log: Some(". Доданий журнал завантажень".to_string()),
            params_error: Some(
                "Помилка при завантаженні параметрів шаблону. [[User:LRBot/resize|Дивіться документацію]]."
                    .to_string(),
            ),
            download_error: Some("Неможливо завантажити зображення з сервера".to_string()),
            upload_error: Some("Неможливо завантажити зображення на сервер".to_string()),
            size_error: Some("Вкажіть ширину файлу, меншу за поточну".to_string()),
            format_error: Some(
                "Формат не підтримується. Доступні формати: {formats}".to_string(),
            ),
            ..SiteSection::default()
        },
        SiteSection {
            key: "vi.wikipedia".to_string(),
            user_namespace: Some("Thành viên".to_string()),
            template_name: Some("Thành viên:LRBot/resize".to_string()),
            upload_description: Some(
                "Giảm độ phân giải theo yêu cầu của [[Thành viên:{user}|{user}]]".to_string(),
            ),
            log_section: Some("Nhật trình tải lên".to_string()),
            success: Some("Hình đã giảm độ phân giải".to_string()),
            success_log: Some(". Thêm nhật trình tải lên".to_string()),
            params_error: Some("Có lỗi khi đang tải tham số bản mẫu. Xem tài liệu.".to_string()),
            download_error: Some("Không thể tải hình từ máy chủ xuống".to_string()),
            upload_error: Some("Không thể tải hình lên máy chủ".to_string()),
            size_error: Some(
                "Chiều rộng mới của hình nên nhỏ hơn chiều rộng hiện tại".to_string(),
            ),
            format_error: Some(
                "Định dạng tập tin không được hỗ trợ. Các định dạng được hỗ trợ: {formats}"
                    .to_string(),
            ),
            ..SiteSection::default()
        },
    ]
}

/// `uk.wikipedia` -> `https://uk.wikipedia.org/w/api.php`
pub fn default_api_url(key: &str) -> Result<String> {
    match key.split_once('.') {
        Some((language, family)) if !language.is_empty() && !family.is_empty() => {
            Ok(format!("https://{language}.{family}.org/w/api.php"))
        }
        _ => bail!("cannot derive api_url from site key {key}; set api_url explicitly"),
    }
}

/// Pattern matching a flat `{{alias|800|log}}` invocation of any alias, with
/// case-insensitive namespaces and whitespace or underscore variants.
pub fn default_trigger_pattern(aliases: &[String]) -> String {
    let mut alternatives: Vec<String> = Vec::new();
    for alias in aliases {
        let alternative = match alias.split_once(':') {
            Some((namespace, page)) if !namespace.trim().is_empty() => format!(
                r"(?i:{})\s*:\s*{}",
                title_pattern(namespace.trim()),
                title_pattern(page.trim())
            ),
            Some((_, page)) => title_pattern(page.trim()),
            None => title_pattern(alias.trim()),
        };
        if !alternatives.contains(&alternative) {
            alternatives.push(alternative);
        }
    }

    format!(
        r"\{{\{{\s*(?:{})\s*(?:\|[^{{}}]*)?\}}\}}",
        alternatives.join("|")
    )
}

fn title_pattern(title: &str) -> String {
    let mut out = String::new();
    for (index, ch) in title.chars().enumerate() {
        if ch == ' ' || ch == '_' {
            if !out.ends_with("[ _]+") {
                out.push_str("[ _]+");
            }
            continue;
        }
        let upper: String = ch.to_uppercase().collect();
        let lower: String = ch.to_lowercase().collect();
        if index == 0 && upper != lower {
            out.push_str(&format!(
                "(?:{}|{})",
                regex::escape(&upper),
                regex::escape(&lower)
            ));
        } else {
            out.push_str(&regex::escape(&ch.to_string()));
        }
    }
    out
}

/// Canonical form used to compare template names: underscores become
/// spaces, the namespace is case-folded and the page part gets an upper-case
/// first letter.
pub fn normalize_template_name(name: &str) -> String {
    let collapsed = name
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    match collapsed.split_once(':') {
        Some((namespace, page)) => format!(
            "{}:{}",
            namespace.trim().to_lowercase(),
            uppercase_first(page.trim())
        ),
        None => uppercase_first(collapsed.trim()),
    }
}

fn uppercase_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn require(key: &str, field: &str, value: &Option<String>) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => bail!("site {key} is missing required field {field}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotSection;

    fn uk() -> SiteProfile {
        let section = builtin_sections()
            .into_iter()
            .find(|section| section.key == "uk.wikipedia")
            .expect("uk profile");
        SiteProfile::from_section(&section).expect("build profile")
    }

    #[test]
    fn default_pattern_matches_both_namespaces_and_bare_form() {
        let profile = uk();
        assert!(profile.contains_trigger("{{User:LRBot/resize|800}}"));
        assert!(profile.contains_trigger("{{Користувач:LRBot/resize|800|log}}"));
        assert!(profile.contains_trigger("{{ user:LRBot/resize }}"));
        assert!(profile.contains_trigger("{{User:LRBot/resize}}"));
        assert!(profile.contains_trigger("{{User:lRBot/resize|1}}"));
    }

    #[test]
    fn default_pattern_rejects_other_templates() {
        let profile = uk();
        assert!(!profile.contains_trigger("{{User:OtherBot/resize|800}}"));
        assert!(!profile.contains_trigger("{{User:LRBot/resize2|800}}"));
        assert!(!profile.contains_trigger("{{Information|description=x}}"));
    }

    #[test]
    fn configured_aliases_are_matched_and_stripped() {
        let section = SiteSection {
            template_aliases: vec!["Шаблон:Resize".to_string()],
            ..builtin_sections()[0].clone()
        };
        let profile = SiteProfile::from_section(&section).expect("profile");
        assert!(profile.trigger_pattern.is_match("{{шаблон:resize|800}}"));
        assert!(profile.contains_trigger("{{Шаблон:Resize|800}}"));
        assert_eq!(profile.strip_triggers("a{{Шаблон:Resize|800}}b"), "ab");
    }

    #[test]
    fn localized_namespace_with_space_is_an_alias() {
        let section = builtin_sections()
            .into_iter()
            .find(|section| section.key == "vi.wikipedia")
            .expect("vi profile");
        let profile = SiteProfile::from_section(&section).expect("profile");
        assert!(profile.is_trigger_template("Thành_viên:LRBot/resize"));
        assert!(profile.trigger_pattern.is_match("{{Thành_viên:LRBot/resize|800}}"));
        assert!(profile.trigger_pattern.is_match("{{user:LRBot/resize}}"));
    }

    #[test]
    fn nested_parameters_are_detected_and_stripped() {
        let profile = uk();
        let text = "x {{User:LRBot/resize|800|note={{smile}}}} y {{Other|{{smile}}}}";
        assert!(profile.contains_trigger(text));
        let stripped = profile.strip_triggers(text);
        assert_eq!(stripped, "x  y {{Other|{{smile}}}}");
        assert!(!profile.contains_trigger(&stripped));
        assert_eq!(profile.strip_triggers(&stripped), stripped);
    }

    #[test]
    fn strip_triggers_settles_on_reassembled_invocations() {
        let profile = uk();
        let text = "{{{{User:LRBot/resize|1}}User:LRBot/resize|2}} tail";
        let stripped = profile.strip_triggers(text);
        assert_eq!(stripped, " tail");
        assert!(!profile.contains_trigger(&stripped));
    }

    #[test]
    fn template_name_comparison_is_normalized() {
        let profile = uk();
        assert!(profile.is_trigger_template("User:LRBot/resize"));
        assert!(profile.is_trigger_template("user:LRBot/resize"));
        assert!(profile.is_trigger_template("Користувач:LRBot/resize"));
        assert!(profile.is_trigger_template("User:lRBot/resize"));
        assert!(!profile.is_trigger_template("Thành viên:LRBot/resize"));
        assert!(!profile.is_trigger_template("LRBot/resize"));
    }

    #[test]
    fn summaries_fill_placeholders() {
        let profile = uk();
        assert_eq!(
            profile.summary_for(&PipelineOutcome::SuccessWithLog),
            "Зображення зменшено. Доданий журнал завантажень"
        );
        assert!(
            profile
                .summary_for(&PipelineOutcome::FormatError)
                .ends_with("png, gif, jpg, jpeg, tiff, tif")
        );

        let mut custom = profile.clone();
        custom.messages.size_error = "Need less than {actual}px, got {requested}px".to_string();
        assert_eq!(
            custom.summary_for(&PipelineOutcome::SizeError {
                requested: 3000,
                actual: 2000
            }),
            "Need less than 2000px, got 3000px"
        );
    }

    #[test]
    fn upload_description_credits_requester() {
        let profile = uk();
        assert!(
            profile
                .upload_description_for("Alice")
                .ends_with("[[User:Alice|Alice]]")
        );
    }

    #[test]
    fn api_url_is_derived_from_key() {
        assert_eq!(
            default_api_url("vi.wikipedia").expect("derive"),
            "https://vi.wikipedia.org/w/api.php"
        );
        assert!(default_api_url("localwiki").is_err());
    }

    #[test]
    fn resolve_profiles_applies_overrides_and_selection() {
        let config = BotConfig {
            bot: BotSection {
                sites: vec!["vi.wikipedia".to_string()],
                ..BotSection::default()
            },
            sites: vec![SiteSection {
                key: "vi.wikipedia".to_string(),
                api_url: Some("https://vi.example.org/api.php".to_string()),
                success: Some("Done".to_string()),
                ..SiteSection::default()
            }],
        };

        let profiles = resolve_profiles(&config).expect("resolve");
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].key, "vi.wikipedia");
        assert_eq!(profiles[0].api_url, "https://vi.example.org/api.php");
        assert_eq!(profiles[0].messages.success, "Done");
        assert_eq!(profiles[0].log_section, "Nhật trình tải lên");
    }

    #[test]
    fn resolve_profiles_rejects_incomplete_new_site() {
        let config = BotConfig {
            bot: BotSection::default(),
            sites: vec![SiteSection {
                key: "en.wikipedia".to_string(),
                template_name: Some("User:LRBot/resize".to_string()),
                ..SiteSection::default()
            }],
        };
        let error = resolve_profiles(&config).expect_err("must fail");
        assert!(error.to_string().contains("missing required field"));
    }

    #[test]
    fn resolve_profiles_rejects_unknown_enabled_site() {
        let config = BotConfig {
            bot: BotSection {
                sites: vec!["de.wikipedia".to_string()],
                ..BotSection::default()
            },
            sites: Vec::new(),
        };
        assert!(resolve_profiles(&config).is_err());
    }
}
