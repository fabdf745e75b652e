use std::ops::Range;

use regex::Regex;

use crate::client::FileVersion;

/// A `{{name|param|...}}` invocation found in wikitext. Named parameters are
/// kept verbatim as `key=value` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInvocation {
    pub name: String,
    pub params: Vec<String>,
}

/// Extract every template invocation, nested ones included. Inner templates
/// appear before the template that encloses them.
pub fn extract_templates(text: &str) -> Vec<TemplateInvocation> {
    template_spans(text)
        .into_iter()
        .map(|(_, invocation)| invocation)
        .collect()
}

/// Like [`extract_templates`], with the byte range of each `{{...}}`
/// including its braces.
fn template_spans(text: &str) -> Vec<(Range<usize>, TemplateInvocation)> {
    let bytes = text.as_bytes();
    let mut output = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut index = 0;

    while index + 1 < bytes.len() {
        match (bytes[index], bytes[index + 1]) {
            (b'{', b'{') => {
                open.push(index);
                index += 2;
            }
            (b'}', b'}') => {
                if let Some(start) = open.pop()
                    && let Some(invocation) = parse_invocation(&text[start + 2..index])
                {
                    output.push((start..index + 2, invocation));
                }
                index += 2;
            }
            _ => index += 1,
        }
    }

    output
}

/// Remove every template for which `is_match` holds, together with whatever
/// it encloses. Nested matches inside a removed template go with it.
pub fn strip_templates<F>(text: &str, is_match: F) -> String
where
    F: Fn(&TemplateInvocation) -> bool,
{
    let mut ranges: Vec<Range<usize>> = template_spans(text)
        .into_iter()
        .filter(|(_, invocation)| is_match(invocation))
        .map(|(range, _)| range)
        .collect();
    if ranges.is_empty() {
        return text.to_string();
    }
    ranges.sort_by_key(|range| (range.start, std::cmp::Reverse(range.end)));

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in ranges {
        if range.start < cursor {
            continue;
        }
        output.push_str(&text[cursor..range.start]);
        cursor = range.end;
    }
    output.push_str(&text[cursor..]);
    output
}

fn parse_invocation(inner: &str) -> Option<TemplateInvocation> {
    let mut parts = split_top_level(inner).into_iter();
    let name = parts.next()?.trim().to_string();
    if name.is_empty() || name.starts_with('#') || name.contains('{') || name.contains('}') {
        return None;
    }
    Some(TemplateInvocation {
        name,
        params: parts.map(|part| part.trim().to_string()).collect(),
    })
}

fn split_top_level(inner: &str) -> Vec<&str> {
    let bytes = inner.as_bytes();
    let mut parts = Vec::new();
    let mut braces = 0usize;
    let mut brackets = 0usize;
    let mut start = 0;
    let mut index = 0;

    while index < bytes.len() {
        let pair = bytes.get(index + 1).map(|next| (bytes[index], *next));
        match pair {
            Some((b'{', b'{')) => {
                braces += 1;
                index += 2;
                continue;
            }
            Some((b'}', b'}')) if braces > 0 => {
                braces -= 1;
                index += 2;
                continue;
            }
            Some((b'[', b'[')) => {
                brackets += 1;
                index += 2;
                continue;
            }
            Some((b']', b']')) if brackets > 0 => {
                brackets -= 1;
                index += 2;
                continue;
            }
            _ => {}
        }
        if bytes[index] == b'|' && braces == 0 && brackets == 0 {
            parts.push(&inner[start..index]);
            start = index + 1;
        }
        index += 1;
    }
    parts.push(&inner[start..]);
    parts
}

/// Remove every match of `pattern`. Repeats until nothing matches so the
/// result is stable under a second application.
pub fn strip_trigger(pattern: &Regex, text: &str) -> String {
    let mut current = text.to_string();
    while pattern.is_match(&current) {
        current = pattern.replace_all(&current, "").into_owned();
    }
    current
}

/// Wikitable listing every upload of a file, newest first.
pub fn file_history_table(versions: &[FileVersion]) -> String {
    let rows = versions
        .iter()
        .map(|version| {
            format!(
                "| {} || {} || {}×{} px ({} bytes) || <nowiki>{}</nowiki>",
                version.timestamp,
                version.user,
                version.width,
                version.height,
                version.size,
                version.comment
            )
        })
        .collect::<Vec<_>>()
        .join("\n|-\n");

    format!(
        "{{| class=\"wikitable\"\n! {{{{int:filehist-datetime}}}} || {{{{int:filehist-user}}}} || {{{{int:filehist-dimensions}}}} || {{{{int:filehist-comment}}}}\n|-\n{rows}\n|}}\n"
    )
}

/// Section appended to a page when the requester asked for `log`.
pub fn log_appendix(section_title: &str, versions: &[FileVersion]) -> String {
    format!(
        "\n== {section_title} ==\n{}",
        file_history_table(versions)
    )
}
