//! Parses a generator reply into the four content sections.
//!
//! Two layouts are understood: labeled sections (`ON-SCREEN TITLE:`, `HOOK:`,
//! `CAPTION:`, `HASHTAGS:`) and a JSON object keyed by the output column
//! names. Anything that does not map cleanly onto exactly one of each
//! section, in display order, is rejected rather than guessed at.

use std::fmt;
use std::sync::LazyLock;

use ai_client::strip_code_blocks;
use regex::Regex;
use tracing::debug;

use crate::error::ParseError;
use crate::types::{GenerationResult, CAPTION_BODY, HASHTAGS, ON_SCREEN_TITLE, VIRAL_HOOK};

/// Brand tags every post ends with, in this order.
pub const BRAND_HASHTAGS: [&str; 3] = ["#vibecoding", "#vibecodefun", "#vibecoders"];

/// Joins the four sections into `full_content`.
pub const SECTION_SEPARATOR: &str = "\n\n";

/// Separates caption sentences.
pub const CAPTION_BREAK: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    OnScreenTitle,
    Hook,
    CaptionBody,
    Hashtags,
}

impl Section {
    /// Display order, also the order sections must appear in.
    pub const ORDER: [Section; 4] = [
        Section::OnScreenTitle,
        Section::Hook,
        Section::CaptionBody,
        Section::Hashtags,
    ];

    fn json_key(self) -> &'static str {
        match self {
            Section::OnScreenTitle => ON_SCREEN_TITLE,
            Section::Hook => VIRAL_HOOK,
            Section::CaptionBody => CAPTION_BODY,
            Section::Hashtags => HASHTAGS,
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "onscreentitle" => Some(Section::OnScreenTitle),
            "viralhook" | "hook" => Some(Section::Hook),
            "captionbody" | "caption" => Some(Section::CaptionBody),
            "hashtags" | "hashtag" => Some(Section::Hashtags),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::OnScreenTitle => "on-screen title",
            Section::Hook => "hook",
            Section::CaptionBody => "caption body",
            Section::Hashtags => "hashtags",
        };
        f.write_str(name)
    }
}

// A label line: optional markdown heading / list number / emphasis, the label,
// an optional parenthetical, then ':' or a spaced dash, then same-line content.
static LABEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*(?:#{1,6}\s+)?(?:\d{1,2}[.)]\s*)?(?:[*_]{1,3}\s*)?",
        r"(?P<label>on[\s-]?screen[\s-]+title|viral[\s-]+hook|hook|caption[\s-]+body|caption|hash[\s-]?tags?)\b",
        r"(?:\s*\([^)]*\))?(?:\s*[*_]{1,3})?",
        r"(?P<sep>\s*:|\s+[-–—](?:\s|$))?",
        r"(?:\s*[*_]{1,3})?\s*(?P<rest>.*)$",
    ))
    .expect("label regex is valid")
});

struct LabelLine<'a> {
    section: Section,
    rest: &'a str,
}

fn match_label(line: &str) -> Option<LabelLine<'_>> {
    let caps = LABEL_LINE.captures(line)?;
    let section = Section::from_label(caps.name("label")?.as_str())?;
    let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
    // Without a separator the label must stand alone, so prose such as
    // "Hook, line and sinker" is not taken for a section header.
    if caps.name("sep").is_none() && !rest.is_empty() {
        return None;
    }
    Some(LabelLine { section, rest })
}

/// Parse a raw generator reply.
pub fn parse(raw: &str) -> Result<GenerationResult, ParseError> {
    let body = strip_code_blocks(raw);
    let sections = if body.starts_with('{') {
        json_sections(body)?
    } else {
        labeled_sections(body)?
    };
    assemble(sections)
}

/// Split labeled text into the four raw section bodies, in [`Section::ORDER`].
fn labeled_sections(text: &str) -> Result<[String; 4], ParseError> {
    let mut found: Vec<(Section, Vec<&str>)> = Vec::new();

    for line in text.lines() {
        if let Some(label) = match_label(line) {
            if found.iter().any(|(s, _)| *s == label.section) {
                return Err(ParseError::DuplicateSection(label.section));
            }
            let expected = Section::ORDER[found.len().min(3)];
            if label.section != expected {
                // A later section showing up first means `expected` is either
                // missing or misplaced; which one is decided below.
                if !text_has_label(text, expected) {
                    return Err(ParseError::MissingSection(expected));
                }
                return Err(ParseError::OutOfOrder {
                    expected,
                    found: label.section,
                });
            }
            let mut lines = Vec::new();
            if !label.rest.is_empty() {
                lines.push(label.rest);
            }
            found.push((label.section, lines));
        } else if let Some((_, lines)) = found.last_mut() {
            lines.push(line);
        }
        // Text before the first label is preamble and ignored.
    }

    if let Some(missing) = Section::ORDER.get(found.len()) {
        return Err(ParseError::MissingSection(*missing));
    }

    let mut out: [String; 4] = Default::default();
    for (slot, (_, lines)) in out.iter_mut().zip(found) {
        *slot = lines.join("\n").trim().to_string();
    }
    Ok(out)
}

fn text_has_label(text: &str, section: Section) -> bool {
    text.lines()
        .filter_map(match_label)
        .any(|l| l.section == section)
}

fn json_sections(body: &str) -> Result<[String; 4], ParseError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::InvalidJson("top-level value is not an object".into()))?;

    let mut out: [String; 4] = Default::default();
    for (slot, section) in out.iter_mut().zip(Section::ORDER) {
        let field = object
            .get(section.json_key())
            .ok_or(ParseError::MissingSection(section))?;
        *slot = match field {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Array(items) if section == Section::Hashtags => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            other => {
                return Err(ParseError::InvalidJson(format!(
                    "\"{}\" is not a string: {other}",
                    section.json_key()
                )))
            }
        };
    }
    Ok(out)
}

fn assemble(sections: [String; 4]) -> Result<GenerationResult, ParseError> {
    let [title, hook, caption, hashtags] = sections;

    let on_screen_title = single_line(&title);
    let viral_hook = single_line(&hook);
    let caption_body = normalize_caption(&caption);
    for (value, section) in [
        (&on_screen_title, Section::OnScreenTitle),
        (&viral_hook, Section::Hook),
        (&caption_body, Section::CaptionBody),
    ] {
        if value.is_empty() {
            return Err(ParseError::EmptySection(section));
        }
    }
    let hashtags = normalize_hashtags(&hashtags);

    let full_content = [
        on_screen_title.as_str(),
        viral_hook.as_str(),
        caption_body.as_str(),
        hashtags.as_str(),
    ]
    .join(SECTION_SEPARATOR);

    Ok(GenerationResult {
        on_screen_title,
        viral_hook,
        caption_body,
        hashtags,
        full_content,
    })
}

fn replace_long_dashes(text: &str) -> String {
    text.replace(['\u{2014}', '\u{2013}'], "-")
}

/// Collapse whitespace to single spaces and drop a pair of wrapping quotes.
fn single_line(text: &str) -> String {
    let collapsed = replace_long_dashes(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}')] {
        if let Some(inner) = collapsed
            .strip_prefix(open)
            .and_then(|s| s.strip_suffix(close))
        {
            return inner.trim().to_string();
        }
    }
    collapsed
}

/// One sentence per paragraph, separated by [`CAPTION_BREAK`].
pub fn normalize_caption(text: &str) -> String {
    let text = replace_long_dashes(text)
        .replace("\\n", "\n")
        .replace("\r\n", "\n");
    let mut sentences = Vec::new();
    for line in text.lines() {
        split_sentences(line, &mut sentences);
    }
    sentences.join(CAPTION_BREAK)
}

fn split_sentences(line: &str, out: &mut Vec<String>) {
    let chars: Vec<char> = line.chars().collect();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        current.push(chars[i]);
        if matches!(chars[i], '.' | '!' | '?') && !ends_with_abbreviation(&current) {
            while i + 1 < chars.len() && is_sentence_tail(chars[i + 1]) {
                i += 1;
                current.push(chars[i]);
            }
            if i + 1 == chars.len() || chars[i + 1].is_whitespace() {
                push_sentence(&mut current, out);
            }
        }
        i += 1;
    }
    push_sentence(&mut current, out);
}

/// Titles and Latin shorthand that end in a period without ending a sentence.
const ABBREVIATIONS: [&str; 12] = [
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "st.", "vs.", "e.g.", "i.e.", "approx.",
];

fn ends_with_abbreviation(current: &str) -> bool {
    let word = current
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(['(', '"', '\'', '\u{201c}'])
        .to_lowercase();
    ABBREVIATIONS.contains(&word.as_str())
}

fn is_sentence_tail(c: char) -> bool {
    matches!(
        c,
        '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}'
    )
}

fn push_sentence(current: &mut String, out: &mut Vec<String>) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        out.push(sentence.to_string());
    }
    current.clear();
}

/// Deduplicated, `#`-prefixed tags with the brand tags appended exactly once at the end.
pub fn normalize_hashtags(text: &str) -> String {
    let mut tags: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for token in text.split(|c: char| c.is_whitespace() || c == ',') {
        let raw = token.trim_start_matches('#');
        // `#AI-tools` becomes `#AItools`.
        let body: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if body.is_empty() {
            if !token.is_empty() {
                debug!(token, "Dropping hashtag with no usable characters");
            }
            continue;
        }
        if body != raw.trim_end_matches(['.', ';', ':', '!']) {
            debug!(token, tag = %body, "Removed disallowed characters from hashtag");
        }
        let tag = format!("#{body}");
        let key = tag.to_lowercase();
        if seen.contains(&key) || BRAND_HASHTAGS.contains(&key.as_str()) {
            continue;
        }
        seen.push(key);
        tags.push(tag);
    }

    tags.extend(BRAND_HASHTAGS.iter().map(|t| t.to_string()));
    tags.join(" ")
}
