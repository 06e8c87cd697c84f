//! Prompt template: a system message and a user message with `{{title}}`,
//! `{{keywords}}` and `{{transcription}}` placeholders.

use std::collections::HashMap;
use std::path::Path;

use ai_client::Message;
use anyhow::{Context, Result};

use crate::types::GenerationRequest;

/// Line separating the system part from the user part in a prompt file.
pub const USER_MARKER: &str = "=== USER ===";

const DEFAULT_SYSTEM: &str = "\
You write short-form video copy for TikTok and YouTube Shorts under the Vibecode brand.
Turn the transcript into scroll-stopping content for builders: specific numbers, real tools, \
confident indie-hacker voice. Never use em dashes, only regular dashes (-).

Reply in exactly this layout and nothing else:

ON-SCREEN TITLE: <bold claim or stat from the video, max 8 words>
HOOK: <first caption line, max 8 words>
CAPTION:
<3-5 sentences that build curiosity, each followed by a blank line>
HASHTAGS: <relevant hashtags, always ending with #vibecoding #vibecodefun #vibecoders>";

const DEFAULT_USER: &str = "\
TITLE: {{title}}
KEYWORDS: {{keywords}}
TRANSCRIPTION: {{transcription}}

Generate viral TikTok/YouTube Shorts content based on this transcript.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system: String,
    user: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM, DEFAULT_USER)
    }
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Parse prompt-file contents. Text before a [`USER_MARKER`] line is the
    /// system message; text after it replaces the default user message.
    pub fn parse(contents: &str) -> Self {
        let mut system = Vec::new();
        let mut user: Option<Vec<&str>> = None;
        for line in contents.lines() {
            match user.as_mut() {
                Some(lines) => lines.push(line),
                None if line.trim() == USER_MARKER => user = Some(Vec::new()),
                None => system.push(line),
            }
        }
        let system = system.join("\n").trim().to_string();
        match user {
            Some(lines) => Self::new(system, lines.join("\n").trim()),
            None => Self::new(system, DEFAULT_USER),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?;
        let template = Self::parse(&contents);
        anyhow::ensure!(
            !template.system.is_empty(),
            "Prompt file {} has an empty system prompt",
            path.display()
        );
        Ok(template)
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    /// Fixed characters sent with every request, excluding substituted values.
    pub fn overhead_chars(&self) -> usize {
        self.system.chars().count() + self.user.chars().count()
    }

    pub fn render(&self, request: &GenerationRequest) -> Vec<Message> {
        let vars = HashMap::from([
            ("title", request.title.as_str()),
            ("keywords", request.keywords.as_str()),
            ("transcription", request.transcription.as_str()),
        ]);
        vec![
            Message::system(&self.system),
            Message::user(resolve_vars(&self.user, &vars)),
        ]
    }
}

/// Replace `{{var}}` placeholders from `vars`. Unknown names are left as-is;
/// substituted values are never re-scanned.
pub fn resolve_vars(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_name = String::new();
            let mut closed = false;
            while let Some(ch) = chars.next() {
                if ch == '}' && chars.peek() == Some(&'}') {
                    chars.next();
                    closed = true;
                    break;
                }
                var_name.push(ch);
            }

            if !closed {
                result.push_str("{{");
                result.push_str(&var_name);
                continue;
            }

            match vars.get(var_name.trim()) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(&var_name);
                    result.push_str("}}");
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}
