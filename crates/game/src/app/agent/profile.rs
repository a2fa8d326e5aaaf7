use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use super::AgentError;

pub(super) const CONTEXT_FILE: &str = "context.txt";

const DEFAULT_NAME: &str = "PNJ Inconnu";
const DEFAULT_FIRST_MEETING: &str = "Tu vois le joueur pour la première fois. Accueille-le.";
const DEFAULT_RETURNING: &str =
    "Tu reconnais le joueur car il t'a déjà parlé. Reprends naturellement la discussion.";

/// Character sheet read from `context.txt`: `[key]` headers, each followed by
/// free text up to the next header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct NpcProfile {
    blocks: BTreeMap<String, String>,
}

impl NpcProfile {
    /// A missing file gives an empty profile.
    pub(super) fn load(path: &Path) -> Result<Self, AgentError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Self::parse(&raw)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(AgentError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub(super) fn parse(raw: &str) -> Self {
        let mut blocks = BTreeMap::new();
        let mut key: Option<String> = None;
        let mut body: Vec<&str> = Vec::new();

        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
                if let Some(done) = key.take() {
                    blocks.insert(done, body.join("\n").trim().to_string());
                }
                key = Some(trimmed[1..trimmed.len() - 1].trim().to_string());
                body.clear();
            } else if key.is_some() {
                body.push(line);
            }
        }
        if let Some(done) = key {
            blocks.insert(done, body.join("\n").trim().to_string());
        }
        Self { blocks }
    }

    pub(super) fn section(&self, key: &str) -> Option<&str> {
        self.blocks.get(key).map(String::as_str)
    }

    /// Empty for absent keys.
    pub(super) fn block(&self, key: &str) -> &str {
        self.section(key).unwrap_or("")
    }

    fn block_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        match self.block(key) {
            "" => fallback,
            value => value,
        }
    }

    pub(super) fn name(&self) -> &str {
        self.block_or("name", DEFAULT_NAME)
    }

    pub(super) fn greeting(&self, first_meeting: bool) -> &str {
        if first_meeting {
            self.block_or("first_meeting_prompt", DEFAULT_FIRST_MEETING)
        } else {
            self.block_or("returning_prompt", DEFAULT_RETURNING)
        }
    }
}
