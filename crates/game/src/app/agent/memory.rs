use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AgentError;

pub(super) const MEMORY_FILE: &str = "memory.json";
const EMPTY_MEMORY: &str = "[]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct MemoryTurn {
    pub(super) role: String,
    pub(super) content: String,
}

/// Conversation history persisted as a JSON array of `{role, content}`.
#[derive(Debug)]
pub(super) struct MemoryStore {
    path: PathBuf,
    turns: Vec<MemoryTurn>,
}

impl MemoryStore {
    /// Creates the file as `[]` when missing. Unreadable content is reset.
    pub(super) fn open(path: PathBuf) -> Result<Self, AgentError> {
        let turns = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<MemoryTurn>>(&raw) {
                Ok(turns) => turns,
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "npc_memory_malformed_reset");
                    write_memory_text(&path, EMPTY_MEMORY)?;
                    Vec::new()
                }
            },
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                write_memory_text(&path, EMPTY_MEMORY)?;
                Vec::new()
            }
            Err(source) => return Err(AgentError::Io { path, source }),
        };
        Ok(Self { path, turns })
    }

    pub(super) fn turns(&self) -> &[MemoryTurn] {
        &self.turns
    }

    pub(super) fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Appends one user/assistant pair in memory. Nothing reaches disk until
    /// [`MemoryStore::save`].
    pub(super) fn push_exchange(&mut self, user: &str, assistant: &str) {
        self.turns.push(MemoryTurn {
            role: "user".to_string(),
            content: user.to_string(),
        });
        self.turns.push(MemoryTurn {
            role: "assistant".to_string(),
            content: assistant.to_string(),
        });
    }

    /// Rewrites the file with every turn held.
    pub(super) fn save(&self) -> Result<(), AgentError> {
        let encoded =
            serde_json::to_string_pretty(&self.turns).map_err(|source| AgentError::MemoryEncode {
                path: self.path.clone(),
                source,
            })?;
        write_memory_text(&self.path, &encoded)
    }
}

/// Empties every `<npc_dir>/<npc>/memory.json` that exists. Returns how many
/// files were reset.
pub(crate) fn reset_all_memories(npc_dir: &Path) -> usize {
    let entries = match fs::read_dir(npc_dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(path = %npc_dir.display(), error = %error, "npc_memory_reset_skipped");
            return 0;
        }
    };

    let mut reset = 0;
    for entry in entries.flatten() {
        let path = entry.path().join(MEMORY_FILE);
        if !path.is_file() {
            continue;
        }
        match write_memory_text(&path, EMPTY_MEMORY) {
            Ok(()) => reset += 1,
            Err(error) => warn!(error = %error, "npc_memory_reset_failed"),
        }
    }
    info!(count = reset, "npc_memory_reset");
    reset
}

fn write_memory_text(path: &Path, text: &str) -> Result<(), AgentError> {
    write_text_atomic(path, text).map_err(|source| AgentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text.as_bytes())?;
    replace_file(&tmp_path, path)
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    match fs::remove_file(final_path) {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(tmp_path);
            return Err(error);
        }
    }

    if let Err(error) = fs::rename(tmp_path, final_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(MEMORY_FILE);
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_empty_memory_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garde").join(MEMORY_FILE);

        let store = MemoryStore::open(path.clone()).expect("open");

        assert!(store.is_empty());
        assert_eq!(fs::read_to_string(&path).expect("read"), "[]");
    }

    #[test]
    fn malformed_memory_is_reset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(MEMORY_FILE);
        fs::write(&path, "{ not json").expect("write");

        let store = MemoryStore::open(path.clone()).expect("open");

        assert!(store.is_empty());
        assert_eq!(fs::read_to_string(&path).expect("read"), "[]");
    }

    #[test]
    fn exchanges_persist_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(MEMORY_FILE);
        let mut store = MemoryStore::open(path.clone()).expect("open");
        store.push_exchange("Salut", "Bien le bonjour, étranger.");
        assert_eq!(fs::read_to_string(&path).expect("read"), "[]", "not saved yet");
        store.save().expect("save");

        let reopened = MemoryStore::open(path.clone()).expect("reopen");

        assert_eq!(reopened.turns().len(), 2);
        assert_eq!(reopened.turns()[1].role, "assistant");
        assert!(fs::read_to_string(&path).expect("read").contains("étranger"));
        assert!(!dir.path().join("memory.json.tmp").exists());
    }

    #[test]
    fn reset_all_clears_existing_memories_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let maire = dir.path().join("maire");
        fs::create_dir_all(&maire).expect("dir");
        fs::write(maire.join(MEMORY_FILE), r#"[{"role":"user","content":"x"}]"#).expect("write");
        fs::create_dir_all(dir.path().join("garde")).expect("dir");

        assert_eq!(reset_all_memories(dir.path()), 1);
        assert_eq!(fs::read_to_string(maire.join(MEMORY_FILE)).expect("read"), "[]");
        assert!(!dir.path().join("garde").join(MEMORY_FILE).exists());
    }
}
