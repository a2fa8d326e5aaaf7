//! NPC conversation backends.
//!
//! An [`NpcAgent`] owns one NPC's profile and persistent memory, assembles
//! the chat request, and parses the reply. The completion itself comes from
//! a [`ChatBackend`]: the OpenAI-compatible HTTP client when an API key is
//! configured, a scripted offline backend otherwise.

mod http;
mod memory;
mod offline;
mod profile;
mod prompt;
mod reply;
mod worker;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::app::config::LlmConfig;

pub(crate) use memory::reset_all_memories;
pub(crate) use worker::{dispatch, AgentTask, DispatchMode, PendingReply, ReplyPoll};

use http::HttpChatBackend;
use memory::MemoryStore;
use offline::OfflineChatBackend;
use profile::NpcProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Emotion {
    TresPositive,
    Positive,
    Neutre,
    Negative,
    TresNegative,
}

impl Emotion {
    /// Unknown tags read as neutral.
    pub(crate) fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "tres_positive" | "très_positive" => Emotion::TresPositive,
            "positive" => Emotion::Positive,
            "negative" | "négative" => Emotion::Negative,
            "tres_negative" | "très_négative" | "tres_négative" => Emotion::TresNegative,
            _ => Emotion::Neutre,
        }
    }

    pub(crate) fn relation_delta(self) -> i32 {
        match self {
            Emotion::TresPositive => 2,
            Emotion::Positive => 1,
            Emotion::Neutre => 0,
            Emotion::Negative => -1,
            Emotion::TresNegative => -2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AgentReply {
    pub(crate) text: String,
    pub(crate) emotion: Emotion,
}

#[derive(Debug, Error)]
pub(crate) enum AgentError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode memory for {path}: {source}")]
    MemoryEncode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat endpoint returned status {status}")]
    Status { status: u16 },
    #[error("chat completion contained no message")]
    EmptyCompletion,
    #[error("API key variable {var} is not set")]
    MissingApiKey { var: String },
    #[error("agent worker stopped without answering")]
    WorkerLost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ChatMessage {
    pub(crate) role: &'static str,
    pub(crate) content: String,
}

impl ChatMessage {
    pub(crate) fn system(content: String) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    pub(crate) fn user(content: String) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnKind {
    FirstMeeting,
    Returning,
    Reply,
}

pub(crate) trait ChatBackend: Send {
    /// Raw assistant text for the assembled conversation.
    fn complete(&self, messages: &[ChatMessage], turn: TurnKind) -> Result<String, AgentError>;
}

/// One NPC's side of a conversation.
pub(crate) trait ConversationalAgent: Send {
    fn open(&mut self, quest_context: &str, inventory: &[String]) -> Result<AgentReply, AgentError>;
    fn send(
        &mut self,
        message: &str,
        inventory: &[String],
        quest_context: &str,
    ) -> Result<AgentReply, AgentError>;

    /// Writes exchanges held since the last call. Runs on the frame thread
    /// once a reply is collected, so an abandoned request never persists.
    fn persist(&mut self) -> Result<(), AgentError> {
        Ok(())
    }
}

pub(crate) trait AgentFactory {
    /// Builds the agent for one dialogue session with the named NPC.
    fn create(
        &self,
        npc_name: &str,
        quest_context: &str,
    ) -> Result<Box<dyn ConversationalAgent>, AgentError>;
}

pub(crate) struct NpcAgent {
    profile: NpcProfile,
    memory: MemoryStore,
    unsaved: bool,
    quest_context: String,
    language: String,
    backend: Box<dyn ChatBackend>,
}

impl NpcAgent {
    pub(crate) fn load(
        folder: &Path,
        quest_context: &str,
        language: &str,
        backend: Box<dyn ChatBackend>,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            profile: NpcProfile::load(&folder.join(profile::CONTEXT_FILE))?,
            memory: MemoryStore::open(folder.join(memory::MEMORY_FILE))?,
            unsaved: false,
            quest_context: quest_context.to_string(),
            language: language.to_string(),
            backend,
        })
    }

    fn ask(
        &mut self,
        message: &str,
        inventory: &[String],
        turn: TurnKind,
    ) -> Result<AgentReply, AgentError> {
        let system = prompt::build_system_prompt(&self.profile, &self.quest_context, &self.language);
        let messages = prompt::build_messages(
            self.profile.name(),
            &system,
            self.memory.turns(),
            inventory,
            message,
        );
        let raw = self.backend.complete(&messages, turn)?;
        let reply = reply::parse_reply(&raw);
        self.memory.push_exchange(message, &reply.text);
        self.unsaved = true;
        Ok(reply)
    }
}

impl ConversationalAgent for NpcAgent {
    fn open(&mut self, quest_context: &str, inventory: &[String]) -> Result<AgentReply, AgentError> {
        self.quest_context = quest_context.to_string();
        let turn = if self.memory.is_empty() {
            TurnKind::FirstMeeting
        } else {
            TurnKind::Returning
        };
        let greeting = self.profile.greeting(turn == TurnKind::FirstMeeting).to_string();
        self.ask(&greeting, inventory, turn)
    }

    fn send(
        &mut self,
        message: &str,
        inventory: &[String],
        quest_context: &str,
    ) -> Result<AgentReply, AgentError> {
        if !quest_context.is_empty() {
            self.quest_context = quest_context.to_string();
        }
        self.ask(message, inventory, TurnKind::Reply)
    }

    fn persist(&mut self) -> Result<(), AgentError> {
        if self.unsaved {
            self.memory.save()?;
            self.unsaved = false;
        }
        Ok(())
    }
}

/// Reads the chat API key from the named environment variable.
pub(crate) fn api_key_from_env(var: &str) -> Result<String, AgentError> {
    std::env::var(var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| AgentError::MissingApiKey {
            var: var.to_string(),
        })
}

/// Agents rooted at `npc/<name>/`, talking over HTTP when the configured API
/// key variable is set and offline otherwise.
pub(crate) struct NpcAgentFactory {
    npc_dir: PathBuf,
    llm: LlmConfig,
    http: Option<HttpChatBackend>,
}

impl NpcAgentFactory {
    pub(crate) fn new(npc_dir: PathBuf, llm: LlmConfig, api_key: Option<String>) -> Result<Self, AgentError> {
        let http = match api_key {
            Some(key) => Some(HttpChatBackend::new(&llm, key)?),
            None => None,
        };
        info!(
            backend = if http.is_some() { "http" } else { "offline" },
            model = %llm.model,
            "agent_backend_selected"
        );
        Ok(Self { npc_dir, llm, http })
    }
}

impl AgentFactory for NpcAgentFactory {
    fn create(
        &self,
        npc_name: &str,
        quest_context: &str,
    ) -> Result<Box<dyn ConversationalAgent>, AgentError> {
        let folder = self.npc_dir.join(npc_name);
        let backend: Box<dyn ChatBackend> = match &self.http {
            Some(http) => Box::new(http.clone()),
            None => Box::new(OfflineChatBackend::new(npc_name)),
        };
        let agent = NpcAgent::load(&folder, quest_context, &self.llm.language, backend)?;
        Ok(Box::new(agent))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::{Arc, Mutex};

    use super::*;

    struct ScriptedBackend {
        reply: String,
        seen: Arc<Mutex<Vec<(Vec<ChatMessage>, TurnKind)>>>,
    }

    impl ChatBackend for ScriptedBackend {
        fn complete(&self, messages: &[ChatMessage], turn: TurnKind) -> Result<String, AgentError> {
            self.seen
                .lock()
                .expect("lock")
                .push((messages.to_vec(), turn));
            Ok(self.reply.clone())
        }
    }

    fn scripted(reply: &str) -> (Box<dyn ChatBackend>, Arc<Mutex<Vec<(Vec<ChatMessage>, TurnKind)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let backend = ScriptedBackend {
            reply: reply.to_string(),
            seen: Arc::clone(&seen),
        };
        (Box::new(backend), seen)
    }

    #[test]
    fn emotion_tags_map_to_relation_deltas() {
        assert_eq!(Emotion::from_tag("tres_positive").relation_delta(), 2);
        assert_eq!(Emotion::from_tag(" Negative ").relation_delta(), -1);
        assert_eq!(Emotion::from_tag("furieux"), Emotion::Neutre);
    }

    #[test]
    fn open_uses_first_meeting_then_returning_prompt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path().join("maire");
        fs::create_dir_all(&folder).expect("npc dir");
        fs::write(
            folder.join("context.txt"),
            "[name]\nAldric\n[first_meeting_prompt]\nPremière rencontre.\n",
        )
        .expect("context");

        let (backend, seen) = scripted(r#"{"response_text": "Bienvenue !", "emotion": "positive"}"#);
        let mut agent = NpcAgent::load(&folder, "quêtes", "français", backend).expect("agent");
        let reply = agent.open("quêtes", &[]).expect("open");
        agent.persist().expect("persist");
        assert_eq!(reply.text, "Bienvenue !");
        assert_eq!(reply.emotion, Emotion::Positive);

        let (backend, seen_again) = scripted(r#"{"response_text": "Re-bonjour", "emotion": "neutre"}"#);
        let mut agent = NpcAgent::load(&folder, "", "français", backend).expect("agent");
        agent.open("", &[]).expect("open");

        let first = seen.lock().expect("lock");
        assert_eq!(first[0].1, TurnKind::FirstMeeting);
        assert_eq!(
            first[0].0.last().map(|message| message.content.as_str()),
            Some("Première rencontre.")
        );
        let second = seen_again.lock().expect("lock");
        assert_eq!(second[0].1, TurnKind::Returning);
        // system + two remembered turns + new greeting
        assert_eq!(second[0].0.len(), 4);
        assert_eq!(second[0].0[2].content, "Bienvenue !");
    }

    #[test]
    fn factory_without_key_runs_offline_and_records_memory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let factory =
            NpcAgentFactory::new(dir.path().to_path_buf(), LlmConfig::default(), None).expect("factory");

        let mut agent = factory.create("forgeron", "").expect("agent");
        let greeting = agent.open("", &[]).expect("open");
        assert!(!greeting.text.is_empty());
        agent
            .send("Bonjour", &["planche".to_string()], "")
            .expect("send");
        agent.persist().expect("persist");

        let memory = fs::read_to_string(dir.path().join("forgeron").join("memory.json")).expect("memory");
        let turns: serde_json::Value = serde_json::from_str(&memory).expect("json");
        assert_eq!(turns.as_array().map(Vec::len), Some(4));
        assert_eq!(turns[2]["content"], "Bonjour");
    }

    #[test]
    fn unpersisted_exchange_never_overwrites_a_later_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path().join("maire");

        let (backend, _) = scripted(r#"{"response_text": "Réponse A", "emotion": "neutre"}"#);
        let mut abandoned = NpcAgent::load(&folder, "", "français", backend).expect("agent");
        let (backend, _) = scripted(r#"{"response_text": "Réponse B", "emotion": "neutre"}"#);
        let mut reopened = NpcAgent::load(&folder, "", "français", backend).expect("agent");

        abandoned.open("", &[]).expect("open");
        reopened.open("", &[]).expect("open");
        reopened.persist().expect("persist");
        drop(abandoned);

        let memory = fs::read_to_string(folder.join("memory.json")).expect("memory");
        let turns: serde_json::Value = serde_json::from_str(&memory).expect("json");
        assert_eq!(turns.as_array().map(Vec::len), Some(2));
        assert_eq!(turns[1]["content"], "Réponse B");
        assert!(!memory.contains("Réponse A"));
        assert!(!folder.join("memory.json.tmp").exists());

        let (backend, seen) = scripted(r#"{"response_text": "Re", "emotion": "neutre"}"#);
        let mut next = NpcAgent::load(&folder, "", "français", backend).expect("agent");
        next.open("", &[]).expect("open");
        assert_eq!(seen.lock().expect("lock")[0].1, TurnKind::Returning);
    }

    #[test]
    fn persist_without_new_exchange_leaves_file_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path().join("garde");
        let (backend, _) = scripted("Halte.");
        let mut agent = NpcAgent::load(&folder, "", "français", backend).expect("agent");

        agent.persist().expect("persist");
        assert_eq!(fs::read_to_string(folder.join("memory.json")).expect("memory"), "[]");
    }
}
