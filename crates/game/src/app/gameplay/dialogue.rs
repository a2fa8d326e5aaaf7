//! One open conversation: transcript, input line, scroll offset and the
//! agent request in flight.

use engine::DialoguePanelView;
use tracing::warn;

use super::roster::display_name;
use super::text_layout::{clamp_scroll, visible_range, wrap_transcript, LayoutMetrics};
use crate::app::agent::{
    dispatch, AgentError, AgentReply, AgentTask, ConversationalAgent, DispatchMode, PendingReply,
    ReplyPoll,
};

pub(crate) const PLAYER_LABEL: &str = "Vous";
/// Transcript line used when the agent fails to answer.
pub(crate) const FALLBACK_REPLY: &str = "...";

enum AgentSlot {
    Ready(Box<dyn ConversationalAgent>),
    Waiting(PendingReply),
    Gone,
}

pub(crate) enum DialoguePoll {
    Idle,
    Waiting,
    Reply(Result<AgentReply, AgentError>),
    /// The worker vanished along with the agent.
    Lost,
}

pub(crate) struct DialogueSession {
    npc_name: String,
    npc_label: String,
    transcript: Vec<(String, String)>,
    input: String,
    scroll: usize,
    agent: AgentSlot,
    mode: DispatchMode,
}

impl DialogueSession {
    /// Starts the session and requests the opening line.
    pub(crate) fn open(
        npc_name: &str,
        agent: Box<dyn ConversationalAgent>,
        mode: DispatchMode,
        quest_context: String,
        inventory: Vec<String>,
    ) -> Self {
        let pending = dispatch(
            mode,
            agent,
            AgentTask::Open {
                quest_context,
                inventory,
            },
        );
        Self {
            npc_name: npc_name.to_string(),
            npc_label: display_name(npc_name),
            transcript: Vec::new(),
            input: String::new(),
            scroll: 0,
            agent: AgentSlot::Waiting(pending),
            mode,
        }
    }

    pub(crate) fn npc_name(&self) -> &str {
        &self.npc_name
    }

    #[cfg(test)]
    pub(crate) fn transcript(&self) -> &[(String, String)] {
        &self.transcript
    }

    #[cfg(test)]
    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    #[cfg(test)]
    pub(crate) fn scroll(&self) -> usize {
        self.scroll
    }

    pub(crate) fn is_waiting(&self) -> bool {
        matches!(self.agent, AgentSlot::Waiting(_))
    }

    /// Ignored while a reply is pending.
    pub(crate) fn type_text(&mut self, text: &str) {
        if self.is_waiting() {
            return;
        }
        self.input.extend(text.chars().filter(|c| !c.is_control()));
    }

    pub(crate) fn erase(&mut self) {
        if !self.is_waiting() {
            self.input.pop();
        }
    }

    /// Moves a non-empty trimmed input into the transcript and returns it.
    /// Nothing happens while a reply is pending or the agent is gone.
    pub(crate) fn take_submission(&mut self) -> Option<String> {
        if !matches!(self.agent, AgentSlot::Ready(_)) {
            return None;
        }
        let message = self.input.trim().to_string();
        if message.is_empty() {
            return None;
        }
        self.input.clear();
        self.transcript
            .push((PLAYER_LABEL.to_string(), message.clone()));
        Some(message)
    }

    /// Sends `message` to the agent. Returns false when a request is
    /// already pending or the agent is gone.
    pub(crate) fn request_reply(
        &mut self,
        message: String,
        inventory: Vec<String>,
        quest_context: String,
    ) -> bool {
        let agent = match std::mem::replace(&mut self.agent, AgentSlot::Gone) {
            AgentSlot::Ready(agent) => agent,
            other => {
                self.agent = other;
                return false;
            }
        };
        let pending = dispatch(
            self.mode,
            agent,
            AgentTask::Send {
                message,
                inventory,
                quest_context,
            },
        );
        self.agent = AgentSlot::Waiting(pending);
        true
    }

    /// Collects a finished request and saves the agent's memory; the agent
    /// becomes ready again.
    pub(crate) fn poll(&mut self) -> DialoguePoll {
        let poll = match &self.agent {
            AgentSlot::Waiting(pending) => pending.poll(),
            AgentSlot::Ready(_) | AgentSlot::Gone => return DialoguePoll::Idle,
        };
        match poll {
            ReplyPoll::Waiting => DialoguePoll::Waiting,
            ReplyPoll::Ready(outcome) => {
                let mut agent = outcome.agent;
                if let Err(error) = agent.persist() {
                    warn!(npc = %self.npc_name, error = %error, "npc_memory_save_failed");
                }
                self.agent = AgentSlot::Ready(agent);
                DialoguePoll::Reply(outcome.result)
            }
            ReplyPoll::Lost => {
                self.agent = AgentSlot::Gone;
                DialoguePoll::Lost
            }
        }
    }

    /// Appends the NPC's line and snaps to the newest content.
    pub(crate) fn push_npc_line(&mut self, text: &str) {
        self.transcript
            .push((self.npc_label.clone(), text.to_string()));
        self.scroll = 0;
    }

    /// Positive steps move towards older lines.
    pub(crate) fn scroll_by(&mut self, steps: i32, metrics: &LayoutMetrics) {
        let total = self.wrapped_lines(metrics.max_chars).len();
        let requested = self.scroll as i64 + i64::from(steps);
        self.scroll = clamp_scroll(requested, total, metrics.visible_lines);
    }

    fn wrapped_lines(&self, max_chars: usize) -> Vec<String> {
        wrap_transcript(
            self.transcript
                .iter()
                .map(|(speaker, message)| (speaker.as_str(), message.as_str())),
            max_chars,
        )
    }

    /// Re-clamps the scroll offset, since the transcript may have grown.
    pub(crate) fn panel(&mut self, metrics: &LayoutMetrics) -> DialoguePanelView {
        let lines = self.wrapped_lines(metrics.max_chars);
        self.scroll = clamp_scroll(self.scroll as i64, lines.len(), metrics.visible_lines);
        let range = visible_range(lines.len(), metrics.visible_lines, self.scroll);
        DialoguePanelView {
            lines: lines[range].to_vec(),
            input: self.input.clone(),
            line_height_px: metrics.line_height_px,
            waiting_for_reply: self.is_waiting(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::agent::Emotion;

    struct CannedAgent;

    impl ConversationalAgent for CannedAgent {
        fn open(&mut self, _quest_context: &str, _inventory: &[String]) -> Result<AgentReply, AgentError> {
            Ok(AgentReply {
                text: "Bonjour voyageur".to_string(),
                emotion: Emotion::Neutre,
            })
        }

        fn send(
            &mut self,
            message: &str,
            _inventory: &[String],
            _quest_context: &str,
        ) -> Result<AgentReply, AgentError> {
            Ok(AgentReply {
                text: format!("Tu as dit {message}"),
                emotion: Emotion::Positive,
            })
        }
    }

    fn metrics(max_chars: usize, visible_lines: usize) -> LayoutMetrics {
        LayoutMetrics {
            max_chars,
            visible_lines,
            line_height_px: 24,
        }
    }

    fn opened() -> DialogueSession {
        let mut session = DialogueSession::open(
            "forgeron",
            Box::new(CannedAgent),
            DispatchMode::Inline,
            String::new(),
            Vec::new(),
        );
        match session.poll() {
            DialoguePoll::Reply(Ok(reply)) => session.push_npc_line(&reply.text),
            _ => panic!("inline opening should be ready"),
        }
        session
    }

    #[test]
    fn opening_line_is_labelled_with_the_npc_name() {
        let session = opened();
        assert_eq!(
            session.transcript(),
            &[("Forgeron".to_string(), "Bonjour voyageur".to_string())]
        );
        assert!(!session.is_waiting());
    }

    #[test]
    fn typing_and_erasing_edit_the_input() {
        let mut session = opened();
        session.type_text("salut\u{8}!");
        session.erase();
        assert_eq!(session.input(), "salut");
    }

    #[test]
    fn blank_submission_is_ignored() {
        let mut session = opened();
        session.type_text("   ");
        assert_eq!(session.take_submission(), None);
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn submit_appends_player_line_then_reply() {
        let mut session = opened();
        session.type_text("  le pont ");
        let message = session.take_submission().expect("message");
        assert_eq!(message, "le pont");
        assert_eq!(session.input(), "");
        assert_eq!(session.transcript()[1], ("Vous".to_string(), "le pont".to_string()));

        assert!(session.request_reply(message, Vec::new(), String::new()));
        assert!(session.is_waiting());
        session.type_text("ignored");
        assert_eq!(session.input(), "");

        match session.poll() {
            DialoguePoll::Reply(Ok(reply)) => {
                assert_eq!(reply.emotion, Emotion::Positive);
                session.push_npc_line(&reply.text);
            }
            _ => panic!("reply should be ready"),
        }
        assert_eq!(session.transcript()[2].1, "Tu as dit le pont");
    }

    #[test]
    fn scroll_is_clamped_to_history() {
        let mut session = opened();
        for index in 0..10 {
            session.push_npc_line(&format!("ligne {index}"));
        }
        // 11 entries, each one line plus a spacer.
        let metrics = metrics(40, 10);
        session.scroll_by(1000, &metrics);
        assert_eq!(session.scroll(), 12);
        session.scroll_by(-5, &metrics);
        assert_eq!(session.scroll(), 7);
        session.scroll_by(-50, &metrics);
        assert_eq!(session.scroll(), 0);
    }

    #[test]
    fn new_npc_line_snaps_back_to_latest() {
        let mut session = opened();
        for index in 0..10 {
            session.push_npc_line(&format!("ligne {index}"));
        }
        session.scroll_by(3, &metrics(40, 4));
        assert_eq!(session.scroll(), 3);
        session.push_npc_line("nouvelle");
        assert_eq!(session.scroll(), 0);

        let panel = session.panel(&metrics(40, 4));
        assert_eq!(panel.lines, vec!["Forgeron: ligne 9", "", "Forgeron: nouvelle", ""]);
    }
}
