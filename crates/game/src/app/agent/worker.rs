use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::warn;

use super::{AgentError, AgentReply, ConversationalAgent};

const WORKER_THREAD_NAME: &str = "npc-agent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AgentTask {
    Open {
        quest_context: String,
        inventory: Vec<String>,
    },
    Send {
        message: String,
        inventory: Vec<String>,
        quest_context: String,
    },
}

impl AgentTask {
    fn run(self, agent: &mut dyn ConversationalAgent) -> Result<AgentReply, AgentError> {
        match self {
            AgentTask::Open {
                quest_context,
                inventory,
            } => agent.open(&quest_context, &inventory),
            AgentTask::Send {
                message,
                inventory,
                quest_context,
            } => agent.send(&message, &inventory, &quest_context),
        }
    }
}

/// The agent travels with its request and comes back with the answer.
pub(crate) struct AgentOutcome {
    pub(crate) agent: Box<dyn ConversationalAgent>,
    pub(crate) result: Result<AgentReply, AgentError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchMode {
    /// One short-lived worker thread per request.
    Thread,
    /// Runs on the caller's thread; the outcome is ready on the first poll.
    #[cfg(test)]
    Inline,
}

pub(crate) enum ReplyPoll {
    Waiting,
    Ready(AgentOutcome),
    Lost,
}

pub(crate) struct PendingReply {
    receiver: Receiver<AgentOutcome>,
}

impl PendingReply {
    pub(crate) fn poll(&self) -> ReplyPoll {
        match self.receiver.try_recv() {
            Ok(outcome) => ReplyPoll::Ready(outcome),
            Err(TryRecvError::Empty) => ReplyPoll::Waiting,
            Err(TryRecvError::Disconnected) => ReplyPoll::Lost,
        }
    }
}

pub(crate) fn dispatch(
    mode: DispatchMode,
    mut agent: Box<dyn ConversationalAgent>,
    task: AgentTask,
) -> PendingReply {
    let (sender, receiver) = mpsc::channel();
    match mode {
        #[cfg(test)]
        DispatchMode::Inline => {
            let result = task.run(agent.as_mut());
            // The receiver is alive in this scope.
            let _ = sender.send(AgentOutcome { agent, result });
        }
        DispatchMode::Thread => {
            let spawned = thread::Builder::new()
                .name(WORKER_THREAD_NAME.to_string())
                .spawn(move || {
                    let result = task.run(agent.as_mut());
                    // A closed receiver means the dialogue was abandoned.
                    let _ = sender.send(AgentOutcome { agent, result });
                });
            if let Err(error) = spawned {
                warn!(error = %error, "agent_worker_spawn_failed");
            }
        }
    }
    PendingReply { receiver }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::app::agent::Emotion;

    struct EchoAgent;

    impl ConversationalAgent for EchoAgent {
        fn open(&mut self, _quest_context: &str, inventory: &[String]) -> Result<AgentReply, AgentError> {
            Ok(AgentReply {
                text: format!("{} objets", inventory.len()),
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
                text: message.to_uppercase(),
                emotion: Emotion::Positive,
            })
        }
    }

    fn wait_for(pending: &PendingReply) -> AgentOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match pending.poll() {
                ReplyPoll::Ready(outcome) => return outcome,
                ReplyPoll::Lost => panic!("worker lost"),
                ReplyPoll::Waiting => {
                    assert!(Instant::now() < deadline, "worker timed out");
                    thread::sleep(Duration::from_millis(5));
                }
            }
        }
    }

    #[test]
    fn inline_dispatch_is_ready_immediately() {
        let pending = dispatch(
            DispatchMode::Inline,
            Box::new(EchoAgent),
            AgentTask::Open {
                quest_context: String::new(),
                inventory: vec!["planche".to_string()],
            },
        );
        match pending.poll() {
            ReplyPoll::Ready(outcome) => {
                assert_eq!(outcome.result.expect("reply").text, "1 objets");
            }
            _ => panic!("inline reply should be ready"),
        }
    }

    #[test]
    fn thread_dispatch_returns_agent_and_reply() {
        let pending = dispatch(
            DispatchMode::Thread,
            Box::new(EchoAgent),
            AgentTask::Send {
                message: "salut".to_string(),
                inventory: Vec::new(),
                quest_context: String::new(),
            },
        );
        let outcome = wait_for(&pending);
        let reply = outcome.result.expect("reply");
        assert_eq!(reply.text, "SALUT");
        assert_eq!(reply.emotion, Emotion::Positive);
    }
}
