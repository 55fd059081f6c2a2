//! Chat session: one user's conversation, turn by turn.
//!
//! The session owns the message log, the cadence counters, and the
//! questionnaire in progress. The retriever and generator are shared
//! collaborators; the retriever is read-only and may back many sessions.

use std::sync::Arc;

use serde::Serialize;
use solace_core::config::{PromptSignal, SolaceConfig};
use solace_core::types::ChatMessage;
use solace_screening::{
    AnswerOutcome, Completion, Question, QuestionnaireSession, RiskLevel, Screening,
    ScreeningError,
};
use solace_vector::Retriever;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ChatError;
use crate::generator::DialogueGenerator;
use crate::greeting::is_greeting;
use crate::history::MessageLog;
use crate::prompt::{build_request, contains_prompt_marker, context_block, suggestion};
use crate::replies::{
    completion_message, decline_reply, GENERATION_APOLOGY, GREETING_REPLY, QUESTIONNAIRE_ERROR,
    REPLY_PREFIX,
};
use crate::report::{RiskFile, RiskReport};
use crate::state::ConversationState;

/// Tunables for a session, normally taken from [`SolaceConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub top_k: usize,
    pub context_chars: usize,
    pub history_window: usize,
    pub max_retained_messages: usize,
    pub prompt_signal: PromptSignal,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&SolaceConfig::default())
    }
}

impl SessionOptions {
    pub fn from_config(config: &SolaceConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            context_chars: config.retrieval.context_chars,
            history_window: config.chat.history_window,
            max_retained_messages: config.chat.max_retained_messages,
            prompt_signal: config.chat.prompt_signal,
        }
    }
}

/// The bot's answer to one free-text turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Whether the yes/no screening controls should be shown.
    pub show_buttons: bool,
    /// The screening the controls refer to.
    pub test_type: Screening,
}

/// What happened after a questionnaire answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerStep {
    /// Show the next item.
    Next(Question),
    /// The screening finished.
    Completed {
        completion: Completion,
        message: String,
        overall: Option<RiskLevel>,
        /// Set when the risk score could not be saved.
        notice: Option<String>,
    },
    /// The answer was unusable; the questionnaire was abandoned.
    Abandoned { message: String },
}

/// Snapshot of session state for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub session_id: Uuid,
    pub exchange_count: u32,
    pub messages_in_memory: usize,
    pub recent_conversations: usize,
    pub prompted_for_test: bool,
    pub test_declined_count: u32,
    pub chats_since_decline: u32,
    pub questionnaire_active: Option<Screening>,
    pub phq9_completed: bool,
    pub gad7_completed: bool,
    pub post_phq_exchanges: u32,
    pub phq9_risk: Option<RiskLevel>,
    pub gad7_risk: Option<RiskLevel>,
    pub overall_risk: Option<RiskLevel>,
}

pub struct ChatSession {
    id: Uuid,
    retriever: Arc<Retriever>,
    generator: Arc<dyn DialogueGenerator>,
    options: SessionOptions,
    state: ConversationState,
    messages: MessageLog,
    questionnaire: QuestionnaireSession,
    risk_file: Option<RiskFile>,
}

impl ChatSession {
    pub fn new(
        retriever: Arc<Retriever>,
        generator: Arc<dyn DialogueGenerator>,
        options: SessionOptions,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "Chat session created");
        Self {
            id,
            retriever,
            generator,
            messages: MessageLog::new(options.max_retained_messages),
            options,
            state: ConversationState::new(),
            questionnaire: QuestionnaireSession::new(),
            risk_file: None,
        }
    }

    /// Write the overall risk level to `file` when both screenings finish.
    pub fn with_risk_file(mut self, file: RiskFile) -> Self {
        self.risk_file = Some(file);
        self
    }

    /// Handle one free-text turn.
    ///
    /// Free text is refused while a questionnaire is running; answers go
    /// through [`ChatSession::record_answer`]. A generator failure becomes an
    /// apology reply rather than an error.
    pub async fn generate_reply(&mut self, input: &str) -> Result<Reply, ChatError> {
        if input.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.questionnaire.is_in_progress() {
            return Err(ChatError::QuestionnaireInProgress);
        }

        self.messages.push(ChatMessage::user(input));

        if is_greeting(input) {
            debug!(session = %self.id, "Greeting; skipping retrieval and generation");
            self.push_assistant(GREETING_REPLY);
            return Ok(Reply {
                text: GREETING_REPLY.to_string(),
                show_buttons: false,
                test_type: Screening::Depression,
            });
        }

        self.state.record_exchange();

        let chunks = match self.retriever.retrieve(input, self.options.top_k).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Retrieval failed; continuing without context");
                Vec::new()
            }
        };
        let context = context_block(&chunks, self.options.context_chars);
        let history = self.messages.transcript(self.options.history_window);

        let due = self
            .state
            .should_prompt_for_test(self.questionnaire.is_in_progress());
        let test_type = due.unwrap_or(Screening::Depression);

        let request = build_request(&history, input, &context, due);
        let (text, show_buttons) = match self.generator.generate(&request).await {
            Ok(generated) => self.apply_prompt_signal(generated, due),
            Err(e) => {
                warn!(session = %self.id, error = %e, "Generation failed; replying with apology");
                (GENERATION_APOLOGY.to_string(), false)
            }
        };

        if show_buttons {
            self.state.mark_prompted();
            info!(session = %self.id, screening = %test_type, "Offering screening");
        }

        self.push_assistant(&text);
        debug!(
            session = %self.id,
            exchange_count = self.state.exchange_count(),
            context_chunks = chunks.len(),
            show_buttons,
            "Turn complete"
        );

        Ok(Reply {
            text,
            show_buttons,
            test_type,
        })
    }

    /// Prefix the reply and decide whether the yes/no controls are shown.
    fn apply_prompt_signal(&self, generated: String, due: Option<Screening>) -> (String, bool) {
        let Some(screening) = due else {
            return (format!("{REPLY_PREFIX}{generated}"), false);
        };
        match self.options.prompt_signal {
            PromptSignal::Markers => {
                let show = contains_prompt_marker(&generated);
                (format!("{REPLY_PREFIX}{generated}"), show)
            }
            PromptSignal::Decision => {
                let text = if contains_prompt_marker(&generated) {
                    format!("{REPLY_PREFIX}{generated}")
                } else {
                    format!("{REPLY_PREFIX}{generated}\n\n{}", suggestion(screening))
                };
                (text, true)
            }
        }
    }

    /// The user turned down the offered screening. Returns the reply shown.
    pub fn decline_test(&mut self, screening: Screening) -> String {
        self.state.decline(screening);
        info!(session = %self.id, screening = %screening, "Screening declined");
        let reply = decline_reply(screening);
        self.push_assistant(reply);
        reply.to_string()
    }

    /// Begin a screening from its first item.
    ///
    /// GAD-7 cannot start before PHQ-9 has completed.
    pub fn start_test(&mut self, screening: Screening) -> Result<Option<Question>, ChatError> {
        if !self.state.can_start(screening) {
            let requires = screening.prerequisite().unwrap_or(Screening::Depression);
            return Err(ScreeningError::OutOfOrder {
                screening,
                requires,
            }
            .into());
        }

        self.state.accept_prompt();
        let question = self.questionnaire.start(screening);
        if let Some(q) = &question {
            self.push_assistant(&q.to_string());
        }
        Ok(question)
    }

    /// Record an answer to the current questionnaire item.
    ///
    /// An answer that is not a whole number abandons the questionnaire and
    /// returns [`AnswerStep::Abandoned`] with an apology; chat resumes.
    pub fn record_answer(&mut self, raw: &str) -> Result<AnswerStep, ChatError> {
        match self.questionnaire.record_answer(raw) {
            Ok(AnswerOutcome::Next(question)) => {
                self.push_assistant(&question.to_string());
                Ok(AnswerStep::Next(question))
            }
            Ok(AnswerOutcome::Completed(completion)) => Ok(self.complete(completion)),
            Err(ScreeningError::InvalidAnswer(_)) => {
                self.push_assistant(QUESTIONNAIRE_ERROR);
                Ok(AnswerStep::Abandoned {
                    message: QUESTIONNAIRE_ERROR.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn complete(&mut self, completion: Completion) -> AnswerStep {
        self.state.record_completion(&completion);
        let overall = self.state.overall_risk();

        let message = completion_message(
            &completion,
            self.state.phq9_risk(),
            self.state.gad7_risk(),
            overall,
        );
        self.push_assistant(&message);

        let mut notice = None;
        if let (Screening::Anxiety, Some(level), Some(file)) =
            (completion.screening, overall, &self.risk_file)
        {
            if let Err(e) = file.write(level) {
                notice = Some(format!("Note: {e}"));
            }
        }

        AnswerStep::Completed {
            completion,
            message,
            overall,
            notice,
        }
    }

    fn push_assistant(&mut self, text: &str) {
        self.messages.push(ChatMessage::assistant(text));
    }

    pub fn overall_risk(&self) -> Option<RiskLevel> {
        self.state.overall_risk()
    }

    pub fn risk_report(&self) -> RiskReport {
        RiskReport::new(self.overall_risk())
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            session_id: self.id,
            exchange_count: self.state.exchange_count(),
            messages_in_memory: self.messages.len(),
            recent_conversations: (self.messages.len() / 2).min(self.options.history_window / 2),
            prompted_for_test: self.state.prompted_for_test(),
            test_declined_count: self.state.test_declined_count(),
            chats_since_decline: self.state.chats_since_decline(),
            questionnaire_active: self.questionnaire.active_screening(),
            phq9_completed: self.state.phq9_completed(),
            gad7_completed: self.state.gad7_completed(),
            post_phq_exchanges: self.state.post_phq_exchanges(),
            phq9_risk: self.state.phq9_risk(),
            gad7_risk: self.state.gad7_risk(),
            overall_risk: self.state.overall_risk(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn current_question(&self) -> Option<Question> {
        self.questionnaire.current_question()
    }

    pub fn in_questionnaire(&self) -> bool {
        self.questionnaire.is_in_progress()
    }
}
