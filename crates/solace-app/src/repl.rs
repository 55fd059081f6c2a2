//! Line-driven terminal front-end for a chat session.
//!
//! Each input line is either a chat turn, a yes/no answer to a screening
//! offer, or a questionnaire answer, depending on what the previous line
//! left pending. In quiet mode nothing is rendered and the caller prints the
//! risk report at the end.

use std::io::Write;

use solace_chat::replies::offer_question;
use solace_chat::{AnswerStep, ChatError, ChatSession};
use solace_screening::{Question, Screening, ANSWER_OPTIONS};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const BANNER: &str = "🧠 Student Mental Health Support Bot\n\
    Type a message to chat. Commands: /debug, /report, /quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Chat,
    Offer(Screening),
    Question,
}

pub struct Repl<W: Write> {
    session: ChatSession,
    out: W,
    quiet: bool,
    pending: Pending,
}

impl<W: Write> Repl<W> {
    pub fn new(session: ChatSession, out: W, quiet: bool) -> Self {
        Self {
            session,
            out,
            quiet,
            pending: Pending::Chat,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Consume lines until EOF or `/quit`.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> std::io::Result<()> {
        self.say(BANNER)?;
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line {
                "/quit" => break,
                "/debug" => {
                    self.show_diagnostics()?;
                    continue;
                }
                "/report" => {
                    let report = self.session.risk_report().to_json();
                    self.say(&report)?;
                    continue;
                }
                _ => {}
            }
            match self.pending {
                Pending::Chat => self.chat_line(line).await?,
                Pending::Offer(screening) => self.offer_line(screening, line)?,
                Pending::Question => self.answer_line(line)?,
            }
        }
        Ok(())
    }

    fn show_diagnostics(&mut self) -> std::io::Result<()> {
        let diagnostics = self.session.diagnostics();
        let json = serde_json::to_string_pretty(&diagnostics)
            .unwrap_or_else(|e| format!("diagnostics unavailable: {e}"));
        self.say(&json)
    }

    async fn chat_line(&mut self, line: &str) -> std::io::Result<()> {
        match self.session.generate_reply(line).await {
            Ok(reply) => {
                self.say(&reply.text)?;
                if reply.show_buttons {
                    self.pending = Pending::Offer(reply.test_type);
                    self.render_offer(reply.test_type)?;
                }
            }
            Err(ChatError::EmptyMessage) => {}
            Err(e) => self.say(&format!("⚠️ {e}"))?,
        }
        Ok(())
    }

    fn offer_line(&mut self, screening: Screening, line: &str) -> std::io::Result<()> {
        match line.to_ascii_lowercase().as_str() {
            "1" | "y" | "yes" => match self.session.start_test(screening) {
                Ok(Some(question)) => {
                    self.pending = Pending::Question;
                    self.render_question(&question)
                }
                Ok(None) => {
                    self.pending = Pending::Chat;
                    Ok(())
                }
                Err(e) => {
                    self.pending = Pending::Chat;
                    self.say(&format!("⚠️ {e}"))
                }
            },
            "2" | "n" | "no" => {
                self.pending = Pending::Chat;
                let reply = self.session.decline_test(screening);
                self.say(&reply)
            }
            _ => self.say("Please choose 1 (yes) or 2 (no)."),
        }
    }

    fn answer_line(&mut self, line: &str) -> std::io::Result<()> {
        // Only the listed options are offered; other numbers are re-asked.
        // Anything that is not a number goes to the session, which abandons
        // the questionnaire.
        if let Ok(n) = line.parse::<i64>() {
            if !ANSWER_OPTIONS.iter().any(|o| o.score == n) {
                return self.say("Please choose one of the options 0-3.");
            }
        }

        match self.session.record_answer(line) {
            Ok(AnswerStep::Next(question)) => self.render_question(&question),
            Ok(AnswerStep::Completed {
                message, notice, ..
            }) => {
                self.pending = Pending::Chat;
                self.say(&message)?;
                if let Some(notice) = notice {
                    self.say(&notice)?;
                }
                Ok(())
            }
            Ok(AnswerStep::Abandoned { message }) => {
                self.pending = Pending::Chat;
                self.say(&message)
            }
            Err(e) => {
                debug!(error = %e, "Answer rejected");
                self.pending = Pending::Chat;
                self.say(&format!("⚠️ {e}"))
            }
        }
    }

    fn render_offer(&mut self, screening: Screening) -> std::io::Result<()> {
        self.say(offer_question(screening))?;
        self.say("  1) Yes, start now\n  2) No, maybe later")
    }

    fn render_question(&mut self, question: &Question) -> std::io::Result<()> {
        self.say(&question.to_string())?;
        let options = ANSWER_OPTIONS
            .iter()
            .map(|o| format!("  {}: {}", o.score, o.label))
            .collect::<Vec<_>>()
            .join("\n");
        self.say(&options)
    }

    fn say(&mut self, text: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }
}
