//! Generation request assembly and screening-suggestion detection.

use solace_core::types::DocumentChunk;
use solace_screening::Screening;

use crate::generator::GeneratorMessage;

const SYSTEM_PROMPT: &str = "\
You are a supportive mental health companion for students.

IMPORTANT INSTRUCTIONS:
- Always respond empathetically and contextually to what the user says
- Use the provided chat history to maintain continuity and remember previous conversations
- Reference previous topics, concerns, or emotions the user has shared when relevant
- If the user greets you, greet them back naturally and do not use context
- If the user expresses negative emotions (sadness, anxiety, stress, loneliness, etc.), respond with empathy and understanding
- Use the context from the knowledge base to provide relevant support and advice
- Build on previous conversations - don't repeat the same advice or questions
- Show that you remember what the user has told you before
- Provide personalized, thoughtful responses based on the conversation history
- Keep responses conversational and supportive, not clinical or robotic";

/// Phrases whose presence in a reply means the model offered a screening.
pub const PROMPT_MARKERS: [&str; 3] = [
    "Would you like to take",
    "I recommend taking",
    "would you like to complete",
];

/// The suggestion the model is asked to make when a screening is due.
pub fn suggestion(screening: Screening) -> &'static str {
    match screening {
        Screening::Depression => {
            "To better understand how you're feeling and provide more personalized support, \
             I recommend taking the PHQ-9 and GAD-7 questionnaires. These are short, standard \
             tools used to assess mood and anxiety. Would you like to take them now?"
        }
        Screening::Anxiety => {
            "Now that we've talked more about how you've been feeling, would you like to \
             complete the GAD-7 questionnaire to assess your anxiety levels? It will help me \
             understand the full picture and provide better support."
        }
    }
}

fn suggestion_instruction(screening: Screening) -> String {
    match screening {
        Screening::Depression => format!(
            "- After responding to the user's message empathetically, suggest taking the \
             mental health questionnaires: '{}'",
            suggestion(screening)
        ),
        Screening::Anxiety => format!(
            "- After responding to the user's message, suggest completing the anxiety \
             assessment: '{}'",
            suggestion(screening)
        ),
    }
}

/// True if `reply` contains one of the [`PROMPT_MARKERS`] (case-sensitive).
pub fn contains_prompt_marker(reply: &str) -> bool {
    PROMPT_MARKERS.iter().any(|m| reply.contains(m))
}

/// Join retrieved chunks into a context block, keeping the first
/// `max_chars` characters of each.
pub fn context_block(chunks: &[DocumentChunk], max_chars: usize) -> String {
    chunks
        .iter()
        .map(|c| match c.content.char_indices().nth(max_chars) {
            Some((i, _)) => &c.content[..i],
            None => c.content.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the system + user message pair sent to the generator.
///
/// The system message carries the screening suggestion only when `due` is
/// set.
pub fn build_request(
    history: &str,
    input: &str,
    context: &str,
    due: Option<Screening>,
) -> Vec<GeneratorMessage> {
    let mut system = SYSTEM_PROMPT.to_string();
    if let Some(screening) = due {
        system.push('\n');
        system.push_str(&suggestion_instruction(screening));
    }

    let user = format!(
        "Chat History:\n{history}\n\nCurrent Input: {input}\n\nContext: {context}"
    );
    vec![GeneratorMessage::system(system), GeneratorMessage::user(user)]
}
