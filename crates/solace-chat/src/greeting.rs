//! Greeting detection.
//!
//! Greetings get a fixed reply and do not count as exchanges for the
//! questionnaire cadence.

const GREETINGS: [&str; 6] = [
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
];

/// Words that turn a short message containing a greeting into small talk
/// ("hi how are you").
const SMALL_TALK: [&str; 4] = ["how", "are", "you", "doing"];

const MAX_SMALL_TALK_WORDS: usize = 4;

/// True if `text` is a greeting.
///
/// Matches when the lowercased, trimmed text is a greeting, or starts with
/// one followed by a space or comma, or is at most four words long, contains
/// a greeting, and contains one of the small-talk words. The last two checks
/// are plain substring tests, so "i think you are" counts ("hi" in "think").
pub fn is_greeting(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    let word_count = text.split_whitespace().count();
    let small_talk = SMALL_TALK.iter().any(|w| text.contains(w));

    GREETINGS.iter().any(|greeting| {
        text == *greeting
            || text
                .strip_prefix(greeting)
                .is_some_and(|rest| rest.starts_with(' ') || rest.starts_with(','))
            || (text.contains(greeting) && word_count <= MAX_SMALL_TALK_WORDS && small_talk)
    })
}
