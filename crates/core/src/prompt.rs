//! Prompt compiler: scenario input to model-ready prompt strings.
//!
//! All functions here are pure and total. Empty or missing scenario fields
//! appear as empty substrings rather than errors.

use crate::scenario::Scenario;

/// Number of leading words used when an image prompt is derived from a story.
pub const DEFAULT_EXCERPT_WORDS: usize = 10;

/// Compile the text-model prompt for a scenario.
///
/// Template:
/// `Write a detailed and creative story in the {scene} scene where {characters}. Scenario: {scenario}.`
/// where each character renders as `{name} who is feeling {emotions}` and
/// characters are joined with `", "`.
///
/// # Examples
///
/// ```
/// use storyloom_core::prompt::compile_story_prompt;
/// use storyloom_core::scenario::{Character, Scenario};
///
/// let scenario = Scenario {
///     scene: "forest".into(),
///     scenario: "a lost key".into(),
///     characters: vec![Character::new("Mira", "joyful")],
/// };
/// assert_eq!(
///     compile_story_prompt(&scenario),
///     "Write a detailed and creative story in the forest scene where \
///      Mira who is feeling joyful. Scenario: a lost key."
/// );
/// ```
pub fn compile_story_prompt(scenario: &Scenario) -> String {
    let characters = scenario
        .characters
        .iter()
        .map(|c| format!("{} who is feeling {}", c.name, c.emotions.describe()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Write a detailed and creative story in the {} scene where {}. Scenario: {}.",
        scenario.scene, characters, scenario.scenario
    )
}

/// Compile the image-model prompt. The caller's prompt is passed through
/// untouched.
pub fn compile_image_prompt(user_prompt: &str) -> String {
    user_prompt.to_string()
}

/// Take the first `max_words` whitespace-separated words of `text`, joined by
/// single spaces.
pub fn excerpt_prompt(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
