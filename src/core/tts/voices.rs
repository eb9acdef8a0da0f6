//! Voice catalogue for the Riva synthesizer

use serde::Serialize;

/// A selectable synthesis voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Voice {
    /// Voice identifier passed to the synthesizer
    pub id: &'static str,
    pub gender: &'static str,
    /// Emotional style, "Neutral" when the voice has none
    pub style: &'static str,
}

const EN_US_VOICES: &[Voice] = &[
    Voice { id: "English-US.Female-1", gender: "Female", style: "Neutral" },
    Voice { id: "English-US.Male-1", gender: "Male", style: "Neutral" },
    Voice { id: "English-US.Female-Neutral", gender: "Female", style: "Neutral" },
    Voice { id: "English-US.Male-Neutral", gender: "Male", style: "Neutral" },
    Voice { id: "English-US.Female-Angry", gender: "Female", style: "Angry" },
    Voice { id: "English-US.Male-Angry", gender: "Male", style: "Angry" },
    Voice { id: "English-US.Female-Calm", gender: "Female", style: "Calm" },
    Voice { id: "English-US.Male-Calm", gender: "Male", style: "Calm" },
    Voice { id: "English-US.Female-Fearful", gender: "Female", style: "Fearful" },
    Voice { id: "English-US.Female-Happy", gender: "Female", style: "Happy" },
    Voice { id: "English-US.Male-Happy", gender: "Male", style: "Happy" },
    Voice { id: "English-US.Female-Sad", gender: "Female", style: "Sad" },
];

/// Languages with a known voice list
pub fn supported_languages() -> &'static [&'static str] {
    &["en-US"]
}

/// Voices available for a language code, `None` for unknown languages.
pub fn available_voices(language_code: &str) -> Option<&'static [Voice]> {
    match language_code {
        "en-US" => Some(EN_US_VOICES),
        _ => None,
    }
}

/// Whether `voice` can be used with `language_code`
pub fn is_voice_available(language_code: &str, voice: &str) -> bool {
    available_voices(language_code)
        .map(|voices| voices.iter().any(|v| v.id == voice))
        .unwrap_or(false)
}
