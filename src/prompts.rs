use std::fmt;

use crate::script::{IMAGE_PROMPT_SCRIPT_CHARS, Script};
use crate::services::{ChatMessage, ChatRole};

pub const COMMENTARY_SYSTEM_PROMPT: &str = "You are an expert in film analysis.";

/// Narrative position an image is meant to illustrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Beginning,
    Middle,
    End,
}

impl Segment {
    /// Generation order.
    pub const ALL: [Segment; 3] = [Segment::Beginning, Segment::Middle, Segment::End];

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Beginning => "beginning",
            Segment::Middle => "middle",
            Segment::End => "end",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Segment::Beginning => "Beginning",
            Segment::Middle => "Middle",
            Segment::End => "End",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn commentary_prompt(script: &Script) -> String {
    format!(
        "You are a helpful assistant specialized in analyzing movie scripts. \
         Given the following movie script:\n\n\
         {}\n\n\
         Provide commentary on the script that includes:\n\
         - The specific feel of the scene\n\
         - The colors associated with it\n\
         - Suggestions for how to act\n\
         - Which specific emotions to capture\n",
        script.as_str()
    )
}

pub fn commentary_messages(script: &Script) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: ChatRole::System,
            content: COMMENTARY_SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: ChatRole::User,
            content: commentary_prompt(script),
        },
    ]
}

pub fn segment_prompt(segment: Segment, script: &Script) -> String {
    format!(
        "Create a photo-like still image that represents the {segment} of this movie script. \
         Focus on capturing a cinematic moment with relevant characters, setting, and mood. \
         The script:\n\n{}\n\n\
         Generate a visually striking scene that embodies the key elements at this stage of the story.",
        script.truncated(IMAGE_PROMPT_SCRIPT_CHARS)
    )
}
