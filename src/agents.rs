//! The five roles of the story-crafting chain. Each role binds an
//! instruction (compiled in from `prompts/`) and the tools it may use; the
//! workflow walks the chain in order and uses the instructions as system
//! prompts where a stage talks to the model.

pub const LIBRARIAN: &str = "Librarian";
pub const PERSONALIZATION: &str = "PersonalizationInterviewer";
pub const STORYTELLER: &str = "Storyteller";
pub const ILLUSTRATOR: &str = "Illustrator";
pub const FORMATTER: &str = "Formatter";

#[derive(Debug, Clone)]
pub struct AgentRole {
    pub name: &'static str,
    pub model: &'static str,
    pub instruction: &'static str,
    pub tools: &'static [&'static str],
}

/// The fixed hand-off chain, in execution order.
pub fn handoff_chain() -> Vec<AgentRole> {
    vec![
        AgentRole {
            name: LIBRARIAN,
            model: "gemini-2.0-flash-exp",
            instruction: include_str!("../prompts/librarian.md"),
            tools: &["list_books", "get_book", "get_characters"],
        },
        AgentRole {
            name: PERSONALIZATION,
            model: "gemini-2.0-flash-exp",
            instruction: include_str!("../prompts/personalization.md"),
            tools: &["submit_personalization_profile"],
        },
        AgentRole {
            name: STORYTELLER,
            model: "gemini-2.5-pro",
            instruction: include_str!("../prompts/storyteller.md"),
            tools: &["get_book", "submit_story_with_prompts"],
        },
        AgentRole {
            name: ILLUSTRATOR,
            model: "gemini-2.5-pro",
            instruction: include_str!("../prompts/illustration.md"),
            tools: &["generate_image"],
        },
        AgentRole {
            name: FORMATTER,
            model: "gemini-2.5-pro",
            instruction: include_str!("../prompts/formatter.md"),
            tools: &["save_formatted_story"],
        },
    ]
}

pub fn role(name: &str) -> Option<AgentRole> {
    handoff_chain().into_iter().find(|r| r.name == name)
}
