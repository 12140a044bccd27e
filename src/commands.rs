/// Prompts that are handled locally instead of being sent to the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedPrompt {
    Restart,
    Costs,
}

impl ReservedPrompt {
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Costs => "costs",
        }
    }
}

/// Matches the whole prompt verbatim, so `"restart please"` or `" costs"` go
/// to the assistant like any other text.
pub fn parse_reserved_prompt(input: &str) -> Option<ReservedPrompt> {
    match input {
        "restart" => Some(ReservedPrompt::Restart),
        "costs" => Some(ReservedPrompt::Costs),
        _ => None,
    }
}
