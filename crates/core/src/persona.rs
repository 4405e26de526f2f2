//! Instruction source — persona/system-instruction lookup per role.
//!
//! The loop asks for the system instruction matching its active role and
//! injects it into every completion request. The content is opaque to the
//! core; `alfred-agent` ships the default persona book.

/// Provides the system instruction for a given role.
pub trait InstructionSource: Send + Sync {
    /// The instruction text for `role`. Unknown roles get a generic fallback;
    /// this never fails.
    fn instruction(&self, role: &str) -> String;
}

/// A fixed instruction regardless of role. Useful for tests and sub-agents
/// that carry a mission-specific prompt.
pub struct StaticInstruction(pub String);

impl InstructionSource for StaticInstruction {
    fn instruction(&self, _role: &str) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_instruction_ignores_role() {
        let source = StaticInstruction("You are a test assistant.".into());
        assert_eq!(source.instruction("ceo"), "You are a test assistant.");
        assert_eq!(source.instruction("anything"), "You are a test assistant.");
    }
}
