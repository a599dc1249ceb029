//! Templated response composer. There is no model behind it: the answer is
//! the retrieved context followed by a canned persona note.

use asklyn_core::config::IdentityConfig;

const NO_CONTEXT: &str = "No specific context found.";

/// Formats retrieved context and the user query into the final reply.
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    persona: String,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::from_config(&IdentityConfig::default())
    }
}

impl ResponseComposer {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    pub fn from_config(identity: &IdentityConfig) -> Self {
        Self::new(identity.name.clone())
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Build the reply for `query` from the retrieved `context`.
    pub fn compose(&self, query: &str, context: &[String]) -> String {
        let context_str = if context.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            context.join("\n")
        };

        format!(
            "**Analysis based on Knowledge Base:**\n\n{context_str}\n\n\
             **{persona}'s Insight:**\n I've processed your query about '{query}'. \
             Based on the data I have, it seems like we are discussing the core \
             capabilities of this system. Is there anything specific about the \
             implementation you'd like to know?",
            persona = self.persona,
        )
    }
}
