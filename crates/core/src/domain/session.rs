use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

fn session_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/sessions/(.*?)/contexts/").ok()).as_ref()
}

impl SessionId {
    /// Pulls the id out of a context path such as
    /// `projects/p/agent/sessions/<id>/contexts/ongoing-order`.
    /// Paths without that shape yield the empty id.
    pub fn from_context_path(path: &str) -> Self {
        let id = session_pattern()
            .and_then(|pattern| pattern.captures(path))
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str().to_owned())
            .unwrap_or_default();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionId;

    #[test]
    fn extracts_id_between_sessions_and_contexts() {
        let id = SessionId::from_context_path(
            "projects/chatbot-deew/agent/sessions/a871bc7d-43fa-78b8-6ef5-0f5a0c15645c/contexts/__system_counters__",
        );
        assert_eq!(id.as_str(), "a871bc7d-43fa-78b8-6ef5-0f5a0c15645c");
    }

    #[test]
    fn stops_at_the_first_contexts_segment() {
        let id = SessionId::from_context_path("a/sessions/s-1/contexts/x/sessions/s-2/contexts/y");
        assert_eq!(id.as_str(), "s-1");
    }

    #[test]
    fn unmatched_path_gives_empty_id() {
        assert_eq!(
            SessionId::from_context_path("projects/p/agent/sessions/s-1"),
            SessionId::default()
        );
        assert_eq!(SessionId::from_context_path(""), SessionId::default());
    }
}
