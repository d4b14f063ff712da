//! Output pane state shared by the explorer tabs
//!
//! Every pane shows exactly one of: waiting for input, in progress, an
//! error message, or a result. Empty input is not an error; it resets the
//! pane to `Waiting`.

use serde::Serialize;

/// What an output pane currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ViewState<T> {
    /// No usable input; carries the prompt text
    Waiting(String),
    /// Request issued; carries the progress text
    InProgress(String),
    /// Request failed; carries the user-facing message
    Failed(String),
    /// Request succeeded
    Ready(T),
}

impl<T> ViewState<T> {
    /// True while a request is outstanding
    pub fn is_in_progress(&self) -> bool {
        matches!(self, ViewState::InProgress(_))
    }

    /// True for the error state
    pub fn is_failed(&self) -> bool {
        matches!(self, ViewState::Failed(_))
    }

    /// Result, if ready
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Prompt, progress or error text; `None` when ready
    pub fn message(&self) -> Option<&str> {
        match self {
            ViewState::Waiting(msg) | ViewState::InProgress(msg) | ViewState::Failed(msg) => {
                Some(msg)
            },
            ViewState::Ready(_) => None,
        }
    }
}

/// Markdown greeting for the hello-world tab
pub fn greet(name: &str) -> String {
    format!("Hello, **{}**!", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greet() {
        assert_eq!(greet("World"), "Hello, **World**!");
        assert_eq!(greet(""), "Hello, ****!");
    }

    #[test]
    fn test_view_state_accessors() {
        let waiting: ViewState<u32> = ViewState::Waiting("Enter input".to_string());
        assert_eq!(waiting.message(), Some("Enter input"));
        assert!(waiting.ready().is_none());

        let ready = ViewState::Ready(3u32);
        assert_eq!(ready.ready(), Some(&3));
        assert!(ready.message().is_none());
        assert!(!ready.is_failed());
    }

    #[test]
    fn test_view_state_serialization() {
        let state: ViewState<u32> = ViewState::Failed("Error: boom".to_string());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["data"], "Error: boom");
    }
}
