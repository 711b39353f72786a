use serde::{Deserialize, Serialize};

/// Builder interaction state. Lives beside a layout, never inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationState {
    pub selected: Option<String>,
    pub binding: Option<String>,
    pub read_only: bool,
}

impl PresentationState {
    pub fn viewer() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn select(&mut self, component_id: impl Into<String>) {
        if !self.read_only {
            self.selected = Some(component_id.into());
        }
    }

    pub fn begin_binding(&mut self, component_id: impl Into<String>) {
        if !self.read_only {
            self.binding = Some(component_id.into());
        }
    }

    pub fn is_selected(&self, component_id: &str) -> bool {
        self.selected.as_deref() == Some(component_id)
    }

    pub fn is_binding(&self, component_id: &str) -> bool {
        self.binding.as_deref() == Some(component_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_ignores_selection() {
        let mut state = PresentationState::viewer();
        state.select("a");
        state.begin_binding("a");
        assert!(!state.is_selected("a"));
        assert!(!state.is_binding("a"));
    }

    #[test]
    fn test_editor_tracks_one_selection() {
        let mut state = PresentationState::default();
        state.select("a");
        state.select("b");
        state.begin_binding("a");
        assert!(!state.is_selected("a"));
        assert!(state.is_selected("b"));
        assert!(state.is_binding("a"));
    }
}
