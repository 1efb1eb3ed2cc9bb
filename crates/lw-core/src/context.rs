//! State carried across lines and files during a metric pass.

/// Derived context threaded through every processed line, in discovery
/// order. It is never reset between files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatefulContext {
    current_network_type: Option<String>,
}

impl StatefulContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The network type set by the most recent transition, if any.
    pub fn current_network_type(&self) -> Option<&str> {
        self.current_network_type.as_deref()
    }

    /// Records a network type transition.
    ///
    /// Returns `true` if the carried type actually changed.
    pub fn observe_network_type(&mut self, new_type: &str) -> bool {
        if self.current_network_type.as_deref() == Some(new_type) {
            return false;
        }
        self.current_network_type = Some(new_type.to_string());
        true
    }
}
