use serde::Serialize;
use std::fmt;

#[derive(Debug, Default, Clone, Serialize)]
pub struct DebugState {
    /// Derivation passes that produced a new table view.
    pub num_derivations: usize,
    /// Derivation passes whose result equalled the current view.
    pub num_skipped: usize,
    pub num_commands: usize,
    pub num_header_clicks: usize,
    /// Last action taken (e.g. "drill_down"), for tracing host interaction.
    pub last_action: String,
    pub enabled: bool,
}

impl DebugState {
    pub fn record(&mut self, action: &str) {
        self.last_action = action.to_string();
        if self.enabled {
            log::debug!("{}", self);
        }
    }
}

impl fmt::Display for DebugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "derivations={} skipped={} commands={} clicks={} last_action={}",
            self.num_derivations,
            self.num_skipped,
            self.num_commands,
            self.num_header_clicks,
            if self.last_action.is_empty() {
                "-"
            } else {
                &self.last_action
            },
        )
    }
}
