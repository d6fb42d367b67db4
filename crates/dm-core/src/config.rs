/// Default cap on Rerun-driven passes over a character's rules.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Runtime configuration for a world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of passes a character's rule set may take before the
    /// engine gives up and returns the scope as it stands.
    pub max_iterations: usize,
    /// Value of the world clock when the world is created.
    pub start_hour: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            start_hour: 0,
        }
    }
}

impl EngineConfig {
    /// Set the rule-evaluation iteration cap.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the initial clock value in hours.
    pub fn with_start_hour(mut self, hour: i64) -> Self {
        self.start_hour = hour;
        self
    }
}
