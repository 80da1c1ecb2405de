/// Memory given to a simulator unless configured otherwise (1 MiB)
pub const DEFAULT_MEMORY_SIZE: usize = 1 << 20;

/// Step budget for [`crate::Simulator::run`] callers that do not pick one
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Size of the flat memory buffer in bytes
    pub memory_size: usize,

    /// Default step budget for a run
    pub max_steps: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { memory_size: DEFAULT_MEMORY_SIZE, max_steps: DEFAULT_MAX_STEPS }
    }
}
