//! Engine configuration.

/// Tunable limits and defaults for loading and running a game.
///
/// Limits fail soft: when one is exceeded the engine logs a diagnostic and
/// treats the offending call as a no-op or as "false".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of state snapshots kept for `undo`.
    pub undo_capacity: usize,

    /// Maximum nesting of procedure and function frames.
    pub max_call_depth: usize,

    /// Maximum depth followed along a `type` chain.
    pub max_type_depth: usize,

    /// Maximum iterations of a single `repeat` or `for` loop.
    pub max_loop_iterations: usize,

    /// Highest slot a script may write in an array variable.
    pub max_array_index: usize,

    /// Seed for the `$rand(...)$` generator.
    pub rng_seed: u64,

    /// Echo each command back as `> command` before running it.
    pub echo_commands: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            undo_capacity: 20,
            max_call_depth: 64,
            max_type_depth: 32,
            max_loop_iterations: 10_000,
            max_array_index: 65_535,
            rng_seed: 0,
            echo_commands: true,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the undo capacity.
    #[must_use]
    pub fn with_undo_capacity(mut self, capacity: usize) -> Self {
        self.undo_capacity = capacity;
        self
    }

    /// Builder method to set the call depth ceiling.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Builder method to set the type chain depth ceiling.
    #[must_use]
    pub fn with_max_type_depth(mut self, depth: usize) -> Self {
        self.max_type_depth = depth;
        self
    }

    /// Builder method to set the loop iteration ceiling.
    #[must_use]
    pub fn with_max_loop_iterations(mut self, iterations: usize) -> Self {
        self.max_loop_iterations = iterations;
        self
    }

    /// Builder method to set the array index ceiling.
    #[must_use]
    pub fn with_max_array_index(mut self, index: usize) -> Self {
        self.max_array_index = index;
        self
    }

    /// Builder method to set the random seed.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Builder method to enable/disable command echo.
    #[must_use]
    pub fn with_echo_commands(mut self, echo: bool) -> Self {
        self.echo_commands = echo;
        self
    }
}
