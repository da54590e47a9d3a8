//! Application-wide constants
//!
//! Defaults for configuration values and the fixed layout of the sandbox and
//! the problem store.

// =============================================================================
// JUDGING DEFAULTS
// =============================================================================

/// Default size of the per-run worker pool (0 = unbounded)
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Default wall-clock limit for one sandboxed run, in milliseconds
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 10_000;

/// Default directory holding problem definitions
pub const DEFAULT_PROBLEMS_DIR: &str = "./problems";

/// Default location of the problem cache file
pub const DEFAULT_PROBLEM_CACHE_PATH: &str = ".arbiter.cache.json";

/// Default root under which staging directories are created
pub const DEFAULT_WORKSPACE_DIR: &str = ".";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "arbiter=info";

// =============================================================================
// SANDBOX LAYOUT
// =============================================================================

/// Mount point of the staged files inside the sandbox
pub const SANDBOX_WORKDIR: &str = "/app";

/// Prefix of every staging directory
pub const STAGING_PREFIX: &str = "work_dir_";

/// Prefix of every sandbox container name
pub const CONTAINER_PREFIX: &str = "arbiter";

/// Details reported when an ad-hoc run matches the reference
pub const RUN_PASS_DETAILS: &str = "Output is as expected";

// =============================================================================
// PROBLEM STORE LAYOUT
// =============================================================================

/// Problem store file and directory names
pub mod store_layout {
    pub const TESTCASES_DIR: &str = "testcases";
    pub const SOLUTION_FILE: &str = "solution.json";
    pub const SOLUTION_DIR: &str = "solution";
    pub const PROBLEM_FILE: &str = "problem.json";
    pub const INPUT_MARKER: &str = "input";
    pub const OUTPUT_MARKER: &str = "output";
}

// =============================================================================
// SUPPORTED LANGUAGES
// =============================================================================

/// Language identifiers
pub mod languages {
    pub const C: &str = "c";
    pub const CPP: &str = "cpp";
    pub const PYTHON: &str = "python";
    pub const GO: &str = "go";
    pub const RUST: &str = "rust";

    /// All supported language identifiers
    pub const ALL: &[&str] = &[CPP, C, PYTHON, GO, RUST];
}

/// Default container images for each language
pub mod container_images {
    pub const C: &str = "gcc";
    pub const CPP: &str = "gcc";
    pub const PYTHON: &str = "python:3";
    pub const GO: &str = "golang";
    pub const RUST: &str = "rust";
}
