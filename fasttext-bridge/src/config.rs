//! Bridge constants
//!
//! File naming conventions, status codes, and logging defaults live here so the
//! C surface, the Rust API and the CLI agree on them.

/// File extensions appended to an output base path.
pub mod artifacts {
    pub const MODEL_EXT: &str = "bin";
    pub const QUANTIZED_EXT: &str = "ftz";
    pub const VECTORS_EXT: &str = "vec";
    pub const OUTPUT_EXT: &str = "output";
}

/// Integer results of the C ABI. Every failure is negative.
pub mod status {
    pub const OK: i32 = 0;
    pub const NOT_FOUND: i32 = -1;
    pub const NOT_READY: i32 = -2;
    pub const SIZE_MISMATCH: i32 = -3;
    pub const WRITE_ERROR: i32 = -4;
    pub const INVALID_ARGUMENT: i32 = -5;
    pub const ENGINE_ERROR: i32 = -6;
    pub const INVALID_INPUT: i32 = -7;
    pub const PANIC: i32 = -8;

    /// The only failure value of the load, dimension, sentence vector and
    /// save calls; the precise code is kept for `ft_last_error_code`
    pub const FAILURE: i32 = -1;
}

/// Engine command-line grammar.
pub mod args {
    /// argv[0] of the positional argument list
    pub const PROGRAM_NAME: &str = "fasttext";
    pub const QUANTIZE_COMMAND: &str = "quantize";

    /// Decimal places used when rendering the learning rate
    pub const LR_PRECISION: usize = 6;
}

pub mod logging {
    /// Environment variable read for the log filter
    pub const FILTER_ENV: &str = "FASTTEXT_BRIDGE_LOG";
    pub const DEFAULT_FILTER: &str = "fasttext_bridge=info";
}
