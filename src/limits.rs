//! Process-wide safety limits bounding worst-case CPU and memory usage on
//! adversarial inputs.
//!
//! The defaults are intentionally conservative. They are plain atomics with
//! relaxed ordering: limits change rarely (typically once at startup), and a
//! stale read is harmless because every value in the window between old and
//! new limit is a sane cap.

use std::sync::atomic::{AtomicUsize, Ordering};

static MAX_INPUT_BYTES: AtomicUsize = AtomicUsize::new(10 << 20);
static MAX_TOKENS: AtomicUsize = AtomicUsize::new(1_000_000);
static MAX_PARSE_DEPTH: AtomicUsize = AtomicUsize::new(1_000);
static MAX_WALK_DEPTH: AtomicUsize = AtomicUsize::new(1_000);

/// Maximum accepted input size in bytes (default 10 MiB).
pub fn max_input_bytes() -> usize {
    MAX_INPUT_BYTES.load(Ordering::Relaxed)
}

/// Hard cap on the number of tokens a single input may produce
/// (default 1,000,000).
pub fn max_tokens() -> usize {
    MAX_TOKENS.load(Ordering::Relaxed)
}

/// Maximum nesting of arrays, objects, and class instantiations while
/// parsing (default 1,000).
pub fn max_parse_depth() -> usize {
    MAX_PARSE_DEPTH.load(Ordering::Relaxed)
}

/// Maximum depth of the value graph walked while encoding (default 1,000).
pub fn max_walk_depth() -> usize {
    MAX_WALK_DEPTH.load(Ordering::Relaxed)
}

pub fn set_max_input_bytes(limit: usize) {
    MAX_INPUT_BYTES.store(limit, Ordering::Relaxed);
}

pub fn set_max_tokens(limit: usize) {
    MAX_TOKENS.store(limit, Ordering::Relaxed);
}

pub fn set_max_parse_depth(limit: usize) {
    MAX_PARSE_DEPTH.store(limit, Ordering::Relaxed);
}

pub fn set_max_walk_depth(limit: usize) {
    MAX_WALK_DEPTH.store(limit, Ordering::Relaxed);
}
