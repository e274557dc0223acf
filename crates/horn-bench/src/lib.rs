//! Benchmark-only crate; see `benches/core.rs`.
