// Fetchkit - a configurable HTTP request helper for Rust
//
// This library provides a request pipeline with factory defaults, verb
// shortcuts, interceptor hooks, timeout cancellation and one-shot retry.

// Re-export the pipeline
pub use fetchkit_client::*;
