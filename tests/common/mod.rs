//! Shared helpers for integration tests.

#![allow(clippy::nursery)] // Test infra prioritizes clarity over pedantry
#![allow(clippy::pedantic)] // Test infra prioritizes clarity over pedantry
#![allow(dead_code)] // Shared test helper; not every integration test uses every helper

pub mod input_sim;

use glyphcaret::CaretEngine;

/// Engine holding `text`, laid out by the default monospace shaper.
pub fn engine(text: &str) -> CaretEngine {
    let mut e = CaretEngine::new();
    e.set_text(text);
    e
}

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
