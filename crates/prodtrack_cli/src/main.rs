//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `prodtrack_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use prodtrack_core::CompletionEngine;

fn main() {
    let engine = CompletionEngine::standard();
    let taxonomy = engine.taxonomy();

    println!("prodtrack_core version={}", prodtrack_core::core_version());
    println!(
        "taxonomy required={} weight={}",
        taxonomy.required().join(","),
        taxonomy.required_weight()
    );
    println!(
        "taxonomy optional={} weight={}",
        taxonomy.optional().join(","),
        taxonomy.optional_weight()
    );
}
