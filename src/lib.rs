//! Command-line driver and pipeline orchestrator for a batch compiler.

/// Diagnostic collection and formatting.
pub mod diagnostic;
/// Option parsing, reference resolution and the compilation pipeline.
pub mod driver;
/// Collaborators backing the `sharpc` binary.
pub mod host;
pub mod lang_options;

pub mod test_utils;

#[cfg(test)]
mod tests;
