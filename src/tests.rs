pub mod diagnostics;
pub mod options_resources;
pub mod output;
pub mod references;
pub mod sources;
