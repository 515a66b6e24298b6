mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::export_report;
pub use progress::LoadProgress;
pub use styling::{dim, magenta_bold};

/// Prints the stagelens banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🧭 stagelens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Pipeline stage views for build history")
    );
}
