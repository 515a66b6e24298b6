use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright_green, bright_red, bright_yellow};

/// Spinner shown on stderr while a history export is loaded.
pub struct LoadProgress {
    pb: ProgressBar,
}

impl LoadProgress {
    pub fn start(location: &str) -> Self {
        let pb = create_spinner(bright_yellow(format!("Loading history from {location}")).to_string());
        Self { pb }
    }

    pub fn finish(self, job_count: usize) {
        self.pb
            .finish_with_message(bright_green(format!("Loaded {job_count} jobs ✓")).to_string());
        eprintln!();
    }

    pub fn fail(self) {
        self.pb
            .abandon_with_message(bright_red("Failed to load history ✗").to_string());
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
