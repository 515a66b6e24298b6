use console::{style, StyledObject};

use crate::history::RunResult;

pub fn bright_yellow(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn bright(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Colored label for a build outcome; a building run has no result yet.
pub fn build_result(result: Option<RunResult>, building: bool) -> StyledObject<String> {
    match result {
        _ if building => bright_yellow("BUILDING"),
        Some(RunResult::Success) => bright_green("SUCCESS"),
        Some(RunResult::Unstable) => bright_yellow("UNSTABLE"),
        Some(RunResult::Failure) => bright_red("FAILURE"),
        Some(RunResult::Aborted) => bright_red("ABORTED"),
        Some(RunResult::NotBuilt) | None => dim("NOT_BUILT"),
    }
}
