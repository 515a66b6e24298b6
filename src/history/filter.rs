use super::{Chronology, Job, Run};

/// Standing run predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFilter {
    /// Full history
    All,
    /// Only runs that have not terminated yet
    InProgress,
}

impl RunFilter {
    pub fn matches(self, run: &Run) -> bool {
        match self {
            Self::All => true,
            Self::InProgress => run.building,
        }
    }
}

/// Collects the runs of `job` accepted by `predicate`, most recent first.
///
/// The chronology is walked backward from the most recent run until there is
/// no previous run; rejected runs are skipped, they never stop the walk.
pub fn filter_runs<'s, S, P>(store: &'s S, job: &Job, predicate: P) -> Vec<&'s Run>
where
    S: Chronology + ?Sized,
    P: Fn(&Run) -> bool,
{
    let mut selected = Vec::new();
    let mut cursor = store.most_recent_run(job);

    while let Some(run) = cursor {
        if predicate(run) {
            selected.push(run);
        }
        cursor = store.previous_run(run);
    }

    selected
}
