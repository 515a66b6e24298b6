/// Builds record URLs under an explicit base path.
///
/// The base path is whatever prefix the serving layer mounts the API under;
/// it is passed in rather than read from any ambient request.
#[derive(Debug, Clone)]
pub struct Links {
    base_path: String,
}

impl Links {
    pub fn new(base_path: &str) -> Self {
        let mut base_path = base_path.trim().to_string();
        if !base_path.starts_with('/') {
            base_path.insert(0, '/');
        }
        if !base_path.ends_with('/') {
            base_path.push('/');
        }
        Self { base_path }
    }

    /// URL of a job (e.g. `/ci/job/app/`)
    pub fn job_url(&self, job_name: &str) -> String {
        format!("{}job/{job_name}/", self.base_path)
    }

    /// URL of one run of a job (e.g. `/ci/job/app/42/`)
    pub fn run_url(&self, job_name: &str, number: u32) -> String {
        format!("{}{number}/", self.job_url(job_name))
    }
}

impl Default for Links {
    fn default() -> Self {
        Self::new("/")
    }
}
