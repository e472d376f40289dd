use anyhow::Result;
use async_trait::async_trait;

/// A challenge page intercepted while fetching listings.
#[derive(Debug, Clone)]
pub struct Challenge {
    /// URL of the page that was blocked
    pub page_url: String,
    /// URL of the embedded challenge frame, when one could be isolated
    pub frame_url: Option<String>,
}

/// Cookie granting access past an anti-bot challenge
#[derive(Debug, Clone)]
pub struct Clearance {
    pub name: String,
    pub value: String,
}

/// Collaborator that can turn a challenge page into a clearance cookie.
///
/// Solving happens outside this crate (a human, a paid service); the watcher
/// only defines the seam. `Ok(None)` means the solver declined.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    async fn solve(&self, challenge: &Challenge) -> Result<Option<Clearance>>;

    /// Get the name of the solver
    fn solver_name(&self) -> &'static str;
}

/// Default solver: declines every challenge.
pub struct NoSolver;

#[async_trait]
impl ChallengeSolver for NoSolver {
    async fn solve(&self, _challenge: &Challenge) -> Result<Option<Clearance>> {
        Ok(None)
    }

    fn solver_name(&self) -> &'static str {
        "none"
    }
}
