/// Where the orchestrator surfaces outcomes. `alert` must reach the
/// operator; `diagnostic` goes to the console log only.
pub trait Reporter {
    fn alert(&self, message: &str);
    fn diagnostic(&self, message: &str);
}

pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn alert(&self, _message: &str) {}
    fn diagnostic(&self, _message: &str) {}
}
