//! Merge progress reporting
//!
//! One step per scanned range. Percentages only ever go up within a run,
//! finish at exactly 100 and drop back to 0 if the run fails.

use super::ranges::SelectionOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeProgress {
    completed_steps: usize,
    total_steps: usize,
}

impl MergeProgress {
    /// Progress over `total_steps` steps, never fewer than one
    pub fn new(total_steps: usize) -> Self {
        Self {
            completed_steps: 0,
            total_steps: total_steps.max(1),
        }
    }

    /// One step per range of each enabled category
    pub fn for_options(options: &SelectionOptions) -> Self {
        Self::new(options.plan().len())
    }

    pub fn completed_steps(&self) -> usize {
        self.completed_steps
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn percent(&self) -> f64 {
        if self.completed_steps >= self.total_steps {
            100.0
        } else {
            self.completed_steps as f64 * 100.0 / self.total_steps as f64
        }
    }

    pub fn advance(&mut self) {
        self.completed_steps = (self.completed_steps + 1).min(self.total_steps);
    }

    pub fn complete(&mut self) {
        self.completed_steps = self.total_steps;
    }

    pub fn reset(&mut self) {
        self.completed_steps = 0;
    }
}

/// Forwards progress to a caller-supplied callback
pub struct ProgressReporter<F: FnMut(f64)> {
    progress: MergeProgress,
    callback: F,
}

impl<F: FnMut(f64)> ProgressReporter<F> {
    pub fn new(progress: MergeProgress, callback: F) -> Self {
        Self { progress, callback }
    }

    pub fn progress(&self) -> MergeProgress {
        self.progress
    }

    /// Record a finished step and report the new percentage
    pub fn step(&mut self) {
        self.progress.advance();
        (self.callback)(self.progress.percent());
    }

    /// Report 100, covering runs with fewer steps than planned
    pub fn complete(&mut self) {
        self.progress.complete();
        (self.callback)(100.0);
    }

    /// Report 0 after a failed run
    pub fn fail(&mut self) {
        self.progress.reset();
        (self.callback)(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ranges::Category;

    #[test]
    fn total_steps_is_never_zero() {
        assert_eq!(MergeProgress::for_options(&SelectionOptions::default()).total_steps(), 1);
        assert_eq!(MergeProgress::new(0).total_steps(), 1);
    }

    #[test]
    fn multi_range_categories_count_each_range() {
        let options =
            SelectionOptions::from_categories([Category::EnglishSymbols, Category::EnglishIcons]);
        assert_eq!(MergeProgress::for_options(&options).total_steps(), 7);
        assert_eq!(MergeProgress::for_options(&SelectionOptions::all()).total_steps(), 18);
    }

    #[test]
    fn reporter_is_monotonic_and_ends_at_100() {
        let mut seen = Vec::new();
        let mut reporter = ProgressReporter::new(MergeProgress::new(3), |p| seen.push(p));
        reporter.step();
        reporter.step();
        reporter.step();
        reporter.step();
        reporter.complete();
        drop(reporter);

        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&100.0));
        assert!((seen[0] - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn failure_resets_to_zero() {
        let mut seen = Vec::new();
        let mut reporter = ProgressReporter::new(MergeProgress::new(2), |p| seen.push(p));
        reporter.step();
        reporter.fail();
        assert_eq!(reporter.progress().completed_steps(), 0);
        drop(reporter);
        assert_eq!(seen, vec![50.0, 0.0]);
    }
}
