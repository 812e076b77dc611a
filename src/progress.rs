//! Progress indicators for the apply loop.

use indicatif::{ProgressBar, ProgressStyle};

/// Bar over a known number of resources.
pub fn bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/dim} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Progress sink driving an indicatif bar during a run.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total: usize) -> Self {
        Self {
            bar: bar(total as u64),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl converge::Progress for BarProgress {
    fn resource_started(&mut self, resource: &converge::Resource) {
        self.bar.set_message(resource.describe());
    }

    fn resource_finished(
        &mut self,
        _resource: &converge::Resource,
        _action: &converge::Action,
        _outcome: &converge::Outcome,
    ) {
        self.bar.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_construction_never_panics() {
        assert_eq!(bar(4).length(), Some(4));
        assert_eq!(bar(0).length(), Some(0));
    }
}
