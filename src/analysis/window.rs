use crate::config::ConfigurationError;
use crate::core::range::ResidueRange;

/// Splits a long sequence into overlapping windows.
///
/// Windows start every `window_size - overlap` residues. The last window is
/// truncated at the end of the sequence; a truncated window shorter than
/// `min_fragment_size` ends the plan without being emitted.
#[derive(Debug, Clone, Copy)]
pub struct WindowPlanner {
    pub window_size: usize,
    pub overlap: usize,
    pub min_fragment_size: usize,
}

impl WindowPlanner {
    /// # Errors
    ///
    /// Returns `ConfigurationError::NonPositiveStep` if `overlap >= window_size`.
    pub fn new(
        window_size: usize,
        overlap: usize,
        min_fragment_size: usize,
    ) -> Result<Self, ConfigurationError> {
        if window_size <= overlap {
            return Err(ConfigurationError::NonPositiveStep {
                window_size,
                overlap,
            });
        }

        Ok(Self {
            window_size,
            overlap,
            min_fragment_size,
        })
    }

    pub fn step(&self) -> usize {
        self.window_size - self.overlap
    }

    /// Lazily plan the windows over a sequence of `sequence_length` residues
    pub fn plan(&self, sequence_length: usize) -> WindowPlan {
        WindowPlan {
            sequence_length,
            window_size: self.window_size,
            step: self.step(),
            min_fragment_size: self.min_fragment_size,
            next_start: Some(0),
        }
    }
}

/// Iterator over planned windows, in increasing start order
#[derive(Debug, Clone)]
pub struct WindowPlan {
    sequence_length: usize,
    window_size: usize,
    step: usize,
    min_fragment_size: usize,
    /// `None` once the plan is exhausted
    next_start: Option<usize>,
}

impl Iterator for WindowPlan {
    type Item = ResidueRange;

    fn next(&mut self) -> Option<ResidueRange> {
        let start = self.next_start.take()?;
        if start >= self.sequence_length {
            return None;
        }

        let end = start
            .saturating_add(self.window_size)
            .min(self.sequence_length);
        if end - start < self.min_fragment_size {
            return None;
        }

        self.next_start = Some(start + self.step);
        Some(ResidueRange::new(start, end))
    }
}

impl std::iter::FusedIterator for WindowPlan {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(len: usize, window: usize, overlap: usize, min: usize) -> Vec<(usize, usize)> {
        WindowPlanner::new(window, overlap, min)
            .unwrap()
            .plan(len)
            .map(|r| (r.start, r.end))
            .collect()
    }

    #[test]
    fn test_default_windows_over_1000() {
        assert_eq!(
            ranges(1000, 400, 200, 50),
            vec![(0, 400), (200, 600), (400, 800), (600, 1000), (800, 1000)]
        );
    }

    #[test]
    fn test_short_tail_dropped() {
        // Candidate [600, 630) is 30 residues long
        assert_eq!(
            ranges(630, 400, 200, 50),
            vec![(0, 400), (200, 600), (400, 630)]
        );
    }

    #[test]
    fn test_tail_equal_to_minimum_kept() {
        assert_eq!(
            ranges(450, 400, 200, 50),
            vec![(0, 400), (200, 450), (400, 450)]
        );
    }

    #[test]
    fn test_properties_hold_across_inputs() {
        for len in [401, 555, 999, 1000, 1777, 2500] {
            for (window, overlap) in [(400, 200), (300, 100), (250, 249), (100, 0)] {
                let min = 50;
                let planned = ranges(len, window, overlap, min);
                assert!(!planned.is_empty());
                assert_eq!(planned[0].0, 0);

                for pair in planned.windows(2) {
                    assert_eq!(pair[1].0 - pair[0].0, window - overlap);
                }
                for &(start, end) in &planned {
                    assert!(end <= len);
                    assert!(end > start);
                }
                let (last_start, last_end) = *planned.last().unwrap();
                assert!(last_end - last_start >= min);

                // Only the final window may be truncated
                for &(start, end) in &planned[..planned.len() - 1] {
                    assert!(end - start == window || end == len);
                }
            }
        }
    }

    #[test]
    fn test_plan_is_deterministic() {
        let planner = WindowPlanner::new(400, 200, 50).unwrap();
        let first: Vec<_> = planner.plan(1234).collect();
        let second: Vec<_> = planner.plan(1234).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_is_fused() {
        let mut plan = WindowPlanner::new(400, 200, 50).unwrap().plan(630);
        assert_eq!(plan.by_ref().count(), 3);
        assert!(plan.next().is_none());
        assert!(plan.next().is_none());
    }

    #[test]
    fn test_non_positive_step() {
        assert!(matches!(
            WindowPlanner::new(200, 200, 50),
            Err(ConfigurationError::NonPositiveStep { .. })
        ));
        assert!(WindowPlanner::new(200, 300, 50).is_err());
    }

    #[test]
    fn test_sequence_within_one_window() {
        assert_eq!(ranges(300, 400, 200, 50), vec![(0, 300), (200, 300)]);
        assert_eq!(ranges(0, 400, 200, 50), Vec::<(usize, usize)>::new());
    }
}
