// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.


//! This module implements the rule which decides whether the search should
//! immediately continue into a child of the node that was just branched.

use crate::Parameters;

/// The diving rule. Given `best`, the smallest of the child's bound and the
/// best bound among the candidates, a child is dived into when
/// `child - best <= ratio * reference` where the reference is the gap to the
/// incumbent when there is one, and `max(|best|, 1)` otherwise.
///
/// # Example
/// ```
/// # use bcp::*;
/// let dive = DivePolicy { enabled: true, ratio_with_incumbent: 0.1, ratio_without_incumbent: 0.1 };
/// // child 10.5, best candidate 10, incumbent 20 : 0.5 <= 0.1 * 10
/// assert!(dive.should_dive(10.5, Some(10.0), Some(20.0)));
/// // child 12, best candidate 10, incumbent 20 : 2 > 0.1 * 10
/// assert!(!dive.should_dive(12.0, Some(10.0), Some(20.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivePolicy {
    pub enabled: bool,
    pub ratio_with_incumbent: f64,
    pub ratio_without_incumbent: f64,
}
impl From<&Parameters> for DivePolicy {
    fn from(p: &Parameters) -> Self {
        DivePolicy {
            enabled: p.dive,
            ratio_with_incumbent: p.dive_quality_ratio_with_incumbent,
            ratio_without_incumbent: p.dive_quality_ratio_without_incumbent,
        }
    }
}
impl DivePolicy {
    /// Returns true iff it is worth diving into a child having the given
    /// bound. The caller is responsible for checking that the child itself
    /// cannot be pruned.
    pub fn should_dive(&self, child: f64, best_candidate: Option<f64>, incumbent: Option<f64>) -> bool {
        if !self.enabled || !child.is_finite() {
            return false;
        }
        let best = best_candidate.map_or(child, |b| b.min(child));
        match incumbent {
            Some(inc) if inc.is_finite() =>
                child - best <= self.ratio_with_incumbent * (inc - best),
            _ =>
                child - best <= self.ratio_without_incumbent * best.abs().max(1.0),
        }
    }
}
