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


//! This module provides the implementation of various cutoff heuristics that
//! can be used to bound the duration of a search.

use std::{sync::{Arc, atomic::{AtomicBool, Ordering}}, time::{Duration, Instant}};

use crate::Cutoff;

/// _This is the default cutoff heuristic._ It imposes that the search proves
/// optimality before to stop.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCutoff;
impl Cutoff for NoCutoff {
    fn must_stop(&self) -> bool {false}
}

/// This cutoff allows one to specify a maximum time budget to solve the
/// problem. Once the time budget is elapsed, no new node is dispatched and
/// the best solution that has been found (so far) is returned.
///
/// # Example
/// ```
/// # use bcp::*;
/// use std::time::Duration;
///
/// let cutoff = TimeBudget::new(Duration::from_secs(3600));
/// assert!(!cutoff.must_stop());
/// let cutoff = TimeBudget::new(Duration::ZERO);
/// assert!(cutoff.must_stop());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    deadline: Instant
}
impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        let now = Instant::now();
        let deadline = now.checked_add(budget).unwrap_or(now + Duration::from_secs(u32::MAX as u64));
        TimeBudget { deadline }
    }
}
impl Cutoff for TimeBudget {
    fn must_stop(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// A cutoff that is triggered from the outside (e.g. from a signal handler
/// or another thread) by setting a shared flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    stop: Arc<AtomicBool>
}
impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }
    /// Requests the search to stop
    pub fn trigger(&self) {
        self.stop.store(true, Ordering::Relaxed)
    }
}
impl Cutoff for Interrupt {
    fn must_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Stops as soon as either of the two criteria is met
#[derive(Debug, Clone)]
pub struct AnyOf<A: Cutoff, B: Cutoff>(pub A, pub B);
impl <A: Cutoff, B: Cutoff> Cutoff for AnyOf<A, B> {
    fn must_stop(&self) -> bool {
        self.0.must_stop() || self.1.must_stop()
    }
}
