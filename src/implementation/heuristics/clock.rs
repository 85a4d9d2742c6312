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


//! The clocks the scheduler can be driven by.

use std::{sync::Arc, time::{Duration, Instant}};

use parking_lot::Mutex;

use crate::Clock;

/// The wall clock (monotonic). This is what is used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;
impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock which only moves when told to. Clones share the same time, which
/// makes it possible to drive a scheduler that owns its clock from a test.
///
/// # Example
/// ```
/// # use bcp::*;
/// # use std::time::Duration;
/// let clock = ManualClock::default();
/// let t0 = clock.now();
/// clock.clone().advance(Duration::from_secs(2));
/// assert_eq!(Duration::from_secs(2), clock.now() - t0);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>
}
impl Default for ManualClock {
    fn default() -> Self {
        ManualClock { now: Arc::new(Mutex::new(Instant::now())) }
    }
}
impl ManualClock {
    /// Moves the time forward
    pub fn advance(&self, d: Duration) {
        let mut now = self.now.lock();
        *now += d;
    }
}
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
