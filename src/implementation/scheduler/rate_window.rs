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


//! A sliding window of per-second event counts.

/// A ring buffer of per-second event counts spanning `capacity` seconds.
/// The bucket under `head` is the one of the current second. Each second
/// elapsed moves the head forward and recycles the oldest bucket. The window
/// is said to be primed once it has been filled (wrapped) at least once:
/// from then on its total is a meaningful rate estimate.
///
/// # Example
/// ```
/// # use bcp::RateWindow;
/// let mut w = RateWindow::new(3);
/// w.record(2);
/// w.advance(1);
/// w.record(5);
/// assert_eq!(7, w.current_total());
/// assert!(!w.is_primed());
/// w.advance(2); // the bucket holding 2 falls out of the window
/// assert_eq!(5, w.current_total());
/// assert!(w.is_primed());
/// ```
#[derive(Debug, Clone)]
pub struct RateWindow {
    buckets: Vec<u64>,
    head   : usize,
    total  : u64,
    primed : bool,
}
impl RateWindow {
    /// Creates an empty window spanning `seconds` seconds (at least one)
    pub fn new(seconds: usize) -> Self {
        RateWindow {
            buckets: vec![0; seconds.max(1)],
            head   : 0,
            total  : 0,
            primed : false,
        }
    }
    /// Counts `n` events in the current second
    pub fn record(&mut self, n: u64) {
        self.buckets[self.head] += n;
        self.total += n;
    }
    /// Moves the window `seconds` seconds forward. Every step drops the
    /// oldest bucket and opens an empty one.
    pub fn advance(&mut self, seconds: u64) {
        let cap   = self.buckets.len();
        let steps = seconds.min(cap as u64) as usize;
        for _ in 0..steps {
            self.head = (self.head + 1) % cap;
            if self.head == 0 {
                self.primed = true;
            }
            self.total -= self.buckets[self.head];
            self.buckets[self.head] = 0;
        }
    }
    /// The number of events counted over the whole window
    pub fn current_total(&self) -> u64 {
        self.total
    }
    /// True iff the window has been filled at least once
    pub fn is_primed(&self) -> bool {
        self.primed
    }
    /// The width of the window in seconds
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }
}
