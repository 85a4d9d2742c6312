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


//! This module provides the adaptive worker slot scheduler.
//!
//! The scheduler owns the universe of worker ids. Each id is at any time in
//! exactly one of three states: free, committed to node processing or
//! committed to strong branching. Node processing is capped (`node_cap`)
//! whereas the number of ids lent for strong branching is estimated: first
//! from a static model of the expected parallelism, and once enough history
//! has been gathered, from the observed rate of releases per request.

use std::time::{Duration, Instant};

use fxhash::FxHashMap;
use tracing::{debug, warn};

use crate::{BcpError, BcpResult, Clock, MonotonicClock, Parameters, RateWindow, SlotKind, WorkerId};

/// The rate window never spans more than one hour
pub const MAX_WINDOW_SECS: usize = 3600;

/// The subset of the parameters the scheduler cares about
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerParams {
    pub over_estimation_static  : f64,
    pub over_estimation_rate    : f64,
    pub switch_to_rate_threshold: f64,
    pub time_root_node_solve    : Option<f64>,
    pub horizon_factor          : f64,
    pub max_node_id_ratio       : f64,
    pub max_node_id_count       : usize,
    pub max_branching_ids       : usize,
    pub min_branching_ids       : usize,
}
impl From<&Parameters> for SchedulerParams {
    fn from(p: &Parameters) -> Self {
        SchedulerParams {
            over_estimation_static  : p.over_estimation_static,
            over_estimation_rate    : p.over_estimation_rate,
            switch_to_rate_threshold: p.switch_to_rate_threshold,
            time_root_node_solve    : p.time_root_node_solve,
            horizon_factor          : p.horizon_factor,
            max_node_id_ratio       : p.max_node_id_ratio,
            max_node_id_count       : p.max_node_id_count,
            max_branching_ids       : p.max_branching_ids,
            min_branching_ids       : p.min_branching_ids,
        }
    }
}
impl Default for SchedulerParams {
    fn default() -> Self {
        Self::from(&Parameters::default())
    }
}
impl SchedulerParams {
    /// The width (in seconds) of the rate window. It spans one second until
    /// the root solve time is known and never more than `MAX_WINDOW_SECS`.
    pub fn window_width(&self) -> usize {
        match self.time_root_node_solve {
            None    => 1,
            Some(t) => {
                let w = (t * self.horizon_factor).ceil();
                if w.is_nan() || w < 1.0 {
                    1
                } else if w >= MAX_WINDOW_SECS as f64 {
                    MAX_WINDOW_SECS
                } else {
                    w as usize
                }
            }
        }
    }
}

/// How the strong branching allocation is currently estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationMode {
    /// From the number of ids and the expected node parallelism
    Static,
    /// From the observed rate of releases per request
    RateBased,
}

/// A snapshot of the scheduler state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerStats {
    pub total              : usize,
    pub free               : usize,
    pub committed_node     : usize,
    pub committed_branching: usize,
    pub node_cap           : usize,
    pub mode               : EstimationMode,
    pub window_width       : usize,
    /// Cumulated idle time of all ids after a branching release
    pub idle_branching     : Duration,
    /// Cumulated idle time of all ids after a node release
    pub idle_node          : Duration,
}

/// The bookkeeping of one worker id
#[derive(Debug, Clone, Copy)]
struct IdRecord {
    assignment  : Option<SlotKind>,
    last_release: SlotKind,
    /// Instant from which the idle time has not been accounted yet
    idle_since  : Instant,
    idle_branching: Duration,
    idle_node     : Duration,
}
impl IdRecord {
    fn account_idle(&mut self, now: Instant) {
        let idle = now.saturating_duration_since(self.idle_since);
        match self.last_release {
            SlotKind::StrongBranching => self.idle_branching += idle,
            SlotKind::NodeProcessing  => self.idle_node      += idle,
        }
        self.idle_since = now;
    }
}

/// The worker slot scheduler.
///
/// # Example
/// ```
/// # use bcp::*;
/// let params = SchedulerParams { max_node_id_count: 2, ..SchedulerParams::default() };
/// let mut scheduler = Scheduler::new(params);
/// scheduler.add_ids(&[WorkerId(0), WorkerId(1), WorkerId(2), WorkerId(3)]).unwrap();
///
/// let a = scheduler.request_node_id().unwrap();
/// let _ = scheduler.request_node_id().unwrap();
/// assert_eq!(None, scheduler.request_node_id()); // node cap reached
///
/// // two ids left: the allocation is always odd
/// assert_eq!(1, scheduler.request_branching_ids(2).len());
///
/// scheduler.release_node_id(a).unwrap();
/// assert_eq!(Some(a), scheduler.request_node_id()); // last released, first reused
/// ```
#[derive(Debug)]
pub struct Scheduler<C: Clock = MonotonicClock> {
    params  : SchedulerParams,
    clock   : C,
    records : FxHashMap<WorkerId, IdRecord>,
    /// The free ids. Allocations take from the end (most recently released)
    free    : Vec<WorkerId>,
    total   : usize,
    committed_node     : usize,
    committed_branching: usize,
    node_cap: usize,
    requests: RateWindow,
    releases: RateWindow,
    last_tick: Instant,
}

impl Scheduler<MonotonicClock> {
    pub fn new(params: SchedulerParams) -> Self {
        Self::with_clock(params, MonotonicClock)
    }
}
impl <C: Clock> Scheduler<C> {
    /// Creates a scheduler driven by the given clock
    pub fn with_clock(params: SchedulerParams, clock: C) -> Self {
        let width = params.window_width();
        let now   = clock.now();
        Scheduler {
            params,
            clock,
            records : FxHashMap::default(),
            free    : vec![],
            total   : 0,
            committed_node     : 0,
            committed_branching: 0,
            node_cap: 1,
            requests: RateWindow::new(width),
            releases: RateWindow::new(width),
            last_tick: now,
        }
    }

    /// Grows the universe of ids. The new ids are immediately free.
    pub fn add_ids(&mut self, ids: &[WorkerId]) -> BcpResult<()> {
        for (i, id) in ids.iter().enumerate() {
            if self.records.contains_key(id) || ids[..i].contains(id) {
                return Err(BcpError::DuplicateWorker(*id));
            }
        }
        let now = self.clock.now();
        // reversed so that the first id of the batch is the first one given out
        for id in ids.iter().rev() {
            self.records.insert(*id, IdRecord {
                assignment    : None,
                last_release  : SlotKind::StrongBranching,
                idle_since    : now,
                idle_branching: Duration::ZERO,
                idle_node     : Duration::ZERO,
            });
            self.free.push(*id);
        }
        self.total += ids.len();
        let by_ratio = (self.params.max_node_id_ratio * self.total as f64).floor();
        let by_ratio = if by_ratio.is_finite() && by_ratio > 0.0 { by_ratio as usize } else { 0 };
        self.node_cap = by_ratio.min(self.params.max_node_id_count).max(1);
        debug!(added = ids.len(), total = self.total, node_cap = self.node_cap, "worker ids added");
        Ok(())
    }

    /// Lends up to `wanted` free ids for strong branching. The result may be
    /// empty; it never blocks.
    pub fn request_branching_ids(&mut self, wanted: usize) -> Vec<WorkerId> {
        self.update_rates();
        self.requests.record(1);

        let mode    = self.mode();
        let desired = self.desired(mode);
        let qty     = self.clamp(desired, wanted);
        if qty == 0 && desired > 0 && wanted >= self.params.min_branching_ids && !self.free.is_empty() {
            warn!(wanted, free = self.free.len(), min = self.params.min_branching_ids,
                "branching request refused: below the minimum allocation");
        }

        let now = self.clock.now();
        let mut granted = Vec::with_capacity(qty);
        for _ in 0..qty {
            if let Some(id) = self.free.pop() {
                if let Some(rec) = self.records.get_mut(&id) {
                    rec.account_idle(now);
                    rec.assignment = Some(SlotKind::StrongBranching);
                }
                granted.push(id);
            }
        }
        self.committed_branching += granted.len();
        debug!(wanted, granted = granted.len(), ?mode, free = self.free.len(), "branching ids allocated");
        granted
    }

    /// Gives back an id which was lent for strong branching
    pub fn release_branching_id(&mut self, id: WorkerId) -> BcpResult<()> {
        self.release(id, SlotKind::StrongBranching)?;
        self.committed_branching -= 1;
        Ok(())
    }

    /// Takes one id for node processing, unless none is free or the node cap
    /// is reached. This does not count as a request event.
    pub fn request_node_id(&mut self) -> Option<WorkerId> {
        if self.committed_node >= self.node_cap {
            return None;
        }
        let id  = self.free.pop()?;
        let now = self.clock.now();
        if let Some(rec) = self.records.get_mut(&id) {
            rec.account_idle(now);
            rec.assignment = Some(SlotKind::NodeProcessing);
        }
        self.committed_node += 1;
        Some(id)
    }

    /// Gives back an id which was processing a node
    pub fn release_node_id(&mut self, id: WorkerId) -> BcpResult<()> {
        self.release(id, SlotKind::NodeProcessing)?;
        self.committed_node -= 1;
        Ok(())
    }

    /// Accounts the idle time of every free id up to now
    pub fn refresh_idle_times(&mut self) {
        let now = self.clock.now();
        for id in self.free.iter() {
            if let Some(rec) = self.records.get_mut(id) {
                rec.account_idle(now);
            }
        }
    }

    /// Resizes the rate window once the actual time to solve the root node
    /// is known. The history gathered so far is discarded.
    pub fn set_root_solve_time(&mut self, time: Duration) {
        self.params.time_root_node_solve = Some(time.as_secs_f64());
        let width = self.params.window_width();
        self.requests  = RateWindow::new(width);
        self.releases  = RateWindow::new(width);
        self.last_tick = self.clock.now();
        debug!(root_solve_time = ?time, window_width = width, "rate window resized");
    }

    /// The idle time accounted so far for the given id in the given bucket
    pub fn idle_time(&self, id: WorkerId, kind: SlotKind) -> Option<Duration> {
        self.records.get(&id).map(|rec| match kind {
            SlotKind::StrongBranching => rec.idle_branching,
            SlotKind::NodeProcessing  => rec.idle_node,
        })
    }
    /// What the given id is currently committed to (None when free or unknown)
    pub fn assignment(&self, id: WorkerId) -> Option<SlotKind> {
        self.records.get(&id).and_then(|rec| rec.assignment)
    }
    pub fn total(&self) -> usize {
        self.total
    }
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
    pub fn committed_node(&self) -> usize {
        self.committed_node
    }
    pub fn committed_branching(&self) -> usize {
        self.committed_branching
    }
    pub fn node_cap(&self) -> usize {
        self.node_cap
    }
    /// The estimation mode that would be used by a request made right now
    pub fn mode(&self) -> EstimationMode {
        let avail = self.total - self.committed_node;
        if !self.requests.is_primed() || avail == 0 {
            return EstimationMode::Static;
        }
        let free_ratio = self.free.len() as f64 / avail as f64;
        if free_ratio >= 1.0 - self.params.switch_to_rate_threshold {
            EstimationMode::Static
        } else {
            EstimationMode::RateBased
        }
    }
    pub fn stats(&self) -> SchedulerStats {
        let (idle_branching, idle_node) = self.records.values()
            .fold((Duration::ZERO, Duration::ZERO), |(b, n), r| (b + r.idle_branching, n + r.idle_node));
        SchedulerStats {
            total              : self.total,
            free               : self.free.len(),
            committed_node     : self.committed_node,
            committed_branching: self.committed_branching,
            node_cap           : self.node_cap,
            mode               : self.mode(),
            window_width       : self.requests.capacity(),
            idle_branching,
            idle_node,
        }
    }

    /// Verifies the consistency of the internal state. Every id must be in
    /// exactly one of free, committed to nodes, committed to branching.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.free.len() + self.committed_node + self.committed_branching != self.total {
            return Err(format!("free {} + node {} + branching {} != total {}",
                self.free.len(), self.committed_node, self.committed_branching, self.total));
        }
        if self.records.len() != self.total {
            return Err(format!("{} records for {} ids", self.records.len(), self.total));
        }
        let mut nodes    = 0;
        let mut branches = 0;
        for (id, rec) in self.records.iter() {
            let occurrences = self.free.iter().filter(|f| *f == id).count();
            match rec.assignment {
                None if occurrences == 1 => {},
                Some(SlotKind::NodeProcessing)  if occurrences == 0 => nodes    += 1,
                Some(SlotKind::StrongBranching) if occurrences == 0 => branches += 1,
                other => return Err(format!("{id} assigned to {other:?} appears {occurrences} times in the free stack")),
            }
        }
        if nodes != self.committed_node || branches != self.committed_branching {
            return Err(format!("counted {nodes}/{branches} committed ids, expected {}/{}",
                self.committed_node, self.committed_branching));
        }
        if self.committed_node > self.node_cap {
            return Err(format!("{} ids process nodes but the cap is {}", self.committed_node, self.node_cap));
        }
        Ok(())
    }

    fn release(&mut self, id: WorkerId, kind: SlotKind) -> BcpResult<()> {
        let now = self.clock.now();
        let rec = self.records.get_mut(&id).ok_or(BcpError::UnknownWorker(id))?;
        if rec.assignment != Some(kind) {
            return Err(BcpError::NotCommitted { worker: id, kind });
        }
        rec.assignment   = None;
        rec.last_release = kind;
        rec.idle_since   = now;
        self.free.push(id);

        self.update_rates();
        self.releases.record(1);
        Ok(())
    }

    /// Moves both windows forward by the number of whole seconds elapsed
    /// since the last tick. The fractional remainder is kept for later.
    fn update_rates(&mut self) {
        let now     = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_tick).as_secs();
        if elapsed > 0 {
            self.requests.advance(elapsed);
            self.releases.advance(elapsed);
            self.last_tick += Duration::from_secs(elapsed);
        }
    }

    fn desired(&self, mode: EstimationMode) -> usize {
        let free = self.free.len();
        match mode {
            EstimationMode::Static => {
                let cn = self.committed_node;
                if cn == 0 {
                    return free;
                }
                let cn       = cn as f64;
                let exp_rate = (2.0 * cn).min(self.node_cap as f64) / cn;
                let busy     = cn * exp_rate;
                ceil_count(self.params.over_estimation_static * (self.total as f64 - busy) / busy)
            },
            EstimationMode::RateBased => {
                let requests = self.requests.current_total();
                if requests == 0 {
                    return free;
                }
                let releases = self.releases.current_total() as f64;
                ceil_count(self.params.over_estimation_rate * releases / requests as f64)
            }
        }
    }

    fn clamp(&self, desired: usize, wanted: usize) -> usize {
        let mut qty = desired.min(self.free.len()).min(wanted);
        if wanted >= self.params.min_branching_ids && qty < self.params.min_branching_ids {
            qty = 0;
        }
        qty = qty.min(self.params.max_branching_ids);
        if qty > 0 && qty % 2 == 0 {
            qty -= 1;
        }
        qty
    }
}

/// Rounds a desired allocation up to a count. Negative and NaN values count
/// as zero.
fn ceil_count(x: f64) -> usize {
    if x.is_nan() || x <= 0.0 {
        0
    } else if x >= usize::MAX as f64 {
        usize::MAX
    } else {
        x.ceil() as usize
    }
}

#[cfg(test)]
mod test_scheduler {
    use std::time::Duration;

    use crate::*;

    fn ids(n: usize) -> Vec<WorkerId> {
        (0..n).map(WorkerId).collect()
    }
    fn scheduler(params: SchedulerParams, n: usize) -> Scheduler<ManualClock> {
        let mut s = Scheduler::with_clock(params, ManualClock::default());
        s.add_ids(&ids(n)).unwrap();
        s
    }

    #[test]
    fn adding_ids_makes_them_free() {
        let s = scheduler(SchedulerParams::default(), 5);
        assert_eq!(5, s.total());
        assert_eq!(5, s.free_count());
        assert_eq!(5, s.node_cap());
        assert!(s.check_invariants().is_ok());
    }
    #[test]
    fn adding_an_id_twice_is_an_error() {
        let mut s = scheduler(SchedulerParams::default(), 2);
        assert!(matches!(s.add_ids(&[WorkerId(1)]), Err(BcpError::DuplicateWorker(WorkerId(1)))));
        assert!(matches!(s.add_ids(&[WorkerId(7), WorkerId(7)]), Err(BcpError::DuplicateWorker(WorkerId(7)))));
        assert_eq!(2, s.total());
        assert!(s.check_invariants().is_ok());
    }
    #[test]
    fn first_ids_of_a_batch_are_given_out_first() {
        let mut s = scheduler(SchedulerParams::default(), 3);
        assert_eq!(Some(WorkerId(0)), s.request_node_id());
        assert_eq!(Some(WorkerId(1)), s.request_node_id());
    }
    #[test]
    fn node_cap_uses_the_ratio_and_the_count() {
        let params = SchedulerParams { max_node_id_ratio: 0.5, ..SchedulerParams::default() };
        assert_eq!(4, scheduler(params, 9).node_cap());
        let params = SchedulerParams { max_node_id_ratio: 0.5, max_node_id_count: 3, ..SchedulerParams::default() };
        assert_eq!(3, scheduler(params, 9).node_cap());
        let params = SchedulerParams { max_node_id_ratio: 0.1, ..SchedulerParams::default() };
        assert_eq!(1, scheduler(params, 2).node_cap());
    }
    #[test]
    fn node_requests_stop_at_the_cap() {
        let params = SchedulerParams { max_node_id_count: 4, ..SchedulerParams::default() };
        let mut s = scheduler(params, 9);
        assert_eq!(4, s.node_cap());
        let taken = (0..4).map(|_| s.request_node_id().unwrap()).collect::<Vec<_>>();
        assert_eq!(None, s.request_node_id());
        s.release_node_id(taken[2]).unwrap();
        assert_eq!(Some(taken[2]), s.request_node_id());
        assert!(s.check_invariants().is_ok());
    }
    #[test]
    fn node_requests_stop_when_nothing_is_free() {
        let mut s = scheduler(SchedulerParams::default(), 3);
        assert_eq!(1, s.request_branching_ids(1).len());
        assert!(s.request_node_id().is_some());
        assert!(s.request_node_id().is_some());
        assert_eq!(None, s.request_node_id());
    }
    #[test]
    fn static_guard_grants_all_free_ids_when_no_node_is_processed() {
        let mut s = scheduler(SchedulerParams::default(), 7);
        assert_eq!(7, s.request_branching_ids(100).len());
        assert_eq!(0, s.free_count());
        assert_eq!(7, s.committed_branching());
    }
    #[test]
    fn allocation_is_clamped_to_the_wanted_count() {
        let mut s = scheduler(SchedulerParams::default(), 7);
        assert_eq!(3, s.request_branching_ids(3).len());
        assert_eq!(4, s.free_count());
    }
    #[test]
    fn allocation_is_never_even() {
        let mut s = scheduler(SchedulerParams::default(), 7);
        assert_eq!(3, s.request_branching_ids(4).len());
        let mut s = scheduler(SchedulerParams::default(), 6);
        assert_eq!(5, s.request_branching_ids(100).len());
    }
    #[test]
    fn static_mode_follows_the_expected_parallelism() {
        // 10 ids, 2 nodes: exp_rate = min(4, 10)/2 = 2, busy = 4
        // desired = ceil(1.5 * (10 - 4) / 4) = 3
        let mut s = scheduler(SchedulerParams::default(), 10);
        s.request_node_id().unwrap();
        s.request_node_id().unwrap();
        assert_eq!(EstimationMode::Static, s.mode());
        assert_eq!(3, s.request_branching_ids(100).len());
    }
    #[test]
    fn below_the_minimum_the_request_is_refused() {
        let params = SchedulerParams { min_branching_ids: 3, ..SchedulerParams::default() };
        let mut s = scheduler(params, 4);
        s.request_node_id().unwrap();
        s.request_node_id().unwrap();
        assert_eq!(2, s.free_count());
        assert!(s.request_branching_ids(5).is_empty());
        assert_eq!(2, s.free_count());
    }
    #[test]
    fn small_requests_are_exempt_from_the_minimum() {
        let params = SchedulerParams { min_branching_ids: 3, ..SchedulerParams::default() };
        let mut s = scheduler(params, 4);
        assert_eq!(1, s.request_branching_ids(2).len());
    }
    #[test]
    fn allocation_is_clamped_to_the_maximum() {
        let params = SchedulerParams { max_branching_ids: 4, ..SchedulerParams::default() };
        let mut s = scheduler(params, 10);
        assert_eq!(3, s.request_branching_ids(10).len());
    }
    #[test]
    fn releasing_an_id_that_is_not_committed_is_an_error() {
        let mut s = scheduler(SchedulerParams::default(), 3);
        let node = s.request_node_id().unwrap();
        assert!(matches!(s.release_branching_id(node), Err(BcpError::NotCommitted { kind: SlotKind::StrongBranching, .. })));
        assert!(matches!(s.release_node_id(WorkerId(2)), Err(BcpError::NotCommitted { kind: SlotKind::NodeProcessing, .. })));
        assert!(matches!(s.release_node_id(WorkerId(42)), Err(BcpError::UnknownWorker(WorkerId(42)))));
        assert!(s.check_invariants().is_ok());
    }
    #[test]
    fn idle_time_goes_to_the_bucket_of_the_last_release() {
        let clock = ManualClock::default();
        let mut s = Scheduler::with_clock(SchedulerParams::default(), clock.clone());
        s.add_ids(&[WorkerId(0)]).unwrap();

        clock.advance(Duration::from_secs(2));
        let w = s.request_node_id().unwrap();
        assert_eq!(Some(Duration::from_secs(2)), s.idle_time(w, SlotKind::StrongBranching));

        s.release_node_id(w).unwrap();
        clock.advance(Duration::from_secs(3));
        s.refresh_idle_times();
        assert_eq!(Some(Duration::from_secs(3)), s.idle_time(w, SlotKind::NodeProcessing));
        assert_eq!(Some(Duration::from_secs(2)), s.idle_time(w, SlotKind::StrongBranching));

        // busy time is not idle time
        let w = s.request_branching_ids(1)[0];
        clock.advance(Duration::from_secs(10));
        s.refresh_idle_times();
        assert_eq!(Some(Duration::from_secs(3)), s.idle_time(w, SlotKind::NodeProcessing));
        s.release_branching_id(w).unwrap();
        clock.advance(Duration::from_secs(1));
        s.refresh_idle_times();
        assert_eq!(Some(Duration::from_secs(3)), s.idle_time(w, SlotKind::StrongBranching));
        assert_eq!(Duration::from_secs(6), s.stats().idle_branching + s.stats().idle_node);
    }
    #[test]
    fn window_width_follows_the_root_solve_time() {
        let params = SchedulerParams { time_root_node_solve: Some(1.2), horizon_factor: 2.0, ..SchedulerParams::default() };
        assert_eq!(3, params.window_width());
        assert_eq!(1, SchedulerParams::default().window_width());

        let mut s = scheduler(SchedulerParams::default(), 2);
        s.set_root_solve_time(Duration::from_secs(5));
        assert_eq!(10, s.stats().window_width);
    }
    #[test]
    fn window_width_is_capped() {
        let huge = SchedulerParams { time_root_node_solve: Some(1e300), horizon_factor: 2.0, ..SchedulerParams::default() };
        assert_eq!(MAX_WINDOW_SECS, huge.window_width());
        let inf = SchedulerParams { time_root_node_solve: Some(f64::INFINITY), ..SchedulerParams::default() };
        assert_eq!(MAX_WINDOW_SECS, inf.window_width());

        let mut s = scheduler(SchedulerParams::default(), 1);
        s.set_root_solve_time(Duration::from_secs(u64::MAX));
        assert_eq!(MAX_WINDOW_SECS, s.stats().window_width);
    }
    #[test]
    fn rate_based_mode_kicks_in_under_pressure() {
        let clock  = ManualClock::default();
        let params = SchedulerParams { time_root_node_solve: Some(1.0), horizon_factor: 2.0, ..SchedulerParams::default() };
        let mut s  = Scheduler::with_clock(params, clock.clone());
        s.add_ids(&ids(10)).unwrap();
        assert_eq!(EstimationMode::Static, s.mode());

        let a  = s.request_branching_ids(1);
        let _b = s.request_branching_ids(1);
        clock.advance(Duration::from_secs(2));
        // the release moves the windows past their width: they are primed
        s.release_branching_id(a[0]).unwrap();
        while s.request_node_id().is_some() {}
        assert_eq!(0, s.free_count());
        assert_eq!(EstimationMode::RateBased, s.mode());
        assert!(s.check_invariants().is_ok());
    }
    #[test]
    fn rate_based_allocation_uses_releases_per_request() {
        let clock  = ManualClock::default();
        let params = SchedulerParams { time_root_node_solve: Some(1.0), horizon_factor: 2.0, ..SchedulerParams::default() };
        let mut s  = Scheduler::with_clock(params, clock.clone());
        s.add_ids(&ids(20)).unwrap();
        let nodes = (0..8).map(|_| s.request_node_id().unwrap()).collect::<Vec<_>>();
        clock.advance(Duration::from_secs(2));
        // 6 releases in the (now primed) window, 2 nodes still running
        for n in nodes.iter().take(6) {
            s.release_node_id(*n).unwrap();
        }
        // static: exp_rate = 2, busy = 4, desired = ceil(1.5 * 16 / 4) = 6
        assert_eq!(EstimationMode::Static, s.mode());
        assert_eq!(3, s.request_branching_ids(3).len());
        // 15 free out of 18: rate based
        assert_eq!(EstimationMode::RateBased, s.mode());
        // desired = ceil(1.2 * 6 / 2) = 4, made odd
        assert_eq!(3, s.request_branching_ids(10).len());
        assert!(s.check_invariants().is_ok());
    }
    #[test]
    fn ceil_count_rounds_up() {
        assert_eq!(0, super::ceil_count(-1.0));
        assert_eq!(0, super::ceil_count(f64::NAN));
        assert_eq!(1, super::ceil_count(0.1));
        assert_eq!(2, super::ceil_count(2.0));
        assert_eq!(usize::MAX, super::ceil_count(f64::INFINITY));
    }
}
