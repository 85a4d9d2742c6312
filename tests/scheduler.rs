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


//! Properties of the worker id scheduler which must hold whatever the
//! sequence of requests and releases.

use std::time::Duration;

use bcp::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddIds(usize),
    RequestBranching(usize),
    ReleaseBranching(usize),
    RequestNode,
    ReleaseNode(usize),
    Advance(u64),
    Refresh,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1_usize..4).prop_map(Op::AddIds),
        (0_usize..8).prop_map(Op::RequestBranching),
        any::<usize>().prop_map(Op::ReleaseBranching),
        Just(Op::RequestNode),
        any::<usize>().prop_map(Op::ReleaseNode),
        (0_u64..3000).prop_map(Op::Advance),
        Just(Op::Refresh),
    ]
}

fn params() -> impl Strategy<Value = SchedulerParams> {
    (
        0.1_f64..3.0,
        0.1_f64..3.0,
        0.0_f64..=1.0,
        proptest::option::of(0.0_f64..5.0),
        0.5_f64..4.0,
        0.1_f64..=1.0,
        1_usize..10,
        1_usize..10,
        1_usize..4,
    )
    .prop_filter("min must not exceed max", |t| t.8 <= t.7)
    .prop_map(|t| SchedulerParams {
        over_estimation_static  : t.0,
        over_estimation_rate    : t.1,
        switch_to_rate_threshold: t.2,
        time_root_node_solve    : t.3,
        horizon_factor          : t.4,
        max_node_id_ratio       : t.5,
        max_node_id_count       : t.6,
        max_branching_ids       : t.7,
        min_branching_ids       : t.8,
    })
}

fn idle(s: &Scheduler<ManualClock>, id: WorkerId) -> Duration {
    s.idle_time(id, SlotKind::NodeProcessing).unwrap_or_default()
        + s.idle_time(id, SlotKind::StrongBranching).unwrap_or_default()
}

proptest! {
    #[test]
    fn every_id_is_in_exactly_one_set(
        params  in params(),
        initial in 1_usize..6,
        ops     in proptest::collection::vec(op(), 0..80))
    {
        let clock = ManualClock::default();
        let mut s = Scheduler::with_clock(params, clock.clone());
        let mut all: Vec<WorkerId> = (0..initial).map(WorkerId).collect();
        s.add_ids(&all).unwrap();

        let mut node      = vec![];
        let mut branching = vec![];
        for op in ops {
            match op {
                Op::AddIds(n) => {
                    let ids = (all.len()..all.len() + n).map(WorkerId).collect::<Vec<_>>();
                    s.add_ids(&ids).unwrap();
                    all.extend(ids);
                },
                Op::RequestBranching(wanted) => {
                    let free = s.free_count();
                    let got  = s.request_branching_ids(wanted);
                    prop_assert!(got.len() <= free);
                    prop_assert!(got.len() <= wanted);
                    prop_assert!(got.len() <= params.max_branching_ids);
                    prop_assert!(got.is_empty() || got.len() % 2 == 1);
                    if wanted >= params.min_branching_ids {
                        // refused below the minimum, at most one less once made odd
                        prop_assert!(got.is_empty() || got.len() + 1 >= params.min_branching_ids);
                    }
                    for id in got.iter() {
                        prop_assert_eq!(Some(SlotKind::StrongBranching), s.assignment(*id));
                    }
                    branching.extend(got);
                },
                Op::ReleaseBranching(i) => {
                    if !branching.is_empty() {
                        let id = branching.swap_remove(i % branching.len());
                        s.release_branching_id(id).unwrap();
                        prop_assert_eq!(None, s.assignment(id));
                    }
                },
                Op::RequestNode => {
                    let saturated = s.committed_node() >= s.node_cap() || s.free_count() == 0;
                    match s.request_node_id() {
                        Some(id) => {
                            prop_assert!(!saturated);
                            node.push(id);
                        },
                        None => prop_assert!(saturated),
                    }
                },
                Op::ReleaseNode(i) => {
                    if !node.is_empty() {
                        let id = node.swap_remove(i % node.len());
                        s.release_node_id(id).unwrap();
                    }
                },
                Op::Advance(ms) => clock.advance(Duration::from_millis(ms)),
                Op::Refresh => {
                    let before = all.iter().map(|id| idle(&s, *id)).collect::<Vec<_>>();
                    s.refresh_idle_times();
                    for (id, b) in all.iter().zip(before) {
                        prop_assert!(idle(&s, *id) >= b);
                    }
                },
            }
            prop_assert_eq!(Ok(()), s.check_invariants());
            prop_assert!(s.committed_node() <= s.node_cap());
            prop_assert_eq!(all.len(), s.total());
        }
    }

    #[test]
    fn releasing_an_id_that_is_not_committed_is_rejected(n in 1_usize..6, extra in 0_usize..6) {
        let mut s = Scheduler::with_clock(SchedulerParams::default(), ManualClock::default());
        s.add_ids(&(0..n).map(WorkerId).collect::<Vec<_>>()).unwrap();
        let free = WorkerId(0);
        let is_not_committed = matches!(s.release_node_id(free), Err(BcpError::NotCommitted { .. }));
        prop_assert!(is_not_committed);
        let is_unknown = matches!(s.release_branching_id(WorkerId(n + extra)), Err(BcpError::UnknownWorker(_)));
        prop_assert!(is_unknown);
        prop_assert_eq!(Ok(()), s.check_invariants());
    }
}

#[test]
fn the_node_cap_bounds_node_processing() {
    let params = SchedulerParams { max_node_id_ratio: 1.0, max_node_id_count: 4, ..SchedulerParams::default() };
    let mut s = Scheduler::with_clock(params, ManualClock::default());
    s.add_ids(&(0..9).map(WorkerId).collect::<Vec<_>>()).unwrap();
    assert_eq!(4, s.node_cap());

    let taken = (0..4).map(|_| s.request_node_id().unwrap()).collect::<Vec<_>>();
    assert_eq!(None, s.request_node_id());
    s.release_node_id(taken[2]).unwrap();
    assert_eq!(Some(taken[2]), s.request_node_id());
    assert_eq!(None, s.request_node_id());
}

#[test]
fn a_request_below_the_minimum_is_refused() {
    let params = SchedulerParams { min_branching_ids: 3, ..SchedulerParams::default() };
    let mut s = Scheduler::with_clock(params, ManualClock::default());
    s.add_ids(&[WorkerId(0), WorkerId(1)]).unwrap();
    assert!(s.request_branching_ids(5).is_empty());
    assert_eq!(2, s.free_count());
    // a request which does not reach the minimum itself is served
    assert_eq!(1, s.request_branching_ids(2).len());
}

#[test]
fn idle_time_is_accounted_per_kind_of_release() {
    let clock = ManualClock::default();
    let mut s = Scheduler::with_clock(SchedulerParams::default(), clock.clone());
    s.add_ids(&[WorkerId(0)]).unwrap();

    let id = s.request_node_id().unwrap();
    s.release_node_id(id).unwrap();
    clock.advance(Duration::from_secs(3));
    s.refresh_idle_times();
    assert_eq!(Some(Duration::from_secs(3)), s.idle_time(id, SlotKind::NodeProcessing));

    let got = s.request_branching_ids(1);
    assert_eq!(vec![id], got);
    s.release_branching_id(id).unwrap();
    clock.advance(Duration::from_secs(2));
    s.refresh_idle_times();
    assert_eq!(Some(Duration::from_secs(2)), s.idle_time(id, SlotKind::StrongBranching));
    assert_eq!(Some(Duration::from_secs(3)), s.idle_time(id, SlotKind::NodeProcessing));
}
