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


//! The coordinator state machine. The coordinator owns the node store and
//! the scheduler; it handles one message at a time and never shares memory
//! with the workers.

use std::time::{Duration, Instant};

use fxhash::FxHashMap;
use tracing::{debug, info, trace, warn};

use crate::*;

/// How long the coordinator waits for a message before it checks the cutoff
/// criterion again.
const POLL: Duration = Duration::from_millis(20);

/// Everything there is to know about a finished search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub completion: Completion,
    /// The best solution found (if any)
    pub incumbent : Option<Solution>,
    /// A lower bound on the optimal objective value. It equals the incumbent
    /// value when the search is exact.
    pub best_bound: f64,
    /// If the search could not prove optimality, this tells why
    pub abort_proof: Option<Reason>,
    pub tree      : TreeStats,
    pub scheduler : SchedulerStats,
}

/// A node which has been dispatched to a worker and whose report is awaited
#[derive(Debug, Clone, Copy)]
struct Dispatch {
    node   : NodeId,
    started: Instant,
}

/// The coordinator (tree manager) of the search
pub struct Coordinator<'a, C: Channel> {
    channel    : C,
    scheduler  : Scheduler,
    store      : NodeStore<SearchOrder>,
    cutoff     : &'a dyn Cutoff,
    observer   : &'a dyn SolutionObserver,
    params     : Parameters,
    dive       : DivePolicy,
    /// The workers reachable through the channel
    workers    : Vec<WorkerId>,
    incumbent  : Option<Solution>,
    phase      : Phase,
    root       : NodeId,
    /// Set until the processing time of the root has been measured
    measure_root: bool,
    outstanding: FxHashMap<WorkerId, Dispatch>,
    /// When set, no new node is dispatched and the search ends at that instant
    /// (or as soon as nothing is outstanding)
    stopping   : Option<Instant>,
    abort_proof: Option<Reason>,
    /// The smallest bound among the nodes that were given up on
    lost_bound : f64,
}

impl <'a, C: Channel> Coordinator<'a, C> {
    /// Creates a coordinator driving the given workers. The root node holds
    /// the `initial` formulation.
    pub fn new(
        channel  : C,
        workers  : Vec<WorkerId>,
        initial  : Vec<Payload>,
        params   : &Parameters,
        cutoff   : &'a dyn Cutoff,
        observer : &'a dyn SolutionObserver,
    ) -> BcpResult<Self> {
        params.validate()?;
        let mut scheduler = Scheduler::new(SchedulerParams::from(params));
        scheduler.add_ids(&workers)?;

        let phase = if params.pricing_phase { Phase::Pricing } else { Phase::BranchAndCut };
        let mut store = NodeStore::new(params.search_order);
        let root = store.create_root(initial, phase);

        Ok(Coordinator {
            channel,
            scheduler,
            store,
            cutoff,
            observer,
            params      : params.clone(),
            dive        : DivePolicy::from(params),
            workers,
            incumbent   : None,
            phase,
            root,
            measure_root: params.time_root_node_solve.is_none(),
            outstanding : FxHashMap::default(),
            stopping    : None,
            abort_proof : None,
            lost_bound  : f64::INFINITY,
        })
    }

    /// Seeds the search with a known solution
    pub fn with_incumbent(mut self, solution: Option<Solution>) -> Self {
        self.incumbent = solution;
        self
    }

    /// Runs the search to completion (or until it is told to stop). Whatever
    /// happens, every worker is told to terminate before this returns.
    ///
    /// Workers still busy when the grace period expires keep talking to the
    /// coordinator endpoint: the coordinator must not be dropped before they
    /// have all stopped.
    pub fn run(&mut self) -> BcpResult<SearchReport> {
        info!(workers = self.workers.len(), phase = ?self.phase, order = ?self.params.search_order, "search started");
        let result = self.search();
        self.shutdown();
        result.map(|()| self.report())
    }

    fn search(&mut self) -> BcpResult<()> {
        loop {
            if self.stopping.is_none() && self.cutoff.must_stop() {
                warn!(outstanding = self.outstanding.len(), "cutoff occurred");
                self.stop(Reason::CutoffOccurred);
            }

            if let Some(deadline) = self.stopping {
                let now = Instant::now();
                if self.is_idle() || now >= deadline {
                    return Ok(());
                }
                if let Some(envelope) = self.channel.recv_timeout(deadline - now)? {
                    self.handle(envelope)?;
                }
                continue;
            }

            self.dispatch_all()?;
            if self.is_idle() && self.store.nb_candidates() == 0 && !self.next_phase()? {
                return Ok(());
            }
            if let Some(envelope) = self.channel.recv_timeout(POLL)? {
                self.handle(envelope)?;
            }
        }
    }

    /// True when no node is being processed and no helper is lent out
    fn is_idle(&self) -> bool {
        self.outstanding.is_empty() && self.scheduler.committed_branching() == 0
    }

    /// Stops dispatching new nodes; the outstanding ones (and the helpers)
    /// are awaited for at most the termination grace period.
    fn stop(&mut self, reason: Reason) {
        if self.stopping.is_none() {
            let now = Instant::now();
            self.stopping    = Some(now.checked_add(self.params.termination_grace()).unwrap_or(now));
            self.abort_proof = Some(reason);
        }
    }

    /// Moves to the next phase of the search, re-seeding the fringe with the
    /// nodes which were deferred. Returns false when there is no next phase.
    fn next_phase(&mut self) -> BcpResult<bool> {
        let next = match self.phase.next() {
            Some(next) => next,
            None => return Ok(false),
        };
        let deferred = self.store.take_deferred();
        info!(from = ?self.phase, to = ?next, nodes = deferred.len(), "phase transition");
        self.phase = next;
        for id in deferred {
            self.store.node_mut(id)?.phase = next;
            self.store.enqueue(id)?;
        }
        Ok(true)
    }

    /// Dispatches candidates for as long as there are candidates and ids
    /// available for node processing. Hopeless candidates are pruned without
    /// taking any id.
    fn dispatch_all(&mut self) -> BcpResult<()> {
        while let Some(node) = self.store.pop_candidate() {
            let bound = self.store.node(node)?.bound;
            if self.is_prunable(bound) {
                trace!(%node, bound, "candidate pruned");
                self.store.set_status(node, NodeStatus::Pruned)?;
                continue;
            }
            match self.scheduler.request_node_id() {
                Some(worker) => self.dispatch(node, worker)?,
                None => {
                    self.store.enqueue(node)?;
                    break;
                }
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, node: NodeId, worker: WorkerId) -> BcpResult<()> {
        let formulation = self.store.formulation_of(node)?;
        let n = self.store.node(node)?;
        let assignment = NodeAssignment {
            node,
            phase : n.phase,
            depth : n.depth,
            bound : n.bound,
            cutoff: self.incumbent_value().unwrap_or(f64::INFINITY),
            formulation,
        };
        self.store.set_status(node, NodeStatus::Processing)?;
        self.outstanding.insert(worker, Dispatch { node, started: Instant::now() });
        debug!(%node, %worker, depth = assignment.depth, bound = assignment.bound, "node dispatched");
        self.channel.send(ProcessId::Worker(worker), &Message::DispatchNode(assignment))
    }

    /// Handles one message
    pub fn handle(&mut self, envelope: Envelope) -> BcpResult<()> {
        let Envelope { from, message } = envelope;
        match message {
            Message::NodeProcessed(report) => self.on_node_processed(from, report),
            Message::ReportIncumbent(solution) => {
                self.on_incumbent(solution);
                Ok(())
            },
            Message::RequestBranchingIds(wanted) => {
                // no new work is handed out while stopping
                let ids = if self.stopping.is_some() { vec![] } else { self.scheduler.request_branching_ids(wanted) };
                self.channel.send(from, &Message::BranchingIdsGranted(ids))
            },
            Message::ReleaseBranchingId(id) => self.scheduler.release_branching_id(id),
            Message::AddIds(ids) => {
                let (reachable, unreachable): (Vec<_>, Vec<_>) = ids.into_iter()
                    .partition(|w| self.channel.reaches(ProcessId::Worker(*w)));
                if !unreachable.is_empty() {
                    warn!(ids = ?unreachable, "ignoring ids that cannot be reached");
                }
                self.scheduler.add_ids(&reachable)?;
                info!(ids = ?reachable, total = self.scheduler.total(), "ids added");
                self.workers.extend_from_slice(&reachable);
                Ok(())
            },
            Message::RequestNodeId => {
                let id = if self.stopping.is_some() { None } else { self.scheduler.request_node_id() };
                self.channel.send(from, &Message::NodeIdGranted(id))
            },
            Message::ReleaseNodeId(id) => {
                if self.outstanding.contains_key(&id) {
                    return Err(BcpError::Unexpected { from, message: "ReleaseNodeId" });
                }
                self.scheduler.release_node_id(id)
            },
            Message::Terminate => match from {
                ProcessId::Worker(w) => Err(BcpError::WorkerLost(w)),
                ProcessId::Coordinator => {
                    info!("termination requested");
                    self.stop(Reason::Terminated);
                    Ok(())
                },
            },
            other => Err(BcpError::Unexpected { from, message: other.name() }),
        }
    }

    fn on_incumbent(&mut self, solution: Solution) {
        let improves = match &self.incumbent {
            Some(best) => solution.objective < best.objective,
            None       => !solution.objective.is_nan(),
        };
        if !improves {
            return;
        }
        info!(objective = solution.objective, explored = self.store.stats().processed, "new incumbent");
        self.observer.on_incumbent(&solution);
        let threshold = solution.objective - self.params.granularity;
        self.incumbent = Some(solution);
        let pruned = self.store.prune_all(threshold);
        if pruned > 0 {
            debug!(pruned, "candidates pruned by the new incumbent");
        }
    }

    fn on_node_processed(&mut self, from: ProcessId, report: NodeReport) -> BcpResult<()> {
        let unexpected = BcpError::Unexpected { from, message: "NodeProcessed" };
        let worker = match from {
            ProcessId::Worker(w) => w,
            ProcessId::Coordinator => return Err(unexpected),
        };
        let dispatch = match self.outstanding.remove(&worker) {
            Some(d) if d.node == report.node => d,
            _ => return Err(unexpected),
        };
        let node = dispatch.node;
        if self.measure_root && node == self.root {
            self.measure_root = false;
            self.scheduler.set_root_solve_time(dispatch.started.elapsed());
        }

        self.store.record_generated(node, report.generated)?;
        let mut children = vec![];
        match report.outcome {
            NodeOutcome::Infeasible | NodeOutcome::BoundPruned { .. } =>
                self.store.set_status(node, NodeStatus::Pruned)?,
            NodeOutcome::FeasibleIntegral { .. } =>
                self.store.set_status(node, NodeStatus::FeasibleIntegral)?,
            NodeOutcome::Deferred { bound } =>
                self.store.defer(node, bound)?,
            NodeOutcome::Branched { bound, children: specs } => {
                let n = self.store.node_mut(node)?;
                n.bound = n.bound.max(bound);
                self.store.set_status(node, NodeStatus::Branched)?;
                for spec in specs {
                    children.push(self.store.create_child(node, spec.bound, spec.bound_changes)?);
                }
            },
            NodeOutcome::Failed(reason) => self.on_failure(node, reason)?,
        }
        self.scheduler.release_node_id(worker)?;

        let dive = self.dive_target(&children)?;
        for child in children.iter().copied().filter(|c| Some(*c) != dive) {
            self.store.enqueue(child)?;
        }
        if let Some(child) = dive {
            // the id just released is the first one given out again
            match self.scheduler.request_node_id() {
                Some(next) => {
                    debug!(%node, %child, worker = %next, "diving");
                    self.dispatch(child, next)?;
                },
                None => self.store.enqueue(child)?,
            }
        }
        Ok(())
    }

    fn on_failure(&mut self, node: NodeId, reason: FailureReason) -> BcpResult<()> {
        let (bound, retries) = {
            let n = self.store.node(node)?;
            (n.bound, n.retries)
        };
        match self.params.failure_policy {
            FailurePolicy::Retry if retries < self.params.max_node_retries => {
                warn!(%node, ?reason, attempt = retries + 1, "node failed, retrying");
                self.store.retry(node)
            },
            FailurePolicy::Escalate => {
                self.store.set_status(node, NodeStatus::Failed)?;
                Err(BcpError::NodeFailed { node, reason })
            },
            FailurePolicy::Drop | FailurePolicy::Retry => {
                warn!(%node, ?reason, bound, "node failed, dropped");
                self.store.set_status(node, NodeStatus::Failed)?;
                self.lost_bound = self.lost_bound.min(bound);
                self.abort_proof.get_or_insert(Reason::NodesDropped);
                Ok(())
            },
        }
    }

    /// The child worth diving into (if any): the most promising one provided
    /// it cannot be pruned and passes the dive quality test.
    fn dive_target(&self, children: &[NodeId]) -> BcpResult<Option<NodeId>> {
        if !self.dive.enabled || self.stopping.is_some() {
            return Ok(None);
        }
        let mut best: Option<(NodeId, f64)> = None;
        for child in children.iter().copied() {
            let bound = self.store.node(child)?.bound;
            if best.map_or(true, |(_, b)| bound < b) {
                best = Some((child, bound));
            }
        }
        Ok(best
            .filter(|(_, bound)| !self.is_prunable(*bound))
            .filter(|(_, bound)| self.dive.should_dive(*bound, self.store.best_candidate_bound(), self.incumbent_value()))
            .map(|(child, _)| child))
    }

    fn incumbent_value(&self) -> Option<f64> {
        self.incumbent.as_ref().map(|s| s.objective)
    }
    /// A node is hopeless when its bound does not improve on the incumbent
    /// by more than the granularity
    fn is_prunable(&self, bound: f64) -> bool {
        self.incumbent_value()
            .map_or(false, |inc| bound >= inc - self.params.granularity)
    }

    /// Tells every worker to terminate (and does not wait for them)
    fn shutdown(&mut self) {
        for w in self.workers.iter() {
            if let Err(e) = self.channel.send(ProcessId::Worker(*w), &Message::Terminate) {
                debug!(worker = %w, error = %e, "could not reach worker");
            }
        }
        self.scheduler.refresh_idle_times();
        let tree  = self.store.stats();
        let sched = self.scheduler.stats();
        info!(
            created = tree.created, processed = tree.processed, pruned = tree.pruned,
            branched = tree.branched, integral = tree.integral, failed = tree.failed,
            idle_node = ?sched.idle_node, idle_branching = ?sched.idle_branching,
            mode = ?sched.mode,
            "search ended");
    }

    fn best_bound(&self) -> f64 {
        let incumbent = self.incumbent_value().unwrap_or(f64::INFINITY);
        if self.abort_proof.is_none() {
            return incumbent;
        }
        let mut bound = self.lost_bound.min(incumbent);
        if let Some(b) = self.store.best_candidate_bound() {
            bound = bound.min(b);
        }
        if let Some(b) = self.store.deferred_bound() {
            bound = bound.min(b);
        }
        for d in self.outstanding.values() {
            if let Ok(n) = self.store.node(d.node) {
                bound = bound.min(n.bound);
            }
        }
        bound
    }

    fn report(&self) -> SearchReport {
        SearchReport {
            completion: Completion {
                is_exact  : self.abort_proof.is_none(),
                best_value: self.incumbent_value(),
            },
            incumbent  : self.incumbent.clone(),
            best_bound : self.best_bound(),
            abort_proof: self.abort_proof,
            tree       : self.store.stats(),
            scheduler  : self.scheduler.stats(),
        }
    }
}

#[cfg(test)]
mod test_coordinator {
    use std::time::Duration;

    use crate::*;
    use crate::test_utils::*;

    const FRACTIONAL: Fractional = Fractional { width: 1 };

    fn params(nb_workers: usize) -> Parameters {
        Parameters { nb_workers, termination_grace: 0.0, ..Parameters::default() }
    }
    fn ids(n: usize) -> Vec<WorkerId> {
        (0..n).map(WorkerId).collect()
    }
    fn coordinator<'a>(params: &Parameters, cutoff: &'a dyn Cutoff, observer: &'a dyn SolutionObserver)
        -> (Coordinator<'a, LocalChannel>, Vec<LocalChannel>)
    {
        let ids = ids(params.nb_workers);
        let (channel, workers) = LocalNetwork::build(&ids);
        let coordinator = Coordinator::new(channel, ids, items(&[(1.0, 1.0)]), params, cutoff, observer).unwrap();
        (coordinator, workers)
    }
    /// Runs a complete search with real workers
    fn run_search<S, F>(params: &Parameters, initial: Vec<Payload>, solver: F,
        branching: &(dyn BranchingRule + Sync), observer: &dyn SolutionObserver) -> BcpResult<SearchReport>
    where S: LpSolver + Send,
          F: Fn() -> S,
    {
        let ids = ids(params.nb_workers);
        let (channel, endpoints) = LocalNetwork::build(&ids);
        let mut coordinator = Coordinator::new(channel, ids.clone(), initial, params, &NoCutoff, observer)?;
        std::thread::scope(|s| {
            for (id, endpoint) in ids.iter().copied().zip(endpoints) {
                let solver   = solver();
                let policies = Policies { columns: &NoColumns, cuts: &NoCuts, branching };
                s.spawn(move || Worker::new(id, endpoint, solver, policies, WorkerParams::from(params)).run());
            }
            coordinator.run()
        })
    }
    fn branched(node: NodeId, bound: f64, children: &[f64]) -> Envelope {
        let children = children.iter().enumerate()
            .map(|(i, b)| ChildSpec { bound: *b, bound_changes: vec![BoundChange { var: 0, lb: i as f64, ub: i as f64 }] })
            .collect();
        Envelope {
            from: ProcessId::Worker(WorkerId(0)),
            message: Message::NodeProcessed(NodeReport {
                node, outcome: NodeOutcome::Branched { bound, children }, generated: vec![], iterations: 1 }),
        }
    }
    fn dispatched(channel: &LocalChannel) -> NodeAssignment {
        match channel.recv_timeout(Duration::from_secs(1)).unwrap().map(|e| e.message) {
            Some(Message::DispatchNode(a)) => a,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn a_node_that_cannot_improve_the_incumbent_is_pruned_without_taking_an_id() {
        let params = params(1);
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        c.incumbent = Some(Solution { objective: 10.0, values: vec![] });

        let root = c.store.pop_candidate().unwrap();
        c.store.set_status(root, NodeStatus::Processing).unwrap();
        c.store.set_status(root, NodeStatus::Branched).unwrap();
        let good = c.store.create_child(root, 5.0, vec![]).unwrap();
        let bad  = c.store.create_child(root, 15.0, vec![]).unwrap();
        c.store.enqueue(bad).unwrap();
        c.store.enqueue(good).unwrap();

        c.dispatch_all().unwrap();
        assert_eq!(NodeStatus::Processing, c.store.node(good).unwrap().status);
        assert_eq!(NodeStatus::Pruned, c.store.node(bad).unwrap().status);
        assert_eq!(0, c.store.nb_candidates());
        assert_eq!(1, c.scheduler.committed_node());

        let a = dispatched(&workers[0]);
        assert_eq!(good, a.node);
        assert_eq!(10.0, a.cutoff);
        assert_eq!(0, workers[0].pending());
    }
    #[test]
    fn the_only_hopeless_candidate_never_takes_an_id() {
        let params = params(1);
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        c.incumbent = Some(Solution { objective: 10.0, values: vec![] });
        c.store.node_mut(c.root).unwrap().bound = 10.0;
        let root = c.store.pop_candidate().unwrap();
        c.store.enqueue(root).unwrap();

        c.dispatch_all().unwrap();
        assert_eq!(NodeStatus::Pruned, c.store.node(root).unwrap().status);
        assert_eq!(0, c.scheduler.committed_node());
        assert_eq!(1, c.scheduler.free_count());
        assert_eq!(0, workers[0].pending());
    }
    #[test]
    fn an_abandoned_node_is_dropped_without_incumbent_nor_children() {
        let params   = Parameters { failure_policy: FailurePolicy::Drop, ..params(1) };
        let recorder = Recorder::default();
        let report = run_search(&params, items(&[(1.0, 1.0)]),
            || Scripted::new(vec![LpResult::abandoned(3)]), &FRACTIONAL, &recorder).unwrap();

        assert_eq!(Completion { is_exact: false, best_value: None }, report.completion);
        assert_eq!(Some(Reason::NodesDropped), report.abort_proof);
        assert_eq!(None, report.incumbent);
        assert_eq!(1, report.tree.created);
        assert_eq!(1, report.tree.failed);
        assert_eq!(f64::NEG_INFINITY, report.best_bound);
        assert!(recorder.seen.lock().is_empty());
    }
    #[test]
    fn a_failed_node_is_retried() {
        let params   = params(1);
        let recorder = Recorder::default();
        let script   = vec![LpResult::abandoned(3), LpResult::optimal(5.0, vec![1.0], vec![], 1)];
        let report = run_search(&params, items(&[(1.0, 1.0)]),
            || Scripted::new(script.clone()), &FRACTIONAL, &recorder).unwrap();

        assert_eq!(Completion { is_exact: true, best_value: Some(5.0) }, report.completion);
        assert_eq!(1, report.tree.retried);
        assert_eq!(0, report.tree.failed);
        assert_eq!(5.0, report.best_bound);
        assert_eq!(1, recorder.seen.lock().len());
    }
    #[test]
    fn a_node_failing_too_often_is_dropped() {
        let params = Parameters { max_node_retries: 2, ..params(1) };
        let report = run_search(&params, items(&[(1.0, 1.0)]),
            || Scripted::new(vec![LpResult::abandoned(3)]), &FRACTIONAL, &NoObserver).unwrap();
        assert!(!report.completion.is_exact);
        assert_eq!(2, report.tree.retried);
        assert_eq!(1, report.tree.failed);
    }
    #[test]
    fn a_failure_can_abort_the_search() {
        let params = Parameters { failure_policy: FailurePolicy::Escalate, ..params(1) };
        let result = run_search(&params, items(&[(1.0, 1.0)]),
            || Scripted::new(vec![LpResult::abandoned(3)]), &FRACTIONAL, &NoObserver);
        assert!(matches!(result,
            Err(BcpError::NodeFailed { node: NodeId(0), reason: FailureReason::Abandoned })));
    }
    #[test]
    fn the_most_promising_child_is_dived_into_on_the_same_worker() {
        let params = params(1);
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        c.dispatch_all().unwrap();
        assert_eq!(c.root, dispatched(&workers[0]).node);

        c.handle(branched(c.root, 1.0, &[2.0, 1.0])).unwrap();
        let a = dispatched(&workers[0]);
        assert_eq!(NodeId(2), a.node);
        assert_eq!(1, a.depth);
        assert_eq!(1.0, a.bound);
        assert_eq!(vec![BoundChange { var: 0, lb: 1.0, ub: 1.0 }], a.formulation.bound_changes);
        assert_eq!(1, c.store.nb_candidates());
        assert_eq!(NodeId(2), c.outstanding[&WorkerId(0)].node);
        assert_eq!(NodeStatus::Branched, c.store.node(c.root).unwrap().status);
    }
    #[test]
    fn no_dive_when_the_child_is_not_promising_enough() {
        let params = params(1);
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        c.dispatch_all().unwrap();
        dispatched(&workers[0]);
        // some other candidate has a much better bound
        let other = c.store.create_child(c.root, -100.0, vec![]).unwrap();
        c.store.enqueue(other).unwrap();

        c.handle(branched(c.root, 1.0, &[2.0, 1.0])).unwrap();
        assert_eq!(0, workers[0].pending());
        assert_eq!(3, c.store.nb_candidates());
        assert!(c.outstanding.is_empty());
        assert_eq!(0, c.scheduler.committed_node());
    }
    #[test]
    fn no_dive_when_diving_is_disabled() {
        let params = Parameters { dive: false, ..params(1) };
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        c.dispatch_all().unwrap();
        dispatched(&workers[0]);

        c.handle(branched(c.root, 1.0, &[2.0, 1.0])).unwrap();
        assert_eq!(0, workers[0].pending());
        assert_eq!(2, c.store.nb_candidates());
    }
    #[test]
    fn a_report_from_the_wrong_worker_is_a_protocol_violation() {
        let params = params(2);
        let (mut c, _workers) = coordinator(&params, &NoCutoff, &NoObserver);
        c.dispatch_all().unwrap();
        let mut envelope = branched(c.root, 1.0, &[1.0]);
        envelope.from = ProcessId::Worker(WorkerId(1));
        assert!(matches!(c.handle(envelope), Err(BcpError::Unexpected { message: "NodeProcessed", .. })));
    }
    #[test]
    fn only_improving_solutions_become_incumbent() {
        let params   = params(1);
        let recorder = Recorder::default();
        let (mut c, _workers) = coordinator(&params, &NoCutoff, &recorder);
        let report = |objective| Envelope {
            from: ProcessId::Worker(WorkerId(0)),
            message: Message::ReportIncumbent(Solution { objective, values: vec![] }),
        };
        c.handle(report(10.0)).unwrap();
        c.handle(report(12.0)).unwrap();
        c.handle(report(10.0)).unwrap();
        c.handle(report(8.0)).unwrap();
        assert_eq!(Some(8.0), c.incumbent_value());
        assert_eq!(vec![10.0, 8.0], recorder.seen.lock().iter().map(|s| s.objective).collect::<Vec<_>>());
    }
    #[test]
    fn a_new_incumbent_prunes_the_fringe() {
        let params = params(1);
        let (mut c, _workers) = coordinator(&params, &NoCutoff, &NoObserver);
        for b in [1.0, 5.0, 9.0] {
            let child = c.store.create_child(c.root, b, vec![]).unwrap();
            c.store.enqueue(child).unwrap();
        }
        c.handle(Envelope {
            from: ProcessId::Worker(WorkerId(0)),
            message: Message::ReportIncumbent(Solution { objective: 5.0, values: vec![] }),
        }).unwrap();
        // root (-inf) and the child at 1.0 remain
        assert_eq!(2, c.store.nb_candidates());
        assert_eq!(2, c.store.stats().pruned);
    }
    #[test]
    fn branching_ids_are_granted_and_released() {
        let params = params(3);
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        c.handle(Envelope { from: ProcessId::Worker(WorkerId(0)), message: Message::RequestBranchingIds(2) }).unwrap();
        let granted = match workers[0].recv().unwrap().message {
            Message::BranchingIdsGranted(ids) => ids,
            other => panic!("unexpected {other:?}"),
        };
        // two wanted, made odd
        assert_eq!(1, granted.len());
        assert_eq!(1, c.scheduler.committed_branching());

        c.handle(Envelope { from: ProcessId::Worker(granted[0]), message: Message::ReleaseBranchingId(granted[0]) }).unwrap();
        assert_eq!(0, c.scheduler.committed_branching());
        assert!(matches!(
            c.handle(Envelope { from: ProcessId::Worker(granted[0]), message: Message::ReleaseBranchingId(granted[0]) }),
            Err(BcpError::NotCommitted { .. })));
    }
    #[test]
    fn node_ids_are_served_to_external_requesters() {
        let params = params(1);
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        c.handle(Envelope { from: ProcessId::Worker(WorkerId(0)), message: Message::RequestNodeId }).unwrap();
        assert_eq!(Message::NodeIdGranted(Some(WorkerId(0))), workers[0].recv().unwrap().message);
        c.handle(Envelope { from: ProcessId::Worker(WorkerId(0)), message: Message::RequestNodeId }).unwrap();
        assert_eq!(Message::NodeIdGranted(None), workers[0].recv().unwrap().message);
        c.handle(Envelope { from: ProcessId::Worker(WorkerId(0)), message: Message::ReleaseNodeId(WorkerId(0)) }).unwrap();
        assert_eq!(1, c.scheduler.free_count());
    }
    #[test]
    fn ids_can_be_added_while_running() {
        let params = params(1);
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        let late = c.channel.attach(WorkerId(7)).unwrap();
        // nobody listens for 8
        c.handle(Envelope { from: ProcessId::Coordinator, message: Message::AddIds(vec![WorkerId(7), WorkerId(8)]) }).unwrap();
        assert_eq!(2, c.scheduler.total());
        assert_eq!(vec![WorkerId(0), WorkerId(7)], c.workers);

        // the last id added is the first one given out
        c.dispatch_all().unwrap();
        assert_eq!(c.root, dispatched(&late).node);
        assert_eq!(0, workers[0].pending());
        assert_eq!(WorkerId(7), c.outstanding.keys().copied().next().unwrap());
        assert!(matches!(
            c.handle(Envelope { from: ProcessId::Coordinator, message: Message::AddIds(vec![WorkerId(7)]) }),
            Err(BcpError::DuplicateWorker(WorkerId(7)))));
    }
    #[test]
    fn the_search_waits_for_helpers_to_come_back() {
        let params = params(2);
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        let root = c.store.pop_candidate().unwrap();
        c.store.set_status(root, NodeStatus::Processing).unwrap();
        c.store.set_status(root, NodeStatus::Pruned).unwrap();

        c.handle(Envelope { from: ProcessId::Worker(WorkerId(0)), message: Message::RequestBranchingIds(1) }).unwrap();
        let helper = match workers[0].recv().unwrap().message {
            Message::BranchingIdsGranted(ids) => ids[0],
            other => panic!("unexpected {other:?}"),
        };
        assert!(!c.is_idle());
        workers[helper.id()].send(ProcessId::Coordinator, &Message::ReleaseBranchingId(helper)).unwrap();

        let report = c.run().unwrap();
        assert!(report.completion.is_exact);
        assert_eq!(0, report.scheduler.committed_branching);
        assert!(c.is_idle());
    }
    #[test]
    fn the_endpoint_outlives_the_search() {
        let params = Parameters { termination_grace: 0.01, ..params(1) };
        let budget = TimeBudget::new(Duration::from_millis(30));
        let (mut c, workers) = coordinator(&params, &budget, &NoObserver);
        let report = c.run().unwrap();
        assert_eq!(Some(Reason::CutoffOccurred), report.abort_proof);

        // the root is still being processed
        assert_eq!(c.root, dispatched(&workers[0]).node);
        assert_eq!(Message::Terminate, workers[0].recv().unwrap().message);
        workers[0].send(ProcessId::Coordinator, &Message::ReleaseNodeId(WorkerId(0))).unwrap();
    }
    #[test]
    fn a_worker_that_quits_aborts_the_search() {
        let params = params(1);
        let (mut c, _workers) = coordinator(&params, &NoCutoff, &NoObserver);
        assert!(matches!(
            c.handle(Envelope { from: ProcessId::Worker(WorkerId(0)), message: Message::Terminate }),
            Err(BcpError::WorkerLost(WorkerId(0)))));
    }
    #[test]
    fn messages_meant_for_workers_are_rejected() {
        let params = params(1);
        let (mut c, _workers) = coordinator(&params, &NoCutoff, &NoObserver);
        assert!(matches!(
            c.handle(Envelope { from: ProcessId::Worker(WorkerId(0)), message: Message::BranchingIdsGranted(vec![]) }),
            Err(BcpError::Unexpected { .. })));
    }
    #[test]
    fn an_external_terminate_stops_the_search() {
        let params = params(1);
        let (mut c, workers) = coordinator(&params, &NoCutoff, &NoObserver);
        c.channel.send(ProcessId::Coordinator, &Message::Terminate).unwrap();
        let report = c.run().unwrap();

        assert_eq!(Some(Reason::Terminated), report.abort_proof);
        assert!(!report.completion.is_exact);
        assert_eq!(f64::NEG_INFINITY, report.best_bound);
        // the root was dispatched before the request was seen
        assert!(matches!(workers[0].recv().unwrap().message, Message::DispatchNode(_)));
        assert_eq!(Message::Terminate, workers[0].recv().unwrap().message);
    }
    #[test]
    fn nothing_is_dispatched_once_the_cutoff_occurred() {
        let params = params(1);
        let budget = TimeBudget::new(Duration::ZERO);
        let (mut c, workers) = coordinator(&params, &budget, &NoObserver);
        let report = c.run().unwrap();

        assert_eq!(Some(Reason::CutoffOccurred), report.abort_proof);
        assert_eq!(0, report.tree.processed);
        assert_eq!(Message::Terminate, workers[0].recv().unwrap().message);
        assert_eq!(0, workers[0].pending());
    }
    #[test]
    fn the_pricing_phase_defers_then_resumes_the_nodes() {
        let spec   = [(10.0, 6.0), (6.0, 5.0), (5.0, 5.0)];
        let params = Parameters { pricing_phase: true, ..params(1) };
        let report = run_search(&params, items(&spec),
            || KnapsackLp { capacity: 8.0 }, &FRACTIONAL, &NoObserver).unwrap();
        assert_eq!(Completion { is_exact: true, best_value: Some(brute_force(&spec, 8.0)) }, report.completion);
        assert_eq!(1, report.tree.deferred);
    }
    #[test]
    fn a_knapsack_is_solved_to_optimality_with_many_workers() {
        let spec   = [(10.0, 5.0), (40.0, 4.0), (30.0, 6.0), (50.0, 3.0), (35.0, 7.0), (25.0, 2.0)];
        let params = params(3);
        let report = run_search(&params, items(&spec),
            || KnapsackLp { capacity: 13.0 }, &Fractional { width: 2 }, &NoObserver).unwrap();
        assert_eq!(Completion { is_exact: true, best_value: Some(brute_force(&spec, 13.0)) }, report.completion);
        assert_eq!(brute_force(&spec, 13.0), report.best_bound);
        assert_eq!(0, report.scheduler.committed_node);
        assert_eq!(0, report.scheduler.committed_branching);
    }
}
