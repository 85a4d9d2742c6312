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


//! This module provides the implementation of a parallel solver. The
//! coordinator runs on the calling thread and every worker gets a thread of
//! its own; they only talk through a `LocalNetwork`. By default, it uses as
//! many workers as the number of hardware threads available on the machine.

use tracing::{error, warn};

use crate::*;

/// This is the structure implementing the multi-threaded engine.
///
/// # Example Usage
/// ```
/// # use bcp::*;
/// # struct Toy;
/// # impl LpSolver for Toy {
/// #     fn solve(&mut self, lp: &Formulation, _cutoff: f64) -> LpResult {
/// #         let (lb, ub) = lp.effective_bounds()[0];
/// #         if lb > ub { LpResult::infeasible(1) } else { LpResult::optimal(2.0 * lb, vec![lb], vec![], 1) }
/// #     }
/// # }
/// # struct NeverBranch;
/// # impl BranchingRule for NeverBranch {
/// #     fn select(&self, _: &Formulation, _: &LpResult) -> Branching { Branching::Integral }
/// # }
/// // 1. The relaxation solver of each worker is built by a factory
/// let factory = |_: WorkerId| Toy;
///
/// // 2. Tune the engine (or load the parameters from a toml file)
/// let params = ParametersBuilder::default()
///     .nb_workers(2)
///     .max_run_time(60.0)
///     .build()
///     .unwrap();
///
/// // 3. Instantiate the solver with your policies and the initial formulation
/// let x = Variable { id: 0, tag: 0, lb: 0.0, ub: 1.0, obj: 2.0, data: vec![] };
/// let mut solver = ParallelSolver::new(
///     &factory, &NoColumns, &NoCuts, &NeverBranch,
///     vec![Payload::from(x)], params).unwrap();
///
/// // 4. Minimize
/// let outcome = solver.minimize().unwrap();
/// assert!(outcome.is_exact);
/// assert_eq!(Some(0.0), outcome.best_value);
/// assert_eq!(0.0, solver.gap());
/// ```
pub struct ParallelSolver<'a, F: SolverFactory> {
    /// Creates the relaxation solver of each worker (on the worker thread)
    factory  : &'a F,
    columns  : &'a (dyn ColumnGenerator + Sync),
    cuts     : &'a (dyn CutGenerator + Sync),
    branching: &'a (dyn BranchingRule + Sync),
    observer : &'a dyn SolutionObserver,
    /// The formulation of the root node
    initial  : Vec<Payload>,
    params   : Parameters,
    interrupt: Interrupt,

    incumbent : Option<Solution>,
    best_bound: f64,
    explored  : usize,
    report    : Option<SearchReport>,
}

impl <'a, F: SolverFactory> ParallelSolver<'a, F> {
    /// Creates a solver; fails when the parameters are inconsistent
    pub fn new(
        factory  : &'a F,
        columns  : &'a (dyn ColumnGenerator + Sync),
        cuts     : &'a (dyn CutGenerator + Sync),
        branching: &'a (dyn BranchingRule + Sync),
        initial  : Vec<Payload>,
        params   : Parameters,
    ) -> BcpResult<Self> {
        params.validate()?;
        Ok(ParallelSolver {
            factory,
            columns,
            cuts,
            branching,
            observer  : &NoObserver,
            initial,
            params,
            interrupt : Interrupt::new(),
            incumbent : None,
            best_bound: f64::NEG_INFINITY,
            explored  : 0,
            report    : None,
        })
    }
    /// Registers a hook called every time the incumbent improves
    pub fn with_observer(mut self, observer: &'a dyn SolutionObserver) -> Self {
        self.observer = observer;
        self
    }
    /// A handle that stops the search when triggered (from any thread)
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }
    /// The detailed report of the last search (if any)
    pub fn report(&self) -> Option<&SearchReport> {
        self.report.as_ref()
    }
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Runs one search. The coordinator endpoint is kept alive until every
    /// worker has stopped, so that the late reports of a search cut short
    /// still find a recipient.
    fn search(&self, cutoff: &dyn Cutoff) -> BcpResult<SearchReport> {
        let ids = (0..self.params.nb_workers).map(WorkerId).collect::<Vec<_>>();
        let (channel, endpoints) = LocalNetwork::build(&ids);
        let mut coordinator = Coordinator::new(channel, ids.clone(), self.initial.clone(), &self.params, cutoff, self.observer)?
            .with_incumbent(self.incumbent.clone());

        let policies = Policies { columns: self.columns, cuts: self.cuts, branching: self.branching };
        let worker_params = WorkerParams::from(&self.params);
        let factory = self.factory;

        let (outcome, failures) = std::thread::scope(|s| {
            let handles = ids.iter().copied().zip(endpoints)
                .map(|(id, endpoint)| (id, s.spawn(move || {
                    let solver = factory.create(id);
                    Worker::new(id, endpoint, solver, policies, worker_params).run()
                })))
                .collect::<Vec<_>>();

            let outcome = coordinator.run();

            let mut failures = vec![];
            for (id, handle) in handles {
                let result = handle.join().unwrap_or_else(|_| {
                    error!(worker = %id, "worker panicked");
                    Err(BcpError::WorkerLost(id))
                });
                if let Err(e) = result {
                    failures.push((id, e));
                }
            }
            (outcome, failures)
        });

        match outcome {
            Ok(report) => {
                for (worker, e) in failures.iter() {
                    warn!(%worker, error = %e, "worker failed after the search was over");
                }
                Ok(report)
            },
            // a worker failure is the root cause of a coordinator error
            Err(e) => Err(failures.into_iter()
                .map(|(_, e)| e)
                .find(|e| !matches!(e, BcpError::Disconnected(_)))
                .unwrap_or(e)),
        }
    }
}

impl <F: SolverFactory> Solver for ParallelSolver<'_, F> {
    fn minimize(&mut self) -> BcpResult<Completion> {
        let report = match self.params.max_run_time() {
            Some(budget) => self.search(&AnyOf(TimeBudget::new(budget), self.interrupt.clone())),
            None         => self.search(&self.interrupt),
        }?;
        self.incumbent  = report.incumbent.clone();
        self.best_bound = report.best_bound;
        self.explored   = report.tree.processed;
        let completion  = report.completion.clone();
        self.report     = Some(report);
        Ok(completion)
    }
    fn best_value(&self) -> Option<f64> {
        self.incumbent.as_ref().map(|s| s.objective)
    }
    fn best_solution(&self) -> Option<Solution> {
        self.incumbent.clone()
    }
    fn best_bound(&self) -> f64 {
        self.best_bound
    }
    fn set_incumbent(&mut self, solution: Solution) {
        let improves = self.best_value().map_or(true, |v| solution.objective < v);
        if improves {
            self.incumbent = Some(solution);
        }
    }
    fn explored(&self) -> usize {
        self.explored
    }
}
