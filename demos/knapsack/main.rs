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


//! This example shows how to solve the 0/1 knapsack problem with bcp, using
//! column generation (each item is a column of the master problem) and
//! strong branching. It is a fairly simple example but it features most of
//! the aspects you will want to copy when plugging your own relaxation.

use std::time::Instant;

use bcp::*;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::{io_utils::read_instance, model::{DantzigLp, ItemBranching, ItemPricing}};

mod model;
mod io_utils;


/// This structure uses `clap-derive` annotations and define the arguments that can
/// be passed on to the executable solver.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path to the instance file
    fname: String,
    /// A toml file holding the engine parameters
    #[clap(short, long)]
    config: Option<String>,
    /// The number of worker threads (overrides the config)
    #[clap(short, long)]
    threads: Option<usize>,
    /// The maximum amount of time (seconds) you would like this solver to run
    #[clap(short, long)]
    duration: Option<f64>,
    /// The node selection order
    #[clap(short, long, value_enum)]
    order: Option<Order>,
    /// Start from an empty formulation and let the items be priced in
    #[clap(short, long)]
    pricing: bool,
    /// Number of branching candidates proposed to strong branching
    #[clap(short, long, default_value = "1")]
    width: usize,
}

/// The node selection orders that can be picked from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Order {
    /// Smallest lower bound first
    BestBound,
    /// Oldest node first
    BreadthFirst,
    /// Deepest node first
    DepthFirst,
}
impl From<Order> for SearchOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::BestBound    => SearchOrder::BestBound,
            Order::BreadthFirst => SearchOrder::BreadthFirst,
            Order::DepthFirst   => SearchOrder::DepthFirst,
        }
    }
}

/// This is your executable's entry point. It is the place where all the pieces are put together
/// to create a solver for the knapsack problem.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args    = Args::parse();
    let problem = read_instance(&args.fname)?;

    let mut params = match &args.config {
        Some(path) => Parameters::from_file(path)?,
        None       => Parameters::default(),
    };
    if let Some(t) = args.threads {
        params.nb_workers = t;
    }
    if args.duration.is_some() {
        params.max_run_time = args.duration;
    }
    if let Some(order) = args.order {
        params.search_order = order.into();
    }
    params.strong_branching_candidates = params.strong_branching_candidates.max(args.width);

    let columns = problem.columns();
    let (initial, pricing) = if args.pricing {
        (vec![], ItemPricing { pool: columns, batch: 4 })
    } else {
        (columns.into_iter().map(Payload::from).collect(), ItemPricing { pool: vec![], batch: 1 })
    };
    let capacity  = problem.capacity;
    let factory   = move |_: WorkerId| DantzigLp { capacity };
    let branching = ItemBranching { width: args.width };

    let mut solver = ParallelSolver::new(&factory, &pricing, &NoCuts, &branching, initial, params)?;

    let start = Instant::now();
    let Completion { is_exact, best_value } = solver.minimize()?;
    let duration = start.elapsed();

    let best_solution = solver.best_solution()
        .map(|s| s.values.iter().filter(|v| v.value > 0.5).map(|v| v.var).collect::<Vec<_>>());

    println!("Duration:   {:.3} seconds", duration.as_secs_f32());
    println!("Objective:  {}",            best_value.map(|v| -v).unwrap_or(0.0));
    println!("Upper Bnd:  {}",            -solver.best_bound());
    println!("Gap:        {:.3}",         solver.gap());
    println!("Explored:   {}",            solver.explored());
    println!("Aborted:    {}",            !is_exact);
    println!("Solution:   {:?}",          best_solution.unwrap_or_default());
    Ok(())
}
