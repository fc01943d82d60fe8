//! `cwf-bench`: times one engine over synthetic workflows.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cwf::{
    engine::{Engine, RunMode},
    logging::{LogLevel, init_logging},
    plan::{ExecutionPlan, WorkflowBuilder},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Shape {
    /// Random DAG; each task depends on up to a quarter of its predecessors.
    Random,
    /// Fixed 13-task render frame.
    Frame,
}

#[derive(Debug, Parser)]
#[command(version, about = "Time a worker pool over synthetic DAG workflows")]
struct Args {
    /// Number of tasks of a random workflow.
    #[arg(long, default_value_t = 100)]
    tasks: usize,

    /// Number of worker threads.
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Workflow to generate.
    #[arg(long, value_enum, default_value_t = Shape::Random)]
    shape: Shape,

    /// How many times the plan is executed.
    #[arg(long, default_value_t = 1)]
    repeat: usize,

    /// Busy-wait duration of every task body, in microseconds.
    #[arg(long, default_value_t = 10)]
    task_micros: u64,

    /// Seed for the random workflow; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Log verbosity; falls back to `CWF_LOG`, then `info`.
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

fn busy_sleep(duration: Duration) {
    let start = Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}

fn frame_workflow(work: Duration) -> Result<ExecutionPlan> {
    let body = move || busy_sleep(work);
    let mut builder = WorkflowBuilder::new("Frame");
    builder
        .task("Input", body)?
        .task("Network", body)?
        .task_with_deps("Camera", body, ["Input", "Network"])?
        .task_with_deps("Transforms", body, ["Input", "Network"])?
        .task_with_deps("Sky", body, ["Camera"])?
        .task_with_deps("Terrain", body, ["Camera"])?
        .task_with_deps("Solids", body, ["Camera"])?
        .task_with_deps("Particles", body, ["Camera"])?
        .task_with_deps("Dynamics", body, ["Camera", "Transforms"])?
        .task_with_deps("Character", body, ["Camera", "Transforms"])?
        .task_with_deps(
            "Post",
            body,
            ["Sky", "Terrain", "Solids", "Particles", "Dynamics", "Character"],
        )?
        .task_with_deps("Gui", body, ["Post"])?
        .task_with_deps("ResolveCommandLists", body, ["Gui"])?;
    Ok(builder.build()?)
}

fn random_workflow(num_tasks: usize, work: Duration, rng: &mut impl Rng) -> Result<ExecutionPlan> {
    let names: Vec<String> = (0..num_tasks).map(|i| format!("Task-{i}")).collect();
    let mut builder = WorkflowBuilder::new("Random");
    for (i, name) in names.iter().enumerate() {
        // Candidates are the first `i - 1` tasks; small prefixes stay roots.
        let max = i.saturating_sub(1);
        let dependencies: Vec<&str> = if max > 4 {
            let count = rng.random_range(0..max / 4);
            (0..count)
                .map(|_| names[rng.random_range(0..max)].as_str())
                .collect()
        } else {
            Vec::new()
        };
        builder.task_with_deps(name.as_str(), move || busy_sleep(work), dependencies)?;
    }
    Ok(builder.build()?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level)?;

    let work = Duration::from_micros(args.task_micros);
    let plan = match args.shape {
        Shape::Frame => frame_workflow(work)?,
        Shape::Random => {
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            random_workflow(args.tasks, work, &mut rng)?
        }
    };
    info!(workflow = plan.name(), tasks = plan.len(), "plan built");

    let start = Instant::now();
    {
        let engine = Engine::new(args.threads).context("failed to start engine")?;
        for _ in 0..args.repeat {
            engine.run_workflow(&plan, RunMode::Block)?;
        }
    }
    let elapsed = start.elapsed();

    println!("Time taken: {:.3}ms", elapsed.as_secs_f64() * 1000.0);
    println!("Threads: {}", args.threads);
    println!("Tasks:   {}", plan.len());
    println!("Repeats: {}", args.repeat);
    Ok(())
}
