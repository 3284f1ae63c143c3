//! Sliding Puzzle State-Space Explorer
//!
//! Searches the move graph of an N x N sliding puzzle, prints solution paths
//! and state-space statistics, and shows the explored states as an
//! interactive 3D graph laid out by a force-directed simulation.

mod visualization;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use puzzlespace::force::ForceLayout;
use puzzlespace::layout::{
    Execution, LayoutConfig, LayoutKind, LayoutStrategy, RadialConfig, Repulsion,
};
use puzzlespace::path::format_moves;
use puzzlespace::search::{SearchStrategy, DEFAULT_VISUALIZATION_DEPTH};
use puzzlespace::spatial::OctreeBackend;
use puzzlespace::{problem, Problem, PuzzleOps};

use visualization::{GraphView, Placement};

/// Goal board of the default demo, searched from the solved board.
const DEMO_GOAL: &str = "5 4 3 / 1 0 7 / 2 8 6";

/// Explores sliding-puzzle state spaces and visualizes them in 3D.
#[derive(Parser)]
#[command(name = "puzzlespace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Search for a path from the initial to the goal board and print its moves.
    Solve(SolveArgs),
    /// Exhaustively explore every state reachable from the initial board.
    Explore(ExploreArgs),
    /// Run a layout over a search result and print its extent.
    Layout(LayoutArgs),
    /// Show a search result in an interactive 3D viewer.
    Display(LayoutArgs),
}

#[derive(Args)]
struct BoardArgs {
    /// Board edge length.
    #[arg(long, default_value_t = 3)]
    size: usize,
    /// Initial board, row-major, empty cell as 0 (e.g. "1 2 3 / 4 5 6 / 7 8 0").
    #[arg(long)]
    initial: Option<String>,
    /// Goal board; defaults to the solved board.
    #[arg(long)]
    goal: Option<String>,
}

#[derive(Args)]
struct SolveArgs {
    #[command(flatten)]
    board: BoardArgs,
    #[arg(long, value_enum, default_value_t = StrategyArg::Bfs)]
    strategy: StrategyArg,
    /// Stop expanding at this depth.
    #[arg(long)]
    depth_limit: Option<usize>,
}

#[derive(Args)]
struct ExploreArgs {
    #[command(flatten)]
    board: BoardArgs,
    #[arg(long)]
    depth_limit: Option<usize>,
}

#[derive(Args)]
struct LayoutArgs {
    #[command(flatten)]
    board: BoardArgs,
    #[arg(long, value_enum, default_value_t = StrategyArg::Bfs)]
    strategy: StrategyArg,
    #[arg(long, default_value_t = DEFAULT_VISUALIZATION_DEPTH)]
    depth_limit: usize,
    #[arg(long, value_enum, default_value_t = LayoutArg::Force)]
    layout: LayoutArg,
    #[arg(long, value_enum, default_value_t = RepulsionArg::BarnesHut)]
    repulsion: RepulsionArg,
    #[arg(long, value_enum, default_value_t = OctreeArg::Pointer)]
    octree: OctreeArg,
    /// Run force phases on all cores.
    #[arg(long)]
    parallel: bool,
    #[arg(long, default_value_t = 100)]
    iterations: usize,
    #[arg(long, default_value_t = 0.5)]
    theta: f32,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Bfs,
    Dfs,
    Complete,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Force,
    Radial,
}

#[derive(Clone, Copy, ValueEnum)]
enum RepulsionArg {
    BarnesHut,
    Naive,
}

#[derive(Clone, Copy, ValueEnum)]
enum OctreeArg {
    Pointer,
    Flat,
}

impl From<StrategyArg> for SearchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Bfs => SearchStrategy::BreadthFirst,
            StrategyArg::Dfs => SearchStrategy::DepthFirst,
            StrategyArg::Complete => SearchStrategy::CompleteExploration,
        }
    }
}

impl BoardArgs {
    /// The initial board defaults to the solved board.
    fn problem(&self) -> anyhow::Result<Box<dyn PuzzleOps>> {
        let solved;
        let initial = match &self.initial {
            Some(text) => text.as_str(),
            None => {
                solved = solved_text(self.size);
                solved.as_str()
            }
        };
        problem(self.size, initial, self.goal.as_deref()).context("invalid board")
    }
}

impl LayoutArgs {
    fn config(&self) -> LayoutConfig {
        LayoutConfig {
            max_iterations: self.iterations,
            theta: self.theta,
            seed: self.seed,
            repulsion: match self.repulsion {
                RepulsionArg::BarnesHut => Repulsion::BarnesHut,
                RepulsionArg::Naive => Repulsion::Naive,
            },
            octree_backend: match self.octree {
                OctreeArg::Pointer => OctreeBackend::Pointer,
                OctreeArg::Flat => OctreeBackend::Flat,
            },
            execution: if self.parallel {
                Execution::Parallel
            } else {
                Execution::Sequential
            },
            ..LayoutConfig::default()
        }
    }

    fn kind(&self) -> LayoutKind {
        match self.layout {
            LayoutArg::Force => LayoutKind::ForceDirected(self.config()),
            LayoutArg::Radial => LayoutKind::Radial(RadialConfig::default()),
        }
    }
}

/// Row-major text of the solved board of edge length `size`.
fn solved_text(size: usize) -> String {
    let cells = size * size;
    (1..=cells)
        .map(|value| (value % cells).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Solve(args)) => run_solve(&args),
        Some(Command::Explore(args)) => run_explore(&args),
        Some(Command::Layout(args)) => run_layout(&args),
        Some(Command::Display(args)) => run_display(&args),
        None => {
            // default: solve and display the demo board
            let demo = LayoutArgs {
                board: BoardArgs {
                    size: 3,
                    initial: None,
                    goal: Some(DEMO_GOAL.to_string()),
                },
                strategy: StrategyArg::Bfs,
                depth_limit: DEFAULT_VISUALIZATION_DEPTH,
                layout: LayoutArg::Force,
                repulsion: RepulsionArg::BarnesHut,
                octree: OctreeArg::Flat,
                parallel: true,
                iterations: 100,
                theta: 0.5,
                seed: 42,
            };
            run_solve(&SolveArgs {
                board: BoardArgs {
                    size: 3,
                    initial: None,
                    goal: Some(DEMO_GOAL.to_string()),
                },
                strategy: StrategyArg::Bfs,
                depth_limit: None,
            })?;
            println!("Controls: Arrows move, U/Y undo/redo, Space solve, Esc cancel, T reverse");
            run_display(&demo)
        }
    }
}

/// Depth-first search has no depth cutoff.
fn check_depth_limit(strategy: StrategyArg, depth_limit: Option<usize>) -> anyhow::Result<()> {
    if let (StrategyArg::Dfs, Some(limit)) = (strategy, depth_limit) {
        bail!("--depth-limit {limit} cannot be used with --strategy dfs");
    }
    Ok(())
}

/// Solves and prints the move sequence.
fn run_solve(args: &SolveArgs) -> anyhow::Result<()> {
    check_depth_limit(args.strategy, args.depth_limit)?;
    let ops = args.board.problem()?;
    println!("{}", ops.format_boards());
    if !ops.is_solvable() {
        println!("Goal is in the other parity class; the search will not reach it");
    }

    let report = ops.solve(args.strategy.into(), args.depth_limit)?;
    println!("Search ended with {:?} after {} states", report.status, report.states);
    if !report.moves.is_empty() {
        println!("{} moves: {}", report.moves.len(), format_moves(&report.moves));
    }
    Ok(())
}

/// Prints the size of the reachable state space.
fn run_explore(args: &ExploreArgs) -> anyhow::Result<()> {
    let ops = args.board.problem()?;
    let report = ops.explore(args.depth_limit);
    println!(
        "{} states, {} adjacency entries, deepest state {} moves away ({:?})",
        report.states, report.edges, report.max_depth, report.status
    );
    Ok(())
}

/// Lays out a search result and prints where the states ended up.
fn run_layout(args: &LayoutArgs) -> anyhow::Result<()> {
    let ops = args.board.problem()?;
    let report = ops.layout(args.strategy.into(), Some(args.depth_limit), &args.kind())?;
    println!("Placed {} of {} states", report.placed, report.states);
    if let Some(bounds) = report.bounds {
        println!(
            "Center {:?}, radius {:.2}",
            bounds.center().to_array(),
            bounds.radius()
        );
    }
    Ok(())
}

/// Searches, lays out and opens the viewer.
fn run_display(args: &LayoutArgs) -> anyhow::Result<()> {
    match args.board.size {
        2 => display_sized::<2>(args),
        3 => display_sized::<3>(args),
        4 => display_sized::<4>(args),
        size => bail!("the viewer supports board sizes 2 to 4, got {size}"),
    }
}

fn display_sized<const N: usize>(args: &LayoutArgs) -> anyhow::Result<()> {
    let solved = solved_text(N);
    let initial = args.board.initial.as_deref().unwrap_or(&solved);
    let Problem { initial, goal } =
        Problem::<N>::parse(initial, args.board.goal.as_deref()).context("invalid board")?;

    let result = SearchStrategy::from(args.strategy).run(&initial, &goal, Some(args.depth_limit));
    println!("Loaded {} states ({:?})", result.nodes.len(), result.status);

    let placement = match args.layout {
        LayoutArg::Force => {
            let mut layout = ForceLayout::new(args.config())?;
            layout.initialize(&result.nodes, &initial);
            Placement::Animated(layout)
        }
        LayoutArg::Radial => Placement::Fixed(
            LayoutKind::Radial(RadialConfig::default()).layout(&result.nodes, &initial)?,
        ),
    };

    visualization::display(GraphView {
        nodes: result.nodes,
        start: initial,
        goal,
        solve_depth: args.depth_limit,
        placement,
    });
    Ok(())
}
