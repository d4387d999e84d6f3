#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line shell that scripts a pursuit session.
//!
//! Obstacles and moves are given as flags; every move of the controlled
//! entity is simulated tick by tick until both entities stand still, after
//! which their positions are printed.

mod config;
mod layout_transfer;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use grid_pursuit_core::{CellCoord, Command, Event};
use grid_pursuit_session::{Session, CONTROLLED, PURSUER};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "grid-pursuit")]
#[command(about = "Scripted grid pursuit simulation", version)]
struct Cli {
    /// TOML file with session settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of grid columns
    #[arg(long)]
    width: Option<u32>,

    /// Override the number of grid rows
    #[arg(long)]
    height: Option<u32>,

    /// Obstacle layout string to load before anything else
    #[arg(long)]
    layout: Option<String>,

    /// Block the cell at X,Y
    #[arg(long = "obstacle", value_name = "X,Y", value_parser = parse_cell)]
    obstacles: Vec<CellCoord>,

    /// Move the controlled entity to X,Y (repeatable, applied in order)
    #[arg(long = "move", value_name = "X,Y", value_parser = parse_cell)]
    moves: Vec<CellCoord>,

    /// Send the controlled entity back to the origin cell after all moves
    #[arg(long)]
    reset: bool,

    /// Print the hover description of X,Y at the end
    #[arg(long, value_name = "X,Y", value_parser = parse_cell)]
    describe: Vec<CellCoord>,

    /// Simulated milliseconds per tick
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Ticks allowed for the entities to settle after each move
    #[arg(long, default_value_t = 10_000)]
    max_ticks: u32,

    /// Print the final obstacle layout as a transfer string
    #[arg(long)]
    export_layout: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the grid pursuit command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    let mut session = Session::new(&config).context("could not start the session")?;
    let tick = Duration::from_millis(cli.tick_ms);
    let mut events = Vec::new();

    if let Some(layout) = &cli.layout {
        let layout = layout_transfer::decode(layout).context("invalid --layout string")?;
        session.apply(Command::LoadObstacles { layout }, &mut events);
    }
    for &cell in &cli.obstacles {
        session.apply(
            Command::SetObstacle {
                cell,
                obstacle: true,
            },
            &mut events,
        );
    }
    check_setup(&events)?;

    for &target in &cli.moves {
        events.clear();
        if let Err(reason) = session.request_move(CONTROLLED, target.x(), target.y(), &mut events)
        {
            println!("move to {} rejected: {reason}", format_cell(target));
            continue;
        }
        let ticks = settle(&mut session, tick, cli.max_ticks, &mut events)?;
        debug!(ticks, events = events.len(), "move settled");
        print_positions(&session);
    }

    if cli.reset {
        events.clear();
        session.apply(Command::ResetControlled, &mut events);
        let _ = settle(&mut session, tick, cli.max_ticks, &mut events)?;
        print_positions(&session);
    }

    for &cell in &cli.describe {
        let description = session.describe_cell(cell.x(), cell.y())?;
        println!("{description}");
    }

    print!("{}", render_grid(&session));

    if cli.export_layout {
        let layout = session.grid().obstacle_layout();
        println!("{}", layout_transfer::encode(&layout)?);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn check_setup(events: &[Event]) -> Result<()> {
    for event in events {
        match event {
            Event::LayoutRejected { reason } => bail!("layout could not be loaded: {reason}"),
            Event::CommandRejected { reason } => warn!(%reason, "obstacle ignored"),
            _ => {}
        }
    }
    Ok(())
}

fn settle(
    session: &mut Session,
    tick: Duration,
    max_ticks: u32,
    events: &mut Vec<Event>,
) -> Result<u32> {
    for elapsed in 0..max_ticks {
        if session.is_settled() {
            return Ok(elapsed);
        }
        session.apply(Command::Tick { dt: tick }, events);
    }
    if session.is_settled() {
        return Ok(max_ticks);
    }
    bail!("entities still moving after {max_ticks} ticks")
}

fn print_positions(session: &Session) {
    println!(
        "controlled {} pursuer {}",
        format_cell(session.controlled().position()),
        format_cell(session.pursuer().position())
    );
}

fn render_grid(session: &Session) -> String {
    let grid = session.grid();
    let mut rendered = String::new();

    for y in (0..grid.height()).rev() {
        for x in 0..grid.width() {
            let cell = CellCoord::new(x, y);
            let symbol = match grid.get_occupant(cell) {
                Some(entity) if entity == CONTROLLED => 'C',
                Some(entity) if entity == PURSUER => 'P',
                Some(_) => '?',
                None if grid.get_obstacle(cell).unwrap_or(false) => '#',
                None => '.',
            };
            rendered.push(symbol);
        }
        rendered.push('\n');
    }

    rendered
}

fn format_cell(cell: CellCoord) -> String {
    format!("({}, {})", cell.x(), cell.y())
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but found '{value}'"))?;
    let x = x
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid column '{x}': {error}"))?;
    let y = y
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid row '{y}': {error}"))?;
    Ok(CellCoord::new(x, y))
}
