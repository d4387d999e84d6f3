use std::time::Duration;

use grid_pursuit_core::{CellCoord, Command, Event};
use grid_pursuit_session::{Session, SessionConfig, CONTROLLED};

#[test]
fn deterministic_replay_produces_identical_logs() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::MoveCompleted { entity, .. } if *entity == CONTROLLED)));
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    controlled: CellCoord,
    pursuer: CellCoord,
    ticks: u64,
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut session = Session::new(&SessionConfig::default()).expect("default configuration");
    let mut events = Vec::new();

    for command in commands {
        session.apply(command, &mut events);
    }

    ReplayOutcome {
        events,
        controlled: session.controlled().position(),
        pursuer: session.pursuer().position(),
        ticks: session.tick_index(),
    }
}

fn scripted_commands() -> Vec<Command> {
    let tick = Command::Tick {
        dt: Duration::from_millis(50),
    };
    let mut commands = vec![
        Command::SetObstacle {
            cell: CellCoord::new(5, 3),
            obstacle: true,
        },
        Command::SetObstacle {
            cell: CellCoord::new(4, 3),
            obstacle: true,
        },
        Command::RequestMove {
            entity: CONTROLLED,
            target: CellCoord::new(5, 6),
        },
    ];
    commands.extend(std::iter::repeat(tick.clone()).take(200));
    commands.push(Command::RequestMove {
        entity: CONTROLLED,
        target: CellCoord::new(1, 8),
    });
    commands.extend(std::iter::repeat(tick.clone()).take(200));
    commands.push(Command::ResetControlled);
    commands.extend(std::iter::repeat(tick).take(300));
    commands
}
