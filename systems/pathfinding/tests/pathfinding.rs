use std::collections::HashSet;

use grid_pursuit_core::{CellCoord, EntityId, PathResult};
use grid_pursuit_system_pathfinding::find_path;
use grid_pursuit_world::Grid;

#[test]
fn open_grid_paths_have_manhattan_length() {
    let grid = Grid::default();

    for start_x in 0..grid.width() {
        for start_y in (0..grid.height()).step_by(3) {
            for target_x in (0..grid.width()).step_by(2) {
                for target_y in 0..grid.height() {
                    let start = CellCoord::new(start_x, start_y);
                    let target = CellCoord::new(target_x, target_y);
                    let path = find_path(&grid, start, target)
                        .into_cells()
                        .expect("open grid is fully connected");

                    assert_eq!(
                        path.len() as u32,
                        start.manhattan_distance(target) + 1,
                        "{start:?} -> {target:?}"
                    );
                    assert_eq!(path.first(), Some(&start));
                    assert_eq!(path.last(), Some(&target));
                    assert_orthogonal_without_repeats(&path);
                }
            }
        }
    }
}

#[test]
fn start_equal_to_target_returns_single_cell() {
    let mut grid = Grid::default();
    let cell = CellCoord::new(4, 4);
    grid.set_occupant(cell, Some(EntityId::new(1)))
        .expect("in range");

    assert_eq!(find_path(&grid, cell, cell), PathResult::Found(vec![cell]));
}

#[test]
fn obstacle_target_is_not_found() {
    let mut grid = Grid::default();
    let target = CellCoord::new(7, 2);
    grid.set_obstacle(target, true).expect("in range");

    for start in [CellCoord::new(0, 0), CellCoord::new(7, 3), CellCoord::new(9, 9)] {
        assert_eq!(find_path(&grid, start, target), PathResult::NotFound);
    }
}

#[test]
fn occupied_target_is_not_found() {
    let mut grid = Grid::default();
    let target = CellCoord::new(2, 2);
    grid.set_occupant(target, Some(EntityId::new(9)))
        .expect("in range");

    assert_eq!(
        find_path(&grid, CellCoord::new(0, 0), target),
        PathResult::NotFound
    );
}

#[test]
fn out_of_bounds_target_is_not_found() {
    let grid = Grid::default();

    assert_eq!(
        find_path(&grid, CellCoord::new(0, 0), CellCoord::new(10, 3)),
        PathResult::NotFound
    );
}

#[test]
fn empty_grid_scenario_yields_eight_cells_with_steady_progress() {
    let grid = Grid::default();
    let start = CellCoord::new(0, 0);
    let target = CellCoord::new(3, 4);

    let path = find_path(&grid, start, target)
        .into_cells()
        .expect("path exists");

    assert_eq!(path.len(), 8);
    assert_orthogonal_without_repeats(&path);
    for pair in path.windows(2) {
        assert!(
            pair[1].manhattan_distance(start) > pair[0].manhattan_distance(start),
            "progress stalled at {:?}",
            pair[1]
        );
        assert!(pair[1].manhattan_distance(target) < pair[0].manhattan_distance(target));
    }
}

#[test]
fn wall_with_single_gap_routes_through_gap() {
    let mut grid = Grid::default();
    for x in 0..grid.width() {
        if x != 5 {
            grid.set_obstacle(CellCoord::new(x, 5), true)
                .expect("in range");
        }
    }

    let path = find_path(&grid, CellCoord::new(0, 0), CellCoord::new(0, 9))
        .into_cells()
        .expect("gap keeps the grid connected");

    assert!(path.contains(&CellCoord::new(5, 5)));
    assert_orthogonal_without_repeats(&path);
    assert!(path.iter().all(|cell| grid.get_obstacle(*cell) == Ok(false)));
    // Shortest detour: 5 across, 9 up, 5 back.
    assert_eq!(path.len(), 20);
}

#[test]
fn sealed_target_is_not_found() {
    let mut grid = Grid::default();
    for x in 0..grid.width() {
        grid.set_obstacle(CellCoord::new(x, 5), true)
            .expect("in range");
    }

    assert_eq!(
        find_path(&grid, CellCoord::new(0, 0), CellCoord::new(0, 9)),
        PathResult::NotFound
    );
}

#[test]
fn occupants_are_routed_around() {
    let mut grid = Grid::new(3, 3);
    grid.set_occupant(CellCoord::new(1, 0), Some(EntityId::new(2)))
        .expect("in range");

    let path = find_path(&grid, CellCoord::new(0, 0), CellCoord::new(2, 0))
        .into_cells()
        .expect("detour exists");

    assert!(!path.contains(&CellCoord::new(1, 0)));
    assert_eq!(path.len(), 5);
}

#[test]
fn repeated_queries_are_identical() {
    let mut grid = Grid::default();
    for cell in [
        CellCoord::new(3, 3),
        CellCoord::new(3, 4),
        CellCoord::new(4, 3),
        CellCoord::new(6, 7),
    ] {
        grid.set_obstacle(cell, true).expect("in range");
    }

    let first = find_path(&grid, CellCoord::new(1, 1), CellCoord::new(8, 8));
    let second = find_path(&grid, CellCoord::new(1, 1), CellCoord::new(8, 8));

    assert!(first.is_found());
    assert_eq!(first, second);
}

fn assert_orthogonal_without_repeats(path: &[CellCoord]) {
    for pair in path.windows(2) {
        assert!(
            pair[0].is_adjacent_to(pair[1]),
            "{:?} -> {:?} is not an orthogonal step",
            pair[0],
            pair[1]
        );
    }
    let unique: HashSet<_> = path.iter().copied().collect();
    assert_eq!(unique.len(), path.len(), "path revisits a cell");
}
