//! A tiny deterministic target for demos and end-to-end tests.
//!
//! [`MazeTarget`] walks a grid maze driven by the control pad. Each visited
//! cell is a coverage location, as is each attempt to walk into a wall or
//! off the grid, so coverage grows as the search finds deeper paths.

use crate::coverage::{CoverageBitmap, StateSnapshot};
use crate::input::{Button, InputSequence};
use crate::tester::{Execution, Target};

/// Largest width or height; positions must fit the one-byte snapshot fields.
pub const MAX_SIDE: usize = u8::MAX as usize;

const DEFAULT_MAZE: [&str; 8] = [
    "S.#.....", //
    ".##.###.", //
    "....#...", //
    "#.#.#.#.", //
    "..#...#.", //
    ".####.#.", //
    "......#.", //
    "#.###..G", //
];

/// A grid maze: `#` walls, `.` open, `S` start, `G` goal.
///
/// Location IDs for an `N`-cell maze: `0..N` are visited cells,
/// `N + cell * 4 + dir` are blocked moves, and `5 * N` is the goal.
#[derive(Debug, Clone)]
pub struct MazeTarget {
    width: usize,
    height: usize,
    walls: Vec<bool>,
    start: (usize, usize),
    goal: (usize, usize),
    runs: u64,
}

impl MazeTarget {
    /// The built-in 8x8 maze.
    pub fn new() -> Self {
        match Self::from_rows(&DEFAULT_MAZE) {
            Some(maze) => maze,
            None => unreachable!("built-in maze is malformed"),
        }
    }

    /// Parse a maze. Returns `None` unless every row has the same width,
    /// neither side exceeds [`MAX_SIDE`], and there is exactly one `S` and
    /// one `G`.
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.len();
        if width == 0 || width > MAX_SIDE || height > MAX_SIDE {
            return None;
        }

        let mut walls = Vec::with_capacity(width * height);
        let mut start = None;
        let mut goal = None;
        for (r, row) in rows.iter().enumerate() {
            if row.len() != width {
                return None;
            }
            for (c, ch) in row.chars().enumerate() {
                match ch {
                    '#' => walls.push(true),
                    '.' => walls.push(false),
                    'S' if start.is_none() => {
                        start = Some((r, c));
                        walls.push(false);
                    }
                    'G' if goal.is_none() => {
                        goal = Some((r, c));
                        walls.push(false);
                    }
                    _ => return None,
                }
            }
        }

        Some(Self {
            width,
            height,
            walls,
            start: start?,
            goal: goal?,
            runs: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Executions performed so far.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    fn cell(&self, (r, c): (usize, usize)) -> usize {
        r * self.width + c
    }

    fn cells(&self) -> u32 {
        (self.width * self.height) as u32
    }

    /// Location ID of a blocked move from `(row, col)` in direction `button`.
    pub fn blocked_location(&self, pos: (usize, usize), button: Button) -> u32 {
        let dir = button.symbol().index();
        self.cells() + (self.cell(pos) * 4 + dir) as u32
    }

    /// Location ID reported when the goal cell is reached.
    pub fn goal_location(&self) -> u32 {
        self.cells() * 5
    }

    fn step(&self, (r, c): (usize, usize), button: Button) -> Option<(usize, usize)> {
        let (nr, nc) = match button {
            Button::Up => (r.checked_sub(1)?, c),
            Button::Down => (r + 1, c),
            Button::Left => (r, c.checked_sub(1)?),
            Button::Right => (r, c + 1),
        };
        if nr >= self.height || nc >= self.width || self.walls[nr * self.width + nc] {
            return None;
        }
        Some((nr, nc))
    }

    /// Walk `input` from the start cell.
    ///
    /// Symbols outside the control pad are skipped. The walk halts at the
    /// goal. The snapshot is `[row, col, moves, reached_goal]`.
    pub fn walk(&self, input: &InputSequence) -> Execution {
        let mut coverage = CoverageBitmap::new();
        let mut pos = self.start;
        let mut moves: u8 = 0;
        coverage.insert(self.cell(pos) as u32);

        for symbol in input.iter() {
            if pos == self.goal {
                break;
            }
            let Some(button) = Button::from_symbol(symbol) else {
                continue;
            };
            match self.step(pos, button) {
                Some(next) => {
                    pos = next;
                    moves = moves.saturating_add(1);
                    coverage.insert(self.cell(pos) as u32);
                }
                None => coverage.insert(self.blocked_location(pos, button)),
            }
        }

        let reached = pos == self.goal;
        if reached {
            coverage.insert(self.goal_location());
        }

        Execution {
            coverage,
            state: StateSnapshot::new(vec![pos.0 as u8, pos.1 as u8, moves, reached as u8]),
        }
    }
}

impl Default for MazeTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for MazeTarget {
    type Input = InputSequence;

    fn execute(&mut self, input: &InputSequence) -> Execution {
        self.runs += 1;
        self.walk(input)
    }
}
