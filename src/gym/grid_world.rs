use std::{fmt, fs, path::Path, str::FromStr};

use strum::VariantArray;

use crate::{
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment, Model, Report, Reporting},
    error::Result,
};

const STEP_REWARD: f64 = -1.0;
const GOAL_REWARD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Square {
    Floor,
    Wall,
    Start,
    Goal,
}

impl Square {
    fn symbol(self) -> char {
        match self {
            Square::Floor => '.',
            Square::Wall => '#',
            Square::Start => 'S',
            Square::Goal => 'G',
        }
    }
}

#[derive(
    strum::Display,
    strum::EnumString,
    VariantArray,
    Clone,
    Copy,
    Debug,
    Hash,
    PartialEq,
    Eq,
)]
#[strum(serialize_all = "lowercase")]
pub enum GridAction {
    Up,
    Down,
    Left,
    Right,
}

impl GridAction {
    fn offset(self) -> (isize, isize) {
        match self {
            GridAction::Up => (-1, 0),
            GridAction::Down => (1, 0),
            GridAction::Left => (0, -1),
            GridAction::Right => (0, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("map is empty")]
    Empty,
    #[error("line {line} has width {found}, expected {expected}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown square {symbol:?} at line {line}, column {column}")]
    UnknownSquare {
        line: usize,
        column: usize,
        symbol: char,
    },
    #[error("map has no start square")]
    MissingStart,
    #[error("map has more than one start square")]
    MultipleStarts,
    #[error("map has no goal square")]
    MissingGoal,
}

/// A deterministic grid world read from a text map
///
/// `#` is a wall, `.` is floor, `S` the single start and `G` a goal. Every non-wall
/// square is a state, numbered row by row. Moving into a wall or off the map leaves
/// the agent in place. Each move costs 1, entering a goal pays 10 and ends the
/// episode; goals are absorbing.
#[derive(Debug, Clone)]
pub struct GridWorld {
    width: usize,
    squares: Vec<Square>,
    /// Square index of each state
    cells: Vec<usize>,
    /// State of each square, `None` for walls
    states: Vec<Option<usize>>,
    start: usize,
    pos: usize,
    pub report: Report,
}

impl GridWorld {
    /// Read a map from a text file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(text.parse()?)
    }

    fn square(&self, state: usize) -> Square {
        self.squares[self.cells[state]]
    }

    /// Square index reached by moving from `cell`, if it is on the map
    fn neighbour(&self, cell: usize, action: GridAction) -> Option<usize> {
        let height = self.squares.len() / self.width;
        let (dr, dc) = action.offset();
        let row = (cell / self.width).checked_add_signed(dr)?;
        let col = (cell % self.width).checked_add_signed(dc)?;
        (row < height && col < self.width).then_some(row * self.width + col)
    }
}

impl FromStr for GridWorld {
    type Err = MapError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lines = s
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>();
        let width = lines.first().ok_or(MapError::Empty)?.chars().count();

        let mut squares = Vec::with_capacity(width * lines.len());
        for (i, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(MapError::Ragged {
                    line: i + 1,
                    expected: width,
                    found,
                });
            }
            for (j, symbol) in line.chars().enumerate() {
                squares.push(match symbol {
                    '.' => Square::Floor,
                    '#' => Square::Wall,
                    'S' => Square::Start,
                    'G' => Square::Goal,
                    _ => {
                        return Err(MapError::UnknownSquare {
                            line: i + 1,
                            column: j + 1,
                            symbol,
                        })
                    }
                });
            }
        }

        let mut cells = Vec::new();
        let mut states = vec![None; squares.len()];
        for (cell, square) in squares.iter().enumerate() {
            if *square != Square::Wall {
                states[cell] = Some(cells.len());
                cells.push(cell);
            }
        }

        let mut starts = cells.iter().filter(|&&c| squares[c] == Square::Start);
        let start_cell = *starts.next().ok_or(MapError::MissingStart)?;
        if starts.next().is_some() {
            return Err(MapError::MultipleStarts);
        }
        if !squares.contains(&Square::Goal) {
            return Err(MapError::MissingGoal);
        }
        let start = states[start_cell].ok_or(MapError::MissingStart)?;

        Ok(Self {
            width,
            squares,
            cells,
            states,
            start,
            pos: start,
            report: Report::new(vec!["reward", "steps"]),
        })
    }
}

impl Environment for GridWorld {
    type State = usize;
    type Action = GridAction;

    fn is_active(&self) -> bool {
        self.square(self.pos) != Square::Goal
    }

    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f64) {
        let (next, reward) = self.transition(self.pos, action);
        self.pos = next;

        self.report.entry("steps").and_modify(|x| *x += 1.0);
        self.report.entry("reward").and_modify(|x| *x += reward);

        (self.is_active().then_some(next), reward)
    }

    fn reset(&mut self) -> Self::State {
        self.pos = self.start;
        self.pos
    }
}

impl DiscreteStateSpace for GridWorld {
    fn n_states(&self) -> usize {
        self.cells.len()
    }
}

impl DiscreteActionSpace for GridWorld {
    fn actions(&self) -> Vec<Self::Action> {
        GridAction::VARIANTS.to_vec()
    }
}

impl Model for GridWorld {
    fn transition(&self, state: usize, action: GridAction) -> (usize, f64) {
        if self.square(state) == Square::Goal {
            return (state, 0.0);
        }

        let next = self
            .neighbour(self.cells[state], action)
            .and_then(|cell| self.states[cell])
            .unwrap_or(state);

        match self.square(next) {
            Square::Goal => (next, GOAL_REWARD),
            _ => (next, STEP_REWARD),
        }
    }

    fn current_state(&self) -> usize {
        self.pos
    }
}

impl Reporting for GridWorld {
    fn report(&mut self) -> &mut Report {
        &mut self.report
    }
}

impl fmt::Display for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let agent = self.cells[self.pos];
        for (cell, square) in self.squares.iter().enumerate() {
            if cell > 0 && cell % self.width == 0 {
                writeln!(f)?;
            }
            let symbol = if cell == agent { 'A' } else { square.symbol() };
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{
        algo::dp::{greedy_from_q, greedy_from_v, q_value_iteration, value_iteration, DPConfig},
        env::act_label,
        error::Error,
    };

    const MAP: &str = "\
#######
#S..#G#
#.#.#.#
#...#.#
##....#
#######
";

    fn world() -> GridWorld {
        MAP.parse().unwrap()
    }

    #[test]
    fn parses_states_row_major() {
        let env = world();
        assert_eq!(env.n_states(), 15);
        assert_eq!(env.n_actions(), 4);
        assert_eq!(env.current_state(), 0);
        assert_eq!(env.to_string(), MAP.replacen('S', "A", 1).trim_end());
    }

    #[rstest]
    #[case("", MapError::Empty)]
    #[case("#S\n#G#\n", MapError::Ragged { line: 2, expected: 2, found: 3 })]
    #[case("S.x\n..G\n", MapError::UnknownSquare { line: 1, column: 3, symbol: 'x' })]
    #[case("..G\n", MapError::MissingStart)]
    #[case("S.S\n..G\n", MapError::MultipleStarts)]
    #[case("S..\n", MapError::MissingGoal)]
    fn rejects_malformed_maps(#[case] map: &str, #[case] expected: MapError) {
        assert_eq!(map.parse::<GridWorld>().unwrap_err(), expected);
    }

    #[test]
    fn walls_and_edges_block_movement() {
        let env = "S.G\n".parse::<GridWorld>().unwrap();
        assert_eq!(env.transition(0, GridAction::Up), (0, -1.0));
        assert_eq!(env.transition(0, GridAction::Left), (0, -1.0));
        assert_eq!(env.transition(0, GridAction::Right), (1, -1.0));
        assert_eq!(env.transition(1, GridAction::Right), (2, 10.0));
        assert_eq!(env.transition(2, GridAction::Left), (2, 0.0));

        let env = world();
        assert_eq!(env.transition(0, GridAction::Up), (0, -1.0), "wall above start");
    }

    #[test]
    fn unknown_action_label_is_rejected() {
        let mut env = world();
        let err = act_label(&mut env, "north").unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"north\" is not a valid action. Available actions are up, down, left, right"
        );
        assert_eq!(env.current_state(), 0);

        act_label(&mut env, "right").unwrap();
        assert_eq!(env.current_state(), 1);
        assert_eq!(env.report["steps"], 1.0);
    }

    #[test]
    fn greedy_policy_walks_shortest_path() {
        let mut env = world();
        let v = value_iteration(&env, &DPConfig::default()).unwrap().table;
        let q = q_value_iteration(&env, &DPConfig::default()).unwrap().table;

        // ten moves: nine paid steps and the goal
        assert_eq!(v[env.current_state()], 1.0);

        let mut steps = 0;
        while env.is_active() {
            let state = env.current_state();
            let action = greedy_from_v(&v, &env, state).unwrap();
            assert_eq!(greedy_from_q(&q, &env, state).unwrap(), action);
            env.step(action);
            steps += 1;
            assert!(steps <= 10, "policy does not reach the goal");
        }
        assert_eq!(steps, 10);
        assert_eq!(env.report["reward"], 1.0);
    }

    #[test]
    fn reset_returns_to_start() {
        let mut env = world();
        env.step(GridAction::Down);
        assert_ne!(env.current_state(), 0);
        assert_eq!(env.reset(), 0);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = GridWorld::load("does/not/exist.txt").unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{err:?}");
    }
}
