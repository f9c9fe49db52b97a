//! Simulation core: sparse board state, toroidal neighbor counting and the
//! generation-advance rule. Knows nothing about rendering or scheduling;
//! the bevy side drives it and consumes the deltas it reports.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use thiserror::Error;

/// Live cells, keyed by row. Rows without live cells are never present.
/// Ordered containers keep iteration (and therefore delta order) stable.
pub type LiveCells = BTreeMap<u32, BTreeSet<u32>>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeError {
    #[error("grid dimensions must be at least 1x1, got {rows}x{cols}")]
    InvalidDimensions { rows: u32, cols: u32 },
    #[error("cell ({row}, {col}) lies outside the {rows}x{cols} grid")]
    OutOfRange {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub rows: u32,
    pub cols: u32,
}

impl GridDims {
    pub fn new(rows: u32, cols: u32) -> Result<Self, LifeError> {
        if rows == 0 || cols == 0 {
            return Err(LifeError::InvalidDimensions { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    #[inline]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.rows && col < self.cols
    }

    #[inline]
    pub fn cell_count(&self) -> u64 {
        self.rows as u64 * self.cols as u64
    }
}

/// One cell whose liveness changed during an advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellDelta {
    pub row: u32,
    pub col: u32,
    pub alive: bool,
}

/// Wraps `coord + offset` onto a toroidal axis of length `len`.
///
/// Offsets are always ±1, so a coordinate is at most one step out of range
/// and a single fixup suffices.
#[inline]
fn wrap(coord: u32, offset: i32, len: u32) -> u32 {
    let pos = coord as i64 + offset as i64;
    if pos < 0 {
        len - 1
    } else if pos >= len as i64 {
        0
    } else {
        pos as u32
    }
}

#[inline]
fn is_live(cells: &LiveCells, row: u32, col: u32) -> bool {
    cells.get(&row).is_some_and(|cols| cols.contains(&col))
}

/// Counts live neighbors of `(row, col)` in the 8-cell Moore neighborhood,
/// wrapping around the grid edges. Returns a value in `0..=8`.
///
/// On a 1-wide axis a cell wraps onto itself, so it can show up among its
/// own neighbor candidates. That is a property of the torus, not an error.
pub fn live_neighbors(row: u32, col: u32, dims: GridDims, cells: &LiveCells) -> u8 {
    let mut count = 0;
    for row_off in -1..=1 {
        for col_off in -1..=1 {
            if row_off == 0 && col_off == 0 {
                continue;
            }
            let neigh_row = wrap(row, row_off, dims.rows);
            let neigh_col = wrap(col, col_off, dims.cols);
            if is_live(cells, neigh_row, neigh_col) {
                count += 1;
            }
        }
    }
    count
}

/// Widens `[min, max]` of the occupied coordinates by one on each side.
/// When the occupied span reaches either edge the wrap seam comes into
/// play, so the band falls back to the whole axis.
fn axis_band(min: u32, max: u32, len: u32) -> RangeInclusive<u32> {
    if min == 0 || max + 1 >= len {
        0..=len - 1
    } else {
        min - 1..=max + 1
    }
}

/// Row and column bands that cover every cell which can change on the next
/// advance. Conservative near the edges, never under-scanning.
fn active_region(
    cells: &LiveCells,
    dims: GridDims,
) -> (RangeInclusive<u32>, RangeInclusive<u32>) {
    let full = (0..=dims.rows - 1, 0..=dims.cols - 1);

    let (Some((&row_min, _)), Some((&row_max, _))) =
        (cells.first_key_value(), cells.last_key_value())
    else {
        return full;
    };

    let mut col_min = u32::MAX;
    let mut col_max = 0;
    for cols in cells.values() {
        // row sets are never empty, both unwraps see at least one element
        col_min = col_min.min(*cols.first().unwrap());
        col_max = col_max.max(*cols.last().unwrap());
    }

    (
        axis_band(row_min, row_max, dims.rows),
        axis_band(col_min, col_max, dims.cols),
    )
}

/// Rounds a raw random draw onto the coarse 0.0, 0.1, .., 1.0 buckets used
/// for random population, so consecutive fills look visibly different.
#[inline]
fn coarse_density(raw: f32) -> f32 {
    (raw * 10.0).round() / 10.0
}

/// The generation engine. Owns the current and previous live-cell sets and
/// the applied grid dimensions; callers only ever see read-only views.
#[derive(Debug, Clone)]
pub struct LifeBoard {
    dims: GridDims,
    current: LiveCells,
    previous: LiveCells,
    generation: u64,
}

impl LifeBoard {
    pub fn new(rows: u32, cols: u32) -> Result<Self, LifeError> {
        Ok(Self {
            dims: GridDims::new(rows, cols)?,
            current: LiveCells::new(),
            previous: LiveCells::new(),
            generation: 0,
        })
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn population(&self) -> usize {
        self.current.values().map(BTreeSet::len).sum()
    }

    pub fn is_alive(&self, row: u32, col: u32) -> bool {
        is_live(&self.current, row, col)
    }

    /// Row-major iteration over the live cells of the current generation.
    pub fn live_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.current
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |&col| (row, col)))
    }

    /// Replaces the grid dimensions and starts over from an empty board.
    /// Zero rows or columns are rejected before anything is touched.
    pub fn set_dimensions(&mut self, rows: u32, cols: u32) -> Result<(), LifeError> {
        self.dims = GridDims::new(rows, cols)?;
        self.current.clear();
        self.previous.clear();
        self.generation = 0;
        Ok(())
    }

    /// Flips one cell and returns its new liveness. Coordinates outside the
    /// grid are an error, not clamped; callers hand in validated indices.
    pub fn toggle_cell(&mut self, row: u32, col: u32) -> Result<bool, LifeError> {
        if !self.dims.contains(row, col) {
            return Err(LifeError::OutOfRange {
                row,
                col,
                rows: self.dims.rows,
                cols: self.dims.cols,
            });
        }
        let cols = self.current.entry(row).or_default();
        if cols.remove(&col) {
            if cols.is_empty() {
                self.current.remove(&row);
            }
            Ok(false)
        } else {
            cols.insert(col);
            Ok(true)
        }
    }

    /// Discards the current population and refills the whole grid, making
    /// each cell live with probability `density`.
    ///
    /// Without an explicit density one is drawn per call and rounded to one
    /// decimal; a supplied value is clamped into `0.0..=1.0`.
    pub fn randomize(&mut self, density: Option<f32>) -> f32 {
        let density = match density {
            Some(value) => value.clamp(0.0, 1.0),
            None => coarse_density(fastrand::f32()),
        };

        self.current.clear();
        self.generation = 0;
        for row in 0..self.dims.rows {
            let mut live_cols = BTreeSet::new();
            for col in 0..self.dims.cols {
                if fastrand::f32() < density {
                    live_cols.insert(col);
                }
            }
            if !live_cols.is_empty() {
                self.current.insert(row, live_cols);
            }
        }
        density
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.generation = 0;
    }

    /// Advances one generation and reports every cell whose liveness
    /// changed, in row-major order.
    ///
    /// A cell is live in the next generation iff it has exactly 3 live
    /// neighbors, or it is currently live with exactly 2. Only the active
    /// region is scanned; everything outside it keeps (and in Life's rule,
    /// that means stays in) the dead state.
    ///
    /// Deterministic: the result depends on nothing but the current set and
    /// the dimensions.
    pub fn advance(&mut self) -> Vec<CellDelta> {
        let (row_band, col_band) = active_region(&self.current, self.dims);

        self.previous = std::mem::take(&mut self.current);

        let mut next = LiveCells::new();
        for row in row_band {
            let mut live_cols = BTreeSet::new();
            for col in col_band.clone() {
                let neighbors = live_neighbors(row, col, self.dims, &self.previous);
                let lives = match (is_live(&self.previous, row, col), neighbors) {
                    (true, 2) | (true, 3) => true,
                    (false, 3) => true,
                    _ => false,
                };
                if lives {
                    live_cols.insert(col);
                }
            }
            if !live_cols.is_empty() {
                next.insert(row, live_cols);
            }
        }

        self.current = next;
        self.generation += 1;
        self.changed_cells()
    }

    /// Symmetric difference of `previous` and `current`, row-major.
    fn changed_cells(&self) -> Vec<CellDelta> {
        let rows: BTreeSet<u32> = self
            .previous
            .keys()
            .chain(self.current.keys())
            .copied()
            .collect();

        let mut deltas = Vec::new();
        for row in rows {
            let before = self.previous.get(&row);
            let after = self.current.get(&row);
            let cols: BTreeSet<u32> = before
                .into_iter()
                .chain(after)
                .flat_map(|cols| cols.iter().copied())
                .collect();
            for col in cols {
                let was = before.is_some_and(|cols| cols.contains(&col));
                let now = after.is_some_and(|cols| cols.contains(&col));
                if was != now {
                    deltas.push(CellDelta {
                        row,
                        col,
                        alive: now,
                    });
                }
            }
        }
        deltas
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn board_with(rows: u32, cols: u32, live: &[(u32, u32)]) -> LifeBoard {
        let mut board = LifeBoard::new(rows, cols).unwrap();
        for &(row, col) in live {
            board.toggle_cell(row, col).unwrap();
        }
        board
    }

    fn live_set(board: &LifeBoard) -> Vec<(u32, u32)> {
        board.live_cells().collect()
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert_eq!(
            LifeBoard::new(0, 10).unwrap_err(),
            LifeError::InvalidDimensions { rows: 0, cols: 10 }
        );

        let mut board = board_with(4, 4, &[(1, 1)]);
        assert!(board.set_dimensions(4, 0).is_err());
        // failed resize leaves the board untouched
        assert_eq!(board.dims(), GridDims { rows: 4, cols: 4 });
        assert!(board.is_alive(1, 1));
    }

    #[test]
    fn resize_clears_the_population() {
        let mut board = board_with(4, 4, &[(1, 1), (2, 3)]);
        board.set_dimensions(6, 9).unwrap();
        assert_eq!(board.dims(), GridDims { rows: 6, cols: 9 });
        assert!(board.is_empty());
        assert_eq!(board.generation(), 0);
    }

    #[test]
    fn toggle_round_trips_and_prunes_rows() {
        let mut board = LifeBoard::new(3, 3).unwrap();
        assert!(board.toggle_cell(1, 2).unwrap());
        assert!(board.is_alive(1, 2));
        assert!(!board.toggle_cell(1, 2).unwrap());
        assert!(board.is_empty());

        assert_eq!(
            board.toggle_cell(3, 0).unwrap_err(),
            LifeError::OutOfRange {
                row: 3,
                col: 0,
                rows: 3,
                cols: 3
            }
        );
    }

    #[test]
    fn corner_neighbors_wrap_around() {
        let board = board_with(3, 3, &[(0, 0)]);
        // (2, 2) touches (0, 0) across both seams of the torus
        assert_eq!(live_neighbors(2, 2, board.dims(), &board.current), 1);
        assert_eq!(live_neighbors(1, 1, board.dims(), &board.current), 1);
    }

    #[test]
    fn one_wide_axis_wraps_onto_itself() {
        let board = board_with(1, 3, &[(0, 0)]);
        // row offsets -1 and +1 both land back on row 0, so the cell sees
        // itself twice among its neighbor candidates
        assert_eq!(live_neighbors(0, 0, board.dims(), &board.current), 2);
    }

    #[test]
    fn lone_cell_dies() {
        let mut board = board_with(5, 5, &[(2, 2)]);
        let deltas = board.advance();
        assert!(board.is_empty());
        assert_eq!(
            deltas,
            vec![CellDelta {
                row: 2,
                col: 2,
                alive: false
            }]
        );
    }

    #[test]
    fn birth_needs_exactly_three_neighbors() {
        // three live cells around a dead center
        let mut board = board_with(6, 6, &[(1, 1), (1, 3), (3, 2)]);
        board.advance();
        assert!(board.is_alive(2, 2));
    }

    #[test]
    fn overpopulated_cell_dies() {
        // center has four live neighbors
        let mut board = board_with(6, 6, &[(2, 2), (1, 1), (1, 3), (3, 1), (3, 3)]);
        board.advance();
        assert!(!board.is_alive(2, 2));
    }

    #[test]
    fn block_is_a_still_life() {
        let block = &[(1, 1), (1, 2), (2, 1), (2, 2)];
        let mut board = board_with(5, 5, block);
        let deltas = board.advance();
        assert!(deltas.is_empty());
        assert_eq!(live_set(&board), block.to_vec());
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let horizontal = &[(2, 1), (2, 2), (2, 3)];
        let mut board = board_with(5, 5, horizontal);

        let deltas = board.advance();
        assert_eq!(live_set(&board), vec![(1, 2), (2, 2), (3, 2)]);
        assert_eq!(
            deltas,
            vec![
                CellDelta {
                    row: 1,
                    col: 2,
                    alive: true
                },
                CellDelta {
                    row: 2,
                    col: 1,
                    alive: false
                },
                CellDelta {
                    row: 2,
                    col: 3,
                    alive: false
                },
                CellDelta {
                    row: 3,
                    col: 2,
                    alive: true
                },
            ]
        );

        board.advance();
        assert_eq!(live_set(&board), horizontal.to_vec());
        assert_eq!(board.generation(), 2);
    }

    #[test]
    fn advance_is_deterministic() {
        let mut a = board_with(8, 8, &[(1, 2), (2, 3), (3, 1), (3, 2), (3, 3)]);
        let mut b = a.clone();
        for _ in 0..10 {
            assert_eq!(a.advance(), b.advance());
            assert_eq!(live_set(&a), live_set(&b));
        }
    }

    #[test]
    fn glider_crosses_the_seam() {
        // a glider on a torus never leaves the board, it keeps translating
        // through the seam with all 5 cells intact
        let mut board = board_with(6, 6, &[(1, 2), (2, 3), (3, 1), (3, 2), (3, 3)]);
        for _ in 0..48 {
            board.advance();
        }
        assert_eq!(board.population(), 5);
    }

    #[test]
    fn active_region_stays_inside_for_interior_populations() {
        let board = board_with(10, 10, &[(4, 5), (5, 5)]);
        let (rows, cols) = active_region(&board.current, board.dims());
        assert_eq!(rows, 3..=6);
        assert_eq!(cols, 4..=6);
    }

    #[test]
    fn active_region_widens_to_full_axis_at_the_edges() {
        let board = board_with(10, 10, &[(0, 4)]);
        let (rows, cols) = active_region(&board.current, board.dims());
        assert_eq!(rows, 0..=9);
        assert_eq!(cols, 3..=5);

        let board = board_with(10, 10, &[(4, 9)]);
        let (rows, cols) = active_region(&board.current, board.dims());
        assert_eq!(rows, 3..=5);
        assert_eq!(cols, 0..=9);
    }

    #[test]
    fn active_region_covers_everything_when_empty() {
        let board = LifeBoard::new(7, 3).unwrap();
        let (rows, cols) = active_region(&board.current, board.dims());
        assert_eq!(rows, 0..=6);
        assert_eq!(cols, 0..=2);
    }

    #[test]
    fn clear_empties_the_board() {
        let mut board = board_with(4, 4, &[(0, 0), (3, 3)]);
        board.clear();
        assert!(board.is_empty());
        assert_eq!(board.population(), 0);
    }

    #[test]
    fn full_density_fills_every_cell() {
        let mut board = LifeBoard::new(3, 7).unwrap();
        board.randomize(Some(1.0));
        assert!(!board.is_empty());
        assert_eq!(board.population() as u64, board.dims().cell_count());
    }

    #[test]
    fn zero_density_fills_nothing() {
        let mut board = LifeBoard::new(3, 7).unwrap();
        board.randomize(Some(0.0));
        assert!(board.is_empty());
    }

    #[test]
    fn drawn_density_lands_on_tenth_buckets() {
        for raw in [0.0, 0.04, 0.05, 0.14, 0.99, 1.0] {
            let bucketed = coarse_density(raw);
            let scaled = bucketed * 10.0;
            assert_eq!(scaled, scaled.round());
        }
        assert_eq!(coarse_density(0.26), 0.3);
        assert_eq!(coarse_density(0.74), 0.7);
    }

    #[test]
    fn population_matches_live_cell_iteration() {
        let mut board = LifeBoard::new(9, 9).unwrap();
        board.randomize(Some(0.5));
        assert_eq!(board.population(), board.live_cells().count());
    }
}
