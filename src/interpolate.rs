//! Linear interpolation over the two-dimensional reference tables

/// Linear interpolation between (x1, y1) and (x2, y2); returns y1 when the
/// two abscissae coincide.
pub fn interpolate(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x1 == x2 {
        return y1;
    }
    y1 + (y2 - y1) * (x - x1) / (x2 - x1)
}

/// What a lookup does with a value outside its key range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Hold the value at the nearest end key
    Clamp,
    /// Continue along the line through the first and last keys
    Extend,
}

/// Indices of the two adjacent keys straddling `x`.
///
/// `keys` must be sorted ascending. The first pair whose closed interval
/// contains `x` wins, so a value equal to an inner key brackets with the key
/// below it. Outside the table, [`Edge::Clamp`] gives the nearest end index
/// twice and [`Edge::Extend`] gives the first and last index.
pub fn bracket(keys: &[f64], x: f64, edge: Edge) -> (usize, usize) {
    let last = keys.len() - 1;
    if x < keys[0] || x > keys[last] {
        return match edge {
            Edge::Extend => (0, last),
            Edge::Clamp if x < keys[0] => (0, 0),
            Edge::Clamp => (last, last),
        };
    }
    if x == keys[0] {
        return (0, 0);
    }
    for i in 0..last {
        if x >= keys[i] && x <= keys[i + 1] {
            return (i, i + 1);
        }
    }
    (last, last)
}

/// Round half away from zero to `places` decimals.
pub fn round_to(x: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (x * factor).round() / factor
}

/// Index of `x` if it is exactly one of the keys.
pub fn exact_key(keys: &[f64], x: f64) -> Option<usize> {
    keys.iter().position(|k| *k == x)
}

/// Two-stage lookup over a grid: interpolate along the column axis at each
/// bracketing row, then across the rows.
///
/// The order matters because the tables are not symmetric in their two
/// axes.
///
/// Rows always clamp; `col_edge` picks the behaviour past the column keys.
pub fn interpolate_grid<F>(
    rows: &[f64],
    cols: &[f64],
    row_x: f64,
    col_x: f64,
    col_edge: Edge,
    cell: F,
) -> f64
where
    F: Fn(usize, usize) -> f64,
{
    let (r1, r2) = bracket(rows, row_x, Edge::Clamp);
    let (c1, c2) = bracket(cols, col_x, col_edge);

    let along_cols = |r: usize| interpolate(col_x, cols[c1], cell(r, c1), cols[c2], cell(r, c2));

    let at_r1 = along_cols(r1);
    if r1 == r2 {
        return at_r1;
    }
    let at_r2 = along_cols(r2);
    interpolate(row_x, rows[r1], at_r1, rows[r2], at_r2)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn interpolates_between_samples() {
        assert_relative_eq!(interpolate(15.0, 10.0, 100.0, 20.0, 200.0), 150.0);
        assert_relative_eq!(interpolate(20.0, 10.0, 100.0, 20.0, 200.0), 200.0);
    }

    #[test]
    fn degenerate_interval_returns_first_sample() {
        assert_eq!(interpolate(12.0, 10.0, 100.0, 10.0, 300.0), 100.0);
    }

    #[test]
    fn round_to_places() {
        assert_eq!(round_to(237.456, 2), 237.46);
        assert_eq!(round_to(166.25, 0), 166.0);
        assert_eq!(round_to(6.7915, 1), 6.8);
    }

    #[test]
    fn bracket_inner_key_pairs_with_lower_neighbour() {
        let keys = [10.0, 16.0, 20.0, 25.0];
        assert_eq!(bracket(&keys, 18.0, Edge::Clamp), (1, 2));
        assert_eq!(bracket(&keys, 20.0, Edge::Extend), (1, 2));
    }

    #[test]
    fn bracket_clamps_outside_the_table() {
        let keys = [10.0, 16.0, 20.0];
        assert_eq!(bracket(&keys, 5.0, Edge::Clamp), (0, 0));
        assert_eq!(bracket(&keys, 10.0, Edge::Clamp), (0, 0));
        assert_eq!(bracket(&keys, 63.0, Edge::Clamp), (2, 2));
    }

    #[test]
    fn bracket_extends_across_the_whole_table() {
        let keys = [0.4, 0.5, 0.6, 0.7];
        assert_eq!(bracket(&keys, 0.35, Edge::Extend), (0, 3));
        assert_eq!(bracket(&keys, 0.97, Edge::Extend), (0, 3));
        assert_eq!(bracket(&keys, 0.4, Edge::Extend), (0, 0));
        assert_eq!(bracket(&keys, 0.7, Edge::Extend), (2, 3));
    }

    #[test]
    fn grid_interpolates_columns_first() {
        let rows = [0.0, 1.0];
        let cols = [0.0, 10.0];
        let grid = [[0.0, 10.0], [100.0, 300.0]];
        let value = interpolate_grid(&rows, &cols, 0.5, 5.0, Edge::Clamp, |r, c| grid[r][c]);
        // row 0 -> 5, row 1 -> 200, halfway -> 102.5
        assert_relative_eq!(value, 102.5);
    }

    #[test]
    fn grid_extends_columns_but_clamps_rows() {
        let rows = [0.0, 1.0];
        let cols = [0.0, 10.0, 20.0];
        let grid = [[0.0, 10.0, 30.0], [100.0, 100.0, 100.0]];
        let lookup = |edge| interpolate_grid(&rows, &cols, -1.0, 30.0, edge, |r, c| grid[r][c]);
        // Line through (0, 0) and (20, 30) continued to 30
        assert_relative_eq!(lookup(Edge::Extend), 45.0);
        assert_relative_eq!(lookup(Edge::Clamp), 30.0);
    }
}
