/// Periodic nearest neighbours of `(row, col)` on a `size × size` grid,
/// ordered north, south, east, west.
///
/// Wraparound is done with `+ size - 1` rather than a signed modulo, so
/// `row = 0` maps north to `size - 1`.
#[inline(always)]
pub fn neighbors(size: usize, row: usize, col: usize) -> [(usize, usize); 4] {
    debug_assert!(row < size && col < size);
    [
        ((row + size - 1) % size, col),
        ((row + 1) % size, col),
        (row, (col + 1) % size),
        (row, (col + size - 1) % size),
    ]
}
