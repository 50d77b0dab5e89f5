//! CPU-side particle grids.
//!
//! A [`ParticleGrid`] is the host image of one field of the particle state
//! store: a square grid of `side * side` RGBA32F cells, row-major, one cell per
//! particle. Cell 0 is always the central attractor.

/// Side of the square grid that holds `particle_count` particles.
pub fn grid_side(particle_count: u32) -> u32 {
    let side = (particle_count as f64).sqrt().ceil() as u32;
    // Guard against sqrt rounding just below an exact square.
    if (side as u64) * (side as u64) < particle_count as u64 {
        side + 1
    } else {
        side
    }
}

/// A square grid of 4-component float cells.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleGrid {
    side: u32,
    cells: Vec<[f32; 4]>,
}

impl ParticleGrid {
    /// Grid of the given side filled with zeros.
    pub fn zeroed(side: u32) -> Self {
        Self {
            side,
            cells: vec![[0.0; 4]; (side as usize) * (side as usize)],
        }
    }

    /// Wrap existing cells. Returns `None` if `cells.len() != side * side`.
    pub fn from_cells(side: u32, cells: Vec<[f32; 4]>) -> Option<Self> {
        if cells.len() == (side as usize) * (side as usize) {
            Some(Self { side, cells })
        } else {
            None
        }
    }

    #[inline]
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Total number of cells, including inert trailing cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `(row, col)` address of a linear cell index.
    #[inline]
    pub fn cell_coord(&self, index: usize) -> (u32, u32) {
        let side = self.side as usize;
        ((index / side) as u32, (index % side) as u32)
    }

    /// Normalized texture coordinate of a cell, `(col, row) / (side - 1)`.
    pub fn cell_uv(&self, index: usize) -> [f32; 2] {
        let (row, col) = self.cell_coord(index);
        let denom = self.side.saturating_sub(1).max(1) as f32;
        [col as f32 / denom, row as f32 / denom]
    }

    #[inline]
    pub fn get(&self, index: usize) -> [f32; 4] {
        self.cells[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: [f32; 4]) {
        self.cells[index] = value;
    }

    pub fn cells(&self) -> &[[f32; 4]] {
        &self.cells
    }

    /// Raw bytes for texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// True if every component of every cell is finite.
    pub fn is_finite(&self) -> bool {
        self.cells.iter().flatten().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_side_is_ceil_sqrt() {
        assert_eq!(grid_side(1), 1);
        assert_eq!(grid_side(2), 2);
        assert_eq!(grid_side(4), 2);
        assert_eq!(grid_side(5), 3);
        assert_eq!(grid_side(1000), 32);
        assert_eq!(grid_side(1024), 32);
        assert_eq!(grid_side(1_000_000), 1000);
        assert_eq!(grid_side(999_999), 1000);
        assert_eq!(grid_side(1_000_001), 1001);
    }

    #[test]
    fn test_grid_side_for_all_small_counts() {
        for count in 1..5000u32 {
            let side = grid_side(count);
            assert!(side * side >= count);
            assert!((side - 1) * (side - 1) < count);
        }
    }

    #[test]
    fn test_cell_addressing() {
        let grid = ParticleGrid::zeroed(3);
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.cell_coord(0), (0, 0));
        assert_eq!(grid.cell_coord(4), (1, 1));
        assert_eq!(grid.cell_coord(5), (1, 2));
        assert_eq!(grid.cell_uv(5), [1.0, 0.5]);
    }

    #[test]
    fn test_from_cells_checks_length() {
        assert!(ParticleGrid::from_cells(2, vec![[0.0; 4]; 3]).is_none());
        let grid = ParticleGrid::from_cells(2, vec![[1.0; 4]; 4]).unwrap();
        assert_eq!(grid.as_bytes().len(), 4 * 16);
    }
}
