// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel layout of grid cells.

use crate::settings::ComparativeSettings;

/// Position and size of one cell, in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellRect {
    /// Top-left corner.
    pub position: (i64, i64),
    /// Width and height.
    pub size: (i64, i64),
}

/// Computes the rectangle of cell `index` (row-major).
///
/// Cells share the total size minus the gaps between them; the offset of a
/// cell is its column (row) times the cell width (height). In overlay mode
/// every cell covers the whole grid.
#[must_use]
pub fn cell_rect(settings: &ComparativeSettings, index: u32) -> CellRect {
    let position = (
        i64::from(settings.view_position.0),
        i64::from(settings.view_position.1),
    );
    let total = (
        i64::from(settings.view_size.0),
        i64::from(settings.view_size.1),
    );
    if settings.overlay {
        return CellRect {
            position,
            size: total,
        };
    }

    let (dx, dy) = settings.dimensions;
    let (dx, dy) = (i64::from(dx.max(1)), i64::from(dy.max(1)));
    let (sx, sy) = (
        i64::from(settings.spacing.0),
        i64::from(settings.spacing.1),
    );
    let width = ((total.0 - (dx - 1) * sx) / dx).max(0);
    let height = ((total.1 - (dy - 1) * sy) / dy).max(0);

    let index = i64::from(index);
    let (x, y) = (index % dx, index / dx);
    CellRect {
        position: (position.0 + x * width, position.1 + y * height),
        size: (width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_split_the_total_size() {
        let settings = ComparativeSettings::default()
            .with_dimensions(2, 2)
            .with_view_size(400, 300);
        assert_eq!(
            cell_rect(&settings, 3),
            CellRect {
                position: (200, 150),
                size: (200, 150),
            }
        );
    }

    #[test]
    fn spacing_shrinks_cells() {
        let settings = ComparativeSettings::default()
            .with_dimensions(3, 1)
            .with_spacing(10, 10)
            .with_view_size(320, 100)
            .with_view_position(5, 7);
        let rect = cell_rect(&settings, 2);
        assert_eq!(rect.size, (100, 100));
        assert_eq!(rect.position, (205, 7));
    }

    #[test]
    fn overlay_cells_cover_everything() {
        let settings = ComparativeSettings::default()
            .with_dimensions(4, 4)
            .with_overlay(true);
        assert_eq!(cell_rect(&settings, 5).size, (400, 400));
    }

    #[test]
    fn oversized_spacing_clamps_to_zero() {
        let settings = ComparativeSettings::default()
            .with_dimensions(3, 1)
            .with_spacing(500, 0);
        assert_eq!(cell_rect(&settings, 0).size.0, 0);
    }
}
