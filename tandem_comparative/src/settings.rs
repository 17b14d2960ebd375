// Copyright 2025 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Initial configuration of a comparative grid.
///
/// ```rust
/// use tandem_comparative::ComparativeSettings;
///
/// let settings = ComparativeSettings::default()
///     .with_dimensions(3, 2)
///     .with_spacing(4, 4)
///     .with_view_size(800, 600);
/// assert_eq!(settings.dimensions, (3, 2));
/// assert!(!settings.overlay);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ComparativeSettings {
    /// Columns and rows.
    pub dimensions: (u32, u32),
    /// Horizontal and vertical gap between cells, in pixels.
    pub spacing: (u32, u32),
    /// Show every cell in the root view instead of one view per cell.
    pub overlay: bool,
    /// Total size of the grid, in pixels.
    pub view_size: (u32, u32),
    /// Position of the grid's top-left corner, in pixels.
    pub view_position: (i32, i32),
    /// Time shown by cells when no time cue applies.
    pub view_time: f64,
}

impl Default for ComparativeSettings {
    fn default() -> Self {
        Self {
            dimensions: (1, 1),
            spacing: (0, 0),
            overlay: false,
            view_size: (400, 400),
            view_position: (0, 0),
            view_time: 0.0,
        }
    }
}

impl ComparativeSettings {
    /// Sets the grid dimensions.
    #[must_use]
    pub fn with_dimensions(mut self, dx: u32, dy: u32) -> Self {
        self.dimensions = (dx, dy);
        self
    }

    /// Sets the gap between cells.
    #[must_use]
    pub fn with_spacing(mut self, x: u32, y: u32) -> Self {
        self.spacing = (x, y);
        self
    }

    /// Selects overlay mode.
    #[must_use]
    pub fn with_overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    /// Sets the total grid size.
    #[must_use]
    pub fn with_view_size(mut self, width: u32, height: u32) -> Self {
        self.view_size = (width, height);
        self
    }

    /// Sets the grid origin.
    #[must_use]
    pub fn with_view_position(mut self, x: i32, y: i32) -> Self {
        self.view_position = (x, y);
        self
    }

    /// Sets the fallback view time.
    #[must_use]
    pub fn with_view_time(mut self, time: f64) -> Self {
        self.view_time = time;
        self
    }
}
