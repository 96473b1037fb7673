//! Cursor readout: pointer position to sample index / amplitude.

use super::mapper::CoordinateMapper;
use super::scale::format_amplitude;

/// Last known pointer position in surface pixels.
///
/// `(-1, -1)` means the pointer is outside the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerState {
    pub x_px: i32,
    pub y_px: i32,
}

impl PointerState {
    pub const OUT_OF_BOUNDS: Self = Self { x_px: -1, y_px: -1 };

    pub fn is_in_bounds(&self) -> bool {
        self.x_px >= 0 && self.y_px >= 0
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::OUT_OF_BOUNDS
    }
}

/// Values under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub sample_index: usize,
    pub amplitude: f32,
}

impl Readout {
    pub fn label(&self) -> String {
        format!("{}, {}", self.sample_index, format_amplitude(self.amplitude))
    }
}

/// A readout label positioned inside the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadoutLabel {
    pub text: String,
    /// Top-left corner in surface pixels
    pub x_px: f32,
    pub y_px: f32,
}

#[derive(Debug, Default)]
pub struct PointerReadout {
    pointer: PointerState,
}

impl PointerReadout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_moved(&mut self, x_px: i32, y_px: i32) {
        self.pointer = if x_px < 0 || y_px < 0 {
            PointerState::OUT_OF_BOUNDS
        } else {
            PointerState { x_px, y_px }
        };
    }

    pub fn pointer_exited(&mut self) {
        self.pointer = PointerState::OUT_OF_BOUNDS;
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn readout(&self, mapper: &CoordinateMapper) -> Option<Readout> {
        if !self.pointer.is_in_bounds() {
            return None;
        }
        Some(Readout {
            sample_index: mapper.sample_index_from_pixel_x(self.pointer.x_px as f32),
            amplitude: mapper.amplitude_from_pixel_y(self.pointer.y_px as f32),
        })
    }

    /// Label next to the pointer, kept fully inside `width_px` x `height_px`.
    ///
    /// `char_width_px` and `line_height_px` describe the text metrics of
    /// the surface.
    pub fn label(
        &self,
        mapper: &CoordinateMapper,
        width_px: u32,
        height_px: u32,
        char_width_px: f32,
        line_height_px: f32,
    ) -> Option<ReadoutLabel> {
        let readout = self.readout(mapper)?;
        let text = readout.label();
        let label_width = text.chars().count() as f32 * char_width_px;
        let (x_px, y_px) = place_label(
            (self.pointer.x_px as f32, self.pointer.y_px as f32),
            (label_width, line_height_px),
            (width_px as f32, height_px as f32),
            LABEL_OFFSET_PX,
        );
        Some(ReadoutLabel { text, x_px, y_px })
    }
}

/// Gap between pointer and label.
pub const LABEL_OFFSET_PX: f32 = 4.0;

/// Top-left corner for a label of `size` anchored at `pointer`.
///
/// Sits below-right of the pointer by default; flips to the left and/or
/// above when that would overflow `bounds`.
pub fn place_label(
    pointer: (f32, f32),
    size: (f32, f32),
    bounds: (f32, f32),
    offset: f32,
) -> (f32, f32) {
    let (px, py) = pointer;
    let (w, h) = size;
    let (bw, bh) = bounds;

    let x = if px + offset + w > bw { px - offset - w } else { px + offset };
    let y = if py + offset + h > bh { py - offset - h } else { py + offset };

    (x.max(0.0), y.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(1.0, 0, 4096, 800, 200)
    }

    #[test]
    fn test_origin_reads_first_sample_at_full_scale() {
        let mut readout = PointerReadout::new();
        readout.pointer_moved(0, 0);

        let value = readout.readout(&mapper()).unwrap();
        assert_eq!(value.sample_index, 0);
        assert_eq!(value.label(), "0, 1.0");
    }

    #[test]
    fn test_center_reads_middle() {
        let mut readout = PointerReadout::new();
        readout.pointer_moved(401, 100);

        let value = readout.readout(&mapper()).unwrap();
        assert_eq!(value.sample_index, 2053);
        assert_eq!(value.label(), "2053, 0.0");
    }

    #[test]
    fn test_exit_resets_to_sentinel() {
        let mut readout = PointerReadout::new();
        assert_eq!(readout.pointer(), PointerState::OUT_OF_BOUNDS);

        readout.pointer_moved(10, 10);
        assert!(readout.readout(&mapper()).is_some());

        readout.pointer_exited();
        assert_eq!(readout.pointer(), PointerState::OUT_OF_BOUNDS);
        assert!(readout.readout(&mapper()).is_none());
    }

    #[test]
    fn test_negative_position_is_out_of_bounds() {
        let mut readout = PointerReadout::new();
        readout.pointer_moved(-3, 20);
        assert!(!readout.pointer().is_in_bounds());
    }

    #[test]
    fn test_label_stays_below_right_when_room() {
        assert_eq!(
            place_label((10.0, 10.0), (40.0, 4.0), (800.0, 200.0), 4.0),
            (14.0, 14.0)
        );
    }

    #[test]
    fn test_label_flips_at_edges() {
        // right edge
        assert_eq!(
            place_label((790.0, 10.0), (40.0, 4.0), (800.0, 200.0), 4.0),
            (746.0, 14.0)
        );
        // bottom edge
        assert_eq!(
            place_label((10.0, 198.0), (40.0, 4.0), (800.0, 200.0), 4.0),
            (14.0, 190.0)
        );
        // both
        assert_eq!(
            place_label((799.0, 199.0), (40.0, 4.0), (800.0, 200.0), 4.0),
            (755.0, 191.0)
        );
    }

    #[test]
    fn test_label_fits_inside_surface() {
        let mut readout = PointerReadout::new();
        readout.pointer_moved(799, 199);

        let label = readout.label(&mapper(), 800, 200, 2.0, 4.0).unwrap();
        let width = label.text.chars().count() as f32 * 2.0;
        assert!(label.x_px + width <= 800.0);
        assert!(label.y_px + 4.0 <= 200.0);
    }
}
