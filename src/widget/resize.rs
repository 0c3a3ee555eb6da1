/// Measured changes at or below this many pixels are ignored, so a frame
/// resized to its own content does not oscillate.
pub const HEIGHT_TOLERANCE: f64 = 1.0;

/// Display height of a widget frame. `None` means natural sizing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightTracker {
    current: Option<f64>,
}

impl HeightTracker {
    pub fn current(&self) -> Option<f64> {
        self.current
    }

    /// Height to apply to the frame, in whole CSS pixels.
    pub fn css_height(&self) -> Option<u32> {
        self.current.map(|h| h.ceil() as u32)
    }

    /// Applies a measurement of the hosted content. Returns whether the
    /// stored height changed.
    pub fn observe(&mut self, measured: f64) -> bool {
        if !measured.is_finite() || measured <= 0.0 {
            return false;
        }
        match self.current {
            Some(current) if (measured - current).abs() <= HEIGHT_TOLERANCE => false,
            _ => {
                self.current = Some(measured);
                true
            }
        }
    }

    /// Applies a height the widget reported itself; zero falls back to
    /// natural sizing.
    pub fn report(&mut self, height: u32) {
        self.current = (height > 0).then_some(height as f64);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
