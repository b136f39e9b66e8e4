//! Rising-edge detection on the acknowledgment button.

/// Turns the raw button level into acknowledgment events.
///
/// Only a released-to-pressed transition acknowledges; holding the button
/// down across several samples acknowledges once.
#[derive(Debug, Clone, Default)]
pub struct AcknowledgeEdge {
    pressed: bool,
}

impl AcknowledgeEdge {
    /// Create a detector with the button released
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest level; returns `true` on a rising edge
    pub fn update(&mut self, pressed: bool) -> bool {
        let rising = pressed && !self.pressed;
        self.pressed = pressed;
        rising
    }

    /// Current level
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_edge_only() {
        let mut edge = AcknowledgeEdge::new();
        let levels = [false, true, true, false, true, false, false];
        let edges: Vec<bool> = levels.iter().map(|&level| edge.update(level)).collect();
        assert_eq!(edges, vec![false, true, false, false, true, false, false]);
    }

    #[test]
    fn test_held_button() {
        let mut edge = AcknowledgeEdge::new();
        assert!(edge.update(true));
        for _ in 0..10 {
            assert!(!edge.update(true));
        }
        assert!(edge.is_pressed());
    }
}
