pub const DEFAULT_POSITION: f64 = 50.0;

/// Horizontal extent of the comparison container, in the same units as pointer x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub left: f64,
    pub width: f64,
}

impl ContainerRect {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }
}

/// Pointer input relevant to the slider. Mouse and touch collapse into the
/// same three events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed on the boundary handle.
    HandleDown,
    Move { client_x: f64 },
    Up,
}

/// Split view state: "before" is clipped to `[0, position]` percent of the
/// width and drawn over "after".
///
/// While a drag is active every move is honoured regardless of where the
/// pointer is, so fast movement past the element keeps the drag alive.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSlider {
    position: f64,
    dragging: bool,
}

impl Default for ComparisonSlider {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION,
            dragging: false,
        }
    }
}

impl ComparisonSlider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Returns `true` when the position changed.
    pub fn handle(&mut self, event: PointerEvent, rect: ContainerRect) -> bool {
        match event {
            PointerEvent::HandleDown => {
                self.dragging = true;
                false
            }
            PointerEvent::Up => {
                self.dragging = false;
                false
            }
            PointerEvent::Move { client_x } => {
                if !self.dragging || rect.width <= 0.0 || !client_x.is_finite() {
                    return false;
                }
                let x = (client_x - rect.left).clamp(0.0, rect.width);
                let next = x / rect.width * 100.0;
                let changed = next != self.position;
                self.position = next;
                changed
            }
        }
    }

    /// Right inset of the "before" layer in percent, i.e. `inset(0 N% 0 0)`.
    pub fn clip_right_inset(&self) -> f64 {
        100.0 - self.position
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
