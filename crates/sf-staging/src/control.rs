//! Selection control seam

/// The file picker the user interacts with
///
/// The control is stateless between interactions from the engine's point of
/// view, but it remembers its last selection. It is reset after every
/// accepted or rejected batch so the same file can be picked again.
pub trait SelectionControl: Send + std::fmt::Debug {
    /// Forget the remembered selection
    fn reset(&mut self);
}

/// Control with nothing to reset (headless use, replay)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullControl;

impl SelectionControl for NullControl {
    fn reset(&mut self) {}
}
