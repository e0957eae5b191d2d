//! Platform-agnostic pointer input.

/// Pointer interaction that keeps the floating controls visible.
///
/// Touch starts count as well but arrive as
/// [`crate::AppEvent::Touch`] so the gesture interpreter sees them too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Pointer moved over the window.
    PointerMove,
    /// Click anywhere, including on a control.
    Click,
}
