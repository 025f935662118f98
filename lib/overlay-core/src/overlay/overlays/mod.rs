mod text_overlay;

pub use text_overlay::{TextOverlay, TextOverlayState};
