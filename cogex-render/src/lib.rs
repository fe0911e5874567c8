pub mod render;

pub use ab_glyph::FontArc;
pub use render::{blit_centered, load_font, render_text_pixmap, FrameStats, SkiaRenderer};
