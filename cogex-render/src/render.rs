use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use anyhow::{bail, Context, Result};
use bytemuck::{cast_slice, cast_slice_mut};
use cogex_core::{Rgba, Screen, WHITE};
use cogex_timing::{HighPrecisionTimer, Timer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};
use tracing::{debug, warn};

const CORRECT_INK: Rgba = [0, 200, 0, 255];
const INCORRECT_INK: Rgba = [220, 0, 0, 255];
const LINE_SPACING: f32 = 1.35;
const TEXT_CACHE_LIMIT: usize = 256;

pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontArc::try_from_vec(bytes).with_context(|| format!("{} is not a usable font", path.display()))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    color: Rgba,
    size_px: u32,
}

/// Rasterized lines keyed by content, colour and size. Instruction pages and
/// stimuli repeat, so each is rasterized once.
struct TextCache {
    map: HashMap<TextKey, Arc<Pixmap>>,
}

impl TextCache {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    fn get_or_render(
        &mut self,
        font: &FontArc,
        text: &str,
        size_px: f32,
        color: Rgba,
    ) -> Option<Arc<Pixmap>> {
        let key = TextKey {
            text: text.to_string(),
            color,
            size_px: size_px.round() as u32,
        };
        if let Some(p) = self.map.get(&key) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(text, size_px, font, color)?);
        if self.map.len() >= TEXT_CACHE_LIMIT {
            self.map.clear();
        }
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }
}

/// Rasterizes one line of text into a tight, transparent, premultiplied pixmap.
/// Returns `None` when nothing in `text` has an outline (empty or whitespace).
pub fn render_text_pixmap(
    text: &str,
    font_size: f32,
    font: &FontArc,
    color: Rgba,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // 1) Layout with baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    // 2) Union pixel bounds from outlined glyphs
    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if outlines.is_empty() {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    // 3) Rasterize with premultiplied alpha blending
    let stride = w as usize;
    let dst = pm.pixels_mut();
    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            let a_lin = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a_lin * 255.0) as u8;
            let inv = 1.0 - (sa as f32 / 255.0);
            let bg = dst[i];
            let over =
                |s: u8, d: u8| ((s as f32 * a_lin) as u8).saturating_add((d as f32 * inv) as u8);
            let blended = PremultipliedColorU8::from_rgba(
                over(color[0], bg.red()),
                over(color[1], bg.green()),
                over(color[2], bg.blue()),
                sa.saturating_add((bg.alpha() as f32 * inv) as u8),
            );
            if let Some(px) = blended {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Premultiplied source-over of `src` centred on `pos`, clipped to `canvas`.
pub fn blit_centered(canvas: &mut Pixmap, src: &Pixmap, pos: (f32, f32)) {
    let (w, h) = (src.width() as i32, src.height() as i32);
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
    let x = (pos.0 - w as f32 * 0.5).floor() as i32;
    let y = (pos.1 - h as f32 * 0.5).floor() as i32;

    // Cull fully off-screen
    if x + w <= 0 || y + h <= 0 || x >= cw || y >= ch {
        return;
    }

    let dst_x = x.max(0) as usize;
    let dst_y = y.max(0) as usize;
    let src_x = (-x).max(0) as usize;
    let src_y = (-y).max(0) as usize;
    let copy_w = (w as usize - src_x).min(cw as usize - dst_x);
    let copy_h = (h as usize - src_y).min(ch as usize - dst_y);

    let src_px: &[[u8; 4]] = cast_slice(src.data());
    let dst_px: &mut [[u8; 4]] = cast_slice_mut(canvas.data_mut());

    for row in 0..copy_h {
        let s_row = (src_y + row) * w as usize + src_x;
        let d_row = (dst_y + row) * cw as usize + dst_x;
        let src_row = &src_px[s_row..s_row + copy_w];
        let dst_row = &mut dst_px[d_row..d_row + copy_w];

        if src_row.iter().all(|p| p[3] == 255) {
            dst_row.copy_from_slice(src_row);
            continue;
        }
        for (d, s) in dst_row.iter_mut().zip(src_row) {
            let inv = 255 - s[3] as u32;
            for c in 0..4 {
                d[c] = (s[c] as u32 + (d[c] as u32 * inv + 127) / 255) as u8;
            }
        }
    }
}

/// Vertical centres of `count` lines stacked around `center_y`.
fn line_centres(count: usize, center_y: f32, line_height: f32) -> impl Iterator<Item = f32> {
    let top = center_y - line_height * count as f32 / 2.0 + line_height / 2.0;
    (0..count).map(move |i| top + i as f32 * line_height)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub lines: usize,
}

/// Software renderer producing one opaque RGBA frame per [`Screen`].
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),

    font: Option<FontArc>,
    text_px: f32,
    stimulus_px: f32,
    text_cache: TextCache,

    canvas: Pixmap,
    timer: HighPrecisionTimer,
}

impl SkiaRenderer {
    /// Without a font every screen still gets its background, but no text.
    pub fn new(width: u32, height: u32, font: Option<FontArc>) -> Result<Self> {
        if font.is_none() {
            warn!("no font loaded, text will not be drawn");
        }
        let canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        let mut renderer = SkiaRenderer {
            width,
            height,
            center: (0.0, 0.0),
            font,
            text_px: 0.0,
            stimulus_px: 0.0,
            text_cache: TextCache::new(),
            canvas,
            timer: HighPrecisionTimer::new(),
        };
        renderer.scale_to(width, height);
        Ok(renderer)
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width, new_height)
            .with_context(|| format!("cannot allocate a {new_width}x{new_height} canvas"))?;
        self.width = new_width;
        self.height = new_height;
        self.scale_to(new_width, new_height);
        self.text_cache.map.clear();
        debug!(width = new_width, height = new_height, "renderer resized");
        Ok(())
    }

    fn scale_to(&mut self, width: u32, height: u32) {
        self.center = (width as f32 / 2.0, height as f32 / 2.0);
        let base = height.min(width) as f32;
        self.text_px = (base / 24.0).clamp(14.0, 48.0);
        self.stimulus_px = (base / 6.0).clamp(32.0, 200.0);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Draws `screen` and copies it into `frame`, which must be `width * height * 4` bytes.
    pub fn render_screen(&mut self, screen: &Screen, frame: &mut [u8]) -> Result<FrameStats> {
        if frame.len() != self.canvas.data().len() {
            bail!(
                "frame holds {} bytes, expected {} for {}x{}",
                frame.len(),
                self.canvas.data().len(),
                self.width,
                self.height
            );
        }
        let started = self.timer.now();

        let t = self.timer.now();
        let [r, g, b, a] = screen.background();
        self.canvas.fill(Color::from_rgba8(r, g, b, a));
        let clear = self.timer.elapsed(t);

        let t = self.timer.now();
        let lines = match screen {
            Screen::Blank { .. } => 0,
            Screen::Instructions { text, .. } => {
                let lines: Vec<(&str, Rgba)> = text.lines().map(|l| (l, WHITE)).collect();
                self.draw_lines(&lines, self.text_px)
            }
            Screen::Stimulus { text, ink, .. } => {
                self.draw_lines(&[(text.as_str(), *ink)], self.stimulus_px)
            }
            Screen::Feedback { correct, latency } => {
                let (verdict, ink) = if *correct {
                    ("Correct!", CORRECT_INK)
                } else {
                    ("Incorrect", INCORRECT_INK)
                };
                let rt = match latency {
                    Some(l) => format!("Response time: {:.0} ms", l.as_secs_f64() * 1e3),
                    None => "No response".to_string(),
                };
                self.draw_lines(
                    &[
                        (verdict, ink),
                        ("", WHITE),
                        (rt.as_str(), WHITE),
                        ("Press SPACE to continue", WHITE),
                    ],
                    self.text_px,
                )
            }
        };
        let draw = self.timer.elapsed(t);

        let t = self.timer.now();
        frame.copy_from_slice(self.canvas.data());
        let copy = self.timer.elapsed(t);

        Ok(FrameStats {
            clear,
            draw,
            copy,
            total: self.timer.elapsed(started),
            lines,
        })
    }

    fn draw_lines(&mut self, lines: &[(&str, Rgba)], size_px: f32) -> usize {
        let Some(font) = self.font.as_ref() else {
            return 0;
        };
        let line_height = size_px * LINE_SPACING;
        let mut drawn = 0;
        let centres = line_centres(lines.len(), self.center.1, line_height);
        for ((text, color), y) in lines.iter().zip(centres) {
            if let Some(pm) = self.text_cache.get_or_render(font, text, size_px, *color) {
                blit_centered(&mut self.canvas, &pm, (self.center.0, y));
                drawn += 1;
            }
        }
        drawn
    }
}
