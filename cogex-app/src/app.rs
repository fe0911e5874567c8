use anyhow::{anyhow, Result};
use cogex_core::{Key, Screen};
use cogex_render::{FontArc, SkiaRenderer};
use pixels::{Pixels, SurfaceTexture};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{Key as WinitKey, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::settings::DisplayConfig;
use crate::worker::UserEvent;

/// Translates a key press into the participant alphabet. Letters are lowercased.
pub fn map_key(key: &WinitKey) -> Option<Key> {
    match key {
        WinitKey::Named(NamedKey::Space) => Some(Key::Space),
        WinitKey::Named(NamedKey::Escape) => Some(Key::Escape),
        WinitKey::Character(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(' '), None) => Some(Key::Space),
                (Some(c), None) if c.is_alphanumeric() => Some(Key::Char(c.to_ascii_lowercase())),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Window, surface and renderer on the main thread. Screens arrive from the
/// session thread as user events; key presses leave through `keys`.
pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    font: Option<FontArc>,
    display: DisplayConfig,
    screen: Screen,
    keys: Option<Sender<Key>>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(display: DisplayConfig, font: Option<FontArc>, keys: Sender<Key>) -> Self {
        Self {
            window: None,
            pixels: None,
            renderer: None,
            font,
            display,
            screen: Screen::blank(),
            keys: Some(keys),
            error: None,
        }
    }

    /// The first window or render failure, if any.
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("no monitor available"))?;

        let mut attributes = Window::default_attributes()
            .with_title("Cogex")
            .with_resizable(!self.display.fullscreen);
        attributes = if self.display.fullscreen {
            attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor.clone()))))
        } else {
            attributes.with_inner_size(LogicalSize::new(self.display.width, self.display.height))
        };

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            refresh_hz = monitor.refresh_rate_millihertz().map(|mhz| mhz as f64 / 1000.0),
            "display ready"
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);
        self.renderer = Some(SkiaRenderer::new(size.width, size.height, self.font.clone())?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let stats = renderer.render_screen(&self.screen, pixels.frame_mut())?;
        pixels.render()?;
        trace!(
            clear_ms = stats.clear.as_secs_f64() * 1e3,
            draw_ms = stats.draw.as_secs_f64() * 1e3,
            copy_ms = stats.copy.as_secs_f64() * 1e3,
            total_ms = stats.total.as_secs_f64() * 1e3,
            lines = stats.lines,
            "frame rendered"
        );
        Ok(())
    }

    fn handle_input(&mut self, event: &KeyEvent) {
        if !event.state.is_pressed() || event.repeat {
            return;
        }
        let Some(key) = map_key(&event.logical_key) else {
            return;
        };
        debug!(%key, "key pressed");
        let delivered = self.keys.as_ref().is_some_and(|tx| tx.send(key).is_ok());
        if !delivered {
            debug!(%key, "session already finished, key ignored");
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(size.width, size.height)?;
            pixels.resize_buffer(size.width, size.height)?;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(size.width, size.height)?;
        }
        debug!(width = size.width, height = size.height, "display resized");
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        if self.error.is_none() {
            self.error = Some(err);
        }
        self.shutdown(event_loop);
    }

    /// Dropping the key sender tells the session the input is gone.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.keys = None;
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.create_window_and_surface(event_loop) {
                self.fail(event_loop, err.context("creating window and surface"));
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Show(screen) => {
                self.screen = screen;
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            UserEvent::Finished => {
                info!("session finished, closing window");
                self.shutdown(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                warn!("window closed by user");
                self.shutdown(event_loop);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.render() {
                    self.fail(event_loop, err.context("rendering frame"));
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_input(&event),
            WindowEvent::Resized(size) => {
                if let Err(err) = self.handle_resize(size) {
                    self.fail(event_loop, err.context("resizing surface"));
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    if let Err(err) = self.handle_resize(size) {
                        self.fail(event_loop, err.context("resizing surface"));
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_letters_space_and_escape() {
        assert_eq!(map_key(&WinitKey::Character("Y".into())), Some(Key::Char('y')));
        assert_eq!(map_key(&WinitKey::Character("g".into())), Some(Key::Char('g')));
        assert_eq!(map_key(&WinitKey::Character(" ".into())), Some(Key::Space));
        assert_eq!(map_key(&WinitKey::Named(NamedKey::Space)), Some(Key::Space));
        assert_eq!(map_key(&WinitKey::Named(NamedKey::Escape)), Some(Key::Escape));
    }

    #[test]
    fn ignores_other_keys() {
        assert_eq!(map_key(&WinitKey::Named(NamedKey::Enter)), None);
        assert_eq!(map_key(&WinitKey::Character("ab".into())), None);
        assert_eq!(map_key(&WinitKey::Character(";".into())), None);
    }
}
