use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use mot_core::{Canvas, InputEvent, InputSource, Key, Primitive, StimulusId, SurfaceError, Vec2};
use mot_experiment::ExperimentConfig;
use mot_render::{FontArc, SkiaCanvas};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use std::time::Duration;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key as WinitKey, NamedKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Fullscreen, Window, WindowId},
};

/// Raw input as the window saw it; pointer positions are in physical
/// pixels, top-left origin.
enum RawInput {
    Key(Key),
    Press(PhysicalPosition<f64>),
}

/// Window-side state driven by winit callbacks.
struct Shell {
    fullscreen: bool,
    requested_size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    current_size: Option<PhysicalSize<u32>>,
    scale_factor: f64,
    refresh_rate: Option<f64>,
    cursor: PhysicalPosition<f64>,
    pending: Vec<RawInput>,
    resized: Option<PhysicalSize<u32>>,
    abort_requested: bool,
    error: Option<anyhow::Error>,
}

impl Shell {
    fn new(config: &ExperimentConfig) -> Self {
        let [width, height] = config.window_size;
        Self {
            fullscreen: config.fullscreen,
            requested_size: PhysicalSize::new(width, height),
            window: None,
            pixels: None,
            current_size: None,
            scale_factor: 1.0,
            refresh_rate: None,
            cursor: PhysicalPosition::new(0.0, 0.0),
            pending: Vec::new(),
            resized: None,
            abort_requested: false,
            error: None,
        }
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let mut window_attributes = Window::default_attributes()
            .with_title("Multiple Object Tracking")
            .with_inner_size(self.requested_size)
            .with_resizable(false);
        if self.fullscreen {
            window_attributes =
                window_attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))));
        }

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();
        self.current_size = Some(physical_size);

        info!("Display configuration:");
        info!("  Physical size: {}×{}", physical_size.width, physical_size.height);
        info!("  Scale factor: {:.2}", self.scale_factor);
        if let Some(refresh_rate) = self.refresh_rate {
            info!("  Refresh rate: {:.1} Hz", refresh_rate);
        }

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        window.set_cursor_visible(false);
        self.window = Some(window);
        Ok(())
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 || self.current_size == Some(new_size) {
            return;
        }
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!("Failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!("Failed to resize buffer: {e}");
            }
        }
        self.resized = Some(new_size);
        info!("Display resized to: {}×{}", new_size.width, new_size.height);
    }
}

fn map_key(key: &WinitKey) -> Key {
    match key {
        WinitKey::Named(NamedKey::Backspace) => Key::Backspace,
        WinitKey::Named(NamedKey::Enter) => Key::Return,
        WinitKey::Named(NamedKey::Escape) => Key::Escape,
        WinitKey::Named(NamedKey::Space) => Key::Char(' '),
        WinitKey::Character(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::from_char(c),
                _ => Key::Other,
            }
        }
        _ => Key::Other,
    }
}

impl ApplicationHandler for Shell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.abort_requested = true;
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                let key = map_key(&event.logical_key);
                if key == Key::Escape {
                    self.abort_requested = true;
                }
                self.pending.push(RawInput::Key(key));
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor = position,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.pending.push(RawInput::Press(self.cursor)),
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }
}

/// A fullscreen window that the experiment drives directly: every `flip`
/// presents the frame and then pumps pending window events, so no separate
/// event loop thread is needed.
pub struct WindowSurface {
    event_loop: EventLoop<()>,
    shell: Shell,
    canvas: SkiaCanvas,
}

impl WindowSurface {
    pub fn open(config: &ExperimentConfig, font: Option<FontArc>) -> Result<Self> {
        let mut event_loop = EventLoop::new()?;
        let mut shell = Shell::new(config);
        while shell.window.is_none() {
            if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::from_millis(16)), &mut shell) {
                return Err(shell
                    .error
                    .take()
                    .unwrap_or_else(|| anyhow!("event loop exited with code {code} before a window opened")));
            }
        }
        let size = shell
            .current_size
            .context("window has no size")?;
        let canvas = SkiaCanvas::new(size.width, size.height, config.window_color.rgba(), font)?;
        Ok(Self {
            event_loop,
            shell,
            canvas,
        })
    }

    fn pump(&mut self) -> Result<(), SurfaceError> {
        let status = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.shell);
        if let Some(size) = self.shell.resized.take() {
            self.canvas
                .resize(size.width, size.height)
                .map_err(|e| SurfaceError::Backend(format!("{e:#}")))?;
        }
        if self.shell.abort_requested || matches!(status, PumpStatus::Exit(_)) {
            return Err(SurfaceError::Aborted);
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        let Some(pixels) = self.shell.pixels.as_mut() else {
            return Err(SurfaceError::Backend("no pixel surface".into()));
        };
        let frame = pixels.frame_mut();
        let src = self.canvas.frame();
        if frame.len() == src.len() {
            frame.copy_from_slice(src);
        }
        pixels
            .render()
            .map_err(|e| SurfaceError::Backend(e.to_string()))
    }

    /// Restores the cursor and logs how long rasterising took.
    pub fn close(self) {
        if let Some(window) = &self.shell.window {
            window.set_cursor_visible(true);
        }
        let stats = self.canvas.raster_stats();
        info!(
            "raster: {:.3} ms/frame average, {:.3} ms worst over the last {} frames",
            stats.average_frame_time_ns / 1e6,
            stats.max_frame_time_ns / 1e6,
            stats.frames
        );
    }
}

impl Canvas for WindowSurface {
    fn add(&mut self, primitive: Primitive, pos: Vec2) -> StimulusId {
        self.canvas.add(primitive, pos)
    }

    fn set_position(&mut self, id: StimulusId, pos: Vec2) {
        self.canvas.set_position(id, pos);
    }

    fn set_text(&mut self, id: StimulusId, text: &str) {
        self.canvas.set_text(id, text);
    }

    fn set_visible(&mut self, id: StimulusId, visible: bool) {
        self.canvas.set_visible(id, visible);
    }

    fn remove(&mut self, id: StimulusId) {
        self.canvas.remove(id);
    }

    fn set_pointer_visible(&mut self, visible: bool) {
        self.canvas.set_pointer_visible(visible);
        if let Some(window) = &self.shell.window {
            window.set_cursor_visible(visible);
        }
    }

    fn size(&self) -> Vec2 {
        self.canvas.size()
    }

    /// Rasterises, presents (blocking on vsync), then pumps window events.
    fn flip(&mut self) -> Result<(), SurfaceError> {
        self.canvas.flip()?;
        self.present()?;
        self.pump()
    }
}

impl InputSource for WindowSurface {
    fn poll_input(&mut self) -> Result<Vec<InputEvent>, SurfaceError> {
        self.pump()?;
        let canvas = &self.canvas;
        Ok(self
            .shell
            .pending
            .drain(..)
            .map(|raw| match raw {
                RawInput::Key(key) => InputEvent::Key(key),
                RawInput::Press(p) => InputEvent::PointerPressed(canvas.from_screen(p.x as f32, p.y as f32)),
            })
            .collect())
    }

    fn discard_pending(&mut self) {
        // An abort requested here still surfaces on the next flip or poll.
        let _ = self.pump();
        self.shell.pending.clear();
    }
}
