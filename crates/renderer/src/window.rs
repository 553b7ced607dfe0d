use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use glam::Vec2;
use tracing::{debug, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::animation::AnimationState;
use crate::camera::{Camera, CubeTransform};
use crate::gpu::{FrameInput, GpuState};
use crate::overlay::{InputMode, KeyInput, OverlayAction, SearchOverlay};
use crate::types::{RendererConfig, SceneParams, SearchParams};

/// Aggregates GPU state, the scene, and the search box for one window.
struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    animation: AnimationState,
    camera: Camera,
    scene: SceneParams,
    search: SearchParams,
    overlay: SearchOverlay,
    mouse: MouseState,
    shift: bool,
    clicked: bool,
    shader_label: Option<String>,
    last_frame: Instant,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, config.antialiasing)?;
        let overlay = SearchOverlay::new(
            config.search.input,
            config.search.url_template.clone(),
            config.search.placeholder.clone(),
        );
        let state = Self {
            window,
            gpu,
            animation: AnimationState::new(config.scene.rotation_step),
            camera: Camera::with_fov_degrees(config.scene.fov_degrees),
            scene: config.scene,
            search: config.search.clone(),
            overlay,
            mouse: MouseState::default(),
            shift: false,
            clicked: false,
            shader_label: None,
            last_frame: Instant::now(),
        };
        state.refresh_title();
        Ok(state)
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn refresh_title(&self) {
        let title = self.overlay.title(self.shader_label.as_deref());
        self.window.set_title(&title);
    }

    fn cube(&self) -> CubeTransform {
        CubeTransform {
            position: self.scene.position,
            size: self.scene.cube_size,
            scale: if self.clicked {
                self.scene.clicked_scale
            } else {
                self.scene.scale
            },
            rotation_y: self.animation.rotation(),
        }
    }

    fn set_fragment(&mut self, label: String, body: &str) {
        match self.gpu.set_fragment(&label, body) {
            Ok(()) => {
                info!(shader = %label, "now rendering shader");
                self.shader_label = Some(label);
                self.refresh_title();
            }
            Err(err) => {
                let fallback = if self.gpu.has_pipeline() {
                    "keeping previous shader"
                } else {
                    "nothing to render yet"
                };
                warn!(shader = %label, "{fallback}: {err:#}");
            }
        }
    }

    fn handle_click(&mut self) {
        let Some(position) = self.mouse.position else {
            return;
        };
        let size = self.gpu.size();
        let ray = self.camera.ray_through(
            Vec2::new(position.x as f32, position.y as f32),
            (size.width, size.height),
        );
        if self.cube().intersect(&ray).is_some() {
            self.clicked = !self.clicked;
            debug!(clicked = self.clicked, "cube clicked");
        }
    }

    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.animation.advance(delta);

        let mvp = self.camera.view_projection(self.gpu.aspect()) * self.cube().model_matrix();
        let frame = FrameInput {
            mvp,
            elapsed: self.animation.elapsed().as_secs_f32(),
            delta: delta.as_secs_f32(),
            cursor: self.mouse.position.map(|p| (p.x as f32, p.y as f32)),
            pressed_at: self.mouse.pressed_anchor.map(|p| (p.x as f32, p.y as f32)),
        };
        self.gpu.render(&frame)
    }
}

#[derive(Debug, Clone)]
enum WindowCommand {
    Swap { label: String, body: String },
    Shutdown,
}

/// Requests the window thread sends back to the application loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSignal {
    NextShader,
    PreviousShader,
}

/// Handle to the window thread. Dropping it closes the window.
pub struct WindowRuntime {
    proxy: EventLoopProxy<WindowCommand>,
    events: Receiver<WindowSignal>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl WindowRuntime {
    pub fn spawn(config: RendererConfig) -> Result<Self> {
        ensure_platform_supported()?;
        let (ready_tx, ready_rx) = bounded(1);
        let (signal_tx, signal_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("cubesearch-window".into())
            .spawn(move || run_window_thread(config, ready_tx, signal_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("window thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            events: signal_rx,
            join_handle: Some(handle),
        })
    }

    /// Queues a new fragment body for the cube. `label` names the shader in
    /// logs and the window title.
    pub fn swap_fragment(&self, label: impl Into<String>, body: impl Into<String>) -> Result<()> {
        self.proxy
            .send_event(WindowCommand::Swap {
                label: label.into(),
                body: body.into(),
            })
            .map_err(|err| anyhow!("window is gone: {err}"))
    }

    pub fn take_signals(&self) -> Vec<WindowSignal> {
        self.events.try_iter().collect()
    }

    /// True once the event loop has exited (window closed, Escape, or a
    /// submitted search with `exit_on_submit`).
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for WindowRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_window_thread(
    config: RendererConfig,
    ready_tx: Sender<Result<EventLoopProxy<WindowCommand>, anyhow::Error>>,
    signal_tx: Sender<WindowSignal>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<WindowCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }

    #[cfg(target_os = "windows")]
    {
        use winit::platform::windows::EventLoopBuilderExtWindows;
        EventLoopBuilderExtWindows::with_any_thread(&mut builder, true);
    }
    let event_loop = match builder.build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            let message = format!("failed to create event loop: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };
    let proxy = event_loop.create_proxy();

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let mut window_builder = WindowBuilder::new()
        .with_title(config.search.placeholder.clone())
        .with_inner_size(window_size);
    if config.fullscreen {
        window_builder = window_builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = match window_builder.build(&event_loop) {
        Ok(window) => Arc::new(window),
        Err(err) => {
            let message = format!("failed to create window: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };

    let mut state = match WindowState::new(window, &config) {
        Ok(state) => state,
        Err(err) => {
            let wrapped = anyhow!("failed to initialise window renderer: {err:#}");
            let message = wrapped.to_string();
            let _ = ready_tx.send(Err(anyhow!(message)));
            return Err(wrapped);
        }
    };
    state.window().request_redraw();

    let _ = ready_tx.send(Ok(proxy));

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::UserEvent(command) => match command {
            WindowCommand::Swap { label, body } => {
                state.set_fragment(label, &body);
                state.window().request_redraw();
            }
            WindowCommand::Shutdown => elwt.exit(),
        },
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                WindowEvent::ModifiersChanged(modifiers) => {
                    state.shift = modifiers.state().shift_key();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed {
                        handle_key(&mut state, &event, &signal_tx, elwt);
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    state.mouse.handle_cursor_moved(position);
                }
                WindowEvent::MouseInput {
                    state: button_state,
                    button: MouseButton::Left,
                    ..
                } => {
                    state.mouse.handle_button(button_state);
                    if button_state == ElementState::Pressed {
                        state.handle_click();
                    }
                }
                WindowEvent::Resized(new_size) => {
                    state.gpu.resize(new_size);
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    let _ = inner_size_writer.request_inner_size(state.gpu.size());
                }
                WindowEvent::RedrawRequested => match state.render_frame() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.gpu.size();
                        state.gpu.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("surface out of memory; closing window");
                        elwt.exit();
                    }
                    Err(err) => {
                        warn!("surface error: {err:?}; retrying next frame");
                    }
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            // The cube animates continuously; Fifo presentation paces frames.
            state.window().request_redraw();
            elwt.set_control_flow(ControlFlow::Wait);
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

fn handle_key(
    state: &mut WindowState,
    event: &KeyEvent,
    signal_tx: &Sender<WindowSignal>,
    elwt: &EventLoopWindowTarget<WindowCommand>,
) {
    let key = key_input(event, state.overlay.mode());
    match state.overlay.handle_key(key, state.shift) {
        OverlayAction::None => {}
        OverlayAction::Edited => state.refresh_title(),
        OverlayAction::Rotate(radians) => state.animation.rotate_by(radians),
        action @ (OverlayAction::NextShader | OverlayAction::PreviousShader) => {
            if let Some(signal) = shader_signal(&action, event.repeat) {
                let _ = signal_tx.send(signal);
            }
        }
        OverlayAction::Close => elwt.exit(),
        OverlayAction::Submit(url) => {
            info!(%url, "opening search");
            if let Err(err) = open::that(&url) {
                warn!(%url, "failed to open browser: {err}");
            }
            state.refresh_title();
            if state.search.exit_on_submit {
                elwt.exit();
            }
        }
    }
}

/// The window thread needs `with_any_thread`, which macOS does not offer.
fn ensure_platform_supported() -> Result<()> {
    if cfg!(target_os = "macos") {
        bail!("cubesearch runs its window off the main thread, which macOS does not allow");
    }
    Ok(())
}

/// Held arrow keys auto-repeat; only the initial press steps the shader.
fn shader_signal(action: &OverlayAction, repeat: bool) -> Option<WindowSignal> {
    if repeat {
        return None;
    }
    match action {
        OverlayAction::NextShader => Some(WindowSignal::NextShader),
        OverlayAction::PreviousShader => Some(WindowSignal::PreviousShader),
        _ => None,
    }
}

/// Maps a winit key event onto the overlay's key model. A focused field
/// takes whatever text the platform produced; a window-wide listener sees
/// the logical key only.
fn key_input(event: &KeyEvent, mode: InputMode) -> KeyInput<'_> {
    match &event.logical_key {
        Key::Named(NamedKey::Enter) => KeyInput::Enter,
        Key::Named(NamedKey::Backspace) => KeyInput::Backspace,
        Key::Named(NamedKey::ArrowLeft) => KeyInput::ArrowLeft,
        Key::Named(NamedKey::ArrowRight) => KeyInput::ArrowRight,
        Key::Named(NamedKey::ArrowUp) => KeyInput::ArrowUp,
        Key::Named(NamedKey::ArrowDown) => KeyInput::ArrowDown,
        Key::Named(NamedKey::Escape) => KeyInput::Escape,
        Key::Named(NamedKey::Space) => KeyInput::Text(" "),
        Key::Character(value) => match mode {
            InputMode::Field => KeyInput::Text(event.text.as_deref().unwrap_or(value.as_str())),
            InputMode::Window => KeyInput::Text(value.as_str()),
        },
        _ => KeyInput::Other,
    }
}

#[derive(Default)]
struct MouseState {
    position: Option<PhysicalPosition<f64>>,
    pressed_anchor: Option<PhysicalPosition<f64>>,
}

impl MouseState {
    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.position = Some(position);
    }

    fn handle_button(&mut self, state: ElementState) {
        self.pressed_anchor = match state {
            ElementState::Pressed => self.position,
            ElementState::Released => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_arrow_presses_do_not_step_shaders() {
        assert_eq!(
            shader_signal(&OverlayAction::NextShader, false),
            Some(WindowSignal::NextShader)
        );
        assert_eq!(
            shader_signal(&OverlayAction::PreviousShader, false),
            Some(WindowSignal::PreviousShader)
        );
        assert_eq!(shader_signal(&OverlayAction::NextShader, true), None);
        assert_eq!(shader_signal(&OverlayAction::PreviousShader, true), None);
        assert_eq!(shader_signal(&OverlayAction::Edited, false), None);
    }

    #[test]
    fn platform_guard_only_rejects_macos() {
        assert_eq!(
            ensure_platform_supported().is_ok(),
            !cfg!(target_os = "macos")
        );
    }
}
