use glam::Vec3;
use sceneconfig::QUERY_PLACEHOLDER;

use crate::overlay::InputMode;

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Cube placement and animation tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParams {
    /// Maximum change of the Y rotation per frame, in radians.
    pub rotation_step: f32,
    /// Edge length of the cube before scaling.
    pub cube_size: f32,
    pub position: Vec3,
    /// Scale while not clicked.
    pub scale: f32,
    /// Scale after a click toggles the cube.
    pub clicked_scale: f32,
    pub fov_degrees: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            rotation_step: 0.05,
            cube_size: 30.0,
            position: Vec3::new(0.0, 0.0, -30.0),
            scale: 1.5,
            clicked_scale: 1.0,
            fov_degrees: 75.0,
        }
    }
}

/// Search box behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// URL template containing `{query}`.
    pub url_template: String,
    pub input: InputMode,
    pub placeholder: String,
    /// Close the window once the browser has been asked to open the URL.
    pub exit_on_submit: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            url_template: format!("https://www.google.com/search?q={QUERY_PLACEHOLDER}"),
            input: InputMode::Field,
            placeholder: "Search...".to_string(),
            exit_on_submit: true,
        }
    }
}

/// Immutable configuration passed to the window runtime at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    pub fullscreen: bool,
    pub antialiasing: Antialiasing,
    pub scene: SceneParams,
    pub search: SearchParams,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            fullscreen: false,
            antialiasing: Antialiasing::default(),
            scene: SceneParams::default(),
            search: SearchParams::default(),
        }
    }
}
