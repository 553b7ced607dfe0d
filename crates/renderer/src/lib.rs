//! Renderer crate for cubesearch.
//!
//! Glues the winit window, the `wgpu` cube pipeline, and Shadertoy-compatible
//! fragment wrapping together. The overall flow is:
//!
//! ```text
//!   cubesearch (app thread)
//!          │ RendererConfig
//!          ▼
//!   WindowRuntime::spawn ──▶ window thread ──▶ winit event loop ──▶ render_frame()
//!          ▲      │ swap_fragment()                 │
//!          │      └──────────────▶ GpuState::set_fragment
//!          └─ WindowSignal (next/previous shader)   └─▶ AnimationState ─▶ GPU UBO
//! ```
//!
//! The window thread owns every GPU resource. Fragment bodies fetched from
//! Shadertoy are wrapped at runtime, validated with naga, and compiled as
//! Vulkan GLSL; a body that fails leaves the previous pipeline in place.

mod animation;
mod camera;
mod compile;
mod gpu;
mod mesh;
mod overlay;
mod types;
mod window;

pub use animation::AnimationState;
pub use camera::{Camera, CubeTransform, Ray};
pub use compile::{compose_fragment_source, validate_fragment};
pub use overlay::{build_search_url, InputMode, KeyInput, OverlayAction, SearchOverlay};
pub use types::{Antialiasing, RendererConfig, SceneParams, SearchParams};
pub use window::{WindowRuntime, WindowSignal};
