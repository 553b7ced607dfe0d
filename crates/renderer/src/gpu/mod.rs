//! GPU side of the cube renderer.
//!
//! - `context` owns wgpu instance/device/surface wiring and reconfigures the
//!   swapchain when the window resizes.
//! - `pipeline` builds the cube render pipeline around a wrapped fragment
//!   program; the vertex stage and layouts are shared.
//! - `uniforms` mirrors the GLSL uniform block and is written once per frame.
//! - `state` glues everything together and exposes the `GpuState` API used by
//!   `window`.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::{FrameInput, GpuState};
