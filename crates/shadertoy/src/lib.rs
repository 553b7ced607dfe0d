mod compose;
mod fetcher;
mod handle;
mod remote;

pub use compose::{compose_body, COMMON_PASS, IMAGE_PASS};
pub use fetcher::{FetchShader, FetchedShader, ShaderFetcher};
pub use handle::{normalize_shader_id, HandleError};
pub use remote::{
    decode_shader_response, RenderPass, ShaderInfo, ShaderPayload, ShadertoyClient,
    ShadertoyConfig, DEFAULT_API_BASE, DEFAULT_TIMEOUT,
};
