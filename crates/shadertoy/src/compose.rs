use crate::remote::{RenderPass, ShaderPayload};

pub const COMMON_PASS: &str = "common";
pub const IMAGE_PASS: &str = "image";

/// Concatenates every `common` pass, then every `image` pass. Other pass
/// kinds (buffers, cubemaps, sound) are dropped.
pub fn compose_body(passes: &[RenderPass]) -> String {
    let mut body = String::new();
    for kind in [COMMON_PASS, IMAGE_PASS] {
        for pass in passes.iter().filter(|pass| pass.is_kind(kind)) {
            body.push_str(&pass.code);
            if !body.is_empty() && !body.ends_with('\n') {
                body.push('\n');
            }
        }
    }
    body
}

impl ShaderPayload {
    pub fn fragment_body(&self) -> String {
        compose_body(&self.render_passes)
    }

    pub fn display_name(&self) -> &str {
        if self.info.name.trim().is_empty() {
            &self.info.id
        } else {
            &self.info.name
        }
    }
}
