use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://www.shadertoy.com/api/v1/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ShadertoyConfig {
    pub api_key: String,
    pub api_base: Url,
    pub timeout: Duration,
}

impl ShadertoyConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("Shadertoy API key must not be empty");
        }
        Ok(Self {
            api_key,
            api_base: Url::parse(DEFAULT_API_BASE)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_api_base(mut self, base: &str) -> Result<Self> {
        let mut url = Url::parse(base).with_context(|| format!("invalid API base url '{base}'"))?;
        // `Url::join` and `path_segments_mut` both expect a trailing slash on the base.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.api_base = url;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds `{api_base}/shaders/{id}?key={api_key}`.
    pub fn shader_url(&self, shader_id: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("invalid Shadertoy API base url"))?;
            segments.pop_if_empty();
            segments.push("shaders");
            segments.push(shader_id);
        }
        url.set_query(Some(&format!("key={}", self.api_key)));
        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct ShadertoyClient {
    http: Client,
    config: ShadertoyConfig,
}

impl ShadertoyClient {
    pub fn new(config: ShadertoyConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ShadertoyConfig {
        &self.config
    }

    pub fn fetch_shader(&self, shader_id: &str) -> Result<ShaderPayload> {
        if shader_id.trim().is_empty() {
            bail!("shader id must not be empty");
        }
        let url = self.config.shader_url(shader_id)?;
        debug!(shader = shader_id, "requesting shader from Shadertoy");
        let response = self
            .http
            .get(url.clone())
            .send()
            .with_context(|| format!("requesting shader '{shader_id}'"))?
            .error_for_status()
            .context("Shadertoy API returned an error status")?;
        let body = response.text()?;
        decode_shader_response(&body).with_context(|| format!("decoding shader '{shader_id}'"))
    }
}

/// Pulls the nested `Shader` object out of an API response body.
pub fn decode_shader_response(body: &str) -> Result<ShaderPayload> {
    if let Ok(payload) = serde_json::from_str::<ShaderApiResponse>(body) {
        return Ok(payload.shader);
    }
    if let Ok(err) = serde_json::from_str::<ApiError>(body) {
        bail!("Shadertoy API error: {}", err.error);
    }
    let snippet = body.chars().take(200).collect::<String>();
    bail!(
        "unexpected Shadertoy API response; could not find 'Shader' field. First 200 bytes: {}",
        snippet
    )
}

#[derive(Debug, Deserialize)]
struct ShaderApiResponse {
    #[serde(rename = "Shader")]
    shader: ShaderPayload,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(alias = "Error")]
    error: String,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShaderPayload {
    #[serde(default)]
    pub info: ShaderInfo,
    #[serde(rename = "renderpass", default)]
    pub render_passes: Vec<RenderPass>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShaderInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RenderPass {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub pass_type: String,
    #[serde(default)]
    pub code: String,
}

impl RenderPass {
    pub fn new(pass_type: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            pass_type: pass_type.into(),
            code: code.into(),
        }
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.pass_type.eq_ignore_ascii_case(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    {
        "Shader": {
            "ver": "0.1",
            "info": {
                "id": "mslfWr",
                "name": "My first ray marching",
                "description": "Demo",
                "tags": ["raymarching"]
            },
            "renderpass": [
                {
                    "name": "Common",
                    "type": "common",
                    "code": "float sdSphere(vec3 p, float r) { return length(p) - r; }",
                    "inputs": [],
                    "outputs": []
                },
                {
                    "name": "Image",
                    "type": "image",
                    "code": "void mainImage(out vec4 fragColor, in vec2 fragCoord) { fragColor = vec4(1.0); }",
                    "inputs": [{ "channel": 0, "ctype": "texture", "src": "/media/a/tex.png" }],
                    "outputs": [{ "id": 37, "channel": 0 }]
                }
            ]
        }
    }
    "#;

    #[test]
    fn decodes_nested_shader_object() {
        let payload = decode_shader_response(SAMPLE).expect("valid payload");
        assert_eq!(payload.info.id, "mslfWr");
        assert_eq!(payload.info.name, "My first ray marching");
        assert_eq!(payload.render_passes.len(), 2);
        assert!(payload.render_passes[0].is_kind("common"));
        assert!(payload.render_passes[1].is_kind("IMAGE"));
    }

    #[test]
    fn surfaces_api_error_body() {
        let err = decode_shader_response(r#"{ "Error": "Shader not found" }"#).unwrap_err();
        assert!(err.to_string().contains("Shader not found"));
    }

    #[test]
    fn rejects_unrelated_json() {
        let err = decode_shader_response(r#"{ "Shaders": 3 }"#).unwrap_err();
        assert!(err.to_string().contains("could not find 'Shader' field"));
    }

    #[test]
    fn builds_shader_url_with_key() {
        let config = ShadertoyConfig::new("abc123").unwrap();
        let url = config.shader_url("3dXyWj").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.shadertoy.com/api/v1/shaders/3dXyWj?key=abc123"
        );
    }

    #[test]
    fn custom_base_without_trailing_slash() {
        let config = ShadertoyConfig::new("k")
            .unwrap()
            .with_api_base("http://localhost:8080/api")
            .unwrap();
        let url = config.shader_url("id").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/shaders/id?key=k");
    }

    #[test]
    fn rejects_blank_api_key() {
        assert!(ShadertoyConfig::new("   ").is_err());
    }
}
