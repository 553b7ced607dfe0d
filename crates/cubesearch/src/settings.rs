use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;
use renderer::{Antialiasing, InputMode, RendererConfig, SceneParams, SearchParams};
use sceneconfig::{AntialiasSetting, InputSetting, SceneConfig};
use shadertoy::normalize_shader_id;

use crate::cli::RunArgs;

/// Reads `path`, falling back to built-in defaults when the file is absent.
pub fn load_config(path: &Path) -> Result<SceneConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        return Ok(SceneConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    SceneConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid config file at {}", path.display()))
}

/// Layers command-line flags (and the env-backed API key) over `config`.
pub fn apply_overrides(config: &mut SceneConfig, args: &RunArgs) -> Result<()> {
    if let Some(shader) = &args.shader {
        config.shadertoy.shaders = vec![shader.clone()];
    }
    if let Some(key) = &args.shadertoy_api_key {
        config.shadertoy.api_key = Some(key.clone());
    }
    if let Some((width, height)) = args.size {
        config.window.width = width;
        config.window.height = height;
    }
    if args.fullscreen {
        config.window.fullscreen = true;
    }
    if let Some(antialias) = args.antialias {
        config.window.antialias = antialias;
    }
    if let Some(input) = args.input {
        config.search.input = input;
    }
    config
        .validate()
        .context("configuration rejected after applying command-line overrides")
}

/// Normalises every configured entry (bare id, `shadertoy://` handle or URL).
pub fn resolve_shader_ids(config: &SceneConfig) -> Result<Vec<String>> {
    config
        .shadertoy
        .shaders
        .iter()
        .map(|entry| {
            normalize_shader_id(entry).with_context(|| format!("invalid shader entry '{entry}'"))
        })
        .collect()
}

pub fn renderer_config(config: &SceneConfig) -> RendererConfig {
    let scene = &config.scene;
    let [x, y, z] = scene.position;
    RendererConfig {
        surface_size: (config.window.width, config.window.height),
        fullscreen: config.window.fullscreen,
        antialiasing: map_antialias(config.window.antialias),
        scene: SceneParams {
            rotation_step: scene.rotation_step as f32,
            cube_size: scene.cube_size as f32,
            position: Vec3::new(x as f32, y as f32, z as f32),
            scale: scene.scale as f32,
            clicked_scale: scene.clicked_scale as f32,
            fov_degrees: scene.fov_degrees as f32,
        },
        search: SearchParams {
            url_template: config.search.url.clone(),
            input: match config.search.input {
                InputSetting::Field => InputMode::Field,
                InputSetting::Window => InputMode::Window,
            },
            placeholder: config.search.placeholder.clone(),
            exit_on_submit: config.search.exit_on_submit,
        },
    }
}

fn map_antialias(setting: AntialiasSetting) -> Antialiasing {
    match setting.samples() {
        None => Antialiasing::Auto,
        Some(1) => Antialiasing::Off,
        Some(samples) => Antialiasing::Samples(samples),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use tempfile::TempDir;

    fn args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["cubesearch"];
        full.extend_from_slice(argv);
        Cli::try_parse_from(full).unwrap().run
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[shadertoy]\nshaders = []\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn cli_flags_override_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[shadertoy]
api_key = "from-file"
shaders = ["aaaaaa", "bbbbbb"]

[window]
width = 640
height = 480
"#,
        )
        .unwrap();
        let mut config = load_config(&path).unwrap();
        apply_overrides(
            &mut config,
            &args(&[
                "--shadertoy-api-key",
                "from-cli",
                "--size",
                "1920x1080",
                "--antialias",
                "off",
                "--input",
                "window",
                "https://www.shadertoy.com/view/XsXXDn",
            ]),
        )
        .unwrap();

        assert_eq!(config.shadertoy.api_key.as_deref(), Some("from-cli"));
        assert_eq!((config.window.width, config.window.height), (1920, 1080));
        assert_eq!(config.window.antialias, AntialiasSetting::Off);
        assert_eq!(config.search.input, InputSetting::Window);
        assert_eq!(resolve_shader_ids(&config).unwrap(), vec!["XsXXDn"]);
    }

    #[test]
    fn rejects_malformed_shader_entries() {
        let mut config = SceneConfig::default();
        config.shadertoy.shaders = vec!["not a shader!".to_string()];
        assert!(resolve_shader_ids(&config).is_err());
    }

    #[test]
    fn maps_config_onto_renderer() {
        let mut config = SceneConfig::default();
        config.window.antialias = AntialiasSetting::Samples8;
        config.scene.position = [1.0, 2.0, -3.0];
        let renderer = renderer_config(&config);

        assert_eq!(renderer.surface_size, (1280, 720));
        assert_eq!(renderer.antialiasing, Antialiasing::Samples(8));
        assert_eq!(renderer.scene.position, Vec3::new(1.0, 2.0, -3.0));
        assert_eq!(renderer.search.input, InputMode::Field);
        assert!(renderer.search.exit_on_submit);
        assert_eq!(map_antialias(AntialiasSetting::Off), Antialiasing::Off);
        assert_eq!(map_antialias(AntialiasSetting::Auto), Antialiasing::Auto);
    }
}
