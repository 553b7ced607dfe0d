use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use renderer::{WindowRuntime, WindowSignal};
use sceneconfig::SceneConfig;
use scheduler::ShaderScheduler;
use shadertoy::{ShaderFetcher, ShadertoyClient, ShadertoyConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;
use crate::settings::{apply_overrides, load_config, renderer_config, resolve_shader_ids};

/// Upper bound on how long the app loop waits for a fetch before checking
/// window signals again.
const POLL_INTERVAL: Duration = Duration::from_millis(16);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolves the config file path: `--config` wins over the discovered directory.
pub fn config_path(args: &RunArgs, paths: &AppPaths) -> PathBuf {
    args.config.clone().unwrap_or_else(|| paths.config_file())
}

/// Defaults < config file < environment < command line.
pub fn effective_config(args: &RunArgs, path: &Path) -> Result<SceneConfig> {
    let mut config = load_config(path)?;
    apply_overrides(&mut config, args)?;
    Ok(config)
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let path = config_path(&args, &paths);
    let config = effective_config(&args, &path)?;
    tracing::debug!(config = %path.display(), "resolved cubesearch config");

    let ids = resolve_shader_ids(&config)?;
    let shader_count = ids.len();
    let client = build_client(&config, &path)?;
    let mut scheduler = ShaderScheduler::new(ids, config.shadertoy.order, args.seed)
        .context("failed to build shader rotation")?;
    let mut fetcher = ShaderFetcher::new(Arc::new(client));

    tracing::info!(
        shaders = shader_count,
        first = scheduler.current(),
        "starting cubesearch"
    );
    let runtime = WindowRuntime::spawn(renderer_config(&config))?;
    fetcher.request(scheduler.current());

    while !runtime.is_finished() {
        for signal in runtime.take_signals() {
            let id = match signal {
                WindowSignal::NextShader => scheduler.next(),
                WindowSignal::PreviousShader => scheduler.previous(),
            }
            .to_string();
            let generation = fetcher.request(&id);
            tracing::debug!(shader = %id, generation, "switching shader");
        }

        if let Some(fetched) = fetcher.poll_timeout(POLL_INTERVAL) {
            tracing::debug!(
                shader = %fetched.shader_id,
                generation = fetched.generation,
                "handing shader to window"
            );
            if let Err(err) = runtime.swap_fragment(
                fetched.payload.display_name(),
                fetched.payload.fragment_body(),
            ) {
                tracing::warn!(error = %err, "failed to forward shader to window");
            }
        }
    }

    tracing::info!("window closed; shutting down");
    runtime.shutdown()
}

fn build_client(config: &SceneConfig, path: &Path) -> Result<ShadertoyClient> {
    let section = &config.shadertoy;
    let key = section.api_key.as_deref().ok_or_else(|| {
        anyhow!(
            "a Shadertoy API key is required: pass --shadertoy-api-key, set SHADERTOY_API_KEY, \
             or add shadertoy.api_key to {}",
            path.display()
        )
    })?;
    let client_config = ShadertoyConfig::new(key)
        .context("invalid Shadertoy API key configuration")?
        .with_api_base(&section.api_base)
        .context("invalid Shadertoy API base URL")?
        .with_timeout(section.timeout);
    ShadertoyClient::new(client_config).context("failed to construct Shadertoy client")
}
