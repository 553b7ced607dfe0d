use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use crate::remote::{ShaderPayload, ShadertoyClient};

/// Anything able to resolve a shader id into a payload. The HTTP client is the
/// production implementation; tests substitute canned sources.
pub trait FetchShader: Send + Sync + 'static {
    fn fetch_shader(&self, shader_id: &str) -> Result<ShaderPayload>;
}

impl FetchShader for ShadertoyClient {
    fn fetch_shader(&self, shader_id: &str) -> Result<ShaderPayload> {
        ShadertoyClient::fetch_shader(self, shader_id)
    }
}

#[derive(Debug)]
struct FetchOutcome {
    generation: u64,
    shader_id: String,
    result: Result<ShaderPayload>,
}

/// A payload belonging to the most recent request.
#[derive(Debug, Clone)]
pub struct FetchedShader {
    pub generation: u64,
    pub shader_id: String,
    pub payload: ShaderPayload,
}

/// Runs each request on its own worker thread and only hands back the result
/// of the latest one. Earlier requests still complete but are dropped.
pub struct ShaderFetcher {
    source: Arc<dyn FetchShader>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
    latest: u64,
}

impl ShaderFetcher {
    pub fn new(source: Arc<dyn FetchShader>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            source,
            tx,
            rx,
            latest: 0,
        }
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest
    }

    /// Starts a fetch and returns its generation.
    pub fn request(&mut self, shader_id: &str) -> u64 {
        self.latest += 1;
        let generation = self.latest;
        let shader_id = shader_id.to_string();
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        debug!(shader = %shader_id, generation, "dispatching shader fetch");

        let spawned = thread::Builder::new()
            .name(format!("shader-fetch-{generation}"))
            .spawn({
                let shader_id = shader_id.clone();
                move || {
                    let result = source.fetch_shader(&shader_id);
                    let _ = tx.send(FetchOutcome {
                        generation,
                        shader_id,
                        result,
                    });
                }
            });
        if let Err(err) = spawned {
            warn!(shader = %shader_id, error = %err, "failed to spawn shader fetch worker");
        }
        generation
    }

    /// Drains finished fetches without blocking.
    pub fn poll(&mut self) -> Option<FetchedShader> {
        let mut accepted = None;
        while let Ok(outcome) = self.rx.try_recv() {
            if let Some(fetched) = self.accept(outcome) {
                accepted = Some(fetched);
            }
        }
        accepted
    }

    /// Blocks until the latest request resolves successfully or `timeout`
    /// elapses.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Option<FetchedShader> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    if let Some(fetched) = self.accept(outcome) {
                        return Some(fetched);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }

    fn accept(&self, outcome: FetchOutcome) -> Option<FetchedShader> {
        let FetchOutcome {
            generation,
            shader_id,
            result,
        } = outcome;
        if generation != self.latest {
            debug!(
                shader = %shader_id,
                generation,
                latest = self.latest,
                "discarding stale shader fetch"
            );
            return None;
        }
        match result {
            Ok(payload) => Some(FetchedShader {
                generation,
                shader_id,
                payload,
            }),
            Err(err) => {
                warn!(shader = %shader_id, "shader fetch failed: {err:#}");
                None
            }
        }
    }
}
