//! Actor Coordinator - Wires up the Live Update Actor System
//!
//! # Responsibility
//!
//! The Coordinator is a **thin orchestrator** that:
//! - Checks the setup (watch target, bind address) before anything runs
//! - Creates communication channels
//! - Runs the actors until shutdown
//!
//! # Architecture
//!
//! ```text
//! FsActor --> CompilerActor --> Broker <-- Registry --> WsServer sessions
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::CHANNEL_BUFFER;
use super::broker::{Broker, Registry};
use super::compiler::CompilerActor;
use super::fs::FsActor;
use super::messages::IdeMessage;
use super::ws::WsServer;
use crate::history::{HistoryProvider, TutorialLayout};

/// Coordinator - wires up and runs the actor system
pub struct Coordinator {
    /// The tutorial directory being edited
    watch_dir: PathBuf,
    layout: TutorialLayout,
    provider: Arc<dyn HistoryProvider>,
    addr: SocketAddr,
    /// Optional shutdown signal receiver
    shutdown_rx: Option<watch::Receiver<bool>>,
}

impl Coordinator {
    pub fn new(
        watch_dir: impl Into<PathBuf>,
        provider: Arc<dyn HistoryProvider>,
        addr: SocketAddr,
    ) -> Self {
        Self {
            watch_dir: watch_dir.into(),
            layout: TutorialLayout::default(),
            provider,
            addr,
            shutdown_rx: None,
        }
    }

    pub fn with_layout(mut self, layout: TutorialLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set shutdown signal receiver
    pub fn with_shutdown_signal(mut self, rx: watch::Receiver<bool>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system until shutdown
    pub async fn run(self) -> Result<()> {
        self.start().await?.wait().await
    }

    /// Do the fallible setup, then spawn every stage.
    ///
    /// Nothing is spawned unless the watch target exists, the watcher starts
    /// and the server address can be bound.
    pub async fn start(self) -> Result<RunningPipeline> {
        if !self.watch_dir.is_dir() {
            bail!("tutorial directory `{}` does not exist", self.watch_dir.display());
        }

        let (fs_tx, fs_rx) = mpsc::channel::<IdeMessage>(CHANNEL_BUFFER);
        let (broker_tx, broker_rx) = mpsc::channel::<IdeMessage>(CHANNEL_BUFFER);

        let fs_actor = FsActor::new(&self.watch_dir, &self.layout, fs_tx)
            .with_context(|| format!("cannot watch `{}`", self.watch_dir.display()))?;

        let registry = Registry::new();
        let server = WsServer::bind(self.addr, registry.clone())
            .await
            .with_context(|| format!("cannot listen on {}", self.addr))?;
        let local_addr = server.local_addr()?;
        crate::log!("serve"; "live updates on ws://{}", local_addr);

        let compiler_actor = CompilerActor::new(fs_rx, broker_tx, self.provider);
        let broker = Broker::new(broker_rx, registry);

        crate::debug!("actor"; "start");
        let handles = vec![
            ("watch", tokio::spawn(fs_actor.run())),
            ("compile", tokio::spawn(compiler_actor.run())),
            ("broker", tokio::spawn(broker.run())),
            ("serve", tokio::spawn(server.run())),
        ];

        Ok(RunningPipeline {
            local_addr,
            handles,
            shutdown_rx: self.shutdown_rx,
        })
    }
}

/// A started pipeline.
pub struct RunningPipeline {
    local_addr: SocketAddr,
    /// Stage name and task
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown_rx: Option<watch::Receiver<bool>>,
}

impl RunningPipeline {
    /// Address the server actually bound, useful with port 0.
    #[cfg(test)]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the shutdown signal, or for any stage to end, then stop all.
    ///
    /// Stages run until shutdown, so a stage that ends first is an error,
    /// whether it returned or panicked.
    pub async fn wait(mut self) -> Result<()> {
        let any_stage =
            futures_util::future::select_all(self.handles.iter_mut().map(|(_, handle)| handle));

        let ended = match self.shutdown_rx.as_mut() {
            Some(rx) => {
                tokio::select! {
                    // a dropped sender can never signal, so stop as well
                    _ = rx.wait_for(|&stop| stop) => {
                        crate::debug!("actor"; "shutdown signal received");
                        None
                    }
                    (result, index, _) = any_stage => Some((index, result)),
                }
            }
            None => {
                let (result, index, _) = any_stage.await;
                Some((index, result))
            }
        };

        for (_, handle) in &self.handles {
            handle.abort();
        }

        let Some((index, result)) = ended else {
            crate::debug!("actor"; "stopped serving ws://{}", self.local_addr);
            return Ok(());
        };

        let stage = self.handles[index].0;
        match result {
            Ok(()) => {
                crate::log!("actor"; "{} stage stopped unexpectedly", stage);
                bail!("the {stage} stage stopped unexpectedly")
            }
            Err(e) => {
                crate::log!("actor"; "{} stage failed: {}", stage, e);
                Err(anyhow::Error::new(e).context(format!("the {stage} stage failed")))
            }
        }
    }
}
