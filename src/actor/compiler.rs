//! Compiler Actor - Selective Recompilation
//!
//! Program changes pass straight through. Narrative changes rebuild the whole
//! tutorial document from the history provider, since a narrative edit can
//! move chapters and patch placeholders anywhere.
//!
//! A failed rebuild is reported and the message dropped; the stream goes on.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinError;

use super::messages::{IdeMessage, MessageKind};
use crate::history::{HistoryError, HistoryProvider};
use crate::render::{RenderError, compile_document};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cannot load tutorial history")]
    History(#[from] HistoryError),

    #[error("cannot render narrative")]
    Render(#[from] RenderError),

    #[error("recompile task panicked")]
    Join(#[from] JoinError),
}

pub struct CompilerActor {
    rx: mpsc::Receiver<IdeMessage>,
    /// Channel to the broker
    out: mpsc::Sender<IdeMessage>,
    provider: Arc<dyn HistoryProvider>,
}

impl CompilerActor {
    pub fn new(
        rx: mpsc::Receiver<IdeMessage>,
        out: mpsc::Sender<IdeMessage>,
        provider: Arc<dyn HistoryProvider>,
    ) -> Self {
        Self { rx, out, provider }
    }

    /// Main event loop; ends when either neighbour hangs up.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            let Some(msg) = self.process(msg).await else {
                continue;
            };
            if self.out.send(msg).await.is_err() {
                crate::debug!("compile"; "broker gone, stopping");
                break;
            }
        }
    }

    /// Zero or one message downstream per input.
    async fn process(&self, msg: IdeMessage) -> Option<IdeMessage> {
        match msg.kind {
            MessageKind::Program => Some(msg),
            MessageKind::Narrative => match self.recompile().await {
                Ok(html) => {
                    crate::logger::status_success(&format!("recompiled `{}`", msg.tutorial_name));
                    Some(msg.with_text(html))
                }
                Err(e) => {
                    let detail = format!("{:#}", anyhow::Error::new(e));
                    crate::logger::status_error(
                        &format!("compile: `{}` failed, update dropped", msg.tutorial_name),
                        &detail,
                    );
                    None
                }
            },
        }
    }

    /// Rebuild the document from the current on-disk narrative.
    ///
    /// Loading walks the git history, so it runs off the async workers.
    async fn recompile(&self) -> Result<String, CompileError> {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || {
            let history = provider.load()?;
            let document = compile_document(&history)?;
            Ok(document.to_html())
        })
        .await?
    }
}
