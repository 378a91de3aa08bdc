//! One sorting pipeline: dispatcher plus (optionally) its suggestion worker.
//!
//! Each pipeline builds its own queue and rate limiter, so independent
//! instances never share state.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ai::{RateLimiter, SuggestionService, SuggestionWorker};
use crate::config::Settings;
use crate::services::{DispatchSettings, Dispatcher, WatchMessage};

pub struct Pipeline {
    dispatcher: Dispatcher,
    worker: Option<SuggestionWorker>,
    cancel: CancellationToken,
    worker_cancel: CancellationToken,
}

impl Pipeline {
    /// `root` is the prepared (existing, canonical) watched folder.
    /// The worker only exists when suggestions are enabled and a service is given.
    pub fn new(
        settings: &Settings,
        root: PathBuf,
        service: Option<Arc<dyn SuggestionService>>,
        cancel: CancellationToken,
    ) -> Self {
        let worker_cancel = cancel.child_token();

        let (worker, handle) = match (settings.suggestions.enabled, service) {
            (true, Some(service)) => {
                let (worker, handle) = SuggestionWorker::new(
                    settings.suggestions.clone(),
                    root.clone(),
                    RateLimiter::new(settings.rate_interval),
                    service,
                    settings.queue_capacity,
                    worker_cancel.clone(),
                );
                (Some(worker), Some(handle))
            }
            (true, None) => {
                tracing::warn!("AI suggestions enabled but no service configured, using fallback");
                (None, None)
            }
            (false, _) => (None, None),
        };

        let dispatcher = Dispatcher::new(
            DispatchSettings {
                root,
                preserve_structure: settings.preserve_structure,
                settle_delay: settings.settle_delay,
            },
            settings.ignore.clone(),
            settings.rules.clone(),
            handle,
        );

        Self {
            dispatcher,
            worker,
            cancel,
            worker_cancel,
        }
    }

    /// Run until the event stream ends or `cancel` fires, then stop the worker
    pub async fn run(self, events: mpsc::Receiver<WatchMessage>) {
        let Self {
            dispatcher,
            worker,
            cancel,
            worker_cancel,
        } = self;

        let worker = worker.map(SuggestionWorker::spawn);

        tokio::select! {
            _ = cancel.cancelled() => tracing::info!("Pipeline cancelled"),
            _ = dispatcher.run(events) => {}
        }

        worker_cancel.cancel();
        drop(dispatcher);
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!("Suggestion worker panicked: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::ScriptedService;
    use crate::config;
    use notify::event::CreateKind;
    use notify::EventKind;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const YAML: &str = r#"
options:
  settle_delay_ms: 0
  rate_limit_secs: 0
ignore:
  os_defaults: true
rules:
  - pattern: '.*invoice.*\.pdf$'
    target: Documents/Finance/Invoices
gpt:
  enabled: true
  api_key: test
  model: test-model
  instructions: Sort it.
"#;

    fn created(path: &Path) -> WatchMessage {
        Ok(notify::Event::new(EventKind::Create(CreateKind::File)).add_path(path.to_path_buf()))
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let settings = config::parse(YAML, None).unwrap();
        let service = Arc::new(ScriptedService::new(vec![Ok("  Work/Reports  ".to_string())]));

        for name in ["project_invoice_2024.pdf", "q3.docx", ".DS_Store"] {
            fs::write(root.join(name), "x").unwrap();
        }

        let (tx, rx) = mpsc::channel(8);
        for name in ["project_invoice_2024.pdf", "q3.docx", ".DS_Store"] {
            tx.send(created(&root.join(name))).await.unwrap();
        }
        drop(tx);

        let dyn_service: Arc<dyn SuggestionService> = service.clone();
        Pipeline::new(&settings, root.to_path_buf(), Some(dyn_service), CancellationToken::new())
            .run(rx)
            .await;

        assert!(root
            .join("Documents/Finance/Invoices/project_invoice_2024.pdf")
            .exists());
        assert!(root.join("Work/Reports/q3.docx").exists());
        assert!(root.join(".DS_Store").exists());
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_enabled_without_service_uses_fallback() {
        let dir = tempdir().unwrap();
        let settings = config::parse(YAML, None).unwrap();
        fs::write(dir.path().join("notes.xyz"), "x").unwrap();

        let (tx, rx) = mpsc::channel(8);
        tx.send(created(&dir.path().join("notes.xyz"))).await.unwrap();
        drop(tx);

        Pipeline::new(&settings, dir.path().to_path_buf(), None, CancellationToken::new())
            .run(rx)
            .await;

        assert!(dir.path().join("Unsorted/notes.xyz").exists());
    }

    #[tokio::test]
    async fn test_cancel_stops_pipeline() {
        let dir = tempdir().unwrap();
        let settings = config::parse(YAML, None).unwrap();
        let service: Arc<dyn SuggestionService> = Arc::new(ScriptedService::default());
        let cancel = CancellationToken::new();

        let (_tx, rx) = mpsc::channel(8);
        let pipeline = Pipeline::new(&settings, dir.path().to_path_buf(), Some(service), cancel.clone());
        let task = tokio::spawn(pipeline.run(rx));

        cancel.cancel();
        task.await.unwrap();
    }
}
