//! Effect handlers for the TUI runtime.
//!
//! Handlers perform I/O and return the `UiEvent` describing the result. They
//! never touch `AppState`; the runtime spawns them and feeds the result back
//! through the inbox.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parley_core::conversation::ConversationStore;
use parley_core::message::{ContextMessage, Message};
use parley_core::providers::ReplyProvider;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::common::{Clipboard, RequestId};
use crate::events::{LoadedConversation, UiEvent};
use crate::transcript::CopyTarget;
use crate::typewriter::RevealId;

/// Asks the provider chain for a reply.
///
/// Returns `None` when cancelled; a cancelled fetch reports nothing.
pub async fn fetch_reply(
    provider: Arc<dyn ReplyProvider>,
    request: RequestId,
    prompt: String,
    context: Vec<ContextMessage>,
    cancel: CancellationToken,
) -> Option<UiEvent> {
    tracing::debug!(?request, context = context.len(), "Fetching reply");
    tokio::select! {
        () = cancel.cancelled() => {
            tracing::debug!(?request, "Reply fetch cancelled");
            None
        }
        result = provider.fetch_reply(&prompt, &context) => {
            Some(UiEvent::ReplyReceived { request, result })
        }
    }
}

/// Fires the reveal tick for `id` after `delay`.
pub async fn reveal_tick(id: RevealId, delay: Duration) -> UiEvent {
    tokio::time::sleep(delay).await;
    UiEvent::RevealTick(id)
}

/// Resolves `id` (full id or unique prefix) and loads its messages.
pub async fn load_conversation(
    store: Arc<dyn ConversationStore>,
    request: RequestId,
    id: String,
) -> UiEvent {
    let result = tokio::task::spawn_blocking(move || read_conversation(store.as_ref(), &id))
        .await
        .unwrap_or_else(|e| Err(format!("Failed to load conversation: {e}")));
    UiEvent::ConversationLoaded { request, result }
}

fn read_conversation(
    store: &dyn ConversationStore,
    id: &str,
) -> Result<LoadedConversation, String> {
    let full_id = store
        .resolve_id(id)
        .map_err(|e| format!("{e:#}"))?
        .ok_or_else(|| format!("No conversation matches '{id}'"))?;
    let messages = store
        .load(&full_id)
        .map_err(|e| format!("{e:#}"))?
        .ok_or_else(|| format!("Conversation {full_id} not found"))?;
    Ok(LoadedConversation {
        id: full_id,
        messages,
    })
}

/// Writes the conversation. Failures are logged and otherwise ignored.
pub fn save_conversation(store: &dyn ConversationStore, id: &str, messages: &[Message]) {
    if let Err(e) = store.save(id, messages, Utc::now()) {
        tracing::warn!(conversation = id, "Failed to save conversation: {e:#}");
    }
}

/// One queued conversation write.
#[derive(Debug)]
pub struct SaveJob {
    pub id: String,
    pub messages: Vec<Message>,
}

/// Spawns the save worker. Jobs are written one at a time in the order they
/// were sent, off the UI thread. The worker exits once every sender is
/// dropped and the queue is drained.
pub fn spawn_save_worker(
    store: Arc<dyn ConversationStore>,
    mut receiver: mpsc::UnboundedReceiver<SaveJob>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            let store = Arc::clone(&store);
            let written = tokio::task::spawn_blocking(move || {
                save_conversation(store.as_ref(), &job.id, &job.messages);
            })
            .await;
            if let Err(e) = written {
                tracing::warn!("Save task failed: {e}");
            }
        }
    })
}

/// Copies on the blocking pool; the system clipboard may stall.
pub async fn copy_to_clipboard(text: String, target: CopyTarget) -> UiEvent {
    let result =
        tokio::task::spawn_blocking(move || Clipboard::copy(&text).map_err(|e| e.to_string()))
            .await
            .unwrap_or_else(|e| Err(format!("Clipboard task failed: {e}")));
    UiEvent::CopyFinished { target, result }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parley_core::conversation::MemoryStore;
    use parley_core::providers::{ProviderError, ProviderErrorKind, ProviderResult};

    use super::*;
    use crate::common::LatestOnly;

    struct Echo;

    #[async_trait]
    impl ReplyProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn fetch_reply(&self, prompt: &str, _: &[ContextMessage]) -> ProviderResult<String> {
            Ok(format!("echo: {prompt}"))
        }
    }

    struct Never;

    #[async_trait]
    impl ReplyProvider for Never {
        fn name(&self) -> &str {
            "never"
        }

        async fn fetch_reply(&self, _: &str, _: &[ContextMessage]) -> ProviderResult<String> {
            std::future::pending::<()>().await;
            Err(ProviderError::new(ProviderErrorKind::Timeout, "unreachable"))
        }
    }

    #[tokio::test]
    async fn test_fetch_reply_returns_event() {
        let request = LatestOnly::default().begin();
        let event = fetch_reply(
            Arc::new(Echo),
            request,
            "hi".to_string(),
            Vec::new(),
            CancellationToken::new(),
        )
        .await;
        match event {
            Some(UiEvent::ReplyReceived { request: r, result }) => {
                assert_eq!(r, request);
                assert_eq!(result.unwrap(), "echo: hi");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_fetch_reports_nothing() {
        let cancel = CancellationToken::new();
        let request = LatestOnly::default().begin();
        let task = tokio::spawn(fetch_reply(
            Arc::new(Never),
            request,
            "hi".to_string(),
            Vec::new(),
            cancel.clone(),
        ));
        cancel.cancel();
        assert!(task.await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_tick_waits_for_delay() {
        let start = tokio::time::Instant::now();
        let (id, _) = crate::typewriter::TypewriterController::new().start("x");
        let event = reveal_tick(id, Duration::from_millis(30)).await;
        assert!(matches!(event, UiEvent::RevealTick(got) if got == id));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_save_worker_writes_in_order() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = spawn_save_worker(Arc::clone(&store) as _, rx);

        for n in 1..=5 {
            let messages = (0..n).map(|i| Message::user(format!("m{i}"))).collect();
            tx.send(SaveJob {
                id: "conv".to_string(),
                messages,
            })
            .unwrap();
        }
        drop(tx);
        worker.await.unwrap();

        let saved = store.load("conv").unwrap().unwrap();
        assert_eq!(saved.len(), 5);
        assert_eq!(saved.last(), Some(&Message::user("m4")));
    }

    #[tokio::test]
    async fn test_load_conversation_by_prefix() {
        let store = Arc::new(MemoryStore::new());
        save_conversation(store.as_ref(), "abc123", &[Message::user("hello")]);

        let request = LatestOnly::default().begin();
        let shared: Arc<dyn ConversationStore> = Arc::clone(&store) as _;
        let event = load_conversation(shared, request, "abc".to_string()).await;
        let UiEvent::ConversationLoaded { result, .. } = event else {
            panic!("unexpected event");
        };
        let loaded = result.unwrap();
        assert_eq!(loaded.id, "abc123");
        assert_eq!(loaded.messages, vec![Message::user("hello")]);

        let event = load_conversation(store, request, "zzz".to_string()).await;
        let UiEvent::ConversationLoaded { result, .. } = event else {
            panic!("unexpected event");
        };
        assert!(result.unwrap_err().contains("No conversation"));
    }
}
