//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! All side effects happen here. The reducer stays pure and returns
//! effects; this module carries them out.
//!
//! Async handlers send their result `UiEvent`s to the inbox channel, which
//! the loop drains every iteration alongside terminal input.

mod handlers;

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use parley_core::config::Config;
use parley_core::conversation::ConversationStore;
use parley_core::providers::ReplyProvider;
use parley_core::transcript::ConversationTranscript;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Frame interval while something is animating (~60fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll interval when nothing is in flight.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

type UiEventSender = mpsc::UnboundedSender<UiEvent>;
type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Full-screen chat runtime.
///
/// The terminal is restored on drop and on panic.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    provider: Arc<dyn ReplyProvider>,
    store: Arc<dyn ConversationStore>,
    /// Ordered queue for conversation writes; `None` once flushed.
    saves: Option<mpsc::UnboundedSender<handlers::SaveJob>>,
    save_worker: Option<JoinHandle<()>>,
    /// Cancels the in-flight reply fetch.
    reply_cancel: Option<CancellationToken>,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Enters the alternate screen and builds the initial state.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(
        config: &Config,
        provider: Arc<dyn ReplyProvider>,
        store: Arc<dyn ConversationStore>,
        conversation: ConversationTranscript,
    ) -> Result<Self> {
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (saves, save_rx) = mpsc::unbounded_channel();
        let save_worker = handlers::spawn_save_worker(Arc::clone(&store), save_rx);
        let now = Instant::now();
        Ok(Self {
            terminal,
            state: AppState::new(config, conversation),
            inbox_tx,
            inbox_rx,
            provider,
            store,
            saves: Some(saves),
            save_worker: Some(save_worker),
            reply_cancel: None,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the event loop until the user quits.
    ///
    /// # Errors
    /// Returns an error if terminal I/O fails.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;
        let result = self.event_loop();
        let _ = terminal::disable_input_features();
        result
    }

    /// Waits for queued conversation writes to finish.
    ///
    /// Saves emitted after this call are written inline.
    pub async fn flush_saves(&mut self) {
        self.saves = None;
        let Some(worker) = self.save_worker.take() else {
            return;
        };
        if let Err(e) = worker.await {
            tracing::warn!("Save worker failed: {e}");
        }
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let mut events = self.collect_events()?;

            // Layout updates run before anything else in the batch.
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                // Renders are batched to the tick cadence.
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty && !self.state.should_quit {
                self.terminal.draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let needs_fast_poll = self.state.is_busy()
            || self.state.load.has_active()
            || self.state.transcript.copy.has_pending_clear()
            || recent_terminal_activity;
        let tick_interval = if needs_fast_poll {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns an async handler and sends its event to the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Option<UiEvent>> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            if let Some(event) = f().await {
                let _ = tx.send(event);
            }
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }

            UiEffect::FetchReply {
                request,
                prompt,
                context,
            } => {
                if let Some(previous) = self.reply_cancel.take() {
                    previous.cancel();
                }
                let cancel = CancellationToken::new();
                self.reply_cancel = Some(cancel.clone());
                let provider = Arc::clone(&self.provider);
                self.spawn_effect(move || {
                    handlers::fetch_reply(provider, request, prompt, context, cancel)
                });
            }
            UiEffect::CancelReply => {
                if let Some(cancel) = self.reply_cancel.take() {
                    cancel.cancel();
                }
            }

            UiEffect::ScheduleRevealTick { id, delay } => {
                self.spawn_effect(move || async move {
                    Some(handlers::reveal_tick(id, delay).await)
                });
            }

            UiEffect::SaveConversation { id, messages } => match &self.saves {
                Some(saves) => {
                    if let Err(e) = saves.send(handlers::SaveJob { id, messages }) {
                        let job = e.0;
                        handlers::save_conversation(self.store.as_ref(), &job.id, &job.messages);
                    }
                }
                None => handlers::save_conversation(self.store.as_ref(), &id, &messages),
            },
            UiEffect::LoadConversation { request, id } => {
                let store = Arc::clone(&self.store);
                self.spawn_effect(move || async move {
                    Some(handlers::load_conversation(store, request, id).await)
                });
            }

            UiEffect::CopyToClipboard { text, target } => {
                self.spawn_effect(move || async move {
                    Some(handlers::copy_to_clipboard(text, target).await)
                });
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        if let Some(cancel) = self.reply_cancel.take() {
            cancel.cancel();
        }
        let _ = terminal::restore_terminal();
    }
}
