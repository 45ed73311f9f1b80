//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use parley_core::conversation::short_id;
use parley_core::message::Message;
use parley_core::providers::ProviderError;
use parley_core::transcript::{ConversationTranscript, FALLBACK_REPLY};

use crate::common::commands::{self, SlashCommand};
use crate::common::RequestId;
use crate::effects::UiEffect;
use crate::events::{LoadedConversation, UiEvent};
use crate::input::{self, InputAction};
use crate::render;
use crate::state::{AppState, Notice};
use crate::transcript::{self, CopyTarget, code_blocks};
use crate::typewriter::{RevealId, TickOutcome};

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            app.transcript.check_copy_timeout(Instant::now());
            transcript::apply_scroll_delta(&mut app.transcript);
            vec![]
        }
        UiEvent::Frame { width, height } => {
            handle_frame(app, width, height);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::ReplyReceived { request, result } => handle_reply(app, request, result),
        UiEvent::RevealTick(id) => handle_reveal_tick(app, id),
        UiEvent::ConversationLoaded { request, result } => {
            handle_conversation_loaded(app, request, result)
        }
        UiEvent::CopyFinished { target, result } => {
            match result {
                Ok(()) if target.message < app.transcript.conversation().len() => {
                    app.transcript.mark_copied(target, Instant::now());
                }
                Ok(()) => {}
                Err(e) => tracing::debug!("Clipboard copy failed: {e}"),
            }
            vec![]
        }
    }
}

fn handle_frame(app: &mut AppState, width: u16, height: u16) {
    let viewport_height = render::transcript_height(app, width, height);
    app.transcript.on_resize(width, height);
    app.transcript.viewport_height = viewport_height;

    let line_count = app
        .transcript
        .build_lines(render::transcript_width(width))
        .len();
    app.transcript.scroll.update_line_count(line_count);
}

// ============================================================================
// Terminal Event Handlers
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        Event::Mouse(mouse) => {
            transcript::handle_mouse(&mut app.transcript, mouse);
            vec![]
        }
        Event::Paste(text) => {
            input::handle_paste(&mut app.input, &text);
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => return quit(app),
        KeyCode::Esc => return finish_reveal(app),
        KeyCode::End if !ctrl && app.input.text().is_empty() => {
            app.transcript.scroll.scroll_to_bottom();
            return vec![];
        }
        _ => {}
    }

    if transcript::handle_scroll_key(&mut app.transcript, key) {
        return vec![];
    }

    match input::handle_key(&mut app.input, key) {
        InputAction::Submit => submit(app),
        InputAction::Handled | InputAction::Ignored => vec![],
    }
}

// ============================================================================
// Submission and Commands
// ============================================================================

fn submit(app: &mut AppState) -> Vec<UiEffect> {
    if app.input.text().trim().is_empty() {
        return vec![];
    }

    if let Some(command) = commands::parse(app.input.text()) {
        app.input.take_submission();
        return handle_command(app, command);
    }

    if app.is_loading() {
        app.notice = Some(Notice::info("Still waiting for the previous reply"));
        return vec![];
    }

    let prompt = app.input.take_submission().trim().to_string();
    app.notice = None;

    // A reveal in progress is completed before the next turn starts.
    let mut effects = finish_reveal(app);

    let context = app.transcript.conversation().context();
    app.transcript.push(Message::user(prompt.clone()));
    app.transcript.scroll.scroll_to_bottom();
    effects.extend(save_effect(app));

    let request = app.reply.begin();
    effects.push(UiEffect::FetchReply {
        request,
        prompt,
        context,
    });
    effects
}

fn handle_command(app: &mut AppState, command: SlashCommand) -> Vec<UiEffect> {
    match command {
        SlashCommand::New => {
            let effects = leave_conversation(app);
            app.transcript
                .replace_conversation(ConversationTranscript::new());
            app.notice = Some(Notice::info("Started a new conversation"));
            effects
        }
        SlashCommand::Open(id) => {
            let mut effects = leave_conversation(app);
            let request = app.load.begin();
            app.notice = Some(Notice::info(format!("Opening {id}…")));
            effects.push(UiEffect::LoadConversation { request, id });
            effects
        }
        SlashCommand::Copy(number) => copy_code_block(app, number),
        SlashCommand::Help => {
            app.notice = Some(Notice::info(commands::help_text()));
            vec![]
        }
        SlashCommand::Quit => quit(app),
        SlashCommand::Invalid(message) => {
            app.notice = Some(Notice::error(message));
            vec![]
        }
    }
}

/// Settles the current conversation before switching away: the reveal is
/// completed and saved, and any in-flight fetch or load is abandoned.
fn leave_conversation(app: &mut AppState) -> Vec<UiEffect> {
    let mut effects = finish_reveal(app);
    if app.reply.has_active() {
        app.reply.cancel();
        effects.push(UiEffect::CancelReply);
    }
    app.load.cancel();
    effects
}

fn quit(app: &mut AppState) -> Vec<UiEffect> {
    let mut effects = leave_conversation(app);
    effects.push(UiEffect::Quit);
    effects
}

fn copy_code_block(app: &mut AppState, number: Option<usize>) -> Vec<UiEffect> {
    let Some(message) = app.transcript.latest_code_message() else {
        app.notice = Some(Notice::error("No code blocks to copy"));
        return vec![];
    };
    let blocks = code_blocks(&app.transcript.conversation().messages()[message].text);
    let block = number.unwrap_or(1).saturating_sub(1);
    let Some(code) = blocks.get(block) else {
        app.notice = Some(Notice::error(format!(
            "No code block {} in the latest reply ({} available)",
            block + 1,
            blocks.len()
        )));
        return vec![];
    };

    vec![UiEffect::CopyToClipboard {
        text: code.code.clone(),
        target: CopyTarget {
            message,
            block: code.block_index,
        },
    }]
}

// ============================================================================
// Replies and Reveal
// ============================================================================

fn handle_reply(
    app: &mut AppState,
    request: RequestId,
    result: Result<String, ProviderError>,
) -> Vec<UiEffect> {
    if !app.reply.finish_if_active(request) {
        tracing::debug!(?request, "Dropping stale reply");
        return vec![];
    }

    match result {
        Ok(text) if app.typewriter_enabled => {
            app.transcript.push(Message::typing(""));
            let (id, delay) = app.typewriter.start(text);
            vec![UiEffect::ScheduleRevealTick { id, delay }]
        }
        Ok(text) => {
            app.transcript.push(Message::assistant(text));
            save_effect(app)
        }
        Err(e) => {
            tracing::warn!(kind = %e.kind, "Reply failed: {e}");
            app.transcript.push(Message::assistant(FALLBACK_REPLY));
            save_effect(app)
        }
    }
}

fn handle_reveal_tick(app: &mut AppState, id: RevealId) -> Vec<UiEffect> {
    match app.typewriter.tick(id) {
        TickOutcome::Stale => {
            tracing::debug!(?id, "Ignoring stale reveal tick");
            vec![]
        }
        TickOutcome::Revealed { text, next_delay } => {
            app.transcript
                .conversation_mut()
                .replace_trailing_text(text);
            vec![UiEffect::ScheduleRevealTick {
                id,
                delay: next_delay,
            }]
        }
        TickOutcome::Done { text } => {
            app.transcript.conversation_mut().finish_trailing(text);
            save_effect(app)
        }
    }
}

/// Completes the active reveal at once. Pending ticks for it go stale.
fn finish_reveal(app: &mut AppState) -> Vec<UiEffect> {
    let Some(full_text) = app.typewriter.skip() else {
        return vec![];
    };
    app.transcript.conversation_mut().finish_trailing(full_text);
    save_effect(app)
}

fn handle_conversation_loaded(
    app: &mut AppState,
    request: RequestId,
    result: Result<LoadedConversation, String>,
) -> Vec<UiEffect> {
    if !app.load.finish_if_active(request) {
        tracing::debug!(?request, "Dropping stale conversation load");
        return vec![];
    }

    match result {
        Ok(loaded) => {
            // A prompt may have been sent while the load was pending. Its
            // reveal is saved under the old id and its fetch is dropped.
            let effects = leave_conversation(app);
            let notice = format!(
                "Opened {} ({} messages)",
                short_id(&loaded.id),
                loaded.messages.len()
            );
            app.transcript
                .replace_conversation(ConversationTranscript::with_messages(
                    loaded.id,
                    loaded.messages,
                ));
            app.notice = Some(Notice::info(notice));
            effects
        }
        Err(message) => {
            app.notice = Some(Notice::error(message));
            vec![]
        }
    }
}

/// Saves the settled part of the conversation. Nothing is saved before the
/// first message.
fn save_effect(app: &AppState) -> Vec<UiEffect> {
    let conversation = app.transcript.conversation();
    let messages: Vec<Message> = conversation
        .conversation_messages()
        .iter()
        .filter(|m| !m.is_typing)
        .cloned()
        .collect();
    if messages.is_empty() {
        return vec![];
    }
    vec![UiEffect::SaveConversation {
        id: conversation.id().to_string(),
        messages,
    }]
}
