//! Typewriter reveal of a finished reply.
//!
//! The controller owns no timer. `start` hands back a [`RevealId`] and the
//! first delay; the runtime schedules a tick carrying that id, and each
//! `tick` returns the next delay. Ticks carrying any id other than the
//! current reveal's are stale and change nothing, so a timer left over from
//! a cancelled or replaced reveal can never touch the new one.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use unicode_segmentation::UnicodeSegmentation;

/// Smallest number of graphemes revealed per tick.
pub const MIN_STEP: usize = 1;
/// Largest number of graphemes revealed per tick.
pub const MAX_STEP: usize = 3;

/// Identifies one `start` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevealId(u64);

/// Supplies the number of graphemes to reveal on each tick.
///
/// Values outside `MIN_STEP..=MAX_STEP` are clamped.
pub trait StepSource {
    fn next_step(&mut self) -> usize;
}

impl<F: FnMut() -> usize> StepSource for F {
    fn next_step(&mut self) -> usize {
        self()
    }
}

/// Uniformly random steps in `MIN_STEP..=MAX_STEP`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSteps;

impl StepSource for RandomSteps {
    fn next_step(&mut self) -> usize {
        rand::rng().random_range(MIN_STEP..=MAX_STEP)
    }
}

/// Tick interval for a reply; longer replies reveal faster.
pub fn reveal_delay(text: &str) -> Duration {
    let len = text.chars().count();
    let millis = if len > 500 {
        5
    } else if len > 200 {
        10
    } else if len > 100 {
        20
    } else {
        30
    };
    Duration::from_millis(millis)
}

/// Controller phase. `Done` is not a resting phase: it is reported once as
/// [`TickOutcome::Done`] and the controller is `Idle` again when that
/// outcome is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Revealing,
}

/// Result of one tick.
#[derive(Debug, PartialEq, Eq)]
pub enum TickOutcome<'a> {
    /// The id does not belong to the active reveal.
    Stale,
    /// More text is visible; schedule another tick after `next_delay`.
    Revealed { text: &'a str, next_delay: Duration },
    /// The whole text is visible. Returned exactly once per `start`.
    Done { text: String },
}

#[derive(Debug)]
struct Reveal {
    id: RevealId,
    full_text: String,
    /// Byte offset of the revealed prefix, always on a grapheme boundary.
    offset: usize,
    delay: Duration,
}

impl Reveal {
    fn advance(&mut self, graphemes: usize) {
        let rest = &self.full_text[self.offset..];
        self.offset += rest
            .graphemes(true)
            .take(graphemes)
            .map(str::len)
            .sum::<usize>();
    }

    fn is_complete(&self) -> bool {
        self.offset >= self.full_text.len()
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Revealing(Reveal),
}

/// Reveals one target string at a time.
pub struct TypewriterController {
    next_id: u64,
    state: State,
    steps: Box<dyn StepSource>,
}

impl fmt::Debug for TypewriterController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypewriterController")
            .field("next_id", &self.next_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for TypewriterController {
    fn default() -> Self {
        Self::new()
    }
}

impl TypewriterController {
    /// Creates a controller with random steps.
    pub fn new() -> Self {
        Self::with_steps(RandomSteps)
    }

    /// Creates a controller with the given step source.
    pub fn with_steps(steps: impl StepSource + 'static) -> Self {
        Self {
            next_id: 0,
            state: State::Idle,
            steps: Box::new(steps),
        }
    }

    /// Starts revealing `full_text`, replacing any reveal in progress.
    ///
    /// Returns the id to attach to ticks and the delay before the first one.
    pub fn start(&mut self, full_text: impl Into<String>) -> (RevealId, Duration) {
        let full_text = full_text.into();
        let id = RevealId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let delay = reveal_delay(&full_text);
        self.state = State::Revealing(Reveal {
            id,
            full_text,
            offset: 0,
            delay,
        });
        (id, delay)
    }

    /// Advances the reveal identified by `id`.
    pub fn tick(&mut self, id: RevealId) -> TickOutcome<'_> {
        if self.active_id() != Some(id) {
            return TickOutcome::Stale;
        }

        let step = self.steps.next_step().clamp(MIN_STEP, MAX_STEP);
        let complete = match &mut self.state {
            State::Revealing(reveal) => {
                reveal.advance(step);
                reveal.is_complete()
            }
            State::Idle => return TickOutcome::Stale,
        };

        if complete {
            return match std::mem::replace(&mut self.state, State::Idle) {
                State::Revealing(reveal) => TickOutcome::Done {
                    text: reveal.full_text,
                },
                State::Idle => TickOutcome::Stale,
            };
        }

        match &self.state {
            State::Revealing(reveal) => TickOutcome::Revealed {
                text: &reveal.full_text[..reveal.offset],
                next_delay: reveal.delay,
            },
            State::Idle => TickOutcome::Stale,
        }
    }

    /// Abandons the active reveal without completing it.
    pub fn cancel(&mut self) {
        self.state = State::Idle;
    }

    /// Completes the active reveal at once and returns its full text.
    ///
    /// Pending ticks for it become stale; no `Done` outcome follows.
    pub fn skip(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Revealing(reveal) => Some(reveal.full_text),
            State::Idle => None,
        }
    }

    /// Currently visible prefix. Empty when idle.
    pub fn revealed(&self) -> &str {
        match &self.state {
            State::Idle => "",
            State::Revealing(reveal) => &reveal.full_text[..reveal.offset],
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Revealing(_) => Phase::Revealing,
        }
    }

    pub fn is_revealing(&self) -> bool {
        matches!(self.state, State::Revealing(_))
    }

    /// Id of the reveal in progress, if any.
    pub fn active_id(&self) -> Option<RevealId> {
        match &self.state {
            State::Revealing(reveal) => Some(reveal.id),
            State::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(step: usize) -> TypewriterController {
        TypewriterController::with_steps(move || step)
    }

    fn cycling() -> TypewriterController {
        let mut n = 0;
        TypewriterController::with_steps(move || {
            n += 1;
            n % 3 + 1
        })
    }

    /// Ticks `id` until it stops revealing; returns the revealed lengths and
    /// how many times `Done` fired.
    fn run_to_end(tw: &mut TypewriterController, id: RevealId) -> (Vec<usize>, usize, String) {
        let mut lengths = Vec::new();
        let mut done_count = 0;
        let mut final_text = String::new();
        for _ in 0..1000 {
            match tw.tick(id) {
                TickOutcome::Revealed { text, .. } => lengths.push(text.len()),
                TickOutcome::Done { text } => {
                    done_count += 1;
                    lengths.push(text.len());
                    final_text = text;
                }
                TickOutcome::Stale => break,
            }
        }
        (lengths, done_count, final_text)
    }

    #[test]
    fn test_reveal_runs_to_completion() {
        let mut tw = cycling();
        let (id, delay) = tw.start("abcdefg");
        assert_eq!(delay, Duration::from_millis(30));
        assert_eq!(tw.phase(), Phase::Revealing);

        let (lengths, done_count, final_text) = run_to_end(&mut tw, id);
        assert_eq!(final_text, "abcdefg");
        assert_eq!(done_count, 1);
        assert!(lengths.windows(2).all(|w| w[0] < w[1]), "{lengths:?}");
        assert_eq!(tw.phase(), Phase::Idle);
        assert_eq!(tw.revealed(), "");

        // Done does not fire again.
        assert_eq!(tw.tick(id), TickOutcome::Stale);
    }

    #[test]
    fn test_restart_ignores_previous_ticks() {
        let mut tw = fixed(1);
        let (first, _) = tw.start("first reply");
        assert!(matches!(tw.tick(first), TickOutcome::Revealed { text: "f", .. }));

        // A timer for `first` is still pending when the second reveal starts.
        let (second, _) = tw.start("second");
        assert_ne!(first, second);
        assert_eq!(tw.tick(first), TickOutcome::Stale);
        assert_eq!(tw.revealed(), "");

        let (_, done_count, final_text) = run_to_end(&mut tw, second);
        assert_eq!(final_text, "second");
        assert_eq!(done_count, 1);
    }

    #[test]
    fn test_cancel_then_start() {
        let mut tw = fixed(2);
        let (old, _) = tw.start("abandoned");
        tw.tick(old);
        tw.cancel();
        assert_eq!(tw.phase(), Phase::Idle);
        assert_eq!(tw.tick(old), TickOutcome::Stale);

        let (new, _) = tw.start("fresh");
        assert_eq!(tw.tick(old), TickOutcome::Stale);
        assert_eq!(
            tw.tick(new),
            TickOutcome::Revealed {
                text: "fr",
                next_delay: Duration::from_millis(30)
            }
        );
    }

    #[test]
    fn test_skip_finishes_immediately() {
        let mut tw = fixed(1);
        let (id, _) = tw.start("skip me");
        tw.tick(id);
        assert_eq!(tw.skip().as_deref(), Some("skip me"));
        assert_eq!(tw.phase(), Phase::Idle);
        assert_eq!(tw.tick(id), TickOutcome::Stale);
        assert_eq!(tw.skip(), None);
    }

    #[test]
    fn test_done_returns_to_idle_and_allows_restart() {
        let mut tw = fixed(3);
        let (first, _) = tw.start("abc");
        assert_eq!(
            tw.tick(first),
            TickOutcome::Done {
                text: "abc".to_string()
            }
        );
        assert_eq!(tw.phase(), Phase::Idle);
        assert_eq!(tw.active_id(), None);
        assert_eq!(tw.skip(), None);

        let (second, _) = tw.start("de");
        assert_eq!(tw.phase(), Phase::Revealing);
        assert_eq!(tw.tick(first), TickOutcome::Stale);
        assert!(matches!(tw.tick(second), TickOutcome::Done { .. }));
    }

    #[test]
    fn test_empty_text_is_done_on_first_tick() {
        let mut tw = fixed(3);
        let (id, _) = tw.start("");
        assert_eq!(
            tw.tick(id),
            TickOutcome::Done {
                text: String::new()
            }
        );
    }

    #[test]
    fn test_steps_are_clamped_and_grapheme_aligned() {
        let mut tw = fixed(0);
        let (id, _) = tw.start("e\u{301}x");
        assert!(matches!(tw.tick(id), TickOutcome::Revealed { text: "e\u{301}", .. }));

        let mut tw = fixed(99);
        let (id, _) = tw.start("👩‍👩‍👧abcd");
        assert!(matches!(
            tw.tick(id),
            TickOutcome::Revealed { text: "👩‍👩‍👧ab", .. }
        ));
    }

    #[test]
    fn test_random_steps_in_range() {
        let mut steps = RandomSteps;
        for _ in 0..100 {
            assert!((MIN_STEP..=MAX_STEP).contains(&steps.next_step()));
        }
    }

    #[test]
    fn test_delay_by_length() {
        assert_eq!(reveal_delay(&"a".repeat(100)), Duration::from_millis(30));
        assert_eq!(reveal_delay(&"a".repeat(101)), Duration::from_millis(20));
        assert_eq!(reveal_delay(&"a".repeat(201)), Duration::from_millis(10));
        assert_eq!(reveal_delay(&"a".repeat(501)), Duration::from_millis(5));
        assert_eq!(reveal_delay(&"é".repeat(150)), Duration::from_millis(20));
    }
}
