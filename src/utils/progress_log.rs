//! Progress-bar-aware logging utilities
//!
//! While a download progress bar is on screen, raw stderr logging would tear
//! the bar apart. The CLI flips progress mode on for the duration of a run and
//! prints the engine's own log events above the bar instead.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::span;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Global flag to indicate whether a progress bar currently owns the terminal
static PROGRESS_MODE: AtomicBool = AtomicBool::new(false);

/// Set progress mode on or off
pub fn set_progress_mode(enabled: bool) {
    PROGRESS_MODE.store(enabled, Ordering::SeqCst);
}

/// Check if progress mode is active
pub fn is_progress_mode() -> bool {
    PROGRESS_MODE.load(Ordering::SeqCst)
}

/// A layer that forwards to `inner` only while progress mode is off
pub struct ConditionalStderrLayer<L> {
    inner: L,
}

impl<L> ConditionalStderrLayer<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

impl<S, L> Layer<S> for ConditionalStderrLayer<L>
where
    S: tracing::Subscriber,
    L: Layer<S>,
{
    // Span bookkeeping always reaches the inner layer so its per-span data
    // exists when printing resumes
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        self.inner.on_new_span(attrs, id, ctx);
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        self.inner.on_record(id, values, ctx);
    }

    fn on_close(&self, id: span::Id, ctx: Context<'_, S>) {
        self.inner.on_close(id, ctx);
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        if !is_progress_mode() {
            self.inner.on_event(event, ctx);
        }
    }

    fn on_enter(&self, id: &span::Id, ctx: Context<'_, S>) {
        if !is_progress_mode() {
            self.inner.on_enter(id, ctx);
        }
    }

    fn on_exit(&self, id: &span::Id, ctx: Context<'_, S>) {
        if !is_progress_mode() {
            self.inner.on_exit(id, ctx);
        }
    }
}
