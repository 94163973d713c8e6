//! Thread-safe queue of pending UI updates.
//!
//! Producers (audio thread, host callbacks) push parameter and MIDI events;
//! the UI thread drains everything in one swap and renders it as script.
//! [`UpdateQueue`] is shared by `Protocol` and `WebView`; each renders the
//! drained [`PendingUpdates`] in its own JavaScript dialect.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::throttle::ParamThrottle;

/// A parameter id and its plain value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamUpdate {
    /// Host parameter id.
    pub id: u32,
    /// Plain (not normalized) value.
    pub value: f32,
}

/// A note on or note off event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// MIDI channel (CLAP allows `-1` as wildcard).
    pub channel: i16,
    /// Note key (CLAP allows `-1` as wildcard).
    pub key: i16,
    /// Velocity in `0.0..=1.0`; always `0.0` for note off.
    pub velocity: f32,
    /// `true` for note on.
    pub is_note_on: bool,
}

/// A MIDI control change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiCcEvent {
    /// MIDI channel.
    pub channel: i16,
    /// Controller number.
    pub cc: u8,
    /// Controller value.
    pub value: u8,
}

/// Snapshot of everything queued since the last drain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingUpdates {
    /// Throttled single parameter updates, in arrival order.
    pub params: Vec<ParamUpdate>,
    /// Bulk parameter updates (preset loads), in arrival order.
    pub bulk_params: Vec<ParamUpdate>,
    /// Note events, in arrival order.
    pub notes: Vec<NoteEvent>,
    /// Control changes, in arrival order.
    pub ccs: Vec<MidiCcEvent>,
}

impl PendingUpdates {
    /// True when nothing was queued.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
            && self.bulk_params.is_empty()
            && self.notes.is_empty()
            && self.ccs.is_empty()
    }
}

struct QueueInner {
    pending: Mutex<PendingUpdates>,
    throttle: ParamThrottle,
}

/// Mutex-guarded update queue with per-parameter throttling.
///
/// Cloning is cheap and every clone refers to the same queue, so a clone can
/// be moved into the audio thread while the UI thread keeps draining.
#[derive(Clone)]
pub struct UpdateQueue {
    inner: Arc<QueueInner>,
}

impl UpdateQueue {
    /// Create an empty queue throttled at ~60 Hz.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                pending: Mutex::new(PendingUpdates::default()),
                throttle: ParamThrottle::new(),
            }),
        }
    }

    /// Queue a single parameter change.
    ///
    /// Returns `false` when the update was dropped by the throttle.
    pub fn queue_param(&self, id: u32, value: f32) -> bool {
        if !self.inner.throttle.accept(id) {
            return false;
        }
        self.inner.pending.lock().params.push(ParamUpdate { id, value });
        true
    }

    /// Queue a batch of parameter values. Never throttled.
    pub fn queue_bulk(&self, params: &[(u32, f32)]) {
        if params.is_empty() {
            return;
        }
        self.inner
            .pending
            .lock()
            .bulk_params
            .extend(params.iter().map(|&(id, value)| ParamUpdate { id, value }));
    }

    /// Queue a note on.
    pub fn queue_note_on(&self, channel: i16, key: i16, velocity: f32) {
        self.inner.pending.lock().notes.push(NoteEvent {
            channel,
            key,
            velocity,
            is_note_on: true,
        });
    }

    /// Queue a note off.
    pub fn queue_note_off(&self, channel: i16, key: i16) {
        self.inner.pending.lock().notes.push(NoteEvent {
            channel,
            key,
            velocity: 0.0,
            is_note_on: false,
        });
    }

    /// Queue a MIDI control change.
    pub fn queue_midi_cc(&self, channel: i16, cc: u8, value: u8) {
        self.inner
            .pending
            .lock()
            .ccs
            .push(MidiCcEvent { channel, cc, value });
    }

    /// Take everything queued so far, leaving the queue empty.
    pub fn drain(&self) -> PendingUpdates {
        std::mem::take(&mut *self.inner.pending.lock())
    }

    /// Whether anything is waiting to be drained.
    pub fn has_pending(&self) -> bool {
        !self.inner.pending.lock().is_empty()
    }

    /// Set the single-update rate limit. See [`ParamThrottle::set_rate_hz`].
    pub fn set_update_rate_hz(&self, hz: u32) -> bool {
        self.inner.throttle.set_rate_hz(hz)
    }

    /// The throttle guarding single parameter updates.
    pub fn throttle(&self) -> &ParamThrottle {
        &self.inner.throttle
    }
}

impl Default for UpdateQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("throttle", &self.inner.throttle)
            .finish_non_exhaustive()
    }
}
