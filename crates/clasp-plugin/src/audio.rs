//! Audio processor of the demo plugin.
//!
//! Applies gain and pan, forwards host parameter, note and CC events to the
//! page through the protocol queue, and reports page-originated parameter
//! changes back to the host.

use clack_extensions::params::PluginAudioProcessorParams;
use clack_plugin::events::spaces::CoreEventSpace;
use clack_plugin::events::{EventFlags, Match};
use clack_plugin::events::event_types::ParamValueEvent;
use clack_plugin::prelude::*;
use clack_plugin::utils::Cookie;

use crate::main_thread::DemoMainThread;
use crate::params::{PARAM_GAIN, PARAM_PAN, db_to_amplitude, pan_gains};
use crate::shared::DemoShared;

/// MIDI status nibble of a control change.
const MIDI_CONTROL_CHANGE: u8 = 0xB0;

/// Report page-originated parameter changes to the host as live events.
///
/// Called from `process` and from both `flush` paths, so page edits reach
/// the host whether or not the plugin is active.
pub(crate) fn push_gui_changes(shared: &DemoShared, output: &mut OutputEvents) {
    for (id, value) in shared.params().drain_gui_changes() {
        let ev = ParamValueEvent::new(
            0,
            ClapId::new(id),
            Pckn::match_all(),
            f64::from(value),
            Cookie::empty(),
        )
        .with_flags(EventFlags::IS_LIVE);
        let _ = output.try_push(ev);
    }
}

/// Audio-thread processor.
pub struct DemoAudioProcessor<'a> {
    shared: &'a DemoShared,
    left: f32,
    right: f32,
}

impl<'a> PluginAudioProcessor<'a, DemoShared, DemoMainThread<'a>> for DemoAudioProcessor<'a> {
    fn activate(
        _host: HostAudioProcessorHandle<'a>,
        _main_thread: &mut DemoMainThread<'a>,
        shared: &'a DemoShared,
        audio_config: PluginAudioConfiguration,
    ) -> Result<Self, PluginError> {
        tracing::info!(sample_rate = audio_config.sample_rate, "demo activated");
        let mut processor = Self {
            shared,
            left: 1.0,
            right: 1.0,
        };
        processor.update_gains();
        Ok(processor)
    }

    fn process(
        &mut self,
        _process: Process,
        mut audio: Audio,
        events: Events,
    ) -> Result<ProcessStatus, PluginError> {
        self.handle_events(events.input);
        push_gui_changes(self.shared, events.output);
        self.update_gains();
        self.process_audio(&mut audio)?;
        Ok(ProcessStatus::ContinueIfNotQuiet)
    }
}

impl DemoAudioProcessor<'_> {
    /// Apply host parameter changes and forward note traffic to the page.
    fn handle_events(&mut self, input: &InputEvents) {
        for event in input {
            let Some(event) = event.as_core_event() else {
                continue;
            };
            match event {
                CoreEventSpace::ParamValue(ev) => {
                    let Some(id) = ev.param_id().map(|id| id.get()) else {
                        continue;
                    };
                    if let Some(value) = self.shared.params().set(id, ev.value() as f32) {
                        self.shared.notify_param(id, value);
                    }
                }
                CoreEventSpace::NoteOn(ev) => {
                    if let (Match::Specific(channel), Match::Specific(key)) =
                        (ev.channel(), ev.key())
                    {
                        self.shared.protocol().queue_note_on(
                            channel as i16,
                            key as i16,
                            ev.velocity() as f32,
                        );
                        self.shared.request_callback();
                    }
                }
                CoreEventSpace::NoteOff(ev) => {
                    if let (Match::Specific(channel), Match::Specific(key)) =
                        (ev.channel(), ev.key())
                    {
                        self.shared
                            .protocol()
                            .queue_note_off(channel as i16, key as i16);
                        self.shared.request_callback();
                    }
                }
                CoreEventSpace::Midi(ev) => {
                    let [status, cc, value] = ev.data();
                    if status & 0xF0 == MIDI_CONTROL_CHANGE {
                        self.shared.protocol().queue_midi_cc(
                            i16::from(status & 0x0F),
                            cc & 0x7F,
                            value & 0x7F,
                        );
                        self.shared.request_callback();
                    }
                }
                _ => {}
            }
        }
    }

    fn update_gains(&mut self) {
        let params = self.shared.params();
        let gain = db_to_amplitude(params.get(PARAM_GAIN).unwrap_or(0.0));
        let (left, right) = pan_gains(params.get(PARAM_PAN).unwrap_or(0.0));
        self.left = gain * left;
        self.right = gain * right;
    }

    fn process_audio(&mut self, audio: &mut Audio) -> Result<(), PluginError> {
        for mut port_pair in audio {
            let channels = port_pair.channels()?;
            let Some(mut channels) = channels.into_f32() else {
                continue;
            };

            let count = channels.channel_pair_count();
            for index in 0..count {
                let factor = match (count, index) {
                    (1, _) => self.left.max(self.right),
                    (_, 0) => self.left,
                    (_, 1) => self.right,
                    _ => 1.0,
                };
                if let Some(pair) = channels.channel_pair(index) {
                    apply_gain(pair, factor);
                }
            }
        }
        Ok(())
    }
}

fn apply_gain(pair: ChannelPair<f32>, factor: f32) {
    match pair {
        ChannelPair::InputOutput(input, output) => {
            for (out, sample) in output.iter_mut().zip(input) {
                *out = sample * factor;
            }
        }
        ChannelPair::InPlace(buf) => {
            for sample in buf {
                *sample *= factor;
            }
        }
        ChannelPair::OutputOnly(buf) => buf.fill(0.0),
        ChannelPair::InputOnly(_) => {}
    }
}

impl PluginAudioProcessorParams for DemoAudioProcessor<'_> {
    fn flush(&mut self, input: &InputEvents, output: &mut OutputEvents) {
        self.handle_events(input);
        push_gui_changes(self.shared, output);
        self.update_gains();
    }
}
