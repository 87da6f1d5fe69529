// Live audio engine - cpal output stream
//
// # Format Support
//
// The device's preferred sample format is detected and the stream is built
// for it:
// - **F32**: native, no conversion
// - **I16**: common on Windows/WASAPI
// - **U16**: rare
//
// Everything is rendered in f32 and converted when written to the device
// buffer (`write_stereo_to_interleaved_frame`, no allocation).
//
// # Threading
//
// The control thread builds voices and pushes them through a lock-free command
// queue. The callback owns the mixer, so nothing is shared but the queue, the
// sample clock and the notification producer used by the error callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex};

use crate::audio::AudioError;
use crate::audio::backend::ToneBackend;
use crate::audio::dsp_utils::{OnePoleSmoother, soft_clip};
use crate::audio::format_conversion::write_stereo_to_interleaved_frame;
use crate::audio::timing::AudioTiming;
use crate::messaging::channels::{
    CommandConsumer, CommandProducer, NotificationProducer, create_command_channel,
};
use crate::messaging::command::Command;
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::synth::mixer::{MasterBus, MasterFilter, VoiceMixer};
use crate::synth::voice::Voice;

/// Tone backend playing through the default output device
pub struct LiveBackend {
    _device: Device,
    _stream: Stream,
    commands: CommandProducer,
    timing: AudioTiming,
    sample_rate: f32,
}

impl LiveBackend {
    pub fn new(
        command_capacity: usize,
        master_gain: f32,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| AudioError::Config(e.to_string()))?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let (commands, command_rx) = create_command_channel(command_capacity);
        let timing = AudioTiming::new(sample_rate);
        let render = RenderState::new(sample_rate, master_gain, command_rx, timing.clone());

        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config, channels, render, notification_tx.clone())
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config, channels, render, notification_tx.clone())
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config, channels, render, notification_tx.clone())
            }
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream.play().map_err(|e| AudioError::Stream(e.to_string()))?;
        log::info!("Audio engine started: {} Hz, {} channels", sample_rate, channels);

        if let Ok(mut tx) = notification_tx.try_lock() {
            let notice = Notification::info(
                NotificationCategory::Audio,
                format!("Audio connected: {} Hz", sample_rate),
            );
            if ringbuf::traits::Producer::try_push(&mut *tx, notice).is_err() {
                log::debug!("Notification queue full, connect notice dropped");
            }
        }

        Ok(Self {
            _device: device,
            _stream: stream,
            commands,
            timing,
            sample_rate,
        })
    }

    pub fn timing(&self) -> &AudioTiming {
        &self.timing
    }

    fn send(&mut self, command: Command) {
        if let Err(command) = ringbuf::traits::Producer::try_push(&mut self.commands, command) {
            log::warn!("Command queue full, {:?} dropped", command);
        }
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut render: RenderState,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // ========== SACRED ZONE ==========
                    // No I/O, no blocking locks
                    render.drain_commands();
                    let frames = data.len() / channels.max(1);
                    for frame in data.chunks_mut(channels.max(1)) {
                        write_stereo_to_interleaved_frame(render.next_frame(), frame);
                    }
                    render.timing.advance(frames);
                    // ========== SACRED ZONE END ==========
                },
                move |err| {
                    // Runs outside the audio callback, I/O is fine here
                    log::error!("Audio stream error: {}", err);
                    if let Ok(mut tx) = notification_tx.try_lock() {
                        let notice = Notification::error(
                            NotificationCategory::Audio,
                            format!("Audio stream error: {}", err),
                        );
                        if ringbuf::traits::Producer::try_push(&mut *tx, notice).is_err() {
                            log::debug!("Notification queue full, stream error notice dropped");
                        }
                    }
                },
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))
    }
}

impl ToneBackend for LiveBackend {
    fn current_time(&self) -> f64 {
        self.timing.current_time()
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn create_voice(&mut self, voice: Voice) {
        self.send(Command::Schedule(Box::new(voice)));
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.send(Command::SetMasterGain(gain));
    }

    fn set_master_filter(&mut self, filter: MasterFilter) {
        self.send(Command::SetMasterFilter(filter));
    }
}

/// Everything the audio callback owns
struct RenderState {
    mixer: VoiceMixer,
    master: MasterBus,
    gain_smoother: OnePoleSmoother,
    gain_target: f32,
    commands: CommandConsumer,
    timing: AudioTiming,
}

impl RenderState {
    fn new(sample_rate: f32, master_gain: f32, commands: CommandConsumer, timing: AudioTiming) -> Self {
        Self {
            mixer: VoiceMixer::new(sample_rate),
            // Gain is applied by the smoother
            master: MasterBus::new(sample_rate, 1.0),
            gain_smoother: OnePoleSmoother::new(master_gain, 10.0, sample_rate),
            gain_target: master_gain,
            commands,
            timing,
        }
    }

    fn drain_commands(&mut self) {
        while let Some(command) = ringbuf::traits::Consumer::try_pop(&mut self.commands) {
            match command {
                Command::Schedule(voice) => self.mixer.add(*voice),
                Command::SetMasterGain(gain) => self.gain_target = gain,
                Command::SetMasterFilter(filter) => self.master.set_filter(filter),
            }
        }
    }

    #[inline]
    fn next_frame(&mut self) -> (f32, f32) {
        let gain = self.gain_smoother.process(self.gain_target);
        let (left, right) = self.master.process(self.mixer.next_frame());
        (soft_clip(left * gain), soft_clip(right * gain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::automation::ParamCurve;
    use crate::synth::oscillator::WaveformType;
    use crate::synth::voice::{Layer, Source};

    // The callback body without a device
    #[test]
    fn test_render_state_plays_scheduled_voices() {
        let sample_rate = 44100.0;
        let (mut tx, rx) = create_command_channel(8);
        let timing = AudioTiming::new(sample_rate);
        let mut render = RenderState::new(sample_rate, 0.8, rx, timing.clone());

        let voice = Voice::new(sample_rate, 0.0)
            .with_layer(
                Layer::new(0.0, 0.05, sample_rate)
                    .source(Source::tone(WaveformType::Sine, 220.0, 0.0, sample_rate))
                    .gain(ParamCurve::constant(0.5)),
            )
            .at(0.01);
        assert!(ringbuf::traits::Producer::try_push(&mut tx, Command::Schedule(Box::new(voice))).is_ok());
        render.drain_commands();

        let mut peak = 0.0f32;
        for _ in 0..4410 {
            let (l, r) = render.next_frame();
            assert!(l.abs() <= 1.0 && r.abs() <= 1.0);
            peak = peak.max(l.abs());
        }
        assert!(peak > 0.1);
        assert!(render.mixer.is_idle());
    }

    #[test]
    fn test_master_gain_command() {
        let (mut tx, rx) = create_command_channel(8);
        let mut render = RenderState::new(44100.0, 0.8, rx, AudioTiming::new(44100.0));
        assert!(ringbuf::traits::Producer::try_push(&mut tx, Command::SetMasterGain(0.2)).is_ok());
        render.drain_commands();
        assert_eq!(render.gain_target, 0.2);
    }

    #[test]
    fn test_master_filter_command() {
        let (mut tx, rx) = create_command_channel(8);
        let mut render = RenderState::new(44100.0, 0.8, rx, AudioTiming::new(44100.0));
        let filter = MasterFilter::new(3000.0, 4.0);
        assert!(
            ringbuf::traits::Producer::try_push(&mut tx, Command::SetMasterFilter(filter)).is_ok()
        );
        render.drain_commands();
        assert_eq!(render.master.filter(), filter);
    }
}
