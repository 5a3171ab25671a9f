//! Control loop - Scheduler -> Sampler -> Emitter, one way.
//!
//! The loop is single-threaded and cooperative. Each [`SamplerLoop::poll`]
//! makes one trigger decision; when it fires, the selected channel runs a
//! full cycle and its record is written before `poll` returns. Because the
//! capture blocks, the effective period is `max(interval, window)`.
//!
//! Nothing here stops the loop on its own: a failed write is logged and
//! counted, and the next cycle runs as usual.

use std::io::Write;

use crate::config::{SamplerConfig, Variant};
use crate::emitter::LineEmitter;
use crate::error::{log_config_error, log_record_error, ConfigError, ErrorCode};
use crate::record::PeakRecord;
use crate::sampler::Sampler;
use crate::scheduler::{ChannelLayout, Scheduler, SchedulerState};
use crate::sensor::{Channel, ChannelId};
use crate::telemetry::{CycleTelemetry, TelemetrySnapshot};
use crate::timing::{Clock, Pacer};

/// The rig's main loop with all of its collaborators
pub struct SamplerLoop<C: Clock, P: Pacer, W: Write> {
    config: SamplerConfig,
    scheduler: Scheduler,
    state: SchedulerState,
    sampler: Sampler,
    channels: Vec<Channel>,
    clock: C,
    pacer: P,
    emitter: LineEmitter<W>,
    telemetry: CycleTelemetry,
    emit_header: bool,
    started: bool,
}

impl<C: Clock, P: Pacer, W: Write> SamplerLoop<C, P, W> {
    /// Assemble the loop, checking the channels match the variant.
    ///
    /// The scheduler's reference time is the clock reading at construction,
    /// so the first cycle fires one interval after startup.
    pub fn new(
        config: SamplerConfig,
        channels: Vec<Channel>,
        clock: C,
        pacer: P,
        sink: W,
    ) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate().and_then(|()| check_channels(config.variant, &channels)) {
            log_config_error(&err, "SamplerLoop::new");
            return Err(err);
        }

        let mut channels = channels;
        channels.sort_by_key(Channel::id);

        let layout = match config.variant {
            Variant::DualChannel => ChannelLayout::Dual,
            Variant::SingleChannel | Variant::LoudnessOnly => ChannelLayout::Single,
        };
        let scheduler = Scheduler::new(config.interval_ms, layout);
        let state = SchedulerState::new(clock.now_ms());
        let sampler = Sampler::new(&config);

        tracing::info!(
            "[SamplerLoop] {:?}: interval={}ms window={}ms pacing={}ms channels={}",
            config.variant,
            config.interval_ms,
            config.window_ms,
            config.pacing_ms,
            channels.len()
        );

        Ok(Self {
            config,
            scheduler,
            state,
            sampler,
            channels,
            clock,
            pacer,
            emitter: LineEmitter::new(sink),
            telemetry: CycleTelemetry::default(),
            emit_header: false,
            started: false,
        })
    }

    /// Print the `Reverberation(s)` header once at startup.
    ///
    /// Only meaningful for the loudness-only variant; ignored otherwise.
    pub fn with_header(mut self, enabled: bool) -> Self {
        self.emit_header = enabled && self.config.variant == Variant::LoudnessOnly;
        self
    }

    /// One-time startup work. Called implicitly by the first `poll`.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        if self.emit_header {
            if let Err(err) = self.emitter.write_header() {
                log_record_error(&err, "SamplerLoop::start");
            }
        }
    }

    /// One iteration of the control loop.
    ///
    /// Returns the record if a cycle ran.
    pub fn poll(&mut self) -> Option<PeakRecord> {
        self.start();

        let now_ms = self.clock.now_ms();
        let elapsed_ms = self.scheduler.elapsed_ms(&self.state, now_ms);
        let channel_id = self.scheduler.tick(&mut self.state, now_ms)?;
        let lateness_ms = elapsed_ms.saturating_sub(self.scheduler.interval_ms());

        let channel = self
            .channels
            .iter_mut()
            .find(|channel| channel.id() == channel_id)?;

        let report = self.sampler.run_cycle(channel, &self.clock, &self.pacer);

        if report.capped {
            self.telemetry.record_capped(channel_id, report.samples);
        }
        self.telemetry.record_cycle(
            channel_id,
            report.samples,
            report.record.peak_time_s,
            lateness_ms,
        );

        if let Err(err) = self.emitter.emit(&report.record) {
            log_record_error(&err, "SamplerLoop::poll");
            self.telemetry.record_emit_failure(channel_id, err.code());
        }

        Some(report.record)
    }

    /// Poll until `max_cycles` records were produced, or forever with `None`.
    ///
    /// Between polls that did not trigger, the loop pauses for the idle poll
    /// delay instead of spinning.
    pub fn run(&mut self, max_cycles: Option<u64>) -> TelemetrySnapshot {
        let mut completed = 0u64;
        while max_cycles.map_or(true, |max| completed < max) {
            if self.poll().is_some() {
                completed += 1;
            } else {
                self.pacer.pause(self.config.idle_poll_ms);
            }
        }
        self.telemetry.snapshot()
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn scheduler_state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &W {
        self.emitter.get_ref()
    }

    pub fn into_sink(self) -> W {
        self.emitter.into_inner()
    }
}

fn check_channels(variant: Variant, channels: &[Channel]) -> Result<(), ConfigError> {
    let expected = variant.channel_count();
    if channels.len() != expected {
        return Err(ConfigError::ChannelCountMismatch {
            expected,
            got: channels.len(),
        });
    }

    let mut seen: Vec<ChannelId> = Vec::with_capacity(channels.len());
    for channel in channels {
        let id = channel.id();
        if usize::from(id.get()) > expected {
            return Err(ConfigError::ChannelIdInvalid { id });
        }
        if seen.contains(&id) {
            return Err(ConfigError::DuplicateChannel { id });
        }
        seen.push(id);

        match (variant.reads_distance(), channel.has_distance()) {
            (true, false) => return Err(ConfigError::MissingDistanceSensor { id }),
            (false, true) => return Err(ConfigError::UnexpectedDistanceSensor { id }),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordErrorCodes;
    use crate::sensor::scripted::{ScriptedDistance, ScriptedLoudness};
    use crate::telemetry::CycleEvent;
    use crate::timing::ManualClock;

    struct UnpluggedPort;

    impl Write for UnpluggedPort {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "serial port unplugged",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Pacer that returns immediately without moving time
    struct FrozenPacer;

    impl Pacer for FrozenPacer {
        fn pause(&self, _ms: u64) {}
    }

    fn dual_channels() -> Vec<Channel> {
        vec![
            Channel::new(ChannelId::A, ScriptedDistance::constant(100), ScriptedLoudness::constant(0)),
            Channel::new(ChannelId::B, ScriptedDistance::constant(200), ScriptedLoudness::constant(0)),
        ]
    }

    #[test]
    fn test_rejects_wrong_channel_count() {
        let clock = ManualClock::new();
        let result = SamplerLoop::new(
            SamplerConfig::for_variant(Variant::SingleChannel),
            dual_channels(),
            &clock,
            &clock,
            Vec::new(),
        );
        assert!(matches!(
            result,
            Err(ConfigError::ChannelCountMismatch {
                expected: 1,
                got: 2
            })
        ));
    }

    #[test]
    fn test_rejects_duplicate_and_out_of_range_ids() {
        let clock = ManualClock::new();
        let duplicate = vec![
            Channel::new(ChannelId::A, || 1, ScriptedLoudness::constant(0)),
            Channel::new(ChannelId::A, || 2, ScriptedLoudness::constant(0)),
        ];
        let result = SamplerLoop::new(SamplerConfig::default(), duplicate, &clock, &clock, Vec::new());
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateChannel { id }) if id == ChannelId::A
        ));

        let out_of_range = vec![Channel::new(ChannelId::B, || 1, ScriptedLoudness::constant(0))];
        let result = SamplerLoop::new(
            SamplerConfig::for_variant(Variant::SingleChannel),
            out_of_range,
            &clock,
            &clock,
            Vec::new(),
        );
        assert!(matches!(result, Err(ConfigError::ChannelIdInvalid { .. })));
    }

    #[test]
    fn test_rejects_distance_sensor_mismatch() {
        let clock = ManualClock::new();
        let result = SamplerLoop::new(
            SamplerConfig::for_variant(Variant::SingleChannel),
            vec![Channel::loudness_only(ChannelId::A, ScriptedLoudness::constant(0))],
            &clock,
            &clock,
            Vec::new(),
        );
        assert!(matches!(result, Err(ConfigError::MissingDistanceSensor { .. })));

        let result = SamplerLoop::new(
            SamplerConfig::for_variant(Variant::LoudnessOnly),
            vec![Channel::new(ChannelId::A, || 1, ScriptedLoudness::constant(0))],
            &clock,
            &clock,
            Vec::new(),
        );
        assert!(matches!(result, Err(ConfigError::UnexpectedDistanceSensor { .. })));
    }

    #[test]
    fn test_rejects_invalid_timing() {
        let clock = ManualClock::new();
        let mut config = SamplerConfig::default();
        config.pacing_ms = 0;
        let result = SamplerLoop::new(config, dual_channels(), &clock, &clock, Vec::new());
        assert!(matches!(result, Err(ConfigError::PacingInvalid { .. })));
    }

    #[test]
    fn test_poll_before_interval_does_nothing() {
        let clock = ManualClock::new();
        let mut sampler_loop =
            SamplerLoop::new(SamplerConfig::default(), dual_channels(), &clock, &clock, Vec::new())
                .unwrap();

        assert_eq!(sampler_loop.poll(), None);
        clock.set(3499);
        assert_eq!(sampler_loop.poll(), None);
        assert_eq!(sampler_loop.scheduler_state().last_trigger_ms(), 0);
        assert!(sampler_loop.sink().is_empty());
    }

    #[test]
    fn test_run_alternates_channels_and_writes_lines() {
        let clock = ManualClock::new();
        let mut sampler_loop =
            SamplerLoop::new(SamplerConfig::default(), dual_channels(), &clock, &clock, Vec::new())
                .unwrap();

        let snapshot = sampler_loop.run(Some(4));

        assert_eq!(snapshot.cycles, 4);
        assert_eq!(snapshot.cycles_per_channel, [2, 2]);
        let text = String::from_utf8(sampler_loop.into_sink()).unwrap();
        assert_eq!(
            text,
            "1,100,0.000\n2,200,0.000\n1,100,0.000\n2,200,0.000\n"
        );
    }

    #[test]
    fn test_header_written_once_for_loudness_only() {
        let clock = ManualClock::new();
        let mut sampler_loop = SamplerLoop::new(
            SamplerConfig::for_variant(Variant::LoudnessOnly),
            vec![Channel::loudness_only(ChannelId::A, ScriptedLoudness::constant(0))],
            &clock,
            &clock,
            Vec::new(),
        )
        .unwrap()
        .with_header(true);

        sampler_loop.run(Some(2));

        let text = String::from_utf8(sampler_loop.into_sink()).unwrap();
        assert_eq!(text, "Reverberation(s)\n0.000\n0.000\n");
    }

    #[test]
    fn test_header_ignored_for_other_variants() {
        let clock = ManualClock::new();
        let mut sampler_loop =
            SamplerLoop::new(SamplerConfig::default(), dual_channels(), &clock, &clock, Vec::new())
                .unwrap()
                .with_header(true);

        sampler_loop.run(Some(1));

        assert_eq!(sampler_loop.sink().as_slice(), b"1,100,0.000\n");
    }

    #[test]
    fn test_emit_failures_are_counted_and_loop_continues() {
        let clock = ManualClock::new();
        let mut sampler_loop = SamplerLoop::new(
            SamplerConfig::default(),
            dual_channels(),
            &clock,
            &clock,
            UnpluggedPort,
        )
        .unwrap();

        let snapshot = sampler_loop.run(Some(3));

        assert_eq!(snapshot.cycles, 3);
        assert_eq!(snapshot.emit_failures, 3);
        assert_eq!(snapshot.cycles_per_channel, [2, 1]);
        assert!(matches!(
            snapshot.recent.last(),
            Some(CycleEvent::EmitFailed { code, .. }) if *code == RecordErrorCodes::EMIT_FAILED
        ));
        assert_eq!(sampler_loop.clock().now_ms(), 10_500 + 1000);
    }

    #[test]
    fn test_stalled_clock_captures_are_capped_per_poll() {
        let clock = ManualClock::new();
        let mut sampler_loop = SamplerLoop::new(
            SamplerConfig::default(),
            dual_channels(),
            &clock,
            FrozenPacer,
            Vec::new(),
        )
        .unwrap();
        let cap = sampler_loop.config().max_samples_per_window();

        sampler_loop.clock().set(3500);
        assert!(sampler_loop.poll().is_some());
        let snapshot = sampler_loop.telemetry();
        assert_eq!(snapshot.capped_captures, 1);
        assert_eq!(snapshot.last_samples, Some(cap));

        // Time has not moved, so no new trigger
        assert_eq!(sampler_loop.poll(), None);

        sampler_loop.clock().set(7000);
        assert!(sampler_loop.poll().is_some());
        let snapshot = sampler_loop.telemetry();
        assert_eq!(snapshot.cycles, 2);
        assert_eq!(snapshot.capped_captures, 2);
        assert_eq!(sampler_loop.sink().as_slice(), b"1,100,0.000\n2,200,0.000\n");
    }
}
