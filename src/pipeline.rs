//! The per-round telemetry pipeline.
//!
//! A round runs its due steps in a fixed order:
//!
//! 1. battery refresh (if due)
//! 2. sensor resample (if due)
//! 3. encode + broadcast handoff (only when the reading changed)
//! 4. notifications (only when a client is connected)
//! 5. display frame
//!
//! Encoding consumes both the battery state and the reading, so it must see
//! this round's freshest values.
//!
//! [`Pipeline::run_round`] drives the whole sequence over synchronous
//! collaborators. The firmware acquires values asynchronously, so it calls
//! the individual steps ([`poll`](Pipeline::poll),
//! [`apply_battery`](Pipeline::apply_battery),
//! [`apply_sample`](Pipeline::apply_sample), ...) in the same order itself.

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::frame::{DisplayFrame, FrameToggle};
use crate::interfaces::{Advertiser, BatteryMonitor, Display, EnvironmentSensor, Notifier};
use crate::notify::{self, Notification};
use crate::payload::{self, AdvFormat, AdvPayload, EncoderState};
use crate::reading::{BatteryState, RawSample, Reading};
use crate::scheduler::{Round, ScheduleState};

/// What happened during one round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoundReport {
    pub battery_refreshed: bool,
    /// A fresh reading was accepted this round.
    pub resampled: bool,
    /// The sensor was due but returned an error.
    pub sample_failed: bool,
    /// Packet counter value of the payload produced this round.
    pub encoded: Option<u8>,
    /// Number of notifications accepted by the transport.
    pub notified: u8,
}

pub struct Pipeline {
    config: PipelineConfig,
    format: AdvFormat,
    schedule: ScheduleState,
    encoder: EncoderState,
    last_reading: Option<Reading>,
    /// `None` until the first successful battery read.
    battery: Option<BatteryState>,
    /// A reading is waiting for the first battery value before encoding.
    held: bool,
    toggle: FrameToggle,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, format: AdvFormat) -> Self {
        Self::with_encoder_state(config, format, EncoderState::new())
    }

    /// Resume with a previously retained encoder state.
    pub fn with_encoder_state(
        config: PipelineConfig,
        format: AdvFormat,
        encoder: EncoderState,
    ) -> Self {
        Self {
            schedule: ScheduleState::new(&config),
            config,
            format,
            encoder,
            last_reading: None,
            battery: None,
            held: false,
            toggle: FrameToggle::new(),
        }
    }

    pub fn format(&self) -> &AdvFormat {
        &self.format
    }

    pub fn encoder_state(&self) -> &EncoderState {
        &self.encoder
    }

    /// Last accepted reading (zero before the first successful sample).
    pub fn reading(&self) -> Reading {
        self.last_reading.unwrap_or_default()
    }

    /// Last known battery state (zero before the first successful read).
    pub fn battery(&self) -> BatteryState {
        self.battery.unwrap_or_default()
    }

    /// Step 0: is a round due at `now`, and which sub-steps does it include.
    ///
    /// Until one battery read has succeeded, every round refreshes the
    /// battery, and resamples too while a reading is held back.
    pub fn poll(&mut self, now: u32) -> Option<Round> {
        let mut round = self.schedule.poll(now)?;
        if self.battery.is_none() {
            round.refresh_battery = true;
            round.resample |= self.held;
        }
        Some(round)
    }

    /// Step 1: fold in a battery measurement. On failure the previous state
    /// is kept.
    pub fn apply_battery(&mut self, millivolts: Result<u16, Error>) -> bool {
        match millivolts {
            Ok(mv) => {
                let battery = BatteryState::from_millivolts(mv);
                debug!("battery: {} mV ({}%)", battery.millivolts, battery.percent);
                self.battery = Some(battery);
                true
            }
            Err(e) => {
                warn!("battery refresh failed, keeping last value: {:?}", e);
                false
            }
        }
    }

    /// Step 2 + 3: fold in a sensor sample and, if the calibrated reading
    /// differs from the previous one, encode a new broadcast payload.
    ///
    /// Returns the payload to hand to the advertiser. A failed sample keeps
    /// the last reading and never produces a payload. Before the first
    /// battery value the reading is kept but the encode is held, so no
    /// payload carries an unmeasured battery.
    pub fn apply_sample(&mut self, sample: Result<RawSample, Error>) -> Option<AdvPayload> {
        let raw = match sample {
            Ok(raw) => raw,
            Err(e) => {
                warn!("sensor sample failed, keeping last reading: {:?}", e);
                return None;
            }
        };

        let reading = self.config.calibration.apply(raw);
        if self.last_reading == Some(reading) && !self.held {
            return None;
        }
        self.last_reading = Some(reading);

        let Some(battery) = self.battery else {
            warn!("no battery value yet, holding encode");
            self.held = true;
            return None;
        };
        self.held = false;

        let payload = payload::encode(&self.format, &reading, &battery, &mut self.encoder);
        debug!(
            "encoded {} bytes: t={} h={} (#{})",
            payload.len(),
            reading.temperature,
            reading.humidity,
            self.encoder.packet_counter
        );
        Some(payload)
    }

    /// Step 4 input: notification buffers for the current values.
    pub fn notifications(&self) -> [Notification; 3] {
        notify::notifications(&self.reading(), &self.battery())
    }

    /// Step 5: this round's display frame. Advances the humidity/battery
    /// alternation.
    pub fn display_frame(&mut self, connected: bool) -> DisplayFrame {
        let reading = self.reading();
        let battery = self.battery();
        self.toggle.next(
            &reading,
            &battery,
            self.config.display_unit,
            self.config.display_battery_indicator,
            connected,
        )
    }

    /// Push all notifications. Each push is independent; failures are
    /// logged and the rest still go out. Returns the number accepted.
    pub fn push_notifications<N: Notifier>(&self, notifier: &mut N) -> u8 {
        let mut sent = 0;
        for n in self.notifications().iter() {
            match notifier.notify(n.characteristic, n.as_bytes()) {
                Ok(()) => sent += 1,
                Err(e) => warn!("notify {:?} failed: {:?}", n.characteristic, e),
            }
        }
        sent
    }

    /// Run one full round against synchronous collaborators.
    ///
    /// Returns `None` when the main cycle has not elapsed.
    pub fn run_round<S, B, A, N, D>(
        &mut self,
        now: u32,
        sensor: &mut S,
        battery: &mut B,
        advertiser: &mut A,
        notifier: &mut N,
        display: &mut D,
    ) -> Option<RoundReport>
    where
        S: EnvironmentSensor,
        B: BatteryMonitor,
        A: Advertiser,
        N: Notifier,
        D: Display,
    {
        let round = self.poll(now)?;
        let mut report = RoundReport::default();

        if round.refresh_battery {
            report.battery_refreshed = self.apply_battery(battery.millivolts());
        }

        if round.resample {
            let sample = sensor.sample();
            report.resampled = sample.is_ok();
            report.sample_failed = sample.is_err();
            if let Some(payload) = self.apply_sample(sample) {
                report.encoded = Some(self.encoder.packet_counter);
                if let Err(e) = advertiser.set_payload(&payload) {
                    warn!("advertising update failed: {:?}", e);
                }
            }
        }

        let connected = notifier.is_connected();
        if connected {
            report.notified = self.push_notifications(notifier);
        }

        let frame = self.display_frame(connected);
        if let Err(e) = display.show(&frame) {
            warn!("display update failed: {:?}", e);
        }

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use crate::notify::Characteristic;
    use crate::payload::{bthome, mi, MiPhase};
    use crate::reading::Calibration;

    struct FixedSensor {
        next: Result<RawSample, Error>,
        calls: usize,
    }

    impl FixedSensor {
        fn new(temperature: i16, humidity: u16) -> Self {
            Self {
                next: raw(temperature, humidity),
                calls: 0,
            }
        }
    }

    impl EnvironmentSensor for FixedSensor {
        fn sample(&mut self) -> Result<RawSample, Error> {
            self.calls += 1;
            self.next
        }
    }

    /// Fails the first `failures` reads, then reports `millivolts`.
    struct FlakyBattery {
        failures: usize,
        millivolts: u16,
        calls: usize,
    }

    impl FlakyBattery {
        fn steady(millivolts: u16) -> Self {
            Self {
                failures: 0,
                millivolts,
                calls: 0,
            }
        }
    }

    impl BatteryMonitor for FlakyBattery {
        fn millivolts(&mut self) -> Result<u16, Error> {
            self.calls += 1;
            if self.calls <= self.failures {
                Err(Error::Battery)
            } else {
                Ok(self.millivolts)
            }
        }
    }

    #[derive(Default)]
    struct RecordingAdvertiser {
        last: Option<AdvPayload>,
        calls: usize,
    }

    impl Advertiser for RecordingAdvertiser {
        fn set_payload(&mut self, payload: &[u8]) -> Result<(), Error> {
            self.calls += 1;
            self.last = Some(AdvPayload::from_slice(payload));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        connected: bool,
        fail_humidity: bool,
        sent: [(u16, usize); 8],
        count: usize,
    }

    impl Notifier for RecordingNotifier {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn notify(&mut self, characteristic: Characteristic, value: &[u8]) -> Result<(), Error> {
            if self.fail_humidity && characteristic == Characteristic::Humidity {
                return Err(Error::Notify);
            }
            self.sent[self.count] = (characteristic.uuid(), value.len());
            self.count += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullDisplay {
        frames: usize,
    }

    impl Display for NullDisplay {
        fn show(&mut self, _frame: &DisplayFrame) -> Result<(), Error> {
            self.frames += 1;
            Ok(())
        }
    }

    /// Collaborators for `run_round`.
    struct Rig {
        sensor: FixedSensor,
        battery: FlakyBattery,
        adv: RecordingAdvertiser,
        conn: RecordingNotifier,
        display: NullDisplay,
    }

    impl Rig {
        fn new(sensor: FixedSensor, battery: FlakyBattery) -> Self {
            Self {
                sensor,
                battery,
                adv: RecordingAdvertiser::default(),
                conn: RecordingNotifier::default(),
                display: NullDisplay::default(),
            }
        }

        fn round(&mut self, p: &mut Pipeline, now: u32) -> Option<RoundReport> {
            p.run_round(
                now,
                &mut self.sensor,
                &mut self.battery,
                &mut self.adv,
                &mut self.conn,
                &mut self.display,
            )
        }
    }

    fn config(every: u16) -> PipelineConfig {
        PipelineConfig {
            main_period_ticks: 10,
            battery_period_ticks: 100,
            measurement_iterations: every,
            ..PipelineConfig::DEFAULT
        }
    }

    /// A pipeline that already has a battery value.
    fn ready(config: PipelineConfig, format: AdvFormat) -> Pipeline {
        let mut p = Pipeline::new(config, format);
        p.apply_battery(Ok(2980));
        p
    }

    fn raw(temperature: i16, humidity: u16) -> Result<RawSample, Error> {
        Ok(RawSample {
            temperature,
            humidity,
        })
    }

    fn le16(payload: &AdvPayload, offset: usize) -> u16 {
        u16::from_le_bytes([payload[offset], payload[offset + 1]])
    }

    #[test]
    fn first_sample_always_encodes() {
        let mut p = ready(config(1), AdvFormat::BtHome);
        assert!(p.apply_sample(raw(0, 0)).is_some());
        assert_eq!(p.encoder_state().packet_counter, 1);
    }

    #[test]
    fn unchanged_sample_does_not_encode() {
        let mut p = ready(config(1), AdvFormat::BtHome);
        assert!(p.apply_sample(raw(215, 553)).is_some());
        assert!(p.apply_sample(raw(215, 553)).is_none());
        assert!(p.apply_sample(raw(215, 554)).is_some());
        assert_eq!(p.encoder_state().packet_counter, 2);
    }

    #[test]
    fn failed_sample_keeps_last_reading() {
        let mut p = ready(config(1), AdvFormat::BtHome);
        p.apply_sample(raw(215, 553));
        let failed = p.apply_sample(Err(Error::Sensor(SensorError::Crc)));
        assert!(failed.is_none());
        assert_eq!(p.reading(), Reading::new(215, 553));
        assert_eq!(p.encoder_state().packet_counter, 1);
    }

    #[test]
    fn failed_battery_keeps_last_state() {
        let mut p = Pipeline::new(config(1), AdvFormat::BtHome);
        assert!(p.apply_battery(Ok(3000)));
        assert!(!p.apply_battery(Err(Error::Battery)));
        assert_eq!(p.battery(), BatteryState::new(100, 3000));
    }

    #[test]
    fn encode_waits_for_first_battery_value() {
        let mut p = Pipeline::new(config(1), AdvFormat::BtHome);
        assert!(p.apply_sample(raw(215, 553)).is_none());
        assert_eq!(p.reading(), Reading::new(215, 553));
        assert_eq!(p.encoder_state().packet_counter, 0);

        p.apply_battery(Ok(2980));
        // Same reading, but the held encode is still owed.
        let payload = p.apply_sample(raw(215, 553)).unwrap();
        assert_eq!(payload[bthome::BATTERY_OFFSET], 97);
        assert!(p.apply_sample(raw(215, 553)).is_none());
    }

    #[test]
    fn boot_battery_failure_is_retried_every_round() {
        let battery = FlakyBattery {
            failures: 2,
            millivolts: 2980,
            calls: 0,
        };
        let mut rig = Rig::new(FixedSensor::new(215, 553), battery);
        let mut p = Pipeline::new(config(8), AdvFormat::BtHome);

        let r = rig.round(&mut p, 0).unwrap();
        assert!(!r.battery_refreshed);
        assert!(r.resampled);
        assert_eq!(r.encoded, None);

        let r = rig.round(&mut p, 10).unwrap();
        assert!(!r.battery_refreshed);
        assert_eq!(r.encoded, None);

        // Third read succeeds; the held reading goes out in the same round.
        let r = rig.round(&mut p, 20).unwrap();
        assert!(r.battery_refreshed);
        assert_eq!(r.encoded, Some(1));
        let payload = rig.adv.last.unwrap();
        assert_eq!(payload[bthome::BATTERY_OFFSET], 97);
        assert_eq!(le16(&payload, bthome::VOLTAGE_OFFSET), 2980);

        // Back on the regular battery cycle and measurement period.
        for t in 3..8u32 {
            let r = rig.round(&mut p, t * 10).unwrap();
            assert!(!r.battery_refreshed);
            assert!(!r.resampled);
        }
        assert_eq!(rig.battery.calls, 3);
        assert_eq!(rig.sensor.calls, 3);
        assert_eq!(rig.adv.calls, 1);
    }

    #[test]
    fn calibration_applies_before_compare() {
        let cfg = PipelineConfig {
            calibration: Calibration {
                temperature_offset: 10,
                humidity_offset: -3,
            },
            ..config(1)
        };
        let mut p = ready(cfg, AdvFormat::BtHome);
        let payload = p.apply_sample(raw(205, 556)).unwrap();
        assert_eq!(p.reading(), Reading::new(215, 553));
        assert_eq!(le16(&payload, bthome::TEMPERATURE_OFFSET) as i16, 2150);
    }

    #[test]
    fn battery_refresh_precedes_encode() {
        let mut rig = Rig::new(FixedSensor::new(215, 553), FlakyBattery::steady(2980));
        let mut p = Pipeline::new(config(1), AdvFormat::BtHome);

        let report = rig.round(&mut p, 0).unwrap();
        assert!(report.battery_refreshed);
        assert!(report.resampled);
        assert!(!report.sample_failed);
        assert_eq!(report.encoded, Some(1));

        let payload = rig.adv.last.unwrap();
        assert_eq!(payload[bthome::BATTERY_OFFSET], 97);
        assert_eq!(le16(&payload, bthome::VOLTAGE_OFFSET), 2980);
    }

    #[test]
    fn failed_sample_is_reported() {
        let mut rig = Rig::new(FixedSensor::new(0, 0), FlakyBattery::steady(2980));
        rig.sensor.next = Err(Error::Sensor(SensorError::Bus));
        let mut p = Pipeline::new(config(1), AdvFormat::BtHome);

        let report = rig.round(&mut p, 0).unwrap();
        assert!(!report.resampled);
        assert!(report.sample_failed);
        assert_eq!(report.encoded, None);
    }

    #[test]
    fn round_not_due_touches_nothing() {
        let mut rig = Rig::new(FixedSensor::new(215, 553), FlakyBattery::steady(2980));
        rig.conn.connected = true;
        let mut p = Pipeline::new(config(1), AdvFormat::BtHome);

        assert!(rig.round(&mut p, 0).is_some());
        assert!(rig.round(&mut p, 5).is_none());
        assert_eq!(rig.sensor.calls, 1);
        assert_eq!(rig.battery.calls, 1);
        assert_eq!(rig.conn.count, 3);
        assert_eq!(rig.display.frames, 1);
    }

    #[test]
    fn notifications_only_when_connected() {
        let mut rig = Rig::new(FixedSensor::new(215, 553), FlakyBattery::steady(2980));
        let mut p = Pipeline::new(config(4), AdvFormat::BtHome);

        let r = rig.round(&mut p, 0).unwrap();
        assert_eq!(r.notified, 0);

        rig.conn.connected = true;
        // Not a measurement round: last reading is reused.
        let r = rig.round(&mut p, 10).unwrap();
        assert!(!r.resampled);
        assert_eq!(r.notified, 3);
        assert_eq!(
            &rig.conn.sent[..3],
            &[(0x2A1F, 2), (0x2A6F, 2), (0x2A19, 1)]
        );
    }

    #[test]
    fn failed_notification_does_not_block_others() {
        let mut p = ready(config(1), AdvFormat::BtHome);
        p.apply_sample(raw(215, 553));
        let mut conn = RecordingNotifier {
            connected: true,
            fail_humidity: true,
            ..Default::default()
        };
        assert_eq!(p.push_notifications(&mut conn), 2);
        assert_eq!(&conn.sent[..2], &[(0x2A1F, 2), (0x2A19, 1)]);
    }

    #[test]
    fn mi_phase_alternates_across_rounds() {
        let mac = [1, 2, 3, 4, 5, 6];
        let mut p = ready(config(1), AdvFormat::Mi { mac });
        let a = p.apply_sample(raw(215, 553)).unwrap();
        let b = p.apply_sample(raw(216, 553)).unwrap();
        let c = p.apply_sample(raw(217, 553)).unwrap();
        assert_eq!(a[mi::OBJECT_TYPE_OFFSET], mi::OBJECT_CLIMATE);
        assert_eq!(b[mi::OBJECT_TYPE_OFFSET], mi::OBJECT_BATTERY);
        assert_eq!(c[mi::OBJECT_TYPE_OFFSET], mi::OBJECT_CLIMATE);
        assert_eq!(p.encoder_state().mi_phase, MiPhase::Battery);
    }

    #[test]
    fn resumes_from_retained_state() {
        let retained = EncoderState::restore([41, 1]);
        let format = AdvFormat::Mi { mac: [0; 6] };
        let mut p = Pipeline::with_encoder_state(config(1), format, retained);
        p.apply_battery(Ok(2980));
        let payload = p.apply_sample(raw(1, 1)).unwrap();
        assert_eq!(payload[mi::COUNTER_OFFSET], 42);
        assert_eq!(payload[mi::OBJECT_TYPE_OFFSET], mi::OBJECT_BATTERY);
    }
}
