//! Sensor capabilities and channel wiring.
//!
//! A channel is one distance + loudness pair. The drivers behind it are
//! external collaborators: the sampler only needs the two narrow traits
//! below, which keeps the cycle logic independent of pins and buses.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod scripted;
pub mod simulated;

/// Upper bound of the analog loudness scale (10-bit ADC).
pub const ANALOG_MAX: u16 = 1023;

/// Distance capability (ultrasonic rangefinder or similar).
///
/// Returns centimetres, or whatever sentinel the driver uses on timeout.
/// The value is passed through to the record untouched.
pub trait DistanceSource {
    fn measure(&mut self) -> i32;
}

/// Loudness capability (microphone envelope on an analog pin).
///
/// Expected to be fast and side-effect free relative to the pacing delay.
pub trait LoudnessSource {
    fn read(&mut self) -> u16;
}

impl<F: FnMut() -> i32> DistanceSource for F {
    fn measure(&mut self) -> i32 {
        self()
    }
}

impl<F: FnMut() -> u16> LoudnessSource for F {
    fn read(&mut self) -> u16 {
        self()
    }
}

/// Identifier of a sensor pair. The dual-channel rig uses `1` and `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(u8);

impl ChannelId {
    pub const A: ChannelId = ChannelId(1);
    pub const B: ChannelId = ChannelId(2);

    /// Accepts the ids the wire protocol can carry (`1` or `2`).
    pub fn new(id: u8) -> Option<Self> {
        match id {
            1 | 2 => Some(ChannelId(id)),
            _ => None,
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One sensor pair, fixed for the lifetime of the loop.
pub struct Channel {
    id: ChannelId,
    distance: Option<Box<dyn DistanceSource>>,
    loudness: Box<dyn LoudnessSource>,
}

impl Channel {
    /// Channel with both a rangefinder and a microphone.
    pub fn new(
        id: ChannelId,
        distance: impl DistanceSource + 'static,
        loudness: impl LoudnessSource + 'static,
    ) -> Self {
        Self {
            id,
            distance: Some(Box::new(distance)),
            loudness: Box::new(loudness),
        }
    }

    /// Microphone-only channel, used by the loudness-only rig.
    pub fn loudness_only(id: ChannelId, loudness: impl LoudnessSource + 'static) -> Self {
        Self {
            id,
            distance: None,
            loudness: Box::new(loudness),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn has_distance(&self) -> bool {
        self.distance.is_some()
    }

    /// Single distance reading, or `None` when the channel has no rangefinder.
    pub fn read_distance(&mut self) -> Option<i32> {
        self.distance.as_mut().map(|sensor| sensor.measure())
    }

    pub fn read_loudness(&mut self) -> u16 {
        self.loudness.read()
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("has_distance", &self.has_distance())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::scripted::ScriptedLoudness;
    use super::*;

    #[test]
    fn test_channel_id_accepts_only_wire_ids() {
        assert_eq!(ChannelId::new(1), Some(ChannelId::A));
        assert_eq!(ChannelId::new(2), Some(ChannelId::B));
        assert_eq!(ChannelId::new(0), None);
        assert_eq!(ChannelId::new(3), None);
        assert_eq!(ChannelId::B.to_string(), "2");
    }

    #[test]
    fn test_channel_reads_through_capabilities() {
        let mut channel = Channel::new(ChannelId::A, || 134, ScriptedLoudness::constant(12));
        assert!(channel.has_distance());
        assert_eq!(channel.read_distance(), Some(134));
        assert_eq!(channel.read_loudness(), 12);
    }

    #[test]
    fn test_loudness_only_channel_has_no_distance() {
        let mut channel = Channel::loudness_only(ChannelId::A, ScriptedLoudness::constant(0));
        assert!(!channel.has_distance());
        assert_eq!(channel.read_distance(), None);
    }
}
