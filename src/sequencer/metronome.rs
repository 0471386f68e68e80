// Metronome - Click synthesis for scheduled beats
// Renders pre-generated tones at the exact sample they were scheduled for

use std::collections::VecDeque;
use std::f32::consts::PI;

/// Role of a click within the measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ClickType {
    /// Main beat flagged in the accent map
    Accent,
    /// Plain main beat
    Regular,
    /// Intra-beat subdivision tick
    Subdivision,
}

impl ClickType {
    /// Sine frequency in Hz
    pub fn frequency(&self) -> f32 {
        match self {
            ClickType::Accent => 880.0,
            ClickType::Regular => 660.0,
            ClickType::Subdivision => 440.0,
        }
    }

    /// Peak amplitude
    pub fn amplitude(&self) -> f32 {
        match self {
            ClickType::Accent => 0.5,
            ClickType::Regular => 0.35,
            ClickType::Subdivision => 0.2,
        }
    }
}

/// A click committed to the audio clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledClick {
    /// Absolute audio-clock position in samples
    pub sample_time: u64,
    pub click_type: ClickType,
}

/// Metronome click sound generator
/// Pre-generates short tones for low CPU overhead
#[derive(Debug, Clone)]
pub struct MetronomeSound {
    accent_samples: Vec<f32>,
    regular_samples: Vec<f32>,
    subdivision_samples: Vec<f32>,
}

impl MetronomeSound {
    const CLICK_DURATION_MS: f32 = 50.0;
    /// Level (relative to silence) the envelope decays to at the end of the click
    const DECAY_FLOOR: f32 = 0.001;

    pub fn new(sample_rate: f32) -> Self {
        let click_samples = ((Self::CLICK_DURATION_MS / 1000.0) * sample_rate) as usize;

        Self {
            accent_samples: Self::generate_click(sample_rate, click_samples, ClickType::Accent),
            regular_samples: Self::generate_click(sample_rate, click_samples, ClickType::Regular),
            subdivision_samples: Self::generate_click(
                sample_rate,
                click_samples,
                ClickType::Subdivision,
            ),
        }
    }

    /// Sine tone with an exponential decay from the role's amplitude down to
    /// `DECAY_FLOOR` over the click duration
    fn generate_click(sample_rate: f32, num_samples: usize, click_type: ClickType) -> Vec<f32> {
        let amplitude = click_type.amplitude();
        let phase_increment = 2.0 * PI * click_type.frequency() / sample_rate;
        let decay_ratio = Self::DECAY_FLOOR / amplitude;

        (0..num_samples)
            .map(|i| {
                let t = i as f32 / num_samples as f32;
                let envelope = amplitude * decay_ratio.powf(t);
                (i as f32 * phase_increment).sin() * envelope
            })
            .collect()
    }

    pub fn get_click(&self, click_type: ClickType) -> &[f32] {
        match click_type {
            ClickType::Accent => &self.accent_samples,
            ClickType::Regular => &self.regular_samples,
            ClickType::Subdivision => &self.subdivision_samples,
        }
    }

    /// Duration of a click in samples
    pub fn click_duration(&self) -> usize {
        self.accent_samples.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct ClickVoice {
    click_type: ClickType,
    position: usize,
}

/// Sample-accurate click renderer used inside the audio callback
///
/// Pending clicks and voices are pre-allocated; nothing in the render path allocates.
#[derive(Debug, Clone)]
pub struct ClickPlayer {
    sound: MetronomeSound,
    volume: f32,
    pending: VecDeque<ScheduledClick>,
    voices: [Option<ClickVoice>; Self::MAX_VOICES],
}

impl ClickPlayer {
    pub const MAX_PENDING: usize = 256;
    const MAX_VOICES: usize = 4;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            sound: MetronomeSound::new(sample_rate),
            volume: 1.0,
            pending: VecDeque::with_capacity(Self::MAX_PENDING),
            voices: [None; Self::MAX_VOICES],
        }
    }

    /// Set output volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Queue a click. Returns false when the pending queue is full.
    pub fn enqueue(&mut self, click: ScheduledClick) -> bool {
        if self.pending.len() >= Self::MAX_PENDING {
            return false;
        }
        // Scheduler output is time ordered; keep the queue sorted if it is not
        let index = self
            .pending
            .iter()
            .rposition(|c| c.sample_time <= click.sample_time)
            .map_or(0, |i| i + 1);
        self.pending.insert(index, click);
        true
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop every pending click and cut ringing voices
    pub fn clear(&mut self) {
        self.pending.clear();
        self.voices = [None; Self::MAX_VOICES];
    }

    fn start_voice(&mut self, click_type: ClickType) {
        let voice = ClickVoice {
            click_type,
            position: 0,
        };
        if let Some(slot) = self.voices.iter_mut().find(|v| v.is_none()) {
            *slot = Some(voice);
            return;
        }
        // Steal the voice closest to its end
        if let Some(slot) = self
            .voices
            .iter_mut()
            .max_by_key(|v| v.map_or(0, |v| v.position))
        {
            *slot = Some(voice);
        }
    }

    /// Render `output.len()` mono samples starting at absolute sample `start_sample`
    ///
    /// Clicks whose time has already passed start on the first sample of the buffer.
    pub fn process_buffer(&mut self, start_sample: u64, output: &mut [f32]) {
        for (i, out) in output.iter_mut().enumerate() {
            *out = self.render_sample(start_sample + i as u64);
        }
    }

    /// Render the single sample at absolute position `now`
    pub fn render_sample(&mut self, now: u64) -> f32 {
        while let Some(click) = self.pending.front().copied() {
            if click.sample_time > now {
                break;
            }
            self.pending.pop_front();
            self.start_voice(click.click_type);
        }
        self.next_sample()
    }

    fn next_sample(&mut self) -> f32 {
        let mut sample = 0.0;
        for slot in self.voices.iter_mut() {
            if let Some(voice) = slot {
                let click = self.sound.get_click(voice.click_type);
                if voice.position < click.len() {
                    sample += click[voice.position];
                    voice.position += 1;
                } else {
                    *slot = None;
                }
            }
        }
        sample * self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    #[test]
    fn test_metronome_sound_generation() {
        let sound = MetronomeSound::new(48000.0);

        let accent = sound.get_click(ClickType::Accent);
        let regular = sound.get_click(ClickType::Regular);
        let subdivision = sound.get_click(ClickType::Subdivision);

        // 50ms at 48kHz = 2400 samples
        assert_eq!(accent.len(), 2400);
        assert_eq!(regular.len(), accent.len());
        assert_eq!(subdivision.len(), accent.len());

        // Accent > main beat > subdivision
        assert!(peak(accent) > peak(regular));
        assert!(peak(regular) > peak(subdivision));
        assert!(peak(accent) <= 0.5);
    }

    #[test]
    fn test_click_decays() {
        let sound = MetronomeSound::new(48000.0);
        let accent = sound.get_click(ClickType::Accent);
        let tail = &accent[accent.len() - 100..];
        assert!(peak(tail) < 0.002);
    }

    #[test]
    fn test_click_starts_at_scheduled_sample() {
        let mut player = ClickPlayer::new(48000.0);
        assert!(player.enqueue(ScheduledClick {
            sample_time: 1000 + 100,
            click_type: ClickType::Accent,
        }));

        let mut buffer = vec![0.0f32; 512];
        player.process_buffer(1000, &mut buffer);

        // Silent until offset 100, sounding afterwards (sin(0) is zero, so skip one sample)
        assert!(buffer[..100].iter().all(|s| *s == 0.0));
        assert!(buffer[101..200].iter().any(|s| s.abs() > 0.01));
        assert_eq!(player.pending_len(), 0);
    }

    #[test]
    fn test_future_click_waits() {
        let mut player = ClickPlayer::new(48000.0);
        player.enqueue(ScheduledClick {
            sample_time: 10_000,
            click_type: ClickType::Regular,
        });

        let mut buffer = vec![0.0f32; 512];
        player.process_buffer(0, &mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
        assert_eq!(player.pending_len(), 1);
    }

    #[test]
    fn test_late_click_plays_immediately() {
        let mut player = ClickPlayer::new(48000.0);
        player.enqueue(ScheduledClick {
            sample_time: 10,
            click_type: ClickType::Regular,
        });

        let mut buffer = vec![0.0f32; 256];
        player.process_buffer(5000, &mut buffer);
        assert!(buffer[1..].iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_enqueue_keeps_time_order() {
        let mut player = ClickPlayer::new(48000.0);
        for t in [300, 100, 200] {
            player.enqueue(ScheduledClick {
                sample_time: t,
                click_type: ClickType::Subdivision,
            });
        }
        let times: Vec<u64> = player.pending.iter().map(|c| c.sample_time).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn test_volume_control() {
        let render = |volume: f32| {
            let mut player = ClickPlayer::new(48000.0);
            player.set_volume(volume);
            player.enqueue(ScheduledClick {
                sample_time: 0,
                click_type: ClickType::Accent,
            });
            let mut buffer = vec![0.0f32; 512];
            player.process_buffer(0, &mut buffer);
            peak(&buffer)
        };

        let half = render(0.5);
        let full = render(1.0);
        assert!(full > half * 1.9);
        assert!(full < half * 2.1);
        assert_eq!(render(0.0), 0.0);
    }

    #[test]
    fn test_clear_silences() {
        let mut player = ClickPlayer::new(48000.0);
        player.enqueue(ScheduledClick {
            sample_time: 0,
            click_type: ClickType::Accent,
        });
        let mut buffer = vec![0.0f32; 64];
        player.process_buffer(0, &mut buffer);

        player.clear();
        player.process_buffer(64, &mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }
}
