/// Sound engine: procedural 8-bit style cues and a looping tune via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Cue playback is fire-and-forget (non-blocking) via rodio's Sink; the
/// music runs on its own sink so it can be muted and stopped.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;
use crate::domain::entity::Surface;

/// Every sound the game can make.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Attack,
    Hit,
    Break,
    GrassStep,
    BushRuffle,
    Hurt,
    Death,
}

impl Cue {
    /// Cue for a simulation event, if it makes a sound.
    pub fn for_event(event: &GameEvent) -> Option<Cue> {
        match event {
            GameEvent::AttackSwung { hits } if *hits > 0 => Some(Cue::Attack),
            GameEvent::AttackSwung { .. } => None,
            GameEvent::ObjectHit { .. } | GameEvent::EnemyHit { .. } => Some(Cue::Hit),
            GameEvent::CrateBreaking { .. } | GameEvent::EnemyKilled { .. } => Some(Cue::Break),
            GameEvent::TerrainCue(Surface::Grass) => Some(Cue::GrassStep),
            GameEvent::TerrainCue(Surface::Bush) => Some(Cue::BushRuffle),
            GameEvent::PlayerHurt { .. } => Some(Cue::Hurt),
            GameEvent::PlayerKilled => Some(Cue::Death),
            GameEvent::ObjectDestroyed { .. } => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::{debug, warn};

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;
    const MUSIC_VOLUME: f32 = 0.35;

    /// Pre-generated WAV buffers for each cue.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_attack: Arc<Vec<u8>>,
        sfx_hit: Arc<Vec<u8>>,
        sfx_break: Arc<Vec<u8>>,
        sfx_grass: Arc<Vec<u8>>,
        sfx_bush: Arc<Vec<u8>>,
        sfx_hurt: Arc<Vec<u8>>,
        sfx_death: Arc<Vec<u8>>,
        music: Arc<Vec<u8>>,
        music_sink: Option<Sink>,
        muted: bool,
    }

    impl SoundEngine {
        pub fn new(muted: bool) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };

            // ── Generate all sound buffers ──
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_attack: Arc::new(make_wav(&gen_swoosh())),
                sfx_hit: Arc::new(make_wav(&gen_thud())),
                sfx_break: Arc::new(make_wav(&gen_crunch())),
                sfx_grass: Arc::new(make_wav(&gen_noise_tick(0.04, 0.08, 7))),
                sfx_bush: Arc::new(make_wav(&gen_noise_tick(0.12, 0.12, 99))),
                sfx_hurt: Arc::new(make_wav(&gen_hurt())),
                sfx_death: Arc::new(make_wav(&gen_death())),
                music: Arc::new(make_wav(&gen_tune())),
                music_sink: None,
                muted,
            })
        }

        pub fn play(&self, cue: Cue) {
            if self.muted { return; }
            let buf = match cue {
                Cue::Attack => &self.sfx_attack,
                Cue::Hit => &self.sfx_hit,
                Cue::Break => &self.sfx_break,
                Cue::GrassStep => &self.sfx_grass,
                Cue::BushRuffle => &self.sfx_bush,
                Cue::Hurt => &self.sfx_hurt,
                Cue::Death => &self.sfx_death,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        /// Start the background loop. Does nothing if it is already running.
        pub fn start_music(&mut self) {
            if self.music_sink.is_some() { return; }
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "music sink unavailable");
                    return;
                }
            };
            let cursor = Cursor::new(self.music.as_ref().clone());
            match rodio::Decoder::new(cursor) {
                Ok(src) => sink.append(src.repeat_infinite()),
                Err(e) => {
                    warn!(error = %e, "music buffer rejected");
                    return;
                }
            }
            sink.set_volume(if self.muted { 0.0 } else { MUSIC_VOLUME });
            self.music_sink = Some(sink);
        }

        /// Flip mute. Returns the new state.
        pub fn toggle_mute(&mut self) -> bool {
            self.muted = !self.muted;
            if let Some(sink) = &self.music_sink {
                sink.set_volume(if self.muted { 0.0 } else { MUSIC_VOLUME });
            }
            debug!(muted = self.muted, "mute toggled");
            self.muted
        }

        pub fn stop_all(&mut self) {
            if let Some(sink) = self.music_sink.take() {
                sink.stop();
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    fn sine(t: f32, freq: f32) -> f32 {
        (t * freq * 2.0 * std::f32::consts::PI).sin()
    }

    /// Simple LCG noise in [-1, 1].
    fn noise(state: &mut u32) -> f32 {
        *state = state.wrapping_mul(1103515245).wrapping_add(12345);
        (*state as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    /// Attack: fast descending swoosh (noise over a falling tone)
    fn gen_swoosh() -> Vec<f32> {
        let n = samples_for(0.12);
        let mut rng: u32 = 4242;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 900.0 - t * 600.0;
                let env = (1.0 - t).powf(1.5);
                (sine(ti, freq) * 0.3 + noise(&mut rng) * 0.7) * env * 0.25
            })
            .collect()
    }

    /// Hit: short low thud
    fn gen_thud() -> Vec<f32> {
        let n = samples_for(0.08);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 180.0 - t * 100.0;
                sine(ti, freq) * (1.0 - t) * 0.4
            })
            .collect()
    }

    /// Break: noisy crunch with a cracking tail
    fn gen_crunch() -> Vec<f32> {
        let n = samples_for(0.25);
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let crackle = if (i / 300) % 3 == 0 { 1.0 } else { 0.4 };
                let env = (1.0 - t).powf(0.7);
                (noise(&mut rng) * 0.8 * crackle + sine(ti, 120.0) * 0.2) * env * 0.3
            })
            .collect()
    }

    /// Footsteps: a soft noise tick. Longer and louder for rustling leaves.
    fn gen_noise_tick(duration: f32, volume: f32, seed: u32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut rng = seed;
        let mut prev = 0.0;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                // One-pole low-pass to take the edge off
                prev = prev * 0.6 + noise(&mut rng) * 0.4;
                prev * (1.0 - t) * volume
            })
            .collect()
    }

    /// Hurt: two quick falling square-ish blips
    fn gen_hurt() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[330.0_f32, 247.0] {
            let n = samples_for(0.06);
            for i in 0..n {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                let wave = sine(ti, freq) * 0.7 + sine(ti, freq * 3.0) * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Death: a falling glide that slows and fades out
    fn gen_death() -> Vec<f32> {
        let n = samples_for(0.6);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 440.0 * (1.0 - 0.45 * t);
                phase += freq / SAMPLE_RATE as f32;
                let env = if t < 0.7 { 1.0 } else { (1.0 - t) / 0.3 };
                (phase * std::f32::consts::TAU).sin() * env * 0.3
            })
            .collect()
    }

    /// Background loop: a slow minor arpeggio over a drone
    fn gen_tune() -> Vec<f32> {
        let notes = [220.0_f32, 261.6, 329.6, 261.6, 196.0, 246.9, 293.7, 246.9];
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = samples_for(0.3);
            for i in 0..n {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.6;
                let lead = sine(ti, freq) * 0.6 + sine(ti, freq * 2.0) * 0.15;
                let drone = sine(ti, 110.0) * 0.25;
                samples.push((lead * env + drone) * 0.2);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    /// 16-bit mono PCM in a RIFF container.
    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const BYTES_PER_SAMPLE: u32 = 2;
        let data_len = samples.len() as u32 * BYTES_PER_SAMPLE;

        let mut out = Vec::with_capacity(44 + data_len as usize);
        let mut put = |bytes: &[u8]| out.extend_from_slice(bytes);
        put(b"RIFF");
        put(&(36 + data_len).to_le_bytes());
        put(b"WAVEfmt ");
        put(&16u32.to_le_bytes());
        put(&1u16.to_le_bytes()); // PCM
        put(&1u16.to_le_bytes()); // mono
        put(&SAMPLE_RATE.to_le_bytes());
        put(&(SAMPLE_RATE * BYTES_PER_SAMPLE).to_le_bytes());
        put(&(BYTES_PER_SAMPLE as u16).to_le_bytes());
        put(&16u16.to_le_bytes());
        put(b"data");
        put(&data_len.to_le_bytes());

        out.extend(samples.iter().flat_map(|s| ((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes()));
        out
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&gen_thud());
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
            assert_eq!(wav.len(), 44 + data_size);
        }

        #[test]
        fn generated_samples_stay_in_range() {
            for buf in [gen_swoosh(), gen_crunch(), gen_noise_tick(0.1, 0.1, 3), gen_tune()] {
                assert!(!buf.is_empty());
                assert!(buf.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine {
    muted: bool,
}

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(muted: bool) -> Option<Self> { Some(SoundEngine { muted }) }
    pub fn play(&self, _cue: Cue) {}
    pub fn start_music(&mut self) {}
    pub fn toggle_mute(&mut self) -> bool { self.muted = !self.muted; self.muted }
    pub fn stop_all(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_map_to_cues() {
        assert_eq!(Cue::for_event(&GameEvent::AttackSwung { hits: 2 }), Some(Cue::Attack));
        assert_eq!(Cue::for_event(&GameEvent::AttackSwung { hits: 0 }), None);
        assert_eq!(Cue::for_event(&GameEvent::TerrainCue(Surface::Bush)), Some(Cue::BushRuffle));
        assert_eq!(Cue::for_event(&GameEvent::CrateBreaking { x: 0.0, y: 0.0 }), Some(Cue::Break));
        assert_eq!(Cue::for_event(&GameEvent::PlayerHurt { health: 2 }), Some(Cue::Hurt));
        assert_eq!(Cue::for_event(&GameEvent::ObjectDestroyed { x: 0.0, y: 0.0 }), None);
    }
}
