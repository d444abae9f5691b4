/// Sound engine: procedural 8-bit style effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// One-shot effects are fire-and-forget; looping effects keep their Sink
/// so a later `stop` can silence them.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::domain::registry::{PlayMode, SoundEffect};
use crate::sim::event::SoundSink;

#[cfg(feature = "sound")]
mod inner {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use crate::domain::registry::{PlayMode, SoundEffect};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<SoundEffect, Arc<Vec<u8>>>,
        looping: RefCell<HashMap<SoundEffect, Sink>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            let buffers: HashMap<SoundEffect, Arc<Vec<u8>>> = [
                (SoundEffect::Jump, gen_sweep(300.0, 700.0, 0.10, 0.25)),
                (SoundEffect::Land, gen_thud()),
                (SoundEffect::Pickup, gen_arpeggio(&[1047.0, 1319.0, 1568.0], 0.045)),
                (SoundEffect::Key, gen_arpeggio(&[784.0, 1047.0], 0.08)),
                (SoundEffect::PowerUp, gen_arpeggio(&[523.0, 659.0, 784.0, 1047.0, 1319.0], 0.05)),
                (SoundEffect::PowerupWarning, gen_blip(880.0, 0.05, 0.2)),
                (SoundEffect::Explode, gen_noise(0.35, 0.4)),
                (SoundEffect::Die, gen_die()),
                (SoundEffect::Conveyor, gen_hum()),
                (SoundEffect::Teleport, gen_sweep(1200.0, 200.0, 0.25, 0.25)),
                (SoundEffect::Win, gen_fanfare()),
                (SoundEffect::Lose, gen_arpeggio(&[392.0, 330.0, 262.0, 196.0], 0.18)),
            ]
            .into_iter()
            .map(|(effect, samples)| (effect, Arc::new(make_wav(&samples))))
            .collect();

            Some(SoundEngine {
                _stream: stream,
                handle,
                buffers,
                looping: RefCell::new(HashMap::new()),
            })
        }

        pub fn play(&self, effect: SoundEffect, mode: PlayMode) {
            let Some(buf) = self.buffers.get(&effect) else { return };
            if mode == PlayMode::Loop && self.looping.borrow().contains_key(&effect) {
                return;
            }
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            let Ok(src) = rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) else { return };
            match mode {
                PlayMode::Once => {
                    sink.append(src);
                    sink.detach();
                }
                PlayMode::Loop => {
                    sink.append(src.repeat_infinite());
                    self.looping.borrow_mut().insert(effect, sink);
                }
            }
        }

        pub fn stop(&self, effect: SoundEffect) {
            if let Some(sink) = self.looping.borrow_mut().remove(&effect) {
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

    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32);
                (t * freq * 2.0 * PI).sin() * env * volume
            })
            .collect()
    }

    /// Linear pitch sweep; rising for a jump, falling for a teleport.
    fn gen_sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq * 2.0 * PI / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - t).powf(0.6) * volume
            })
            .collect()
    }

    /// Short ascending run of square-ish notes.
    fn gen_arpeggio(notes: &[f32], note_dur: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = samples_for(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * 2.0 * PI).sin() * 0.7 + (t * freq * 3.0 * 2.0 * PI).sin() * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    fn gen_thud() -> Vec<f32> {
        let n = samples_for(0.06);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                (ti * (140.0 - t * 80.0) * 2.0 * PI).sin() * (1.0 - t) * 0.35
            })
            .collect()
    }

    /// Noise burst with a low rumble underneath.
    fn gen_noise(duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * 60.0 * 2.0 * PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.3 + noise * 0.7) * (1.0 - t).powf(1.5) * volume
            })
            .collect()
    }

    /// Belt hum. Whole cycles of both partials so the loop point is seamless.
    fn gen_hum() -> Vec<f32> {
        let n = samples_for(0.2);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                ((t * 110.0 * 2.0 * PI).sin() * 0.6 + (t * 220.0 * 2.0 * PI).sin() * 0.4) * 0.12
            })
            .collect()
    }

    fn gen_die() -> Vec<f32> {
        let mut samples = gen_arpeggio(&[440.0, 370.0, 311.0, 261.0], 0.12);
        let total = samples.len();
        let fade_len = total / 4;
        for (i, s) in samples.iter_mut().enumerate().skip(total - fade_len) {
            *s *= (total - i) as f32 / fade_len as f32;
        }
        samples
    }

    fn gen_fanfare() -> Vec<f32> {
        let mut samples = gen_arpeggio(&[523.0, 659.0, 784.0], 0.1);
        let last = 1047.0_f32;
        let n = samples_for(0.35);
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let wave = (t * last * 2.0 * PI).sin() * 0.7 + (t * last * 2.0 * 2.0 * PI).sin() * 0.3;
            samples.push(wave * env * 0.3);
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a 16-bit PCM buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&gen_blip(440.0, 0.01, 0.5));
            let n = samples_for(0.01);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + n * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, n * 2);
        }

        #[test]
        fn generators_stay_in_range() {
            for samples in [gen_noise(0.1, 0.4), gen_fanfare(), gen_die(), gen_hum()] {
                assert!(!samples.is_empty());
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _effect: SoundEffect, _mode: PlayMode) {}
    pub fn stop(&self, _effect: SoundEffect) {}
}

impl SoundSink for SoundEngine {
    fn play(&self, effect: SoundEffect, mode: PlayMode) {
        SoundEngine::play(self, effect, mode);
    }

    fn stop(&self, effect: SoundEffect) {
        SoundEngine::stop(self, effect);
    }
}

/// Sink used when no audio device is available.
pub struct Silence;

impl SoundSink for Silence {
    fn play(&self, _effect: SoundEffect, _mode: PlayMode) {}
    fn stop(&self, _effect: SoundEffect) {}
}
