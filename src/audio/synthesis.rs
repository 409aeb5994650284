//! Built-in procedural patch used when no track is given.

use glicol::Engine;

use super::AudioError;
use crate::params::audio_constants::BLOCK_SIZE;

/// Glicol composition: a plucked arpeggio over a slow filter sweep
pub const GLICOL_COMPOSITION: &str = r#"
~gate: speed 4.0 >> seq 57 _57 _~a 45 _64
~a: choose 45 52 57 69 0 0
~amp: ~gate >> envperc 0.002 0.25
~pit: ~gate >> mul 220.0
~lead: saw ~pit >> mul ~amp >> lpf ~mod 3.0 >> mul 0.12
~mod: sin 0.1 >> mul 1800 >> add 2000
o: ~lead >> plate 0.2
"#;

/// Block-based synth that feeds an interleaved output buffer
pub struct Synth {
    engine: Engine<BLOCK_SIZE>,
    /// Stereo frames left over from the last engine block
    pending: Vec<[f32; 2]>,
}

impl Synth {
    pub fn new(sample_rate: usize) -> Result<Self, AudioError> {
        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(sample_rate);
        engine.update_with_code(GLICOL_COMPOSITION);
        engine
            .update()
            .map_err(|e| AudioError::Synthesis(format!("{:?}", e)))?;

        Ok(Self {
            engine,
            pending: Vec::with_capacity(BLOCK_SIZE),
        })
    }

    /// Fill the next stereo frame
    pub fn next_frame(&mut self) -> [f32; 2] {
        if self.pending.is_empty() {
            let (buffers, _) = self.engine.next_block(vec![]);
            // Reversed so pop() yields frames in order
            self.pending.extend(
                (0..BLOCK_SIZE)
                    .rev()
                    .map(|i| [buffers[0][i].clamp(-0.5, 0.5), buffers[1][i].clamp(-0.5, 0.5)]),
            );
        }
        self.pending.pop().unwrap_or([0.0, 0.0])
    }
}
