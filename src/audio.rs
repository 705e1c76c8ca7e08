//! Audio cues
//!
//! Playback itself belongs to the platform. The game only names the cue it
//! wants; an `AudioSink` decides what to do with it.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Two fixtures started touching
    Impact,
    /// Button press, unpause
    Click,
    /// Background music starts or resumes
    MusicStart,
    /// Background music pauses (app suspended)
    MusicPause,
}

/// External audio collaborator
pub trait AudioSink {
    fn play(&self, effect: SoundEffect);
}

/// Logs cues instead of playing them (headless runs)
#[derive(Debug)]
pub struct LogAudio {
    master_volume: f32,
    sfx_volume: f32,
}

impl Default for LogAudio {
    fn default() -> Self {
        Self::new(0.8, 1.0)
    }
}

impl LogAudio {
    pub fn new(master_volume: f32, sfx_volume: f32) -> Self {
        Self {
            master_volume: master_volume.clamp(0.0, 1.0),
            sfx_volume: sfx_volume.clamp(0.0, 1.0),
        }
    }

    fn effective_volume(&self) -> f32 {
        self.master_volume * self.sfx_volume
    }
}

impl AudioSink for LogAudio {
    fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        log::debug!("Audio cue {:?} at volume {:.2}", effect, vol);
    }
}

/// Drops every cue; used when the config mutes audio
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&self, _effect: SoundEffect) {}
}

/// Records cues for assertions
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingAudio {
    played: std::cell::RefCell<Vec<SoundEffect>>,
}

#[cfg(test)]
impl RecordingAudio {
    pub(crate) fn played(&self) -> Vec<SoundEffect> {
        self.played.borrow().clone()
    }

    pub(crate) fn count(&self, effect: SoundEffect) -> usize {
        self.played.borrow().iter().filter(|e| **e == effect).count()
    }
}

#[cfg(test)]
impl AudioSink for RecordingAudio {
    fn play(&self, effect: SoundEffect) {
        self.played.borrow_mut().push(effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_is_clamped() {
        let audio = LogAudio::new(2.0, -1.0);
        assert_eq!(audio.effective_volume(), 0.0);

        let audio = LogAudio::new(0.5, 0.5);
        assert!((audio.effective_volume() - 0.25).abs() < 1e-6);
    }
}
