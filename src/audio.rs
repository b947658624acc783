//! Audio cue mixing
//!
//! Actors and the mission queue [`Cue`]s; the mixer turns them into
//! volume-resolved [`Playback`] requests for whatever backend is attached.
//! No device output happens here.

use serde::{Deserialize, Serialize};

use crate::settings::AudioSettings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Sword leaves Idle
    SwordSwing,
    /// Enemy gun fires
    Gunshot,
    /// Enemy gun starts reloading
    Reload,
    /// Enemy staggered by the sword
    EnemyHit,
    /// Enemy killed
    EnemyDeath,
    /// Boss lands and fires its ring
    BossSlam,
    /// Boss fires a volley
    BossShot,
    /// Boss starts charging
    BossDash,
    /// Boss takes a hit
    BossHit,
    /// Boss killed
    BossDeath,
    /// Player takes a hit
    PlayerHit,
    /// Mission stage cleared
    StageClear,
}

impl SoundEffect {
    /// Per-effect gain before user volume
    pub fn base_gain(self) -> f32 {
        match self {
            SoundEffect::SwordSwing => 0.5,
            SoundEffect::Gunshot => 0.4,
            SoundEffect::Reload => 0.3,
            SoundEffect::EnemyHit | SoundEffect::BossHit => 0.6,
            SoundEffect::EnemyDeath => 0.7,
            SoundEffect::BossSlam | SoundEffect::BossDeath => 1.0,
            SoundEffect::BossShot => 0.5,
            SoundEffect::BossDash => 0.8,
            SoundEffect::PlayerHit => 0.8,
            SoundEffect::StageClear => 0.9,
        }
    }
}

/// Background music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    Field,
    Boss,
    Victory,
    Defeat,
}

impl MusicTrack {
    /// Whether the track loops until replaced
    pub fn looping(self) -> bool {
        matches!(self, MusicTrack::Field | MusicTrack::Boss)
    }
}

/// Something the game wants heard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    Sfx(SoundEffect),
    Music(MusicTrack),
    StopMusic,
}

/// A backend-ready request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Playback {
    Sfx { effect: SoundEffect, volume: f32 },
    Music { track: MusicTrack, volume: f32, looping: bool },
    StopMusic,
}

/// Resolves cues against the user's volume settings
#[derive(Debug, Clone)]
pub struct AudioMixer {
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    current_music: Option<MusicTrack>,
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::new(&AudioSettings::default())
    }
}

impl AudioMixer {
    pub fn new(settings: &AudioSettings) -> Self {
        Self {
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            music_volume: settings.music_volume.clamp(0.0, 1.0),
            muted: settings.muted,
            current_music: None,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn current_music(&self) -> Option<MusicTrack> {
        self.current_music
    }

    fn effective(&self, channel: f32) -> f32 {
        if self.muted { 0.0 } else { self.master_volume * channel }
    }

    /// Resolve one cue. Silent effects and repeats of the playing track
    /// produce nothing.
    pub fn mix(&mut self, cue: Cue) -> Option<Playback> {
        match cue {
            Cue::Sfx(effect) => {
                let volume = self.effective(self.sfx_volume) * effect.base_gain();
                (volume > 0.0).then_some(Playback::Sfx { effect, volume })
            }
            Cue::Music(track) => {
                if self.current_music == Some(track) {
                    return None;
                }
                self.current_music = Some(track);
                Some(Playback::Music {
                    track,
                    volume: self.effective(self.music_volume),
                    looping: track.looping(),
                })
            }
            Cue::StopMusic => self.current_music.take().map(|_| Playback::StopMusic),
        }
    }

    pub fn mix_all(&mut self, cues: impl IntoIterator<Item = Cue>) -> Vec<Playback> {
        cues.into_iter().filter_map(|cue| self.mix(cue)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sfx_volume_chain() {
        let mut mixer = AudioMixer::default();
        mixer.set_master_volume(0.5);
        mixer.set_sfx_volume(0.5);
        let Some(Playback::Sfx { volume, .. }) = mixer.mix(Cue::Sfx(SoundEffect::BossSlam)) else {
            panic!("expected sfx playback");
        };
        assert!((volume - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_muted_drops_sfx() {
        let mut mixer = AudioMixer::default();
        mixer.set_muted(true);
        assert_eq!(mixer.mix(Cue::Sfx(SoundEffect::Gunshot)), None);
    }

    #[test]
    fn test_music_dedup_and_stop() {
        let mut mixer = AudioMixer::default();
        let out = mixer.mix_all([
            Cue::Music(MusicTrack::Field),
            Cue::Music(MusicTrack::Field),
            Cue::Music(MusicTrack::Boss),
            Cue::StopMusic,
            Cue::StopMusic,
        ]);
        assert_eq!(out.len(), 3);
        assert!(matches!(out[1], Playback::Music { track: MusicTrack::Boss, looping: true, .. }));
        assert_eq!(out[2], Playback::StopMusic);
        assert_eq!(mixer.current_music(), None);
    }
}
