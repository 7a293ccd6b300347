//! Fire-and-forget sound samples.
//!
//! Mixing is not this crate's business: workers name the sample they want
//! and a [`Sampler`] decides what to do with it.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Monster grid stepped a cell
    MonsterStep,
    /// Bonus ship (re)appeared
    BonusShip,
    /// Player fired
    Shoot,
    /// Monster destroyed
    MonsterKilled,
    /// Spaceship hit
    ShipHit,
}

impl SoundEffect {
    pub fn sample(&self) -> &'static str {
        match self {
            SoundEffect::MonsterStep => "fastinvader1.wav",
            SoundEffect::BonusShip => "ufo_highpitch.wav",
            SoundEffect::Shoot => "shoot.wav",
            SoundEffect::MonsterKilled => "invaderkilled.wav",
            SoundEffect::ShipHit => "explosion.wav",
        }
    }
}

pub trait Sampler: Send + Sync {
    fn play(&self, effect: SoundEffect);
}

/// Logs every sample at `trace` level instead of playing it.
#[derive(Debug, Default)]
pub struct LogSampler;

impl Sampler for LogSampler {
    fn play(&self, effect: SoundEffect) {
        log::trace!("play sample {}", effect.sample());
    }
}
