//! Ability variants.
//!
//! Characters:
//! - [`aura`]: persistent damaging ring with knockback (vanguard)
//! - [`ranged`]: cooldown-gated bolts with accuracy spread (ranger)
//! - [`boomerang`]: fixed-heading blades that return to the thrower (glaive)
//! - [`puddle`]: thrown flasks leaving slowing hazards (alchemist)
//! - [`starfall`]: falling stars with area impact and confusion (astromancer)
//!
//! Enemies:
//! - [`chaser`]: contact damage, optionally poisoning or bleeding
//! - [`reflector`]: reflects damage until its shield is exhausted
//! - [`regenerator`]: heals on a fixed interval
//! - [`bomber`]: delayed self-destruct
//! - [`overlord`]: boss with shard volleys, meteors and an enrage phase
//!
//! Tuning values are per variant; similar abilities deliberately do not
//! share knockback or crowd-control constants.

pub mod aura;
pub mod bomber;
pub mod boomerang;
pub mod chaser;
pub mod common;
pub mod overlord;
pub mod puddle;
pub mod ranged;
pub mod reflector;
pub mod regenerator;
pub mod starfall;

pub use aura::AuraTuning;
pub use bomber::BomberTuning;
pub use boomerang::BoomerangTuning;
pub use chaser::ChaserTuning;
pub use overlord::OverlordTuning;
pub use puddle::PuddleTuning;
pub use ranged::RangedTuning;
pub use reflector::ReflectorTuning;
pub use regenerator::RegeneratorTuning;
pub use starfall::StarfallTuning;
