//! HORAY tissue interaction model.
//!
//! Every scanline carries a pulse that starts at the probe's gain. Walking the points near to
//! far, each point inside an organ echoes part of the remaining pulse back as brightness, and
//! the pulse loses energy in proportion to the organ's echogenicity and attenuation. Deep
//! points behind strong reflectors therefore appear dark.

use super::frame::ScanFrame;
use crate::scene::{OrganId, SceneQuery, is_contained};
use crate::math::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Brightness lost per unit of attenuation at the echoing point itself.
pub const ATTENUATION_DARKENING: f32 = 0.02;

/// Echo brightness of a point hit by `pulse`.
pub fn echo_brightness(pulse: f32, echogenicity: f32, attenuation: f32) -> f32 {
    (pulse * echogenicity - ATTENUATION_DARKENING * attenuation).clamp(0.0, 1.0)
}

/// Pulse left after traversing one sample of tissue. Never negative.
pub fn attenuate_pulse(
    pulse: f32,
    echogenicity: f32,
    attenuation: f32,
    points_per_scanline: usize,
) -> f32 {
    (pulse - (echogenicity + attenuation) / points_per_scanline.max(1) as f32).max(0.0)
}

/// Shades every point of `frame` against `candidates`, returning how many points echoed.
///
/// When several candidates contain a point, the one listed last determines its echo.
pub fn shade_points(frame: &mut ScanFrame, scene: &dyn SceneQuery, candidates: &[OrganId]) -> usize {
    if candidates.is_empty() {
        return 0;
    }

    let gain = frame.config().gain();
    let points_per_scanline = frame.config().points_per_scanline();
    let mut echoes = 0;

    for scanline in frame.scanlines_mut() {
        let mut pulse = gain;
        for point in scanline.points_mut() {
            let position = point.world_position();
            let hit = candidates
                .iter()
                .copied()
                .filter(|&organ| is_contained(scene, organ, position))
                .last();
            let Some(organ) = hit else {
                continue;
            };
            let Some(material) = scene.material(organ) else {
                log::trace!("{organ} has no material, skipping echo");
                continue;
            };

            point.set_echo(
                organ,
                echo_brightness(pulse, material.echogenicity, material.attenuation),
                material.color,
            );
            pulse = attenuate_pulse(
                pulse,
                material.echogenicity,
                material.attenuation,
                points_per_scanline,
            );
            echoes += 1;
        }
    }
    echoes
}

/// Golden-ratio multiplier spreading the `z` bits over the whole seed.
const Z_SEED_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic value in [0, 1) derived from a world position.
///
/// The position's bit pattern seeds a ChaCha8 stream, so the value is stable across
/// platforms and toolchains.
fn position_seed(position: Vec3) -> f32 {
    let seed = ((position.x.to_bits() as u64) << 32 | position.y.to_bits() as u64)
        ^ (position.z.to_bits() as u64).wrapping_mul(Z_SEED_MULTIPLIER);
    ChaCha8Rng::seed_from_u64(seed).gen_range(0.0..1.0)
}

/// Blends each point toward a per-position pseudo-random value by the configured noise level.
///
/// The same pose always produces the same noise pattern.
pub fn apply_noise(frame: &mut ScanFrame) {
    let level = frame.config().noise_level();
    if level <= 0.0 {
        return;
    }
    for scanline in frame.scanlines_mut() {
        for point in scanline.points_mut() {
            let seed = position_seed(point.world_position());
            let brightness = point.brightness();
            point.set_brightness(brightness + (seed - brightness) * level);
        }
    }
}
