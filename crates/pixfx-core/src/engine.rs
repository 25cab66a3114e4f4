use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::color::{hsv_to_rgb, rgb_to_hsv};
use crate::effects::{EffectInstance, EffectType, ParameterValue, resolve_param};
use crate::error::{CoreError, Result};

// =============================================================================
// PixelEffect trait
// =============================================================================

/// Trait for pixel-processing effects. The process method receives an RGBA
/// buffer by value and returns the transformed buffer, so in-place effects
/// avoid allocating. Implementations are stateless across calls and never
/// touch the alpha channel.
pub trait PixelEffect: Send + Sync {
    /// Process a buffer, returning the modified buffer. Parameters are
    /// resolved against the effect's definitions: missing keys use the
    /// documented defaults, out-of-range values are clamped.
    fn process(&self, input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer;

    /// Returns true if the given parameters produce an identity transform
    /// (output == input). Used to skip processing in chains.
    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        let _ = params;
        false
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Apply a per-pixel RGB transform in place, row-parallel, preserving alpha.
/// The transform receives (r, g, b) as f64 and returns the new (r, g, b);
/// results are rounded and clamped to [0, 255].
fn map_rgb<F>(buffer: &mut PixelBuffer, f: F)
where
    F: Fn(f64, f64, f64) -> (f64, f64, f64) + Sync,
{
    if buffer.data.is_empty() {
        return;
    }
    let row_bytes = buffer.row_bytes();
    buffer
        .data
        .par_chunks_exact_mut(row_bytes)
        .for_each(|row| {
            for pixel in row.chunks_exact_mut(4) {
                let (r, g, b) = f(pixel[0] as f64, pixel[1] as f64, pixel[2] as f64);
                pixel[0] = r.round().clamp(0.0, 255.0) as u8;
                pixel[1] = g.round().clamp(0.0, 255.0) as u8;
                pixel[2] = b.round().clamp(0.0, 255.0) as u8;
                // alpha unchanged
            }
        });
}

/// 3x3 convolution over RGB, per channel. Kernel taps that fall outside the
/// buffer bounds are skipped, which darkens border pixels relative to the
/// interior. Alpha is copied from the source pixel.
fn convolve_3x3(input: &PixelBuffer, kernel: &[f64; 9]) -> PixelBuffer {
    let mut output = input.clone();
    if input.data.is_empty() {
        return output;
    }

    let w = input.width as i64;
    let h = input.height as i64;
    let src = &input.data;
    let row_bytes = input.row_bytes();

    output
        .data
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            for x in 0..w {
                let (mut r, mut g, mut b) = (0.0, 0.0, 0.0);
                for ky in -1..=1i64 {
                    for kx in -1..=1i64 {
                        let nx = x + kx;
                        let ny = y + ky;
                        if nx < 0 || nx >= w || ny < 0 || ny >= h {
                            continue;
                        }
                        let k = kernel[((ky + 1) * 3 + (kx + 1)) as usize];
                        let idx = ((ny * w + nx) * 4) as usize;
                        r += src[idx] as f64 * k;
                        g += src[idx + 1] as f64 * k;
                        b += src[idx + 2] as f64 * k;
                    }
                }
                let pi = (x * 4) as usize;
                row[pi] = r.round().clamp(0.0, 255.0) as u8;
                row[pi + 1] = g.round().clamp(0.0, 255.0) as u8;
                row[pi + 2] = b.round().clamp(0.0, 255.0) as u8;
                // alpha already copied from the source row
            }
        });

    output
}

// =============================================================================
// Built-in effects
// =============================================================================

/// Edge-enhancing 3x3 convolution. The kernel sums to more than one at any
/// positive intensity, so even a flat image brightens; there is no identity
/// setting.
pub struct SharpenEffect;

impl PixelEffect for SharpenEffect {
    fn process(&self, input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let intensity = resolve_param(EffectType::Sharpen, params, "intensity");
        let center = 4.0 + intensity / 25.0;
        let kernel = [0.0, -1.0, 0.0, -1.0, center, -1.0, 0.0, -1.0, 0.0];
        convolve_3x3(&input, &kernel)
    }
}

/// Directional relief via a diagonal 3x3 kernel. The opposing diagonal taps
/// cancel on flat regions, so interior pixels of a constant image pass
/// through unchanged.
pub struct EmbossEffect;

impl EmbossEffect {
    fn diagonal(params: &[(String, ParameterValue)]) -> f64 {
        let intensity = resolve_param(EffectType::Emboss, params, "intensity");
        let angle = resolve_param(EffectType::Emboss, params, "angle");
        angle.to_radians().cos() * intensity / 50.0
    }
}

impl PixelEffect for EmbossEffect {
    fn process(&self, input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let k = Self::diagonal(params);
        let kernel = [k, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -k];
        convolve_3x3(&input, &kernel)
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        Self::diagonal(params) == 0.0
    }
}

/// Uniform noise added to each color channel independently. A fresh draw is
/// taken per channel per pixel.
///
/// With `seed: None` (the default) the noise is non-deterministic. A seed
/// makes output reproducible for a given input, including across the
/// row-parallel split.
#[derive(Default)]
pub struct NoiseEffect {
    pub seed: Option<u64>,
}

impl NoiseEffect {
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl PixelEffect for NoiseEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let amount = resolve_param(EffectType::Noise, params, "amount");
        let size = resolve_param(EffectType::Noise, params, "size");
        let amplitude = amount / 100.0 * 255.0 * size;
        if amplitude == 0.0 || input.data.is_empty() {
            return input;
        }

        let row_bytes = input.row_bytes();
        let seed = self.seed;
        input
            .data
            .par_chunks_exact_mut(row_bytes)
            .enumerate()
            .for_each(|(row_idx, row)| {
                // Each row gets its own generator so parallel execution stays
                // reproducible under a fixed seed.
                let mut rng = match seed {
                    Some(s) => StdRng::seed_from_u64(s.wrapping_add(row_idx as u64)),
                    None => StdRng::from_os_rng(),
                };
                for pixel in row.chunks_exact_mut(4) {
                    for channel in pixel.iter_mut().take(3) {
                        let delta = (rng.random::<f64>() - 0.5) * amplitude;
                        *channel = (*channel as f64 + delta).round().clamp(0.0, 255.0) as u8;
                    }
                }
            });
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::Noise, params, "amount") == 0.0
    }
}

/// Radial darkening toward the corners: the multiplicative composite of a
/// black gradient running from transparent at the inner radius to
/// `intensity`% opacity at the image diagonal.
pub struct VignetteEffect;

impl PixelEffect for VignetteEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let intensity = resolve_param(EffectType::Vignette, params, "intensity") / 100.0;
        let size = resolve_param(EffectType::Vignette, params, "size");
        if intensity == 0.0 || input.data.is_empty() {
            return input;
        }

        let w = input.width as f64;
        let h = input.height as f64;
        let cx = w / 2.0;
        let cy = h / 2.0;
        let outer = (w * w + h * h).sqrt() / 2.0;
        let inner = outer * (1.0 - size / 100.0);
        let span = outer - inner;

        let row_bytes = input.row_bytes();
        input
            .data
            .par_chunks_exact_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                let dy = (y as f64 + 0.5) - cy;
                for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                    let dx = (x as f64 + 0.5) - cx;
                    let dist = (dx * dx + dy * dy).sqrt();
                    let t = if span > 0.0 {
                        ((dist - inner) / span).clamp(0.0, 1.0)
                    } else if dist >= inner {
                        1.0
                    } else {
                        0.0
                    };
                    let factor = 1.0 - t * intensity;
                    pixel[0] = (pixel[0] as f64 * factor).round() as u8;
                    pixel[1] = (pixel[1] as f64 * factor).round() as u8;
                    pixel[2] = (pixel[2] as f64 * factor).round() as u8;
                    // alpha unchanged
                }
            });
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::Vignette, params, "intensity") == 0.0
    }
}

/// Hue rotation and saturation scaling through an HSV round-trip.
pub struct ColorSplitEffect;

impl PixelEffect for ColorSplitEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let factor = resolve_param(EffectType::ColorSplit, params, "amount") / 100.0;
        let hue = resolve_param(EffectType::ColorSplit, params, "hue");
        map_rgb(&mut input, |r, g, b| {
            let (h, s, v) = rgb_to_hsv(r as u8, g as u8, b as u8);
            let (r2, g2, b2) = hsv_to_rgb((h + hue) % 360.0, s * factor, v);
            (r2 as f64, g2 as f64, b2 as f64)
        });
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        let factor = resolve_param(EffectType::ColorSplit, params, "amount") / 100.0;
        let hue = resolve_param(EffectType::ColorSplit, params, "hue");
        factor == 1.0 && hue % 360.0 == 0.0
    }
}

/// Tile the image into size×size blocks, each painted with the RGB of the
/// block's top-left pixel. Alpha keeps its per-pixel value.
pub struct MosaicEffect;

impl PixelEffect for MosaicEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let block = resolve_param(EffectType::Mosaic, params, "size").floor().max(1.0) as usize;
        if block <= 1 || input.data.is_empty() {
            return input;
        }

        let w = input.width as usize;
        let src = input.data.clone();
        let row_bytes = input.row_bytes();
        input
            .data
            .par_chunks_exact_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                let anchor_y = y - y % block;
                for x in 0..w {
                    let anchor_x = x - x % block;
                    let si = (anchor_y * w + anchor_x) * 4;
                    let pi = x * 4;
                    row[pi..pi + 3].copy_from_slice(&src[si..si + 3]);
                    // alpha unchanged
                }
            });
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::Mosaic, params, "size").floor() <= 1.0
    }
}

/// Signed additive offset per color channel, clamped.
pub struct ColorBalanceEffect;

impl PixelEffect for ColorBalanceEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let red = resolve_param(EffectType::ColorBalance, params, "red");
        let green = resolve_param(EffectType::ColorBalance, params, "green");
        let blue = resolve_param(EffectType::ColorBalance, params, "blue");
        map_rgb(&mut input, |r, g, b| (r + red, g + green, b + blue));
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::ColorBalance, params, "red") == 0.0
            && resolve_param(EffectType::ColorBalance, params, "green") == 0.0
            && resolve_param(EffectType::ColorBalance, params, "blue") == 0.0
    }
}

/// Exposure and contrast curve per channel: normalize, scale by
/// 2^(exposure/100), raise to (contrast+100)/100, rescale.
pub struct TonemapEffect;

impl PixelEffect for TonemapEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let exposure = resolve_param(EffectType::Tonemap, params, "exposure");
        let contrast = resolve_param(EffectType::Tonemap, params, "contrast");
        let exp_factor = (exposure / 100.0).exp2();
        let contrast_factor = (contrast + 100.0) / 100.0;
        map_rgb(&mut input, |r, g, b| {
            let curve = |c: f64| (c / 255.0 * exp_factor).powf(contrast_factor) * 255.0;
            (curve(r), curve(g), curve(b))
        });
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::Tonemap, params, "exposure") == 0.0
            && resolve_param(EffectType::Tonemap, params, "contrast") == 0.0
    }
}

/// Linear interpolation toward Rec. 601 luminance.
pub struct GrayscaleEffect;

impl PixelEffect for GrayscaleEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let amount = resolve_param(EffectType::Grayscale, params, "intensity") / 100.0;
        map_rgb(&mut input, |r, g, b| {
            let l = 0.299 * r + 0.587 * g + 0.114 * b;
            (r + (l - r) * amount, g + (l - g) * amount, b + (l - b) * amount)
        });
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::Grayscale, params, "intensity") == 0.0
    }
}

/// Linear interpolation toward the sepia color matrix.
pub struct SepiaEffect;

impl PixelEffect for SepiaEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let amount = resolve_param(EffectType::Sepia, params, "intensity") / 100.0;
        map_rgb(&mut input, |r, g, b| {
            let sr = 0.393 * r + 0.769 * g + 0.189 * b;
            let sg = 0.349 * r + 0.686 * g + 0.168 * b;
            let sb = 0.272 * r + 0.534 * g + 0.131 * b;
            (r + (sr - r) * amount, g + (sg - g) * amount, b + (sb - b) * amount)
        });
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::Sepia, params, "intensity") == 0.0
    }
}

/// Box blur. Intensity maps to a pixel radius of intensity/20 (rounded), the
/// same scale the original tool fed its blur filter; radius 0 is identity.
/// Out-of-bounds window taps are excluded from the mean.
pub struct BlurEffect;

impl BlurEffect {
    fn radius(params: &[(String, ParameterValue)]) -> i64 {
        (resolve_param(EffectType::Blur, params, "intensity") / 20.0).round() as i64
    }
}

impl PixelEffect for BlurEffect {
    fn process(&self, input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let radius = Self::radius(params);
        if radius == 0 || input.data.is_empty() {
            return input;
        }

        let w = input.width as i64;
        let h = input.height as i64;
        let src = input.data.clone();
        let mut output = input;
        let row_bytes = output.row_bytes();
        output
            .data
            .par_chunks_exact_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as i64;
                for x in 0..w {
                    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
                    let mut count = 0u64;
                    for ny in (y - radius).max(0)..=(y + radius).min(h - 1) {
                        for nx in (x - radius).max(0)..=(x + radius).min(w - 1) {
                            let idx = ((ny * w + nx) * 4) as usize;
                            r += src[idx] as u64;
                            g += src[idx + 1] as u64;
                            b += src[idx + 2] as u64;
                            count += 1;
                        }
                    }
                    let pi = (x * 4) as usize;
                    row[pi] = ((r + count / 2) / count) as u8;
                    row[pi + 1] = ((g + count / 2) / count) as u8;
                    row[pi + 2] = ((b + count / 2) / count) as u8;
                    // alpha unchanged
                }
            });
        output
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        Self::radius(params) == 0
    }
}

/// Multiplies RGB by intensity/100.
pub struct BrightnessEffect;

impl PixelEffect for BrightnessEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let factor = resolve_param(EffectType::Brightness, params, "intensity") / 100.0;
        map_rgb(&mut input, |r, g, b| (r * factor, g * factor, b * factor));
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::Brightness, params, "intensity") == 100.0
    }
}

/// Scales the distance from mid-gray by intensity/100.
pub struct ContrastEffect;

impl PixelEffect for ContrastEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let factor = resolve_param(EffectType::Contrast, params, "intensity") / 100.0;
        map_rgb(&mut input, |r, g, b| {
            let curve = |c: f64| (c - 127.5) * factor + 127.5;
            (curve(r), curve(g), curve(b))
        });
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::Contrast, params, "intensity") == 100.0
    }
}

/// Scales the distance from the pixel's luminance by intensity/100.
pub struct SaturateEffect;

impl PixelEffect for SaturateEffect {
    fn process(&self, mut input: PixelBuffer, params: &[(String, ParameterValue)]) -> PixelBuffer {
        let factor = resolve_param(EffectType::Saturate, params, "intensity") / 100.0;
        map_rgb(&mut input, |r, g, b| {
            let l = 0.299 * r + 0.587 * g + 0.114 * b;
            (l + (r - l) * factor, l + (g - l) * factor, l + (b - l) * factor)
        });
        input
    }

    fn is_identity(&self, params: &[(String, ParameterValue)]) -> bool {
        resolve_param(EffectType::Saturate, params, "intensity") == 100.0
    }
}

// =============================================================================
// Effect registry
// =============================================================================

/// Maps EffectType to its PixelEffect implementation. Built-in effects are
/// registered at construction; callers may override entries (e.g. a seeded
/// noise source for deterministic output).
pub struct EffectRegistry {
    effects: HashMap<EffectType, Box<dyn PixelEffect>>,
}

impl EffectRegistry {
    /// Create a registry with all built-in effects registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            effects: HashMap::new(),
        };
        registry.register(EffectType::Sharpen, Box::new(SharpenEffect));
        registry.register(EffectType::Emboss, Box::new(EmbossEffect));
        registry.register(EffectType::Noise, Box::new(NoiseEffect::default()));
        registry.register(EffectType::Vignette, Box::new(VignetteEffect));
        registry.register(EffectType::ColorSplit, Box::new(ColorSplitEffect));
        registry.register(EffectType::Mosaic, Box::new(MosaicEffect));
        registry.register(EffectType::ColorBalance, Box::new(ColorBalanceEffect));
        registry.register(EffectType::Tonemap, Box::new(TonemapEffect));
        registry.register(EffectType::Grayscale, Box::new(GrayscaleEffect));
        registry.register(EffectType::Sepia, Box::new(SepiaEffect));
        registry.register(EffectType::Blur, Box::new(BlurEffect));
        registry.register(EffectType::Brightness, Box::new(BrightnessEffect));
        registry.register(EffectType::Contrast, Box::new(ContrastEffect));
        registry.register(EffectType::Saturate, Box::new(SaturateEffect));
        registry
    }

    /// Look up the pixel effect implementation for a given type.
    pub fn get(&self, effect_type: &EffectType) -> Option<&dyn PixelEffect> {
        self.effects.get(effect_type).map(|e| e.as_ref())
    }

    /// Register (or replace) an effect implementation.
    pub fn register(&mut self, effect_type: EffectType, effect: Box<dyn PixelEffect>) {
        self.effects.insert(effect_type, effect);
    }

    /// Apply an effect by its string identifier. This is the entry point for
    /// external input: an unrecognized identifier fails with `UnknownEffect`,
    /// a malformed buffer with `InvalidBuffer`. Out-of-range parameter values
    /// are clamped, never rejected.
    pub fn apply(
        &self,
        effect_id: &str,
        buffer: PixelBuffer,
        params: &[(String, ParameterValue)],
    ) -> Result<PixelBuffer> {
        let effect_type: EffectType = effect_id.parse()?;
        buffer.validate()?;
        let effect = self
            .effects
            .get(&effect_type)
            .ok_or_else(|| CoreError::UnknownEffect(effect_id.to_string()))?;
        Ok(effect.process(buffer, params))
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// =============================================================================
// Chain functions
// =============================================================================

/// Run an ordered chain of effect instances over a buffer, skipping
/// instances whose parameters resolve to an identity transform. Instances
/// whose type has no registered implementation are skipped.
pub fn run_effect_chain(
    buffer: PixelBuffer,
    effects: &[EffectInstance],
    registry: &EffectRegistry,
) -> Result<PixelBuffer> {
    buffer.validate()?;
    let mut current = buffer;
    for effect in effects {
        if let Some(pixel_effect) = registry.get(&effect.effect_type) {
            if !pixel_effect.is_identity(&effect.parameters) {
                current = pixel_effect.process(current, &effect.parameters);
            }
        }
    }
    Ok(current)
}

/// Apply the same effect chain to many independent buffers in parallel.
/// Output order matches input order.
pub fn run_effect_chain_batch(
    buffers: Vec<PixelBuffer>,
    effects: &[EffectInstance],
    registry: &EffectRegistry,
) -> Result<Vec<PixelBuffer>> {
    buffers
        .into_par_iter()
        .map(|buffer| run_effect_chain(buffer, effects, registry))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height);
        for pixel in buf.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
        buf
    }

    fn float_params(pairs: &[(&str, f64)]) -> Vec<(String, ParameterValue)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), ParameterValue::Float(*v)))
            .collect()
    }

    // --- Sharpen ---

    #[test]
    fn test_sharpen_flat_interior_doubles_at_default() {
        // Default intensity 50: kernel center 6, sum 2 over a full window.
        let buf = flat(3, 3, [50, 50, 50, 200]);
        let result = SharpenEffect.process(buf, &[]);
        assert_eq!(result.pixel(1, 1), &[100, 100, 100, 200]);
    }

    #[test]
    fn test_sharpen_border_taps_skipped() {
        // Out-of-bounds taps simply drop out of the sum, so border pixels see
        // fewer negative taps than the interior.
        let buf = flat(3, 3, [50, 50, 50, 255]);
        let result = SharpenEffect.process(buf, &[]);
        // corner: 6*50 - 2*50 = 200; edge: 6*50 - 3*50 = 150
        assert_eq!(result.pixel(0, 0)[0], 200);
        assert_eq!(result.pixel(1, 0)[0], 150);
    }

    #[test]
    fn test_sharpen_preserves_alpha() {
        let buf = flat(4, 4, [10, 200, 90, 137]);
        let result = SharpenEffect.process(buf, &float_params(&[("intensity", 100.0)]));
        assert!(result.data.chunks_exact(4).all(|p| p[3] == 137));
    }

    #[test]
    fn test_sharpen_is_never_identity() {
        assert!(!SharpenEffect.is_identity(&float_params(&[("intensity", 0.0)])));
    }

    // --- Emboss ---

    #[test]
    fn test_emboss_zero_intensity_is_identity() {
        let buf = flat(3, 3, [80, 120, 160, 255]);
        let params = float_params(&[("intensity", 0.0)]);
        assert!(EmbossEffect.is_identity(&params));
        let expected = buf.data.clone();
        let result = EmbossEffect.process(buf, &params);
        assert_eq!(result.data, expected);
    }

    #[test]
    fn test_emboss_flat_interior_unchanged() {
        // The opposing diagonal taps cancel on constant regions.
        let buf = flat(3, 3, [50, 50, 50, 255]);
        let result = EmbossEffect.process(buf, &[]);
        assert_eq!(result.pixel(1, 1), &[50, 50, 50, 255]);
    }

    #[test]
    fn test_emboss_relief_at_borders() {
        // Default 45°: k = cos(45°) ≈ 0.7071. The top-left corner loses the
        // +k tap (50·(1−k) ≈ 15), the bottom-right loses −k (50·(1+k) ≈ 85).
        let buf = flat(3, 3, [50, 50, 50, 255]);
        let result = EmbossEffect.process(buf, &[]);
        assert_eq!(result.pixel(0, 0)[0], 15);
        assert_eq!(result.pixel(2, 2)[0], 85);
    }

    // --- Noise ---

    #[test]
    fn test_noise_zero_amount_is_exact_identity() {
        let buf = flat(8, 8, [90, 90, 90, 123]);
        let params = float_params(&[("amount", 0.0), ("size", 10.0)]);
        assert!(NoiseEffect::default().is_identity(&params));
        let expected = buf.data.clone();
        let result = NoiseEffect::default().process(buf, &params);
        assert_eq!(result.data, expected);
    }

    #[test]
    fn test_noise_changes_pixels() {
        let buf = flat(16, 16, [128, 128, 128, 255]);
        let before = buf.data.clone();
        let result = NoiseEffect::default().process(buf, &float_params(&[("amount", 100.0)]));
        assert_ne!(result.data, before);
    }

    #[test]
    fn test_noise_seeded_is_reproducible() {
        let buf = flat(16, 16, [128, 128, 128, 255]);
        let params = float_params(&[("amount", 50.0)]);
        let a = NoiseEffect::seeded(42).process(buf.clone(), &params);
        let b = NoiseEffect::seeded(42).process(buf.clone(), &params);
        assert_eq!(a.data, b.data);
        let c = NoiseEffect::seeded(43).process(buf, &params);
        assert_ne!(a.data, c.data);
    }

    #[test]
    fn test_noise_preserves_alpha() {
        let buf = flat(16, 16, [128, 128, 128, 77]);
        let result = NoiseEffect::default().process(buf, &float_params(&[("amount", 100.0)]));
        assert!(result.data.chunks_exact(4).all(|p| p[3] == 77));
    }

    // --- Vignette ---

    #[test]
    fn test_vignette_zero_intensity_is_identity() {
        let params = float_params(&[("intensity", 0.0)]);
        assert!(VignetteEffect.is_identity(&params));
    }

    #[test]
    fn test_vignette_darkens_corners_not_center() {
        // 16x16, size 50: the inner radius (4√2) covers the center pixels,
        // and the corner ramp factor works out to exactly 1/8.
        let buf = flat(16, 16, [200, 200, 200, 255]);
        let result =
            VignetteEffect.process(buf, &float_params(&[("intensity", 100.0), ("size", 50.0)]));
        assert_eq!(result.pixel(7, 7), &[200, 200, 200, 255]);
        assert_eq!(result.pixel(0, 0), &[25, 25, 25, 255]);
        assert_eq!(result.pixel(15, 15), &[25, 25, 25, 255]);
    }

    #[test]
    fn test_vignette_preserves_alpha() {
        let buf = flat(9, 5, [200, 10, 60, 91]);
        let result = VignetteEffect.process(buf, &float_params(&[("intensity", 100.0)]));
        assert!(result.data.chunks_exact(4).all(|p| p[3] == 91));
    }

    // --- Color split ---

    #[test]
    fn test_color_split_identity_settings_roundtrip() {
        // Full saturation, zero hue shift: HSV round-trip may move a channel
        // by at most one unit of rounding.
        let colors: [[u8; 4]; 5] = [
            [255, 0, 0, 255],
            [12, 200, 99, 255],
            [128, 128, 128, 255],
            [0, 255, 255, 255],
            [37, 42, 250, 255],
        ];
        let params = float_params(&[("amount", 100.0), ("hue", 0.0)]);
        assert!(ColorSplitEffect.is_identity(&params));
        for rgba in colors {
            let buf = flat(1, 1, rgba);
            let result = ColorSplitEffect.process(buf, &params);
            for c in 0..3 {
                let diff = (result.pixel(0, 0)[c] as i32 - rgba[c] as i32).abs();
                assert!(diff <= 1, "channel {c} of {rgba:?} moved by {diff}");
            }
        }
    }

    #[test]
    fn test_color_split_hue_rotation() {
        // Red rotated 180° lands on cyan.
        let buf = flat(1, 1, [255, 0, 0, 255]);
        let result =
            ColorSplitEffect.process(buf, &float_params(&[("amount", 100.0), ("hue", 180.0)]));
        assert_eq!(result.pixel(0, 0), &[0, 255, 255, 255]);
    }

    #[test]
    fn test_color_split_zero_amount_desaturates() {
        let buf = flat(2, 2, [200, 40, 90, 255]);
        let result =
            ColorSplitEffect.process(buf, &float_params(&[("amount", 0.0), ("hue", 0.0)]));
        let px = result.pixel(0, 0);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    // --- Mosaic ---

    #[test]
    fn test_mosaic_size_one_is_identity() {
        let params = float_params(&[("size", 1.0)]);
        assert!(MosaicEffect.is_identity(&params));

        let mut buf = PixelBuffer::new(3, 2);
        for (i, pixel) in buf.data.chunks_exact_mut(4).enumerate() {
            pixel.copy_from_slice(&[i as u8, 10 + i as u8, 20 + i as u8, 255]);
        }
        let expected = buf.data.clone();
        let result = MosaicEffect.process(buf, &params);
        assert_eq!(result.data, expected);
    }

    #[test]
    fn test_mosaic_blocks_take_top_left_rgb() {
        let mut buf = PixelBuffer::new(4, 2);
        for (i, pixel) in buf.data.chunks_exact_mut(4).enumerate() {
            pixel.copy_from_slice(&[10 * i as u8, 0, 0, 200 + i as u8]);
        }
        let result = MosaicEffect.process(buf, &float_params(&[("size", 2.0)]));
        // Left block anchored at (0,0), right block at (2,0).
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert_eq!(result.pixel(x, y)[0], 0, "({x},{y})");
        }
        for (x, y) in [(2, 0), (3, 0), (2, 1), (3, 1)] {
            assert_eq!(result.pixel(x, y)[0], 20, "({x},{y})");
        }
        // Per-pixel alpha survives the block fill.
        for i in 0..8u32 {
            let (x, y) = (i % 4, i / 4);
            assert_eq!(result.pixel(x, y)[3], 200 + i as u8);
        }
    }

    #[test]
    fn test_mosaic_fractional_size_floors() {
        assert!(MosaicEffect.is_identity(&float_params(&[("size", 1.9)])));
        assert!(!MosaicEffect.is_identity(&float_params(&[("size", 2.1)])));
    }

    // --- Color balance ---

    #[test]
    fn test_color_balance_offsets_and_clamps() {
        let buf = flat(2, 2, [100, 100, 100, 255]);
        let result = ColorBalanceEffect.process(buf, &float_params(&[("red", 50.0)]));
        assert!(result
            .data
            .chunks_exact(4)
            .all(|p| p == &[150, 100, 100, 255]));

        let result = ColorBalanceEffect.process(result, &float_params(&[("red", 200.0)]));
        assert!(result
            .data
            .chunks_exact(4)
            .all(|p| p == &[255, 100, 100, 255]));
    }

    #[test]
    fn test_color_balance_negative_clamps_at_zero() {
        let buf = flat(1, 1, [30, 90, 200, 255]);
        let result = ColorBalanceEffect.process(
            buf,
            &float_params(&[("red", -100.0), ("green", -100.0), ("blue", -100.0)]),
        );
        assert_eq!(result.pixel(0, 0), &[0, 0, 100, 255]);
    }

    // --- Tonemap ---

    #[test]
    fn test_tonemap_neutral_is_identity() {
        let params = float_params(&[("exposure", 0.0), ("contrast", 0.0)]);
        assert!(TonemapEffect.is_identity(&params));
        let buf = flat(2, 2, [0, 100, 255, 128]);
        let expected = buf.data.clone();
        let result = TonemapEffect.process(buf, &params);
        assert_eq!(result.data, expected);
    }

    #[test]
    fn test_tonemap_exposure_doubles() {
        let buf = flat(1, 1, [64, 200, 0, 255]);
        let result = TonemapEffect.process(buf, &float_params(&[("exposure", 100.0)]));
        // 64 → 128; 200 → 400 clamped; 0 stays 0.
        assert_eq!(result.pixel(0, 0), &[128, 255, 0, 255]);
    }

    #[test]
    fn test_tonemap_contrast_floor_flattens_to_white() {
        // (contrast+100)/100 = 0: every normalized value, including zero,
        // raised to the zeroth power is one.
        let buf = flat(1, 1, [0, 100, 255, 64]);
        let result = TonemapEffect.process(buf, &float_params(&[("contrast", -100.0)]));
        assert_eq!(result.pixel(0, 0), &[255, 255, 255, 64]);
    }

    // --- Basic filter effects ---

    #[test]
    fn test_grayscale_full_red_to_luma() {
        let buf = flat(1, 1, [255, 0, 0, 255]);
        let result = GrayscaleEffect.process(buf, &[]);
        // 0.299 * 255 = 76.245 → 76
        assert_eq!(result.pixel(0, 0), &[76, 76, 76, 255]);
    }

    #[test]
    fn test_grayscale_zero_is_identity() {
        let params = float_params(&[("intensity", 0.0)]);
        assert!(GrayscaleEffect.is_identity(&params));
    }

    #[test]
    fn test_sepia_white_at_full_strength() {
        let buf = flat(1, 1, [255, 255, 255, 255]);
        let result = SepiaEffect.process(buf, &[]);
        // Red and green rows clamp; blue row sums to 0.937.
        assert_eq!(result.pixel(0, 0), &[255, 255, 239, 255]);
    }

    #[test]
    fn test_brightness_scales_channels() {
        let buf = flat(1, 1, [100, 150, 200, 255]);
        let result = BrightnessEffect.process(buf, &float_params(&[("intensity", 50.0)]));
        assert_eq!(result.pixel(0, 0), &[50, 75, 100, 255]);
        assert!(BrightnessEffect.is_identity(&float_params(&[("intensity", 100.0)])));
    }

    #[test]
    fn test_contrast_zero_flattens_to_mid_gray() {
        let buf = flat(1, 1, [0, 100, 255, 255]);
        let result = ContrastEffect.process(buf, &float_params(&[("intensity", 0.0)]));
        assert_eq!(result.pixel(0, 0), &[128, 128, 128, 255]);
        assert!(ContrastEffect.is_identity(&float_params(&[("intensity", 100.0)])));
    }

    #[test]
    fn test_saturate_zero_matches_luma() {
        let buf = flat(1, 1, [255, 0, 0, 255]);
        let result = SaturateEffect.process(buf, &float_params(&[("intensity", 0.0)]));
        assert_eq!(result.pixel(0, 0), &[76, 76, 76, 255]);
        assert!(SaturateEffect.is_identity(&float_params(&[("intensity", 100.0)])));
    }

    #[test]
    fn test_blur_below_half_pixel_is_identity() {
        assert!(BlurEffect.is_identity(&float_params(&[("intensity", 9.0)])));
        assert!(!BlurEffect.is_identity(&float_params(&[("intensity", 10.0)])));
    }

    #[test]
    fn test_blur_flat_image_unchanged() {
        let buf = flat(8, 8, [90, 14, 200, 255]);
        let expected = buf.data.clone();
        let result = BlurEffect.process(buf, &float_params(&[("intensity", 100.0)]));
        assert_eq!(result.data, expected);
    }

    #[test]
    fn test_blur_averages_window() {
        // 3x1 row [0, 255, 0] at radius 1.
        let buf = PixelBuffer::from_rgba_vec(
            3,
            1,
            vec![0, 0, 0, 255, 255, 255, 255, 255, 0, 0, 0, 255],
        )
        .unwrap();
        let result = BlurEffect.process(buf, &float_params(&[("intensity", 20.0)]));
        assert_eq!(result.pixel(0, 0)[0], 128);
        assert_eq!(result.pixel(1, 0)[0], 85);
        assert_eq!(result.pixel(2, 0)[0], 128);
    }

    // --- Registry ---

    #[test]
    fn test_registry_has_all_builtins() {
        let registry = EffectRegistry::with_builtins();
        for effect_type in EffectType::all_builtin() {
            assert!(registry.get(&effect_type).is_some(), "{effect_type:?}");
        }
    }

    #[test]
    fn test_registry_apply_by_id() {
        let registry = EffectRegistry::with_builtins();
        let buf = flat(2, 2, [100, 100, 100, 255]);
        let result = registry
            .apply("colorBalance", buf, &float_params(&[("red", 50.0)]))
            .unwrap();
        assert_eq!(result.pixel(0, 0), &[150, 100, 100, 255]);
    }

    #[test]
    fn test_registry_apply_unknown_effect() {
        let registry = EffectRegistry::with_builtins();
        let err = registry
            .apply("swirl", flat(1, 1, [0, 0, 0, 0]), &[])
            .unwrap_err();
        match err {
            CoreError::UnknownEffect(name) => assert_eq!(name, "swirl"),
            other => panic!("expected UnknownEffect, got: {other}"),
        }
    }

    #[test]
    fn test_registry_apply_invalid_buffer() {
        let registry = EffectRegistry::with_builtins();
        let mut buf = flat(2, 2, [0, 0, 0, 0]);
        buf.data.pop();
        let err = registry.apply("sharpen", buf, &[]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBuffer { .. }));
    }

    #[test]
    fn test_registry_apply_clamps_out_of_range_params() {
        let registry = EffectRegistry::with_builtins();
        let buf = flat(1, 1, [100, 100, 100, 255]);
        let result = registry
            .apply("colorBalance", buf, &float_params(&[("red", 999.0)]))
            .unwrap();
        // Clamped to +255, then the channel itself clamps at 255.
        assert_eq!(result.pixel(0, 0), &[255, 100, 100, 255]);
    }

    #[test]
    fn test_registry_seeded_noise_override() {
        let mut registry = EffectRegistry::with_builtins();
        registry.register(EffectType::Noise, Box::new(NoiseEffect::seeded(7)));
        let buf = flat(8, 8, [128, 128, 128, 255]);
        let a = registry.apply("noise", buf.clone(), &[]).unwrap();
        let b = registry.apply("noise", buf, &[]).unwrap();
        assert_eq!(a.data, b.data);
    }

    // --- Chains ---

    #[test]
    fn test_chain_empty_returns_input() {
        let registry = EffectRegistry::with_builtins();
        let buf = flat(2, 2, [1, 2, 3, 4]);
        let expected = buf.data.clone();
        let result = run_effect_chain(buf, &[], &registry).unwrap();
        assert_eq!(result.data, expected);
    }

    #[test]
    fn test_chain_skips_identity_instances() {
        let registry = EffectRegistry::with_builtins();
        let buf = flat(4, 4, [60, 110, 160, 255]);
        let expected = buf.data.clone();

        let mut emboss = EffectInstance::new(EffectType::Emboss);
        emboss.set_float("intensity", 0.0);
        let contrast = EffectInstance::new(EffectType::Contrast); // default 100 = identity
        let mut noise = EffectInstance::new(EffectType::Noise);
        noise.set_float("amount", 0.0);

        let result = run_effect_chain(buf, &[emboss, contrast, noise], &registry).unwrap();
        assert_eq!(result.data, expected);
    }

    #[test]
    fn test_chain_order_matters() {
        let registry = EffectRegistry::with_builtins();
        let buf = flat(1, 1, [200, 30, 30, 255]);

        let grayscale = EffectInstance::new(EffectType::Grayscale);
        let mut balance = EffectInstance::new(EffectType::ColorBalance);
        balance.set_float("red", 100.0);

        let a = run_effect_chain(
            buf.clone(),
            &[grayscale.clone(), balance.clone()],
            &registry,
        )
        .unwrap();
        let b = run_effect_chain(buf, &[balance, grayscale], &registry).unwrap();
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn test_chain_rejects_invalid_buffer() {
        let registry = EffectRegistry::with_builtins();
        let mut buf = flat(2, 2, [0, 0, 0, 0]);
        buf.data.truncate(3);
        let err = run_effect_chain(buf, &[], &registry).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBuffer { .. }));
    }

    // --- Batch ---

    #[test]
    fn test_batch_matches_single_runs_in_order() {
        let registry = EffectRegistry::with_builtins();
        let mut brightness = EffectInstance::new(EffectType::Brightness);
        brightness.set_float("intensity", 50.0);
        let chain = vec![brightness];

        let buffers = vec![
            flat(2, 2, [100, 100, 100, 255]),
            flat(3, 1, [200, 60, 20, 255]),
            flat(1, 4, [50, 50, 50, 10]),
        ];
        let singles: Vec<PixelBuffer> = buffers
            .iter()
            .map(|b| run_effect_chain(b.clone(), &chain, &registry).unwrap())
            .collect();
        let batch = run_effect_chain_batch(buffers, &chain, &registry).unwrap();
        assert_eq!(batch.len(), singles.len());
        for (got, want) in batch.iter().zip(&singles) {
            assert_eq!(got.data, want.data);
        }
    }
}
