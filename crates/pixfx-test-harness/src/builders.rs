use pixfx_core::buffer::PixelBuffer;
use pixfx_core::effects::{EffectInstance, EffectType};

/// Builder for test pixel buffers with sensible defaults.
pub struct BufferBuilder {
    width: u32,
    height: u32,
    fill: [u8; 4],
    pixels: Vec<(u32, u32, [u8; 4])>,
}

impl BufferBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fill: [128, 128, 128, 255],
            pixels: Vec::new(),
        }
    }

    /// Flood the buffer with a single RGBA value (default mid-gray opaque).
    pub fn fill(mut self, rgba: [u8; 4]) -> Self {
        self.fill = rgba;
        self
    }

    /// Override a single pixel after the fill.
    pub fn pixel(mut self, x: u32, y: u32, rgba: [u8; 4]) -> Self {
        self.pixels.push((x, y, rgba));
        self
    }

    pub fn build(self) -> PixelBuffer {
        let mut buf = PixelBuffer::new(self.width, self.height);
        for pixel in buf.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&self.fill);
        }
        for (x, y, rgba) in self.pixels {
            buf.pixel_mut(x, y).copy_from_slice(&rgba);
        }
        buf
    }
}

/// A flat mid-gray opaque buffer.
pub fn mid_gray(width: u32, height: u32) -> PixelBuffer {
    BufferBuilder::new(width, height).build()
}

/// A buffer where every pixel differs: channels derived from the pixel
/// index, alpha cycling through 1..=255 so alpha-preservation bugs show up.
pub fn varied(width: u32, height: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(width, height);
    for (i, pixel) in buf.data.chunks_exact_mut(4).enumerate() {
        pixel[0] = (i * 7 % 256) as u8;
        pixel[1] = (i * 13 % 256) as u8;
        pixel[2] = (i * 29 % 256) as u8;
        pixel[3] = (i % 255) as u8 + 1;
    }
    buf
}

/// Builder for effect instances in tests.
pub struct EffectBuilder {
    instance: EffectInstance,
}

impl EffectBuilder {
    pub fn new(effect_type: EffectType) -> Self {
        Self {
            instance: EffectInstance::new(effect_type),
        }
    }

    /// Set a float parameter. Panics on a name the effect doesn't define,
    /// which in a test means the test itself is wrong.
    pub fn param(mut self, name: &str, value: f64) -> Self {
        assert!(
            self.instance.set_float(name, value),
            "effect {:?} has no parameter named {name}",
            self.instance.effect_type
        );
        self
    }

    pub fn build(self) -> EffectInstance {
        self.instance
    }
}
