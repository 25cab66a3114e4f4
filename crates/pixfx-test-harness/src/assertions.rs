use pixfx_core::buffer::PixelBuffer;

/// Assert two buffers have the same dimensions.
pub fn assert_same_dimensions(a: &PixelBuffer, b: &PixelBuffer) {
    assert_eq!(
        (a.width, a.height),
        (b.width, b.height),
        "buffer dimensions differ: {}x{} vs {}x{}",
        a.width,
        a.height,
        b.width,
        b.height
    );
}

/// Assert that every alpha byte is exactly unchanged between two buffers.
pub fn assert_alpha_unchanged(before: &PixelBuffer, after: &PixelBuffer) {
    assert_same_dimensions(before, after);
    for (i, (a, b)) in before
        .data
        .chunks_exact(4)
        .zip(after.data.chunks_exact(4))
        .enumerate()
    {
        assert_eq!(
            a[3], b[3],
            "alpha changed at pixel {i}: {} -> {}",
            a[3], b[3]
        );
    }
}

/// Assert every channel of every pixel matches within a tolerance.
pub fn assert_rgb_within(a: &PixelBuffer, b: &PixelBuffer, tolerance: u8) {
    assert_same_dimensions(a, b);
    for (i, (pa, pb)) in a
        .data
        .chunks_exact(4)
        .zip(b.data.chunks_exact(4))
        .enumerate()
    {
        for c in 0..3 {
            let diff = (pa[c] as i32 - pb[c] as i32).unsigned_abs();
            assert!(
                diff <= tolerance as u32,
                "channel {c} of pixel {i} differs by {diff}: {} vs {}",
                pa[c],
                pb[c]
            );
        }
    }
}

/// Assert every pixel of a buffer equals the given RGBA value.
pub fn assert_all_pixels(buf: &PixelBuffer, rgba: [u8; 4]) {
    for (i, pixel) in buf.data.chunks_exact(4).enumerate() {
        assert_eq!(pixel, &rgba, "pixel {i} is {pixel:?}, expected {rgba:?}");
    }
}

/// Assert the buffer is fully desaturated (r == g == b everywhere).
pub fn assert_grayscale(buf: &PixelBuffer) {
    for (i, pixel) in buf.data.chunks_exact(4).enumerate() {
        assert!(
            pixel[0] == pixel[1] && pixel[1] == pixel[2],
            "pixel {i} is not gray: {pixel:?}"
        );
    }
}
