//! RGB ⇄ HSV conversion used by the color-split effect.

/// Convert an 8-bit RGB triple to HSV. H ∈ [0, 360), S and V ∈ [0, 1].
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let v = max;
    let s = if max == 0.0 { 0.0 } else { diff / max };

    let mut h = 0.0;
    if diff != 0.0 {
        h = if max == r {
            60.0 * ((g - b) / diff + if g < b { 6.0 } else { 0.0 })
        } else if max == g {
            60.0 * ((b - r) / diff + 2.0)
        } else {
            60.0 * ((r - g) / diff + 4.0)
        };
    }

    (h, s, v)
}

/// Convert HSV back to 8-bit RGB using six-sector hue reconstruction.
/// H is interpreted modulo 360.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}
