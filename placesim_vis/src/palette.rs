use plotters::style::RGBColor;

// Viridis sampled at 0, 1/8, ..., 1.
const VIRIDIS_STOPS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

/// Map `v` in `[0, 1]` onto the viridis colormap (values outside are clamped).
pub fn viridis(v: f32) -> RGBColor {
    let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = v * (VIRIDIS_STOPS.len() - 1) as f32;
    let i = (scaled as usize).min(VIRIDIS_STOPS.len() - 2);
    let t = scaled - i as f32;

    let (r0, g0, b0) = VIRIDIS_STOPS[i];
    let (r1, g1, b1) = VIRIDIS_STOPS[i + 1];
    let lerp = |a: u8, b: u8| (a as f32 + t * (b as f32 - a as f32)).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_stops() {
        assert_eq!(viridis(0.0), RGBColor(68, 1, 84));
        assert_eq!(viridis(1.0), RGBColor(253, 231, 37));
        assert_eq!(viridis(2.0), viridis(1.0));
        assert_eq!(viridis(f32::NAN), viridis(0.0));
    }

    #[test]
    fn midpoint_is_between_neighbours() {
        let c = viridis(0.5);
        assert_eq!(c, RGBColor(33, 144, 141));
        let c = viridis(1.0 / 16.0);
        assert!(c.1 > 1 && c.1 < 44);
    }
}
