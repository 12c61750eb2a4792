//! Millimeter to internal unit conversion.
//!
//! Schematic coordinates are stored as `i32` internal units (IU) of 100 nm.
//! Values read from a document are clamped so that the sum of two coordinates
//! can never overflow an `i32`.

/// Internal units per millimeter
pub const IU_PER_MM: f64 = 10_000.0;

/// Internal units per mil (1/1000 inch)
pub const IU_PER_MILS: f64 = IU_PER_MM * 0.0254;

/// Default line thickness in mils
pub const DEFAULT_LINE_WIDTH_MILS: i32 = 6;

/// Largest magnitude a parsed coordinate may take, roughly `i32::MAX / sqrt(2)`
pub const IU_LIMIT: f64 = i32::MAX as f64 * 0.7071;

/// Convert millimeters to internal units, clamping to `±IU_LIMIT` and rounding
/// half away from zero.
pub fn mm_to_iu(mm: f64) -> i32 {
    let iu = mm * IU_PER_MM;
    // NaN never reaches here, the number parser rejects it
    iu.clamp(-IU_LIMIT, IU_LIMIT).round() as i32
}

pub fn iu_to_mm(iu: i32) -> f64 {
    f64::from(iu) / IU_PER_MM
}

pub fn mils_to_iu(mils: i32) -> i32 {
    (f64::from(mils) * IU_PER_MILS).round() as i32
}

/// Default stroke width in internal units
pub fn default_line_width() -> i32 {
    mils_to_iu(DEFAULT_LINE_WIDTH_MILS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(0.0, 0)]
    #[case(1.0, 10_000)]
    #[case(2.54, 25_400)]
    #[case(-1.27, -12_700)]
    #[case(0.00006, 1)]
    #[case(-0.00006, -1)]
    #[case(0.00004, 0)]
    fn converts_mm(#[case] mm: f64, #[case] iu: i32) {
        assert_eq!(mm_to_iu(mm), iu);
    }

    #[rstest]
    #[case(1.0e9)]
    #[case(f64::MAX)]
    #[case(f64::INFINITY)]
    fn clamps_large_values(#[case] mm: f64) {
        let limit = IU_LIMIT.round() as i32;
        assert_eq!(mm_to_iu(mm), limit);
        assert_eq!(mm_to_iu(-mm), -limit);
    }

    #[test]
    fn clamped_coordinates_compose_without_overflow() {
        let limit = mm_to_iu(1.0e12) as f64;
        let diagonal = (limit * limit + limit * limit).sqrt();
        assert!(diagonal <= i32::MAX as f64);
    }

    #[rstest]
    #[case(12.345678)]
    #[case(-203.2)]
    #[case(0.1)]
    #[case(150_000.0)]
    fn round_trip_within_one_unit(#[case] mm: f64) {
        let back = iu_to_mm(mm_to_iu(mm));
        assert!((back - mm).abs() <= 1.0 / IU_PER_MM);
    }

    #[test]
    fn default_width_is_six_mils() {
        assert_eq!(default_line_width(), 1524);
    }
}
