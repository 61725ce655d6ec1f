//! Tick to sqrt price conversion.
//!
//! `sqrt_price_x96(tick) = sqrt(1.0001^tick) * 2^96`, evaluated with the
//! canonical table of 128-bit magic factors so results are bit-exact with
//! on-chain pools.

use crate::error::DomainError;
use primitive_types::U256;

/// Lowest tick with a representable sqrt price.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick with a representable sqrt price.
pub const MAX_TICK: i32 = 887_272;

/// `sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U256 = U256([4_295_128_739, 0, 0, 0]);
/// `sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U256 = U256([0x5d95_1d52_6398_8d26, 0xefd1_fc6a_5064_8849, 0xfffd_8963, 0]);

/// `2^128 / sqrt(1.0001^(2^i))` for i = 1..=19, as Q128.128.
const RATIO_FACTORS: [(u32, u128); 19] = [
    (0x2, 0xfff9_7272_373d_4132_59a4_6990_580e_213a),
    (0x4, 0xfff2_e50f_5f65_6932_ef12_357c_f3c7_fdcc),
    (0x8, 0xffe5_caca_7e10_e4e6_1c36_24ea_a094_1cd0),
    (0x10, 0xffcb_9843_d60f_6159_c9db_5883_5c92_6644),
    (0x20, 0xff97_3b41_fa98_c081_472e_6896_dfb2_54c0),
    (0x40, 0xff2e_a164_66c9_6a38_43ec_78b3_26b5_2861),
    (0x80, 0xfe5d_ee04_6a99_a2a8_11c4_61f1_969c_3053),
    (0x100, 0xfcbe_86c7_900a_88ae_dcff_c83b_479a_a3a4),
    (0x200, 0xf987_a725_3ac4_1317_6f2b_074c_f781_5e54),
    (0x400, 0xf339_2b08_22b7_0005_940c_7a39_8e4b_70f3),
    (0x800, 0xe715_9475_a2c2_9b74_43b2_9c7f_a6e8_89d9),
    (0x1000, 0xd097_f3bd_fd20_22b8_845a_d8f7_92aa_5825),
    (0x2000, 0xa9f7_4646_2d87_0fdf_8a65_dc1f_90e0_61e5),
    (0x4000, 0x70d8_69a1_56d2_a1b8_90bb_3df6_2baf_32f7),
    (0x8000, 0x31be_135f_97d0_8fd9_8123_1505_542f_cfa6),
    (0x10000, 0x9aa_508b_5b7a_84e1_c677_de54_f3e9_9bc9),
    (0x20000, 0x5d_6af8_dedb_8119_6699_c329_225e_e604),
    (0x40000, 0x2216_e584_f5fa_1ea9_2604_1bed_fe98),
    (0x80000, 0x48a_1703_91f7_dc42_444e_8fa2),
];

/// Returns the Q64.96 sqrt price at `tick`.
///
/// # Errors
/// [`DomainError::TickOutOfBounds`] when `|tick| > MAX_TICK`.
pub fn sqrt_ratio_at_tick(tick: i32) -> Result<U256, DomainError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK.unsigned_abs() {
        return Err(DomainError::TickOutOfBounds(tick));
    }

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffc_b933_bd6f_ad37_aa2d_162d_1a59_4001u128)
    } else {
        U256::one() << 128
    };
    for (mask, factor) in RATIO_FACTORS {
        if abs_tick & mask != 0 {
            ratio = (ratio * U256::from(factor)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up so the result is never below the true price.
    let shifted = ratio >> 32;
    if (ratio & U256::from(u32::MAX)).is_zero() {
        Ok(shifted)
    } else {
        Ok(shifted + U256::one())
    }
}

/// Returns the greatest tick whose sqrt price is `<= sqrt_price_x96`.
///
/// # Errors
/// [`DomainError::SqrtPriceOutOfBounds`] outside `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
pub fn tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, DomainError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(DomainError::SqrtPriceOutOfBounds(sqrt_price_x96));
    }

    let (mut low, mut high) = (MIN_TICK, MAX_TICK);
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    Ok(low)
}

/// Rounds `tick` down to a multiple of `spacing`.
pub fn floor_to_spacing(tick: i32, spacing: i32) -> i32 {
    tick.div_euclid(spacing) * spacing
}

/// Validates a `[lower, upper)` tick range.
pub fn check_ticks(tick_lower: i32, tick_upper: i32) -> Result<(), DomainError> {
    if tick_lower >= tick_upper {
        return Err(DomainError::InvalidTickRange {
            lower: tick_lower,
            upper: tick_upper,
        });
    }
    if tick_lower < MIN_TICK {
        return Err(DomainError::TickOutOfBounds(tick_lower));
    }
    if tick_upper > MAX_TICK {
        return Err(DomainError::TickOutOfBounds(tick_upper));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Q96;

    #[test]
    fn test_bounds_match_canonical_constants() {
        assert_eq!(sqrt_ratio_at_tick(MIN_TICK).unwrap(), MIN_SQRT_RATIO);
        assert_eq!(sqrt_ratio_at_tick(MAX_TICK).unwrap(), MAX_SQRT_RATIO);
        assert_eq!(sqrt_ratio_at_tick(0).unwrap(), Q96);
    }

    #[test]
    fn test_out_of_bounds_tick() {
        assert_eq!(
            sqrt_ratio_at_tick(MAX_TICK + 1),
            Err(DomainError::TickOutOfBounds(MAX_TICK + 1))
        );
        assert!(sqrt_ratio_at_tick(MIN_TICK - 1).is_err());
    }

    #[test]
    fn test_monotonic() {
        let mut previous = sqrt_ratio_at_tick(-200_000).unwrap();
        for tick in (-199_000..=200_000).step_by(1000) {
            let current = sqrt_ratio_at_tick(tick).unwrap();
            assert!(current > previous, "tick {tick} not increasing");
            previous = current;
        }
    }

    #[test]
    fn test_tick_at_sqrt_ratio_round_trip() {
        for tick in [-887_272, -201_000, -10, -1, 0, 1, 10, 201_000, 887_271] {
            let sqrt = sqrt_ratio_at_tick(tick).unwrap();
            assert_eq!(tick_at_sqrt_ratio(sqrt).unwrap(), tick);
            if tick > MIN_TICK {
                // One below the exact boundary belongs to the previous tick.
                assert_eq!(tick_at_sqrt_ratio(sqrt - U256::one()).unwrap(), tick - 1);
            }
        }
        assert_eq!(tick_at_sqrt_ratio(MAX_SQRT_RATIO - U256::one()).unwrap(), MAX_TICK - 1);
        assert!(tick_at_sqrt_ratio(MAX_SQRT_RATIO).is_err());
    }

    #[test]
    fn test_floor_to_spacing() {
        assert_eq!(floor_to_spacing(201_005, 10), 201_000);
        assert_eq!(floor_to_spacing(-201_005, 10), -201_010);
        assert_eq!(floor_to_spacing(-200, 60), -240);
    }

    #[test]
    fn test_check_ticks() {
        assert!(check_ticks(-10, 10).is_ok());
        assert_eq!(
            check_ticks(10, 10),
            Err(DomainError::InvalidTickRange {
                lower: 10,
                upper: 10
            })
        );
        assert!(check_ticks(MIN_TICK - 1, 0).is_err());
    }
}
