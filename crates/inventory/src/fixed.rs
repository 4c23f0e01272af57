//! Signed fixed-point helpers.
//!
//! All percentage math is scaled by [`config::ONE`] (10^18). Intermediates
//! are signed: a chain that has exhausted itself legitimately shows a
//! negative virtual balance, and that sign must survive the arithmetic.
//! Multiplication precedes division so precision is not lost; integer
//! division truncates toward zero.

use alloy_primitives::{I256, U256};

/// [`config::ONE`] as a signed value.
pub const ONE_SIGNED: I256 = I256::from_raw(config::ONE);

/// Signed view of an unsigned amount.
///
/// Amounts anywhere near `I256::MAX` are not representable on chain, so the
/// saturation path is theoretical.
pub fn to_signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}

/// Unsigned view of a signed amount; negative values clamp to zero.
pub fn to_unsigned(value: I256) -> U256 {
    if value.is_negative() {
        U256::ZERO
    } else {
        value.unsigned_abs()
    }
}

/// `numer * ONE / denom`: the fraction of `denom` that `numer` represents.
/// Zero when `denom` is zero.
pub fn ratio(numer: I256, denom: I256) -> I256 {
    numer
        .saturating_mul(ONE_SIGNED)
        .checked_div(denom)
        .unwrap_or(I256::ZERO)
}

/// `pct * base / ONE`: apply a fixed-point fraction to an amount.
pub fn apply_pct(pct: I256, base: I256) -> I256 {
    pct.saturating_mul(base)
        .checked_div(ONE_SIGNED)
        .unwrap_or(I256::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(v: i64) -> I256 {
        I256::try_from(v).unwrap()
    }

    #[test]
    fn test_ratio_exact() {
        // 25 / 100 == 0.25
        let pct = ratio(signed(25), signed(100));
        assert_eq!(pct * signed(4), ONE_SIGNED);
    }

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(ratio(signed(25), I256::ZERO), I256::ZERO);
    }

    #[test]
    fn test_ratio_preserves_sign() {
        let pct = ratio(signed(-50), signed(100));
        assert!(pct.is_negative());
        assert_eq!(pct * signed(-2), ONE_SIGNED);
    }

    #[test]
    fn test_apply_pct_round_trips_ratio() {
        let base = signed(1_000_000);
        let pct = ratio(signed(250_000), base);
        assert_eq!(apply_pct(pct, base), signed(250_000));
    }

    #[test]
    fn test_to_unsigned_clamps_negative() {
        assert_eq!(to_unsigned(signed(-5)), U256::ZERO);
        assert_eq!(to_unsigned(signed(5)), U256::from(5));
    }
}
