//! Arbitrary-precision unsigned integers, just enough for exact
//! binary-to-decimal conversion.
//!
//! Limbs are little-endian `u32`s with no high zero limbs.

/// 5^13, the largest power of five that fits a `u32`.
const POW5_13: u32 = 1_220_703_125;
const POW10_9: u32 = 1_000_000_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BigUint {
    limbs: Vec<u32>,
}

impl BigUint {
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_u128(mut value: u128) -> Self {
        let mut limbs = Vec::with_capacity(4);
        while value != 0 {
            limbs.push(value as u32);
            value >>= 32;
        }
        Self { limbs }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// Number of significant bits.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.limbs
            .last()
            .map_or(0, |top| self.limbs.len() * 32 - top.leading_zeros() as usize)
    }

    pub fn mul_small(&mut self, factor: u32) {
        if factor == 0 {
            self.limbs.clear();
            return;
        }
        let mut carry = 0u64;
        for limb in &mut self.limbs {
            let product = u64::from(*limb) * u64::from(factor) + carry;
            *limb = product as u32;
            carry = product >> 32;
        }
        if carry != 0 {
            self.limbs.push(carry as u32);
        }
    }

    /// Multiply by `5^k`.
    pub fn mul_pow5(&mut self, mut k: u32) {
        while k >= 13 {
            self.mul_small(POW5_13);
            k -= 13;
        }
        if k > 0 {
            self.mul_small(5u32.pow(k));
        }
    }

    /// Multiply by `2^bits`.
    pub fn shl(&mut self, bits: u32) {
        if self.is_zero() {
            return;
        }
        let limb_shift = (bits / 32) as usize;
        let bit_shift = bits % 32;
        if bit_shift != 0 {
            let mut carry = 0u32;
            for limb in &mut self.limbs {
                let next = *limb >> (32 - bit_shift);
                *limb = (*limb << bit_shift) | carry;
                carry = next;
            }
            if carry != 0 {
                self.limbs.push(carry);
            }
        }
        if limb_shift != 0 {
            let mut shifted = vec![0; limb_shift];
            shifted.append(&mut self.limbs);
            self.limbs = shifted;
        }
    }

    /// Divide in place by `divisor`, returning the remainder.
    ///
    /// # Panics
    ///
    /// Panics if `divisor` is zero.
    pub fn divmod_small(&mut self, divisor: u32) -> u32 {
        assert!(divisor != 0, "division by zero");
        let mut rem = 0u64;
        for limb in self.limbs.iter_mut().rev() {
            let cur = (rem << 32) | u64::from(*limb);
            *limb = (cur / u64::from(divisor)) as u32;
            rem = cur % u64::from(divisor);
        }
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
        rem as u32
    }

    /// Decimal digits, most significant first, as values `0..=9`.
    /// Zero yields a single `0`.
    #[must_use]
    pub fn to_decimal(&self) -> Vec<u8> {
        if self.is_zero() {
            return vec![0];
        }
        let mut scratch = self.clone();
        let mut chunks = Vec::with_capacity(self.limbs.len() * 32 / 29 + 1);
        while !scratch.is_zero() {
            chunks.push(scratch.divmod_small(POW10_9));
        }

        let mut digits = Vec::with_capacity(chunks.len() * 9);
        let mut top = chunks.pop().unwrap_or(0);
        let mut lead = Vec::with_capacity(9);
        while top != 0 {
            lead.push((top % 10) as u8);
            top /= 10;
        }
        digits.extend(lead.iter().rev());
        for mut chunk in chunks.into_iter().rev() {
            let mut block = [0u8; 9];
            for slot in block.iter_mut().rev() {
                *slot = (chunk % 10) as u8;
                chunk /= 10;
            }
            digits.extend_from_slice(&block);
        }
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal_string(n: &BigUint) -> String {
        n.to_decimal().iter().map(|d| char::from(b'0' + d)).collect()
    }

    #[test]
    fn from_u128_round_trips_through_decimal() {
        assert_eq!(decimal_string(&BigUint::zero()), "0");
        assert_eq!(decimal_string(&BigUint::from_u128(7)), "7");
        assert_eq!(
            decimal_string(&BigUint::from_u128(u128::MAX)),
            u128::MAX.to_string()
        );
        assert_eq!(
            decimal_string(&BigUint::from_u128(1_000_000_000)),
            "1000000000"
        );
    }

    #[test]
    fn shifts_match_powers_of_two() {
        let mut n = BigUint::from_u128(1);
        n.shl(100);
        assert_eq!(decimal_string(&n), (1u128 << 100).to_string());
        assert_eq!(n.bit_len(), 101);

        let mut big = BigUint::from_u128(3);
        big.shl(1023);
        // 3 * 2^1023, 309 digits
        assert_eq!(big.to_decimal().len(), 309);
        assert!(decimal_string(&big).starts_with("2696539702293473"));
    }

    #[test]
    fn powers_of_five() {
        let mut n = BigUint::from_u128(1);
        n.mul_pow5(27);
        assert_eq!(decimal_string(&n), 5u128.pow(27).to_string());
        let mut m = BigUint::from_u128(1);
        m.mul_pow5(1074);
        // 5^1074 has 751 digits
        assert_eq!(m.to_decimal().len(), 751);
    }

    #[test]
    fn divmod_small_returns_remainder() {
        let mut n = BigUint::from_u128(1_000_000_007);
        assert_eq!(n.divmod_small(10), 7);
        assert_eq!(decimal_string(&n), "100000000");
    }

    #[test]
    fn mul_by_zero_clears() {
        let mut n = BigUint::from_u128(99);
        n.mul_small(0);
        assert!(n.is_zero());
    }
}
