//! IEEE 754 decomposition.
//!
//! Every supported format is reduced to `(negative, class)` where a finite
//! value is exactly `mantissa * 2^exp2`. Formats handled: binary32,
//! binary64, x87 80-bit extended and binary128.

/// x87 80-bit extended precision value, stored as its two fields.
///
/// Layout: 1 sign bit + 15 exponent bits in `sign_exponent`, and a 64-bit
/// significand with an explicit integer bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct X87Extended {
    pub sign_exponent: u16,
    pub significand: u64,
}

/// IEEE binary128 value as its raw bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binary128(pub u128);

/// A C `long double` in one of the two wide layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LongDouble {
    X87(X87Extended),
    Quad(Binary128),
}

/// Classification of a decoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatClass {
    Zero,
    /// `mantissa * 2^exp2`, `mantissa != 0`.
    Finite { mantissa: u128, exp2: i32 },
    Infinite,
    /// `payload` excludes the quiet bit.
    Nan { payload: u128 },
}

/// Sign and class of a floating-point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub negative: bool,
    pub class: FloatClass,
}

impl Decoded {
    #[must_use]
    pub fn is_finite(&self) -> bool {
        matches!(self.class, FloatClass::Zero | FloatClass::Finite { .. })
    }
}

const F64_EXP_MASK: u64 = 0x7FF;
const F64_FRAC_MASK: u64 = (1 << 52) - 1;

#[must_use]
pub fn decode_f32(value: f32) -> Decoded {
    let bits = value.to_bits();
    let negative = bits >> 31 != 0;
    let exp = (bits >> 23) & 0xFF;
    let frac = bits & ((1 << 23) - 1);
    let class = match (exp, frac) {
        (0, 0) => FloatClass::Zero,
        (0, _) => FloatClass::Finite {
            mantissa: u128::from(frac),
            exp2: -149,
        },
        (0xFF, 0) => FloatClass::Infinite,
        (0xFF, _) => FloatClass::Nan {
            payload: u128::from(frac & ((1 << 22) - 1)),
        },
        _ => FloatClass::Finite {
            mantissa: u128::from(frac | (1 << 23)),
            exp2: exp as i32 - 150,
        },
    };
    Decoded { negative, class }
}

#[must_use]
pub fn decode_f64(value: f64) -> Decoded {
    let bits = value.to_bits();
    let negative = bits >> 63 != 0;
    let exp = (bits >> 52) & F64_EXP_MASK;
    let frac = bits & F64_FRAC_MASK;
    let class = match (exp, frac) {
        (0, 0) => FloatClass::Zero,
        (0, _) => FloatClass::Finite {
            mantissa: u128::from(frac),
            exp2: -1074,
        },
        (F64_EXP_MASK, 0) => FloatClass::Infinite,
        (F64_EXP_MASK, _) => FloatClass::Nan {
            payload: u128::from(frac & ((1 << 51) - 1)),
        },
        _ => FloatClass::Finite {
            mantissa: u128::from(frac | (1 << 52)),
            exp2: exp as i32 - 1075,
        },
    };
    Decoded { negative, class }
}

impl X87Extended {
    #[must_use]
    pub const fn from_parts(sign_exponent: u16, significand: u64) -> Self {
        Self {
            sign_exponent,
            significand,
        }
    }

    /// Little-endian in-memory image (10 bytes, as stored by `fstpt`).
    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 10]) -> Self {
        let mut sig = [0u8; 8];
        sig.copy_from_slice(&bytes[..8]);
        Self {
            significand: u64::from_le_bytes(sig),
            sign_exponent: u16::from_le_bytes([bytes[8], bytes[9]]),
        }
    }

    /// Exact widening conversion from binary64.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        let bits = value.to_bits();
        let sign = ((bits >> 63) as u16) << 15;
        let exp = (bits >> 52) & F64_EXP_MASK;
        let frac = bits & F64_FRAC_MASK;
        let (exponent, significand) = match exp {
            0 if frac == 0 => (0, 0),
            0 => {
                let shift = frac.leading_zeros();
                (15372 - shift as u16, frac << shift)
            }
            F64_EXP_MASK => (0x7FFF, (1 << 63) | (frac << 11)),
            _ => (exp as u16 + 15360, (1 << 63) | (frac << 11)),
        };
        Self {
            sign_exponent: sign | exponent,
            significand,
        }
    }

    /// Decode. Pseudo-NaN, pseudo-infinity and unnormals are invalid
    /// encodings on every x87 since the 387 and decode as NaN.
    #[must_use]
    pub fn decode(self) -> Decoded {
        let negative = self.sign_exponent >> 15 != 0;
        let exp = i32::from(self.sign_exponent & 0x7FFF);
        let sig = self.significand;
        let integer_bit = sig >> 63 != 0;
        let payload = u128::from(sig & ((1 << 62) - 1));
        let class = match exp {
            0 if sig == 0 => FloatClass::Zero,
            0 => FloatClass::Finite {
                mantissa: u128::from(sig),
                exp2: -16445,
            },
            0x7FFF if integer_bit && sig << 1 == 0 => FloatClass::Infinite,
            0x7FFF => FloatClass::Nan { payload },
            _ if !integer_bit => FloatClass::Nan { payload },
            _ => FloatClass::Finite {
                mantissa: u128::from(sig),
                exp2: exp - 16383 - 63,
            },
        };
        Decoded { negative, class }
    }
}

impl Binary128 {
    const FRAC_BITS: u32 = 112;
    const EXP_MASK: u128 = 0x7FFF;

    #[must_use]
    pub const fn from_bits(bits: u128) -> Self {
        Self(bits)
    }

    /// Exact widening conversion from binary64.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        let bits = value.to_bits();
        let sign = u128::from(bits >> 63) << 127;
        let exp = (bits >> 52) & F64_EXP_MASK;
        let frac = u128::from(bits & F64_FRAC_MASK);
        let (exponent, fraction) = match exp {
            0 if frac == 0 => (0u128, 0u128),
            0 => {
                let top = 127 - frac.leading_zeros();
                let exponent = u128::from(top) + 16383 - 1074;
                (exponent, (frac ^ (1 << top)) << (Self::FRAC_BITS - top))
            }
            F64_EXP_MASK => (Self::EXP_MASK, frac << 60),
            _ => (u128::from(exp) + 15360, frac << 60),
        };
        Self(sign | (exponent << Self::FRAC_BITS) | fraction)
    }

    #[must_use]
    pub fn decode(self) -> Decoded {
        let bits = self.0;
        let negative = bits >> 127 != 0;
        let exp = (bits >> Self::FRAC_BITS) & Self::EXP_MASK;
        let frac = bits & ((1 << Self::FRAC_BITS) - 1);
        let class = match (exp, frac) {
            (0, 0) => FloatClass::Zero,
            (0, _) => FloatClass::Finite {
                mantissa: frac,
                exp2: -16494,
            },
            (Self::EXP_MASK, 0) => FloatClass::Infinite,
            (Self::EXP_MASK, _) => FloatClass::Nan {
                payload: frac & ((1 << 111) - 1),
            },
            _ => FloatClass::Finite {
                mantissa: frac | (1 << Self::FRAC_BITS),
                exp2: exp as i32 - 16383 - 112,
            },
        };
        Decoded { negative, class }
    }
}

impl LongDouble {
    #[must_use]
    pub fn decode(self) -> Decoded {
        match self {
            Self::X87(v) => v.decode(),
            Self::Quad(v) => v.decode(),
        }
    }
}
