use serde::{Deserialize, Serialize};

/// A wrapper over `num_bigint_dig::BigInt` applying the KMIP byte rules.
///
/// Big Integers are encoded as a sequence of eight-bit bytes, in two's
/// complement notation, transmitted big-endian. The length of the sequence
/// must be a multiple of eight bytes; the minimal number of leading
/// sign-extended bytes is prepended when it is not.
///
/// The JSON text form renders the encoded bytes as `0x` followed by
/// upper-case hex.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KmipBigInt(num_bigint_dig::BigInt);

impl From<num_bigint_dig::BigInt> for KmipBigInt {
    fn from(big_int: num_bigint_dig::BigInt) -> Self {
        Self(big_int)
    }
}

impl From<KmipBigInt> for num_bigint_dig::BigInt {
    fn from(val: KmipBigInt) -> Self {
        val.0
    }
}

impl From<i64> for KmipBigInt {
    fn from(value: i64) -> Self {
        Self(num_bigint_dig::BigInt::from(value))
    }
}

impl KmipBigInt {
    /// The KMIP wire bytes: big-endian two's complement, sign-extended to a
    /// multiple of eight bytes. The padding bytes are part of the item value
    /// and count towards the item length.
    #[must_use]
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let mut bytes = self.0.to_signed_bytes_be();
        let len = bytes.len();
        if len % 8 != 0 {
            let padding = 8 - len % 8;
            let mut padded_bytes = match self.0.sign() {
                num_bigint_dig::Sign::Minus => vec![255_u8; padding],
                num_bigint_dig::Sign::NoSign | num_bigint_dig::Sign::Plus => vec![0_u8; padding],
            };
            padded_bytes.append(&mut bytes);
            padded_bytes
        } else {
            bytes
        }
    }

    #[must_use]
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self(num_bigint_dig::BigInt::from_signed_bytes_be(bytes))
    }

    /// -1 if the number is negative, 0 if it is zero, and 1 if it is positive.
    #[must_use]
    pub fn sign(&self) -> i8 {
        match self.0.sign() {
            num_bigint_dig::Sign::Minus => -1,
            num_bigint_dig::Sign::NoSign => 0,
            num_bigint_dig::Sign::Plus => 1,
        }
    }
}

impl Serialize for KmipBigInt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = "0x".to_owned() + &hex::encode_upper(self.to_bytes_be());
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for KmipBigInt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let hex_str = s.strip_prefix("0x").ok_or_else(|| {
            serde::de::Error::custom("Invalid KMIP Big Integer string: it must start with '0x'")
        })?;
        let bytes = hex::decode(hex_str).map_err(serde::de::Error::custom)?;
        Ok(Self::from_bytes_be(&bytes))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use num_bigint_dig::BigInt;
    use num_traits::pow::Pow;

    use super::KmipBigInt;

    #[test]
    fn wire_bytes_are_sign_extended_to_a_multiple_of_8() {
        let values = [
            BigInt::from(0),
            BigInt::from(1),
            BigInt::from(-1),
            BigInt::from(255),
            BigInt::from(-256),
            BigInt::from(-123_456_789),
            BigInt::from(123_456_789),
            BigInt::from(1_234_567_890_123_456_789_i64),
            BigInt::from(-1_234_567_890_123_456_789_i64),
            BigInt::from(i64::MAX),
            BigInt::from(i64::MIN),
            BigInt::from(u64::MAX),
            BigInt::from(i128::MAX),
            BigInt::from(i128::MIN),
            BigInt::from(2).pow(&64_u32),
            BigInt::from(2).pow(&120_u32),
        ];
        for value in &values {
            let big_int = KmipBigInt::from(value.clone());
            let bytes = big_int.to_bytes_be();
            assert_eq!(bytes.len() % 8, 0);
            assert_eq!(KmipBigInt::from_bytes_be(&bytes), big_int);
        }
    }

    #[test]
    fn power_of_two_120_normative_bytes() {
        // KMIP 1.0 spec 9.1.2: a Big Integer containing 2^120 spans 16 bytes
        let big_int = KmipBigInt::from(BigInt::from(2).pow(&120_u32));
        assert_eq!(
            big_int.to_bytes_be(),
            hex::decode("00000000010000000000000000000000").unwrap()
        );
    }

    #[test]
    fn json_hex_form() {
        let tests = [
            (
                KmipBigInt::from(BigInt::from(-1_234_567_890_i64)),
                "0xFFFFFFFFB669FD2E",
            ),
            (
                KmipBigInt::from(BigInt::from(1_234_567_890_i64)),
                "0x00000000499602D2",
            ),
        ];
        for (big_int, expected) in &tests {
            let serialized = serde_json::to_string(&big_int).unwrap();
            assert_eq!(serialized, format!("\"{expected}\""));
            let deserialized: KmipBigInt = serde_json::from_str(&serialized).unwrap();
            assert_eq!(deserialized, *big_int);
        }
        assert!(serde_json::from_str::<KmipBigInt>("\"499602D2\"").is_err());
    }
}
