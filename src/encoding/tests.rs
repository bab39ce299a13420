//! Encoding Module Tests
//!
//! Validates the textual-to-binary conversions, the null sentinel behavior
//! for unparseable input, and the decode directions that matter to readers.

#[cfg(test)]
mod tests {
    use crate::encoding::*;

    // ============================================================
    // INTEGERS AND FLOATS
    // ============================================================

    #[test]
    fn uint_roundtrip_and_garbage() {
        assert_eq!(encode(DataType::Uint, "12345"), 12345);
        assert_eq!(decode(DataType::Uint, 12345), "12345");

        assert_eq!(encode(DataType::Uint, "not a number"), NULL_VALUE);
        assert_eq!(encode(DataType::Uint, ""), NULL_VALUE);
        assert_eq!(decode(DataType::Uint, NULL_VALUE), "");
    }

    #[test]
    fn int_preserves_sign_through_bit_pattern() {
        let encoded = encode(DataType::Int, "-42");
        assert_eq!(encoded, -42i64 as u64);
        assert_eq!(decode(DataType::Int, encoded), "-42");

        assert_eq!(encode(DataType::Int, "17"), 17);
        assert_eq!(encode(DataType::Int, "12.5"), NULL_VALUE);
    }

    #[test]
    fn float_stores_f32_bits() {
        let encoded = encode(DataType::Float, "1.5");
        assert_eq!(encoded, u64::from(1.5f32.to_bits()));
        assert_eq!(decode(DataType::Float, encoded), "1.5");
        assert_eq!(encode(DataType::Float, "one point five"), NULL_VALUE);
    }

    #[test]
    fn double_stores_f64_bits() {
        let encoded = encode(DataType::Double, "-2.25");
        assert_eq!(encoded, (-2.25f64).to_bits());
        assert_eq!(decode(DataType::Double, encoded), "-2.25");
        assert_eq!(decode(DataType::Double, NULL_VALUE), "");
    }

    // ============================================================
    // BOOL AND CHARS
    // ============================================================

    #[test]
    fn bool_recognizes_false_spellings() {
        for raw in ["F", "f", "FALSE", "false", "0"] {
            assert_eq!(encode(DataType::Bool, raw), 0, "{raw} should be false");
        }
        for raw in ["T", "true", "1", "yes"] {
            assert_eq!(encode(DataType::Bool, raw), 1, "{raw} should be true");
        }
        assert_eq!(encode(DataType::Bool, ""), NULL_VALUE);
    }

    #[test]
    fn chars_pack_up_to_seven_bytes() {
        let encoded = encode(DataType::Chars, "abc");
        assert_eq!(decode(DataType::Chars, encoded), "abc");

        // Longer input truncates to the seven bytes that fit beside the
        // terminator.
        let truncated = encode(DataType::Chars, "abcdefghij");
        assert_eq!(decode(DataType::Chars, truncated), "abcdefg");

        assert_eq!(decode(DataType::Chars, encode(DataType::Chars, "")), "");
    }

    // ============================================================
    // IP ADDRESSES
    // ============================================================

    #[test]
    fn ip_address_packs_octets() {
        let encoded = encode(DataType::IpAddress, "192.168.0.1");
        assert_eq!(encoded, (192 << 24) | (168 << 16) | 1);
        assert_eq!(decode(DataType::IpAddress, encoded), "192.168.0.1");
    }

    #[test]
    fn ip_address_rejects_malformed_input() {
        assert_eq!(encode(DataType::IpAddress, "192.168.0"), NULL_VALUE);
        assert_eq!(encode(DataType::IpAddress, "192.168.0.1.5"), NULL_VALUE);
        assert_eq!(encode(DataType::IpAddress, "192.168.0.999"), NULL_VALUE);
        assert_eq!(encode(DataType::IpAddress, "a.b.c.d"), NULL_VALUE);
    }

    // ============================================================
    // DATES AND TIMESTAMPS
    // ============================================================

    #[test]
    fn date_encodes_to_midnight_utc() {
        let encoded = encode(DataType::Date, "2020-03-01");
        // 2020-03-01T00:00:00Z
        assert_eq!(encoded, 1_583_020_800);
        assert_eq!(decode(DataType::Date, encoded), "2020-03-01");

        assert_eq!(encode(DataType::Date, "03/01/2020"), NULL_VALUE);
        assert_eq!(encode(DataType::Date, "2020-13-40"), NULL_VALUE);
    }

    #[test]
    fn us_date_uses_two_digit_year() {
        let encoded = encode(DataType::UsDate, "03/01/20");
        assert_eq!(encoded, encode(DataType::Date, "2020-03-01"));
        assert_eq!(decode(DataType::UsDate, encoded), "03/01/20");

        assert_eq!(encode(DataType::UsDate, "2020-03-01"), NULL_VALUE);
    }

    #[test]
    fn date_time_carries_time_of_day() {
        let encoded = encode(DataType::DateTime, "2020-03-01T12:30:45");
        assert_eq!(encoded, 1_583_020_800 + 12 * 3600 + 30 * 60 + 45);
        assert_eq!(decode(DataType::DateTime, encoded), "2020-03-01T12:30:45");

        assert_eq!(encode(DataType::DateTime, "2020-03-01 12:30:45"), NULL_VALUE);
        assert_eq!(decode(DataType::DateTime, NULL_VALUE), "");
    }

    // ============================================================
    // SCHEMA
    // ============================================================

    #[test]
    fn schema_drives_runtime_dispatch() {
        let schema: Schema = vec![
            ("id".to_string(), DataType::Uint),
            ("active".to_string(), DataType::Bool),
            ("addr".to_string(), DataType::IpAddress),
        ];
        let row = ["7", "false", "10.0.0.7"];

        let encoded: Vec<u64> = schema
            .iter()
            .zip(row.iter())
            .map(|((_, ty), raw)| encode(*ty, raw))
            .collect();

        assert_eq!(encoded[0], 7);
        assert_eq!(encoded[1], 0);
        assert_eq!(decode(DataType::IpAddress, encoded[2]), "10.0.0.7");
    }
}
