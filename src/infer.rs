//! Attribute type inference for the XML → ABX direction.
//!
//! Each predicate is tried in order and the first match wins. The chain is
//! deliberately conservative: anything ambiguous stays a string so that
//! decoding reproduces the original attribute text.

use crate::attr::AttrValue;

/// Decimal strings at or above this length are kept as strings. Certificate
/// and key material often serializes as very long digit runs.
const MAX_NUMERIC_LEN: usize = 15;

/// Values shorter than this with no space or hyphen go to the interned pool.
/// UUIDs and package names stay plain strings; the pool is capacity-limited
/// and their reuse likelihood is low.
const MAX_INTERNED_LEN: usize = 50;

/// Map an XML attribute value to the tightest ABX payload.
pub fn infer_attribute(value: &str) -> AttrValue {
    if value == "true" {
        return AttrValue::BooleanTrue;
    }
    if value == "false" {
        return AttrValue::BooleanFalse;
    }

    if let Some(inferred) = infer_hex(value) {
        return inferred;
    }

    if is_decimal(value) && value.len() < MAX_NUMERIC_LEN {
        if let Ok(parsed) = value.parse::<i32>() {
            return AttrValue::Int(parsed);
        }
        if let Ok(parsed) = value.parse::<i64>() {
            return AttrValue::Long(parsed);
        }
    }

    if is_float_literal(value) {
        if let Ok(parsed) = value.parse::<f32>() {
            if parsed.is_finite() {
                return AttrValue::Float(parsed);
            }
        }
    }

    if value.len() < MAX_INTERNED_LEN && !value.contains(' ') && !value.contains('-') {
        return AttrValue::InternedString(value.to_string());
    }

    AttrValue::String(value.to_string())
}

/// `^-?0[xX][0-9a-fA-F]+$`; up to 8 digits fit an i32, longer runs an i64.
fn infer_hex(value: &str) -> Option<AttrValue> {
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let digits = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let mut signed = String::with_capacity(digits.len() + 1);
    if negative {
        signed.push('-');
    }
    signed.push_str(digits);

    if digits.len() <= 8 {
        i32::from_str_radix(&signed, 16).ok().map(AttrValue::IntHex)
    } else {
        i64::from_str_radix(&signed, 16).ok().map(AttrValue::LongHex)
    }
}

fn is_decimal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `^-?[0-9]+\.[0-9]+$`: exactly one dot with digits on both sides.
fn is_float_literal(value: &str) -> bool {
    let rest = value.strip_prefix('-').unwrap_or(value);
    match rest.split_once('.') {
        Some((int_part, frac_part)) => {
            !int_part.is_empty()
                && !frac_part.is_empty()
                && int_part.bytes().all(|b| b.is_ascii_digit())
                && frac_part.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_are_exact_matches_only() {
        assert_eq!(infer_attribute("true"), AttrValue::BooleanTrue);
        assert_eq!(infer_attribute("false"), AttrValue::BooleanFalse);
        assert_eq!(
            infer_attribute("True"),
            AttrValue::InternedString("True".to_string())
        );
    }

    #[test]
    fn hex_literals_pick_width_by_digit_count() {
        assert_eq!(infer_attribute("0xff"), AttrValue::IntHex(255));
        assert_eq!(infer_attribute("0XFF"), AttrValue::IntHex(255));
        assert_eq!(infer_attribute("-0x10"), AttrValue::IntHex(-16));
        // 9 hex digits no longer fit the 32-bit arm
        assert_eq!(
            infer_attribute("0x123456789"),
            AttrValue::LongHex(0x123456789)
        );
    }

    #[test]
    fn overflowing_hex_falls_through_to_string_handling() {
        // 8 digits but out of i32 range
        assert_eq!(
            infer_attribute("0xffffffff"),
            AttrValue::InternedString("0xffffffff".to_string())
        );
        // 17 digits overflow i64 as well
        assert_eq!(
            infer_attribute("0x10000000000000000"),
            AttrValue::InternedString("0x10000000000000000".to_string())
        );
    }

    #[test]
    fn malformed_hex_is_not_hex() {
        assert_eq!(
            infer_attribute("0xzz"),
            AttrValue::InternedString("0xzz".to_string())
        );
        assert_eq!(
            infer_attribute("0x"),
            AttrValue::InternedString("0x".to_string())
        );
    }

    #[test]
    fn decimals_widen_from_int_to_long() {
        assert_eq!(infer_attribute("42"), AttrValue::Int(42));
        assert_eq!(infer_attribute("-42"), AttrValue::Int(-42));
        assert_eq!(
            infer_attribute("99999999999999"),
            AttrValue::Long(99999999999999)
        );
    }

    #[test]
    fn long_digit_runs_stay_strings() {
        // 15 characters: over the numeric safety threshold
        assert_eq!(
            infer_attribute("123456789012345"),
            AttrValue::InternedString("123456789012345".to_string())
        );
    }

    #[test]
    fn floats_need_a_single_dot_with_digits_both_sides() {
        assert_eq!(infer_attribute("3.14"), AttrValue::Float(3.14));
        assert_eq!(infer_attribute("-0.5"), AttrValue::Float(-0.5));
        assert_eq!(
            infer_attribute("1.2.3"),
            AttrValue::InternedString("1.2.3".to_string())
        );
        assert_eq!(
            infer_attribute(".5"),
            AttrValue::InternedString(".5".to_string())
        );
        assert_eq!(
            infer_attribute("5."),
            AttrValue::InternedString("5.".to_string())
        );
    }

    #[test]
    fn interning_skips_spaces_hyphens_and_long_values() {
        assert_eq!(
            infer_attribute("com.example.app"),
            AttrValue::InternedString("com.example.app".to_string())
        );
        assert_eq!(
            infer_attribute("two words"),
            AttrValue::String("two words".to_string())
        );
        assert_eq!(
            infer_attribute("123e4567-e89b-12d3-a456-426614174000"),
            AttrValue::String("123e4567-e89b-12d3-a456-426614174000".to_string())
        );
        let long = "a".repeat(50);
        assert_eq!(infer_attribute(&long), AttrValue::String(long.clone()));
        let just_under = "a".repeat(49);
        assert_eq!(
            infer_attribute(&just_under),
            AttrValue::InternedString(just_under.clone())
        );
    }

    #[test]
    fn empty_value_is_interned() {
        assert_eq!(
            infer_attribute(""),
            AttrValue::InternedString(String::new())
        );
    }
}
