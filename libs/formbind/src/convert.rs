use std::any::type_name;
use std::num::IntErrorKind;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::TimeFormats;
use crate::error::BindError;
use crate::shape::{PrimitiveSlot, TimeSlot};

// ═══════════════════════════════════════════════════════════════
//  Primitive conversion
// ═══════════════════════════════════════════════════════════════

/// Convert `value` into the primitive behind `slot`. On failure the slot is
/// left untouched.
pub(crate) fn primitive(slot: PrimitiveSlot<'_>, field: &str, value: &str) -> Result<(), BindError> {
    match slot {
        PrimitiveSlot::Bool(dest) => *dest = parse_bool(field, value)?,
        PrimitiveSlot::I8(dest) => *dest = parse_int(field, value, false)?,
        PrimitiveSlot::I16(dest) => *dest = parse_int(field, value, false)?,
        PrimitiveSlot::I32(dest) => *dest = parse_int(field, value, false)?,
        PrimitiveSlot::I64(dest) => *dest = parse_int(field, value, false)?,
        PrimitiveSlot::Isize(dest) => *dest = parse_int(field, value, false)?,
        PrimitiveSlot::U8(dest) => *dest = parse_int(field, value, true)?,
        PrimitiveSlot::U16(dest) => *dest = parse_int(field, value, true)?,
        PrimitiveSlot::U32(dest) => *dest = parse_int(field, value, true)?,
        PrimitiveSlot::U64(dest) => *dest = parse_int(field, value, true)?,
        PrimitiveSlot::Usize(dest) => *dest = parse_int(field, value, true)?,
        PrimitiveSlot::F32(dest) => {
            let wide = parse_float(field, value)?;
            let narrow = wide as f32;
            if narrow.is_infinite() && wide.is_finite() {
                return Err(BindError::invalid_float(field, value, "out of range for f32"));
            }
            *dest = narrow;
        }
        PrimitiveSlot::F64(dest) => *dest = parse_float(field, value)?,
        PrimitiveSlot::Str(dest) => value.clone_into(dest),
    }
    Ok(())
}

/// HTML checkboxes submit `on` when checked and nothing when not.
fn parse_bool(field: &str, value: &str) -> Result<bool, BindError> {
    match value {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(BindError::invalid_bool(field, value)),
    }
}

/// Base-10 parse, then range-check against the target width.
fn parse_int<T: TryFrom<i128>>(field: &str, value: &str, unsigned: bool) -> Result<T, BindError> {
    let out_of_range = || {
        let reason = format!("out of range for {}", type_name::<T>());
        if unsigned {
            BindError::invalid_uint(field, value, reason)
        } else {
            BindError::invalid_int(field, value, reason)
        }
    };

    let wide = match value.parse::<i128>() {
        Ok(wide) => wide,
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            return Err(out_of_range());
        }
        Err(e) => return Err(BindError::invalid_int(field, value, e)),
    };
    T::try_from(wide).map_err(|_| out_of_range())
}

/// Overflow parses to infinity; only a spelled-out `inf`/`infinity` may
/// produce one.
fn parse_float(field: &str, value: &str) -> Result<f64, BindError> {
    let parsed = value
        .parse::<f64>()
        .map_err(|e| BindError::invalid_float(field, value, e))?;
    if parsed.is_infinite() && !is_infinity_token(value) {
        return Err(BindError::invalid_float(field, value, "out of range"));
    }
    Ok(parsed)
}

fn is_infinity_token(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

// ═══════════════════════════════════════════════════════════════
//  Time conversion
// ═══════════════════════════════════════════════════════════════

/// Try each layout in order; the first that parses wins.
pub(crate) fn time(
    slot: TimeSlot<'_>,
    formats: &TimeFormats,
    field: &str,
    value: &str,
) -> Result<(), BindError> {
    let parsed = formats
        .iter()
        .find_map(|layout| parse_with_layout(value, layout))
        .ok_or_else(|| BindError::invalid_time(field, value))?;

    match slot {
        TimeSlot::DateTime(dest) => *dest = parsed,
        TimeSlot::Date(dest) => *dest = parsed.date(),
        TimeSlot::Utc(dest) => *dest = parsed.and_utc(),
    }
    Ok(())
}

/// Offset-aware layouts are normalized to UTC; date-only layouts resolve to
/// midnight.
fn parse_with_layout(value: &str, layout: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_str(value, layout) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, layout) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, layout)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{TimeZone, Utc};

    fn int<T: TryFrom<i128>>(value: &str, unsigned: bool) -> Result<T, ErrorKind> {
        parse_int::<T>("f", value, unsigned).map_err(|e| e.kind)
    }

    #[test]
    fn bool_tokens() {
        for token in ["true", "1", "on"] {
            assert_eq!(parse_bool("f", token), Ok(true), "{token}");
        }
        for token in ["false", "0", ""] {
            assert_eq!(parse_bool("f", token), Ok(false), "{token}");
        }
        for token in ["yes", "TRUE", "off"] {
            assert_eq!(parse_bool("f", token).map_err(|e| e.kind), Err(ErrorKind::InvalidBool));
        }
    }

    #[test]
    fn integer_ranges() {
        assert_eq!(int::<i8>("-128", false), Ok(-128));
        assert_eq!(int::<i8>("1024", false), Err(ErrorKind::InvalidInt));
        assert_eq!(int::<u8>("1024", true), Err(ErrorKind::InvalidUint));
        assert_eq!(int::<u8>("-1", true), Err(ErrorKind::InvalidUint));
        assert_eq!(int::<u64>("18446744073709551615", true), Ok(u64::MAX));
        assert_eq!(int::<i64>("99999999999999999999999999999999999999999", false), Err(ErrorKind::InvalidInt));
        assert_eq!(int::<i32>("", false), Err(ErrorKind::InvalidInt));
        assert_eq!(int::<u32>("xyz", true), Err(ErrorKind::InvalidInt));
    }

    #[test]
    fn failed_conversion_leaves_slot_untouched() {
        let mut dest = 7i8;
        let err = primitive(PrimitiveSlot::I8(&mut dest), "n", "1024").unwrap_err();
        assert_eq!(err.field, "n");
        assert_eq!(dest, 7);
    }

    #[test]
    fn floats() {
        let mut f = 0f32;
        primitive(PrimitiveSlot::F32(&mut f), "f", "1.000000").unwrap();
        assert_eq!(f, 1.0);
        let err = primitive(PrimitiveSlot::F32(&mut f), "f", "1e300").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFloat);
        let err = primitive(PrimitiveSlot::F32(&mut f), "f", "1.2.3").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFloat);
    }

    #[test]
    fn float_overflow_is_out_of_range() {
        let mut wide = 0f64;
        let err = primitive(PrimitiveSlot::F64(&mut wide), "f", "1e400").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFloat);
        let err = primitive(PrimitiveSlot::F64(&mut wide), "f", "-1e400").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFloat);
        assert_eq!(wide, 0.0);

        let mut narrow = 0f32;
        let err = primitive(PrimitiveSlot::F32(&mut narrow), "f", "1e400").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFloat);
        assert_eq!(narrow, 0.0);

        primitive(PrimitiveSlot::F64(&mut wide), "f", "-inf").unwrap();
        assert_eq!(wide, f64::NEG_INFINITY);
        primitive(PrimitiveSlot::F32(&mut narrow), "f", "Infinity").unwrap();
        assert_eq!(narrow, f32::INFINITY);
    }

    #[test]
    fn time_layouts_in_order() {
        let mut formats = TimeFormats::default();
        formats.push("%m/%d/%Y");

        let mut dt = NaiveDateTime::default();
        time(TimeSlot::DateTime(&mut dt), &formats, "t", "1982-07-09 21:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(1982, 7, 9, 21, 30, 0).unwrap().naive_utc());

        let mut date = NaiveDate::default();
        time(TimeSlot::Date(&mut date), &formats, "t", "07/09/1982").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1982, 7, 9).unwrap());

        let mut utc = chrono::DateTime::<Utc>::default();
        time(TimeSlot::Utc(&mut utc), &formats, "t", "1982-07-09").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(1982, 7, 9, 0, 0, 0).unwrap());

        let err = time(TimeSlot::Date(&mut date), &formats, "t", "July 9").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTime);
    }
}
