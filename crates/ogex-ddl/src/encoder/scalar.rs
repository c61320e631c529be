//! Scalar value formatting shared by both encoders

use ogex_core::{Error, Result};

use crate::document::ResolvedDocument;
use crate::primitive::{DdlString, PrimitiveData};
use crate::reference::Reference;
use crate::structure::PropertyValue;

/// Formats individual values of a resolved document
pub struct ScalarFormatter<'a> {
    rounding: Option<u32>,
    document: &'a ResolvedDocument,
}

impl<'a> ScalarFormatter<'a> {
    pub fn new(rounding: Option<u32>, document: &'a ResolvedDocument) -> Self {
        Self { rounding, document }
    }

    /// Write element `element` of `data`, braced when `vector_size > 0`
    pub fn write_element(
        &self,
        data: &PrimitiveData,
        vector_size: usize,
        element: usize,
        separator: &str,
        out: &mut String,
    ) -> Result<()> {
        if vector_size == 0 {
            return self.write_value(data, element, out);
        }

        out.push('{');
        let start = element * vector_size;
        for index in start..start + vector_size {
            if index > start {
                out.push_str(separator);
            }
            self.write_value(data, index, out)?;
        }
        out.push('}');
        Ok(())
    }

    /// Write the flat value at `index`
    pub fn write_value(&self, data: &PrimitiveData, index: usize, out: &mut String) -> Result<()> {
        match data {
            PrimitiveData::Bool(v) => out.push_str(if v[index] { "true" } else { "false" }),
            PrimitiveData::Int8(v) => out.push_str(&v[index].to_string()),
            PrimitiveData::Int16(v) => out.push_str(&v[index].to_string()),
            PrimitiveData::Int32(v) => out.push_str(&v[index].to_string()),
            PrimitiveData::Int64(v) => out.push_str(&v[index].to_string()),
            PrimitiveData::UnsignedInt8(v) => out.push_str(&v[index].to_string()),
            PrimitiveData::UnsignedInt16(v) => out.push_str(&v[index].to_string()),
            PrimitiveData::UnsignedInt32(v) => out.push_str(&v[index].to_string()),
            PrimitiveData::UnsignedInt64(v) => out.push_str(&v[index].to_string()),
            PrimitiveData::Half(v) => out.push_str(&format_f32(v[index].to_f32(), self.rounding)),
            PrimitiveData::Float(v) => out.push_str(&format_f32(v[index], self.rounding)),
            PrimitiveData::Double(v) => out.push_str(&format_f64(v[index], self.rounding)),
            PrimitiveData::String(v) => write_string(&v[index], out),
            PrimitiveData::Ref(v) => self.write_reference(&v[index], out)?,
            PrimitiveData::Type(v) => out.push_str(v[index].name()),
        }
        Ok(())
    }

    pub fn write_property(&self, value: &PropertyValue, out: &mut String) -> Result<()> {
        match value {
            PropertyValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            PropertyValue::Int(i) => out.push_str(&i.to_string()),
            PropertyValue::UnsignedInt(u) => out.push_str(&u.to_string()),
            PropertyValue::Float(f) => out.push_str(&format_f64(*f, self.rounding)),
            PropertyValue::String(s) => write_string(s, out),
            PropertyValue::Ref(r) => self.write_reference(r, out)?,
            PropertyValue::Type(t) => out.push_str(t.name()),
        }
        Ok(())
    }

    fn write_reference(&self, reference: &Reference, out: &mut String) -> Result<()> {
        match reference {
            Reference::Null => out.push_str("null"),
            Reference::Resolved(id) => {
                let target = self
                    .document
                    .target(*id)
                    .ok_or(Error::DanglingReference { target: id.value() })?;
                out.push(target.scope.sigil());
                out.push_str(&target.name);
            }
            Reference::Deferred(key) => return Err(Error::reference(key.as_str())),
        }
        Ok(())
    }
}

/// Decimal places that print an f64 exactly; the smallest subnormal is 2^-1074
const MAX_F64_PLACES: u32 = 1074;
/// Same bound for f32, whose smallest subnormal is 2^-149
const MAX_F32_PLACES: u32 = 149;

/// Format a float rounded to `rounding` decimal places
///
/// Trailing zeros are trimmed but one fractional digit always stays, so
/// integral values read as `1.0`. Non-finite values collapse to `0.0`.
pub fn format_f64(value: f64, rounding: Option<u32>) -> String {
    if !value.is_finite() {
        return "0.0".to_string();
    }
    match rounding {
        Some(places) => trim_decimal(format!("{:.*}", places.min(MAX_F64_PLACES) as usize, value)),
        None => trim_decimal(value.to_string()),
    }
}

/// Like [`format_f64`]; places beyond what an f32 can hold are ignored
pub fn format_f32(value: f32, rounding: Option<u32>) -> String {
    if !value.is_finite() {
        return "0.0".to_string();
    }
    match rounding {
        Some(places) => trim_decimal(format!("{:.*}", places.min(MAX_F32_PLACES) as usize, value)),
        None => trim_decimal(value.to_string()),
    }
}

fn trim_decimal(mut text: String) -> String {
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').len();
        text.truncate(trimmed);
        if text.ends_with('.') {
            text.push('0');
        }
    } else {
        text.push_str(".0");
    }
    text
}

/// Quote and escape a string, or copy a literal verbatim
pub fn write_string(value: &DdlString, out: &mut String) {
    if value.literal {
        out.push_str(&value.value);
        return;
    }

    out.push('"');
    for c in value.value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && (c as u32) < 0x100 => {
                out.push_str(&format!("\\x{:02X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_to_six_places() {
        assert_eq!(format_f64(1.0000004999, Some(6)), "1.0");
        assert_eq!(format_f64(1.0000004999, Some(3)), "1.0");
        assert_eq!(format_f64(0.125, Some(6)), "0.125");
        assert_eq!(format_f64(2.25, Some(0)), "2.0");
    }

    #[test]
    fn test_huge_rounding_is_clamped() {
        assert_eq!(format_f64(1.5, Some(70000)), "1.5");
        assert_eq!(format_f64(1.5, Some(u32::MAX)), "1.5");
        assert_eq!(format_f32(0.25, Some(70000)), "0.25");
        assert_eq!(format_f64(f64::from_bits(1), Some(u32::MAX)), format_f64(f64::from_bits(1), Some(MAX_F64_PLACES)));
        assert!(format_f64(f64::from_bits(1), Some(u32::MAX)).ends_with("5"));
    }

    #[test]
    fn test_non_finite_collapse() {
        for rounding in [None, Some(0), Some(6)] {
            assert_eq!(format_f64(f64::NAN, rounding), "0.0");
            assert_eq!(format_f64(f64::INFINITY, rounding), "0.0");
            assert_eq!(format_f32(f32::NEG_INFINITY, rounding), "0.0");
        }
    }

    #[test]
    fn test_without_rounding() {
        assert_eq!(format_f32(0.1, None), "0.1");
        assert_eq!(format_f64(100.0, None), "100.0");
        assert_eq!(format_f64(-3.25, None), "-3.25");
    }

    #[test]
    fn test_f32_rounding_uses_single_precision() {
        assert_eq!(format_f32(0.1, Some(6)), "0.1");
        assert_eq!(format_f32(-0.5, Some(2)), "-0.5");
    }

    #[test]
    fn test_string_escaping() {
        let mut out = String::new();
        write_string(&DdlString::new("a \"b\"\\\n"), &mut out);
        assert_eq!(out, r#""a \"b\"\\\n""#);
    }

    #[test]
    fn test_literal_string_verbatim() {
        let mut out = String::new();
        write_string(&DdlString::literal("\"pre\\tquoted\""), &mut out);
        assert_eq!(out, "\"pre\\tquoted\"");
    }
}
