//! Record schema engine.
//!
//! Datatype layouts are data, not types: a [`Schema`] is an ordered list of
//! named fields, each described by a compact format string, compiled once
//! into opcodes and then walked against a byte cursor for every decode or
//! encode. All multi-byte scalars are little-endian; this is not
//! configurable.
//!
//! The format alphabet:
//!
//! | Format | Meaning |
//! |---|---|
//! | `B` / `b` | unsigned / signed 8-bit |
//! | `H` / `h` | unsigned / signed 16-bit |
//! | `I` / `i` / `L` / `l` | unsigned / signed 32-bit |
//! | `f` / `d` | 32 / 64-bit IEEE-754 float |
//! | `?` | boolean byte |
//! | `Ns` | fixed-length N-byte string |
//! | `n` | null-terminated string |
//! | `(…)` | nested fixed composition, decoded as a tuple |
//! | `{…}` | greedy repetition until end of buffer |
//! | `N[…]` | array of exactly N elements |
//! | `/Ks` | byte string whose length is the value of field K |
//! | `$` | remainder of the buffer |
//!
//! A count before a scalar code repeats it, so `(5B)` is a tuple of five
//! unsigned bytes.
//!
//! For every schema `S` and every byte string `b` accepted by `S::unpack`,
//! `S.pack(&S.unpack(b)) == b`.

use crate::error::ProtocolError;
use bytes::Bytes;
use std::fmt;

/// One compiled format element.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCode {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
    Bool,
    /// `Ns`: fixed-length byte string.
    Bytes(usize),
    /// `n`: null-terminated string, terminator consumed on read and
    /// appended on write.
    CString,
    /// `/Ks`: byte string whose length is the already-decoded field at
    /// position K of the enclosing sequence.
    LenIndexed(usize),
    /// `$`: the rest of the buffer.
    Remainder,
    /// `(…)`
    Tuple(Vec<FieldCode>),
    /// `N[…]`
    Array(usize, Vec<FieldCode>),
    /// `{…}`
    Greedy(Vec<FieldCode>),
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    F64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Tuple(Vec<Value>),
    List(Vec<Value>),
}

impl Value {
    pub fn as_u8(&self) -> Option<u8> {
        match *self {
            Value::U8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match *self {
            Value::U16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match *self {
            Value::I16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Any unsigned integer width, widened to u64.
    pub fn as_uint(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }
}

/// A named field with its compiled format.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub code: FieldCode,
}

/// A named, ordered list of fields compiled from their format strings.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    fields: Vec<Field>,
}

/// A decoded record: its schema, its field values in schema order, and the
/// raw bytes it was decoded from (empty for host-built records).
#[derive(Debug, Clone)]
pub struct Record {
    schema: &'static Schema,
    values: Vec<Value>,
    raw: Bytes,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name && self.values == other.values
    }
}

impl Schema {
    /// Compile a schema from `(name, format)` pairs. Panics on a malformed
    /// format string; schemas are static data, so this is a programming
    /// error, not a runtime condition.
    pub fn new(name: &'static str, defs: &[(&'static str, &str)]) -> Schema {
        let fields = defs
            .iter()
            .map(|&(field_name, fmt)| {
                let mut codes = parse_format(fmt)
                    .unwrap_or_else(|e| panic!("schema {name}, field {field_name}: {e}"));
                if codes.len() != 1 {
                    panic!("schema {name}, field {field_name}: format must be a single element");
                }
                Field { name: field_name, code: codes.remove(0) }
            })
            .collect();
        Schema { name, fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    fn error(&self, message: impl fmt::Display) -> ProtocolError {
        ProtocolError::Schema { schema: self.name, message: message.to_string() }
    }

    /// Decode `data` into a record. The whole buffer must be consumed.
    pub fn unpack(&'static self, data: &[u8]) -> Result<Record, ProtocolError> {
        let mut cursor = Cursor { data, pos: 0 };
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = decode(&field.code, &mut cursor, &values)
                .map_err(|e| self.error(format!("field {}: {}", field.name, e)))?;
            values.push(value);
        }
        if cursor.pos != data.len() {
            return Err(self.error(format!(
                "{} bytes left over after decoding",
                data.len() - cursor.pos
            )));
        }
        Ok(Record { schema: self, values, raw: Bytes::copy_from_slice(data) })
    }

    /// Encode a record built against this schema.
    pub fn pack(&self, record: &Record) -> Result<Bytes, ProtocolError> {
        if record.values.len() != self.fields.len() {
            return Err(self.error(format!(
                "record has {} values, schema has {} fields",
                record.values.len(),
                self.fields.len()
            )));
        }
        let mut out = Vec::new();
        for (field, value) in self.fields.iter().zip(&record.values) {
            encode(&field.code, value, &mut out, &record.values)
                .map_err(|e| self.error(format!("field {}: {}", field.name, e)))?;
        }
        Ok(Bytes::from(out))
    }

    /// Build a record from values in schema order.
    pub fn record(&'static self, values: Vec<Value>) -> Result<Record, ProtocolError> {
        if values.len() != self.fields.len() {
            return Err(self.error(format!(
                "expected {} values, got {}",
                self.fields.len(),
                values.len()
            )));
        }
        Ok(Record { schema: self, values, raw: Bytes::new() })
    }
}

impl Record {
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema.name
    }

    /// Look up a field value by its schema name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema
            .field_index(name)
            .and_then(|index| self.values.get(index))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The raw bytes this record was decoded from. Empty for host-built
    /// records; semantic decoders never mutate this.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
        if self.remaining() < n {
            return Err(format!("need {n} bytes, {} remain", self.remaining()));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], String> {
        Ok(self.take(N)?.try_into().expect("length checked"))
    }
}

fn decode(code: &FieldCode, cursor: &mut Cursor, scope: &[Value]) -> Result<Value, String> {
    Ok(match code {
        FieldCode::U8 => Value::U8(cursor.take(1)?[0]),
        FieldCode::I8 => Value::I8(cursor.take(1)?[0] as i8),
        FieldCode::U16 => Value::U16(u16::from_le_bytes(cursor.take_array()?)),
        FieldCode::I16 => Value::I16(i16::from_le_bytes(cursor.take_array()?)),
        FieldCode::U32 => Value::U32(u32::from_le_bytes(cursor.take_array()?)),
        FieldCode::I32 => Value::I32(i32::from_le_bytes(cursor.take_array()?)),
        FieldCode::F32 => Value::F32(f32::from_le_bytes(cursor.take_array()?)),
        FieldCode::F64 => Value::F64(f64::from_le_bytes(cursor.take_array()?)),
        FieldCode::Bool => Value::Bool(cursor.take(1)?[0] != 0),
        FieldCode::Bytes(n) => Value::Bytes(cursor.take(*n)?.to_vec()),
        FieldCode::CString => {
            let rest = &cursor.data[cursor.pos..];
            let nul = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| "unterminated string".to_string())?;
            let value = rest[..nul].to_vec();
            cursor.pos += nul + 1;
            Value::Bytes(value)
        }
        FieldCode::LenIndexed(k) => {
            let len = scope
                .get(*k)
                .and_then(Value::as_uint)
                .ok_or_else(|| format!("length field {k} is missing or not an integer"))?;
            Value::Bytes(cursor.take(len as usize)?.to_vec())
        }
        FieldCode::Remainder => {
            let rest = cursor.take(cursor.remaining())?;
            Value::Bytes(rest.to_vec())
        }
        FieldCode::Tuple(codes) => Value::Tuple(decode_sequence(codes, cursor)?),
        FieldCode::Array(n, codes) => {
            let mut elements = Vec::with_capacity(*n);
            for _ in 0..*n {
                elements.push(decode_element(codes, cursor)?);
            }
            Value::List(elements)
        }
        FieldCode::Greedy(codes) => {
            let mut elements = Vec::new();
            while cursor.remaining() > 0 {
                elements.push(decode_element(codes, cursor)?);
            }
            Value::List(elements)
        }
    })
}

/// Decode one repetition of a sequence: a single-code sequence yields the
/// bare value, a longer one yields a tuple.
fn decode_element(codes: &[FieldCode], cursor: &mut Cursor) -> Result<Value, String> {
    if let [code] = codes {
        decode(code, cursor, &[])
    } else {
        Ok(Value::Tuple(decode_sequence(codes, cursor)?))
    }
}

fn decode_sequence(codes: &[FieldCode], cursor: &mut Cursor) -> Result<Vec<Value>, String> {
    let mut values = Vec::with_capacity(codes.len());
    for code in codes {
        let value = decode(code, cursor, &values)?;
        values.push(value);
    }
    Ok(values)
}

fn encode(code: &FieldCode, value: &Value, out: &mut Vec<u8>, scope: &[Value]) -> Result<(), String> {
    match (code, value) {
        (FieldCode::U8, Value::U8(v)) => out.push(*v),
        (FieldCode::I8, Value::I8(v)) => out.push(*v as u8),
        (FieldCode::U16, Value::U16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (FieldCode::I16, Value::I16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (FieldCode::U32, Value::U32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (FieldCode::I32, Value::I32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (FieldCode::F32, Value::F32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (FieldCode::F64, Value::F64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (FieldCode::Bool, Value::Bool(v)) => out.push(u8::from(*v)),
        (FieldCode::Bytes(n), Value::Bytes(v)) => {
            if v.len() != *n {
                return Err(format!("expected {n} bytes, got {}", v.len()));
            }
            out.extend_from_slice(v);
        }
        (FieldCode::CString, Value::Bytes(v)) => {
            if v.contains(&0) {
                return Err("string contains a null byte".to_string());
            }
            out.extend_from_slice(v);
            out.push(0);
        }
        (FieldCode::LenIndexed(k), Value::Bytes(v)) => {
            let len = scope
                .get(*k)
                .and_then(Value::as_uint)
                .ok_or_else(|| format!("length field {k} is missing or not an integer"))?;
            if v.len() as u64 != len {
                return Err(format!("length field {k} says {len}, value has {}", v.len()));
            }
            out.extend_from_slice(v);
        }
        (FieldCode::Remainder, Value::Bytes(v)) => out.extend_from_slice(v),
        (FieldCode::Tuple(codes), Value::Tuple(values)) => {
            encode_sequence(codes, values, out)?;
        }
        (FieldCode::Array(n, codes), Value::List(elements)) => {
            if elements.len() != *n {
                return Err(format!("expected {n} array elements, got {}", elements.len()));
            }
            for element in elements {
                encode_element(codes, element, out)?;
            }
        }
        (FieldCode::Greedy(codes), Value::List(elements)) => {
            for element in elements {
                encode_element(codes, element, out)?;
            }
        }
        (code, value) => {
            return Err(format!("value {value:?} does not match format {code:?}"));
        }
    }
    Ok(())
}

fn encode_element(codes: &[FieldCode], value: &Value, out: &mut Vec<u8>) -> Result<(), String> {
    if let [code] = codes {
        encode(code, value, out, &[])
    } else {
        match value {
            Value::Tuple(values) => encode_sequence(codes, values, out),
            other => Err(format!("expected a tuple element, got {other:?}")),
        }
    }
}

fn encode_sequence(codes: &[FieldCode], values: &[Value], out: &mut Vec<u8>) -> Result<(), String> {
    if codes.len() != values.len() {
        return Err(format!(
            "expected {} values in composition, got {}",
            codes.len(),
            values.len()
        ));
    }
    for (code, value) in codes.iter().zip(values) {
        encode(code, value, out, values)?;
    }
    Ok(())
}

/// Parse a format string into a sequence of compiled elements.
pub fn parse_format(fmt: &str) -> Result<Vec<FieldCode>, String> {
    let mut chars = fmt.chars().peekable();
    let codes = parse_sequence(&mut chars, None)?;
    if chars.peek().is_some() {
        return Err(format!("trailing characters in format {fmt:?}"));
    }
    Ok(codes)
}

fn parse_sequence(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    terminator: Option<char>,
) -> Result<Vec<FieldCode>, String> {
    let mut codes = Vec::new();
    loop {
        while chars.peek() == Some(&' ') {
            chars.next();
        }
        match chars.peek().copied() {
            None => {
                if let Some(t) = terminator {
                    return Err(format!("missing closing {t:?}"));
                }
                return Ok(codes);
            }
            Some(c) if Some(c) == terminator => {
                chars.next();
                return Ok(codes);
            }
            Some(_) => parse_element(chars, &mut codes)?,
        }
    }
}

fn parse_element(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    codes: &mut Vec<FieldCode>,
) -> Result<(), String> {
    let mut count: Option<usize> = None;
    while let Some(c) = chars.peek().copied() {
        if c.is_ascii_digit() {
            chars.next();
            let digit = c as usize - '0' as usize;
            count = Some(count.unwrap_or(0) * 10 + digit);
        } else {
            break;
        }
    }
    let c = chars.next().ok_or_else(|| "unexpected end of format".to_string())?;
    match c {
        '[' => {
            let inner = parse_sequence(chars, Some(']'))?;
            let n = count.ok_or_else(|| "array without a count".to_string())?;
            codes.push(FieldCode::Array(n, inner));
        }
        '(' => {
            if count.is_some() {
                return Err("count before a composition".to_string());
            }
            let inner = parse_sequence(chars, Some(')'))?;
            codes.push(FieldCode::Tuple(inner));
        }
        '{' => {
            if count.is_some() {
                return Err("count before a greedy repetition".to_string());
            }
            let inner = parse_sequence(chars, Some('}'))?;
            codes.push(FieldCode::Greedy(inner));
        }
        '/' => {
            let mut index: Option<usize> = None;
            while let Some(d) = chars.peek().copied() {
                if d.is_ascii_digit() {
                    chars.next();
                    index = Some(index.unwrap_or(0) * 10 + (d as usize - '0' as usize));
                } else {
                    break;
                }
            }
            let index = index.ok_or_else(|| "reference without a field index".to_string())?;
            match chars.next() {
                Some('s') => codes.push(FieldCode::LenIndexed(index)),
                other => return Err(format!("expected 's' after field reference, got {other:?}")),
            }
        }
        's' => {
            let n = count.ok_or_else(|| "byte string without a length".to_string())?;
            codes.push(FieldCode::Bytes(n));
        }
        '$' => {
            if count.is_some() {
                return Err("count before remainder".to_string());
            }
            codes.push(FieldCode::Remainder);
        }
        'n' => {
            for _ in 0..count.unwrap_or(1) {
                codes.push(FieldCode::CString);
            }
        }
        scalar => {
            let code = match scalar {
                'B' => FieldCode::U8,
                'b' => FieldCode::I8,
                'H' => FieldCode::U16,
                'h' => FieldCode::I16,
                'I' | 'L' => FieldCode::U32,
                'i' | 'l' => FieldCode::I32,
                'f' => FieldCode::F32,
                'd' => FieldCode::F64,
                '?' => FieldCode::Bool,
                other => return Err(format!("unknown format character {other:?}")),
            };
            for _ in 0..count.unwrap_or(1) {
                codes.push(code.clone());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static POSITION: LazyLock<Schema> =
        LazyLock::new(|| Schema::new("Position", &[("lat", "i"), ("lon", "i")]));

    static WAYPOINT: LazyLock<Schema> = LazyLock::new(|| {
        Schema::new(
            "Waypoint",
            &[
                ("ident", "6s"),
                ("posn", "(i i)"),
                ("unused", "I"),
                ("cmnt", "40s"),
            ],
        )
    });

    #[test]
    fn scalars_are_little_endian() {
        let schema: &'static Schema = &POSITION;
        let record = schema.unpack(&[0x01, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff]).unwrap();
        assert_eq!(record.value(0), Some(&Value::I32(1)));
        assert_eq!(record.value(1), Some(&Value::I32(-1)));
    }

    #[test]
    fn fixed_layout_roundtrip() {
        let schema: &'static Schema = &WAYPOINT;
        let mut data = Vec::new();
        data.extend_from_slice(b"HOME\0\0");
        data.extend_from_slice(&100i32.to_le_bytes());
        data.extend_from_slice(&(-200i32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 40]);
        let record = schema.unpack(&data).unwrap();
        assert_eq!(record.value(0).unwrap().as_bytes(), Some(&b"HOME\0\0"[..]));
        let posn = record.value(1).unwrap().as_tuple().unwrap();
        assert_eq!(posn, &[Value::I32(100), Value::I32(-200)]);
        assert_eq!(schema.pack(&record).unwrap(), data);
    }

    #[test]
    fn short_buffer_is_an_error_not_a_panic() {
        let schema: &'static Schema = &WAYPOINT;
        assert!(matches!(
            schema.unpack(&[0u8; 10]),
            Err(ProtocolError::Schema { schema: "Waypoint", .. })
        ));
    }

    #[test]
    fn leftover_bytes_are_an_error() {
        let schema: &'static Schema = &POSITION;
        assert!(schema.unpack(&[0u8; 9]).is_err());
    }

    #[test]
    fn cstring_reads_to_nul_and_consumes_it() {
        static S: LazyLock<Schema> =
            LazyLock::new(|| Schema::new("S", &[("ident", "n"), ("rest", "$")]));
        let schema: &'static Schema = &S;
        let record = schema.unpack(b"CAMP\0xy").unwrap();
        assert_eq!(record.value(0).unwrap().as_bytes(), Some(&b"CAMP"[..]));
        assert_eq!(record.value(1).unwrap().as_bytes(), Some(&b"xy"[..]));
        assert_eq!(schema.pack(&record).unwrap(), &b"CAMP\0xy"[..]);
    }

    #[test]
    fn unterminated_cstring_is_an_error() {
        static S: LazyLock<Schema> = LazyLock::new(|| Schema::new("S", &[("ident", "n")]));
        let schema: &'static Schema = &S;
        assert!(schema.unpack(b"CAMP").is_err());
    }

    #[test]
    fn greedy_repeats_until_exhaustion() {
        static S: LazyLock<Schema> =
            LazyLock::new(|| Schema::new("ProtocolArray", &[("protocol_array", "{B H}")]));
        let schema: &'static Schema = &S;
        let data = [b'L', 1, 0, b'A', 10, 0];
        let record = schema.unpack(&data).unwrap();
        let list = record.value(0).unwrap().as_list().unwrap();
        assert_eq!(
            list,
            &[
                Value::Tuple(vec![Value::U8(b'L'), Value::U16(1)]),
                Value::Tuple(vec![Value::U8(b'A'), Value::U16(10)]),
            ]
        );
        assert_eq!(schema.pack(&record).unwrap(), &data[..]);
    }

    #[test]
    fn greedy_on_empty_buffer_is_empty() {
        static S: LazyLock<Schema> = LazyLock::new(|| Schema::new("S", &[("strings", "{n}")]));
        let schema: &'static Schema = &S;
        let record = schema.unpack(&[]).unwrap();
        assert_eq!(record.value(0), Some(&Value::List(vec![])));
    }

    #[test]
    fn greedy_with_partial_element_is_an_error() {
        static S: LazyLock<Schema> = LazyLock::new(|| Schema::new("S", &[("pairs", "{B H}")]));
        let schema: &'static Schema = &S;
        assert!(schema.unpack(&[1, 2, 0, 3]).is_err());
    }

    #[test]
    fn array_is_exactly_n_elements() {
        static S: LazyLock<Schema> =
            LazyLock::new(|| Schema::new("S", &[("records", "3[B H]")]));
        let schema: &'static Schema = &S;
        let data = [1, 2, 0, 3, 4, 0, 5, 6, 0];
        let record = schema.unpack(&data).unwrap();
        assert_eq!(record.value(0).unwrap().as_list().unwrap().len(), 3);
        assert_eq!(schema.pack(&record).unwrap(), &data[..]);
        assert!(schema.unpack(&data[..6]).is_err());
    }

    #[test]
    fn counted_scalars_form_a_tuple() {
        static S: LazyLock<Schema> = LazyLock::new(|| Schema::new("S", &[("unknown", "(5B)")]));
        let schema: &'static Schema = &S;
        let record = schema.unpack(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(
            record.value(0),
            Some(&Value::Tuple(vec![
                Value::U8(1),
                Value::U8(2),
                Value::U8(3),
                Value::U8(4),
                Value::U8(5)
            ]))
        );
    }

    #[test]
    fn length_indexed_string_resolves_prior_field() {
        static S: LazyLock<Schema> =
            LazyLock::new(|| Schema::new("MemData", &[("length", "B"), ("data", "/0s")]));
        let schema: &'static Schema = &S;
        let record = schema.unpack(&[3, b'a', b'b', b'c']).unwrap();
        assert_eq!(record.value(1).unwrap().as_bytes(), Some(&b"abc"[..]));
        assert_eq!(schema.pack(&record).unwrap(), &[3, b'a', b'b', b'c'][..]);
    }

    #[test]
    fn length_indexed_mismatch_fails_to_pack() {
        static S: LazyLock<Schema> =
            LazyLock::new(|| Schema::new("MemData", &[("length", "B"), ("data", "/0s")]));
        let schema: &'static Schema = &S;
        let record = schema
            .record(vec![Value::U8(5), Value::Bytes(b"abc".to_vec())])
            .unwrap();
        assert!(schema.pack(&record).is_err());
    }

    #[test]
    fn remainder_takes_everything() {
        static S: LazyLock<Schema> =
            LazyLock::new(|| Schema::new("MemChunk", &[("offset", "I"), ("chunk", "$")]));
        let schema: &'static Schema = &S;
        let mut data = 0x1000u32.to_le_bytes().to_vec();
        data.extend_from_slice(&[9, 8, 7]);
        let record = schema.unpack(&data).unwrap();
        assert_eq!(record.value(0), Some(&Value::U32(0x1000)));
        assert_eq!(record.value(1).unwrap().as_bytes(), Some(&[9, 8, 7][..]));
        assert_eq!(schema.pack(&record).unwrap(), data);
    }

    #[test]
    fn bool_byte() {
        static S: LazyLock<Schema> = LazyLock::new(|| Schema::new("S", &[("new_trk", "?")]));
        let schema: &'static Schema = &S;
        assert_eq!(schema.unpack(&[0]).unwrap().value(0), Some(&Value::Bool(false)));
        assert_eq!(schema.unpack(&[2]).unwrap().value(0), Some(&Value::Bool(true)));
    }

    #[test]
    fn format_parser_rejects_garbage() {
        assert!(parse_format("q").is_err());
        assert!(parse_format("(i i").is_err());
        assert!(parse_format("[B]").is_err());
        assert!(parse_format("s").is_err());
        assert!(parse_format("/s").is_err());
    }

    #[test]
    fn raw_bytes_are_retained() {
        let schema: &'static Schema = &POSITION;
        let data = [1, 0, 0, 0, 2, 0, 0, 0];
        let record = schema.unpack(&data).unwrap();
        assert_eq!(&record.raw()[..], &data[..]);
    }
}
