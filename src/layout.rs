//! Declarative fixed-layout codec for wire-format instruction payloads and
//! account buffers. All multi-byte integers are little-endian, matching the
//! on-chain programs this crate interoperates with.

use crate::error::{AppError, AppResult};
use solana_sdk::pubkey::Pubkey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    U8,
    U32,
    U64,
    I64,
    /// 32-byte public key.
    Address,
    /// Fixed-length raw byte run.
    Bytes(usize),
    /// u32-LE count prefix followed by that many rows of the sub-layout.
    /// The sub-layout must itself be fixed-size.
    Seq(Vec<Field>),
}

impl Field {
    fn span(&self) -> Option<usize> {
        match self {
            Field::U8 => Some(1),
            Field::U32 => Some(4),
            Field::U64 | Field::I64 => Some(8),
            Field::Address => Some(32),
            Field::Bytes(n) => Some(*n),
            Field::Seq(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Carries every unsigned width; encoding range-checks against the
    /// declared field width instead of truncating.
    U64(u64),
    I64(i64),
    Address(Pubkey),
    Bytes(Vec<u8>),
    Seq(Vec<Vec<Value>>),
}

#[derive(Clone, Debug)]
pub struct Layout {
    fields: Vec<Field>,
}

impl Layout {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Total byte span, or `None` when the layout contains a sequence.
    pub fn span(&self) -> Option<usize> {
        self.fields.iter().map(Field::span).sum()
    }

    pub fn encode(&self, values: &[Value]) -> AppResult<Vec<u8>> {
        if values.len() != self.fields.len() {
            return Err(AppError::LayoutMismatch(format!(
                "expected {} values, got {}",
                self.fields.len(),
                values.len()
            )));
        }
        let mut out = Vec::new();
        for (field, value) in self.fields.iter().zip(values) {
            encode_field(field, value, &mut out)?;
        }
        Ok(out)
    }

    pub fn decode(&self, bytes: &[u8]) -> AppResult<Vec<Value>> {
        if let Some(span) = self.span() {
            if bytes.len() != span {
                return Err(AppError::LayoutMismatch(format!(
                    "layout spans {span} bytes, buffer holds {}",
                    bytes.len()
                )));
            }
        }
        let mut offset = 0usize;
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            values.push(decode_field(field, bytes, &mut offset)?);
        }
        if offset != bytes.len() {
            return Err(AppError::LayoutMismatch(format!(
                "{} trailing bytes after layout end",
                bytes.len() - offset
            )));
        }
        Ok(values)
    }
}

fn encode_field(field: &Field, value: &Value, out: &mut Vec<u8>) -> AppResult<()> {
    match (field, value) {
        (Field::U8, Value::U64(v)) => {
            let byte = u8::try_from(*v)
                .map_err(|_| AppError::LayoutMismatch(format!("value {v} exceeds u8 width")))?;
            out.push(byte);
        }
        (Field::U32, Value::U64(v)) => {
            let word = u32::try_from(*v)
                .map_err(|_| AppError::LayoutMismatch(format!("value {v} exceeds u32 width")))?;
            out.extend_from_slice(&word.to_le_bytes());
        }
        (Field::U64, Value::U64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Field::I64, Value::I64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Field::Address, Value::Address(pk)) => out.extend_from_slice(pk.as_ref()),
        (Field::Bytes(n), Value::Bytes(b)) => {
            if b.len() != *n {
                return Err(AppError::LayoutMismatch(format!(
                    "byte field expects {n} bytes, got {}",
                    b.len()
                )));
            }
            out.extend_from_slice(b);
        }
        (Field::Seq(row), Value::Seq(rows)) => {
            let count = u32::try_from(rows.len()).map_err(|_| {
                AppError::LayoutMismatch("sequence count exceeds u32".to_string())
            })?;
            out.extend_from_slice(&count.to_le_bytes());
            let row_layout = Layout::new(row.clone());
            for values in rows {
                out.extend_from_slice(&row_layout.encode(values)?);
            }
        }
        (field, value) => {
            return Err(AppError::LayoutMismatch(format!(
                "value {value:?} does not fit field {field:?}"
            )));
        }
    }
    Ok(())
}

fn decode_field(field: &Field, bytes: &[u8], offset: &mut usize) -> AppResult<Value> {
    match field {
        Field::U8 => Ok(Value::U64(read_u8(bytes, offset)? as u64)),
        Field::U32 => Ok(Value::U64(read_u32(bytes, offset)? as u64)),
        Field::U64 => Ok(Value::U64(read_u64(bytes, offset)?)),
        Field::I64 => Ok(Value::I64(read_i64(bytes, offset)?)),
        Field::Address => Ok(Value::Address(read_pubkey(bytes, offset)?)),
        Field::Bytes(n) => Ok(Value::Bytes(read_bytes(bytes, offset, *n)?.to_vec())),
        Field::Seq(row) => {
            let count = read_u32(bytes, offset)? as usize;
            let row_layout = Layout::new(row.clone());
            let row_span = row_layout.span().ok_or_else(|| {
                AppError::LayoutMismatch("sequence rows must be fixed-size".to_string())
            })?;
            let needed = count.checked_mul(row_span).ok_or_else(|| {
                AppError::TruncatedBuffer("sequence length overflows".to_string())
            })?;
            if bytes.len() - *offset < needed {
                return Err(AppError::TruncatedBuffer(format!(
                    "sequence declares {count} rows ({needed} bytes), {} remain",
                    bytes.len() - *offset
                )));
            }
            let mut rows = Vec::with_capacity(count);
            for _ in 0..count {
                let slice = &bytes[*offset..*offset + row_span];
                rows.push(row_layout.decode(slice)?);
                *offset += row_span;
            }
            Ok(Value::Seq(rows))
        }
    }
}

// Cursor primitives shared with the account decoders.

pub fn read_u8(data: &[u8], offset: &mut usize) -> AppResult<u8> {
    let b = read_bytes(data, offset, 1)?;
    Ok(b[0])
}

pub fn read_u32(data: &[u8], offset: &mut usize) -> AppResult<u32> {
    let b = read_bytes(data, offset, 4)?;
    Ok(u32::from_le_bytes(b.try_into().unwrap()))
}

pub fn read_u64(data: &[u8], offset: &mut usize) -> AppResult<u64> {
    let b = read_bytes(data, offset, 8)?;
    Ok(u64::from_le_bytes(b.try_into().unwrap()))
}

pub fn read_i64(data: &[u8], offset: &mut usize) -> AppResult<i64> {
    let b = read_bytes(data, offset, 8)?;
    Ok(i64::from_le_bytes(b.try_into().unwrap()))
}

pub fn read_pubkey(data: &[u8], offset: &mut usize) -> AppResult<Pubkey> {
    let b = read_bytes(data, offset, 32)?;
    Ok(Pubkey::try_from(b).unwrap())
}

pub fn read_bytes<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> AppResult<&'a [u8]> {
    let end = offset.checked_add(len).ok_or_else(|| {
        AppError::TruncatedBuffer("offset overflow".to_string())
    })?;
    if end > data.len() {
        return Err(AppError::TruncatedBuffer(format!(
            "need {len} bytes at offset {offset}, buffer holds {}",
            data.len()
        )));
    }
    let slice = &data[*offset..end];
    *offset = end;
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> Layout {
        Layout::new(vec![Field::U8, Field::U64, Field::I64, Field::Address])
    }

    #[test]
    fn round_trips_fixed_layout() {
        let layout = sample_layout();
        let values = vec![
            Value::U64(14),
            Value::U64(1_500_000_000),
            Value::I64(-7),
            Value::Address(Pubkey::new_unique()),
        ];
        let bytes = layout.encode(&values).unwrap();
        assert_eq!(bytes.len(), 49);
        assert_eq!(layout.decode(&bytes).unwrap(), values);
    }

    #[test]
    fn encode_rejects_out_of_range_numeric() {
        let layout = Layout::new(vec![Field::U8]);
        let err = layout.encode(&[Value::U64(300)]).unwrap_err();
        assert!(matches!(err, AppError::LayoutMismatch(_)));

        let layout = Layout::new(vec![Field::U32]);
        let err = layout.encode(&[Value::U64(u64::MAX)]).unwrap_err();
        assert!(matches!(err, AppError::LayoutMismatch(_)));
    }

    #[test]
    fn decode_rejects_wrong_span() {
        let layout = sample_layout();
        let err = layout.decode(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, AppError::LayoutMismatch(_)));
    }

    #[test]
    fn sequence_round_trip_and_truncation() {
        let layout = Layout::new(vec![Field::U8, Field::Seq(vec![Field::U64, Field::Address])]);
        let values = vec![
            Value::U64(1),
            Value::Seq(vec![
                vec![Value::U64(10), Value::Address(Pubkey::new_unique())],
                vec![Value::U64(20), Value::Address(Pubkey::new_unique())],
            ]),
        ];
        let bytes = layout.encode(&values).unwrap();
        assert_eq!(layout.decode(&bytes).unwrap(), values);

        // Count claims more rows than the buffer holds.
        let mut short = bytes.clone();
        short[1..5].copy_from_slice(&9u32.to_le_bytes());
        let err = layout.decode(&short).unwrap_err();
        assert!(matches!(err, AppError::TruncatedBuffer(_)));
    }
}
