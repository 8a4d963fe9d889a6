//! Value persistence
//!
//! Field values are written as little-endian `f64`. Restoring a value sets
//! both the committed and the pending value and does not propagate, so it
//! is meant for fields that are not yet wired, or for a graph restored as a
//! whole.

use bytes::{Buf, BufMut};
use ripple_core::{FieldId, RippleError, RippleResult};

use crate::FieldGraph;

/// Encoded size of one field value
pub const VALUE_SIZE: usize = 8;

impl FieldGraph {
    pub fn write_value(&self, id: FieldId, buf: &mut impl BufMut) -> RippleResult<()> {
        let value = self.field(id)?.value();
        if buf.remaining_mut() < VALUE_SIZE {
            return Err(RippleError::BufferTooShort {
                expected: VALUE_SIZE,
                actual: buf.remaining_mut(),
            });
        }
        buf.put_f64_le(value);
        Ok(())
    }

    pub fn read_value(&mut self, id: FieldId, buf: &mut impl Buf) -> RippleResult<()> {
        self.field(id)?;
        if buf.remaining() < VALUE_SIZE {
            return Err(RippleError::BufferTooShort {
                expected: VALUE_SIZE,
                actual: buf.remaining(),
            });
        }
        let value = buf.get_f64_le();
        let field = self.field_mut(id)?;
        field.value = value;
        field.pending = value;
        Ok(())
    }

    /// Write the values of `ids` back to back
    pub fn write_values(&self, ids: &[FieldId], buf: &mut impl BufMut) -> RippleResult<()> {
        let expected = ids.len() * VALUE_SIZE;
        if buf.remaining_mut() < expected {
            return Err(RippleError::BufferTooShort {
                expected,
                actual: buf.remaining_mut(),
            });
        }
        for &id in ids {
            self.write_value(id, buf)?;
        }
        Ok(())
    }

    /// Restore the values of `ids`. Nothing is restored if the buffer is short.
    pub fn read_values(&mut self, ids: &[FieldId], buf: &mut impl Buf) -> RippleResult<()> {
        let expected = ids.len() * VALUE_SIZE;
        if buf.remaining() < expected {
            return Err(RippleError::BufferTooShort {
                expected,
                actual: buf.remaining(),
            });
        }
        for &id in ids {
            self.read_value(id, buf)?;
        }
        Ok(())
    }
}
