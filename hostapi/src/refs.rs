//! Boundary value references.
//!
//! Strings and arrays cannot cross the boundary, so the guest holds them
//! by reference: a non-zero `i32` naming an entry in the session's
//! `RefTable`. References are a separate id space from pending-read
//! handles. A reference names a value; a handle names a read in progress.

use crate::error::{HostError, ResourceKind};
use crate::handle_table::HandleTable;
use crate::types::NULL_REF;

/// A host-owned value the guest holds by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryValue {
    Str(String),
    StrArray(Vec<String>),
    /// Growable value array built with `make_array` / `push`.
    Values(Vec<i32>),
    /// Growable byte array built with the byte-array builder.
    Bytes(Vec<u8>),
}

impl BoundaryValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::StrArray(_) => "string array",
            Self::Values(_) => "value array",
            Self::Bytes(_) => "byte array",
        }
    }
}

/// Reference-keyed table of boundary values owned by one session.
#[derive(Debug)]
pub struct RefTable {
    values: HandleTable<BoundaryValue>,
}

impl Default for RefTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RefTable {
    /// Create an empty table. The first reference issued is `1`.
    pub fn new() -> Self {
        Self {
            values: HandleTable::starting_at(ResourceKind::Value, NULL_REF + 1),
        }
    }

    pub fn insert(&mut self, value: BoundaryValue) -> Result<i32, HostError> {
        self.values.allocate(value)
    }

    pub fn insert_str(&mut self, s: impl Into<String>) -> Result<i32, HostError> {
        self.insert(BoundaryValue::Str(s.into()))
    }

    pub fn get(&self, reference: i32) -> Option<&BoundaryValue> {
        self.values.get(reference)
    }

    /// Borrow a string value.
    pub fn str(&self, reference: i32) -> Result<&str, HostError> {
        match self.values.get(reference) {
            Some(BoundaryValue::Str(s)) => Ok(s),
            Some(other) => Err(wrong_type(reference, other, "string")),
            None => Err(HostError::unknown_ref(reference)),
        }
    }

    /// Borrow a string-array value.
    pub fn str_array(&self, reference: i32) -> Result<&[String], HostError> {
        match self.values.get(reference) {
            Some(BoundaryValue::StrArray(items)) => Ok(items),
            Some(other) => Err(wrong_type(reference, other, "string array")),
            None => Err(HostError::unknown_ref(reference)),
        }
    }

    /// Append to a value array in place.
    pub fn push_value(&mut self, reference: i32, value: i32) -> Result<(), HostError> {
        match self.values.require_mut(reference)? {
            BoundaryValue::Values(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(wrong_type(reference, other, "value array")),
        }
    }

    /// Append to a byte array in place.
    pub fn push_byte(&mut self, reference: i32, byte: u8) -> Result<(), HostError> {
        match self.values.require_mut(reference)? {
            BoundaryValue::Bytes(bytes) => {
                bytes.push(byte);
                Ok(())
            }
            other => Err(wrong_type(reference, other, "byte array")),
        }
    }

    /// Remove a value array from the table, handing ownership to the caller.
    ///
    /// A reference of the wrong type is left in place.
    pub fn take_values(&mut self, reference: i32) -> Result<Vec<i32>, HostError> {
        match self.values.get(reference) {
            Some(BoundaryValue::Values(_)) => {}
            Some(other) => return Err(wrong_type(reference, other, "value array")),
            None => return Err(HostError::unknown_ref(reference)),
        }
        match self.values.release(reference) {
            Some(BoundaryValue::Values(items)) => Ok(items),
            _ => Err(HostError::unknown_ref(reference)),
        }
    }

    /// Remove a byte array from the table, handing ownership to the caller.
    pub fn take_bytes(&mut self, reference: i32) -> Result<Vec<u8>, HostError> {
        match self.values.get(reference) {
            Some(BoundaryValue::Bytes(_)) => {}
            Some(other) => return Err(wrong_type(reference, other, "byte array")),
            None => return Err(HostError::unknown_ref(reference)),
        }
        match self.values.release(reference) {
            Some(BoundaryValue::Bytes(bytes)) => Ok(bytes),
            _ => Err(HostError::unknown_ref(reference)),
        }
    }

    /// Drop a reference. Idempotent.
    pub fn release(&mut self, reference: i32) -> Option<BoundaryValue> {
        self.values.release(reference)
    }

    /// Number of live references.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn wrong_type(reference: i32, found: &BoundaryValue, expected: &'static str) -> HostError {
    tracing::debug!(reference, found = found.type_name(), expected, "reference type mismatch");
    HostError::WrongType {
        kind: ResourceKind::Value,
        id: reference.into(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reference_is_not_null() {
        let mut refs = RefTable::new();
        let r = refs.insert_str("hi").unwrap();
        assert_ne!(r, NULL_REF);
        assert_eq!(refs.str(r).unwrap(), "hi");
    }

    #[test]
    fn test_null_reference_is_never_live() {
        let refs = RefTable::new();
        assert!(refs.get(NULL_REF).is_none());
        assert!(refs.str(NULL_REF).unwrap_err().is_not_found());
    }

    #[test]
    fn test_push_value_keeps_identity() {
        let mut refs = RefTable::new();
        let arr = refs.insert(BoundaryValue::Values(Vec::new())).unwrap();
        refs.push_value(arr, 65).unwrap();
        refs.push_value(arr, 66).unwrap();
        assert_eq!(refs.get(arr), Some(&BoundaryValue::Values(vec![65, 66])));
    }

    #[test]
    fn test_push_to_wrong_type() {
        let mut refs = RefTable::new();
        let s = refs.insert_str("text").unwrap();
        let err = refs.push_value(s, 1).unwrap_err();
        assert!(matches!(err, HostError::WrongType { .. }));
        assert_eq!(refs.str(s).unwrap(), "text");
    }

    #[test]
    fn test_take_values_consumes() {
        let mut refs = RefTable::new();
        let arr = refs.insert(BoundaryValue::Values(vec![1, 2, 3])).unwrap();
        assert_eq!(refs.take_values(arr).unwrap(), vec![1, 2, 3]);
        assert!(refs.take_values(arr).unwrap_err().is_not_found());
        assert!(refs.is_empty());
    }

    #[test]
    fn test_take_wrong_type_leaves_value() {
        let mut refs = RefTable::new();
        let bytes = refs.insert(BoundaryValue::Bytes(vec![1])).unwrap();
        assert!(refs.take_values(bytes).is_err());
        assert_eq!(refs.take_bytes(bytes).unwrap(), vec![1]);
    }

    #[test]
    fn test_push_byte() {
        let mut refs = RefTable::new();
        let b = refs.insert(BoundaryValue::Bytes(Vec::new())).unwrap();
        refs.push_byte(b, 0x41).unwrap();
        refs.push_byte(b, 0x42).unwrap();
        assert_eq!(refs.take_bytes(b).unwrap(), b"AB".to_vec());
    }

    #[test]
    fn test_str_array_lookup() {
        let mut refs = RefTable::new();
        let r = refs
            .insert(BoundaryValue::StrArray(vec!["a".into(), "b".into()]))
            .unwrap();
        assert_eq!(refs.str_array(r).unwrap(), ["a".to_string(), "b".to_string()]);
        assert!(refs.str(r).is_err());
    }

    #[test]
    fn test_release_idempotent() {
        let mut refs = RefTable::new();
        let r = refs.insert_str("x").unwrap();
        assert!(refs.release(r).is_some());
        assert!(refs.release(r).is_none());
    }
}
