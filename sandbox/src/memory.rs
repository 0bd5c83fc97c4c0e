//! Bounds-checked reads from guest linear memory.
//!
//! Pointer and length arguments arrive as raw `i32` values from the guest
//! and are validated against the current memory size before any access.

use hostlink_hostapi::HostError;

/// Read `len` bytes from guest memory at `ptr`.
///
/// Returns `Err(BadPointer)` if the range `[ptr, ptr+len)` is out of bounds.
pub fn read_bytes(mem: &[u8], ptr: i32, len: i32) -> Result<Vec<u8>, HostError> {
    let (start, end) = checked_range(mem.len(), ptr, len)?;
    Ok(mem[start..end].to_vec())
}

fn checked_range(mem_size: usize, ptr: i32, len: i32) -> Result<(usize, usize), HostError> {
    let start = usize::try_from(ptr).map_err(|_| HostError::BadPointer)?;
    let len = usize::try_from(len).map_err(|_| HostError::BadPointer)?;
    let end = start.checked_add(len).ok_or(HostError::BadPointer)?;
    if end > mem_size {
        return Err(HostError::BadPointer);
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bytes_basic() {
        let mem = b"hello world";
        assert_eq!(read_bytes(mem, 6, 5).unwrap(), b"world");
        assert_eq!(read_bytes(mem, 0, 0).unwrap(), b"");
    }

    #[test]
    fn test_read_bytes_out_of_bounds() {
        let mem = [0u8; 3];
        assert!(read_bytes(&mem, 1, 3).is_err());
        assert!(read_bytes(&mem, -1, 1).is_err());
        assert!(read_bytes(&mem, 0, -1).is_err());
        assert!(matches!(
            read_bytes(&mem, i32::MAX, i32::MAX),
            Err(HostError::BadPointer)
        ));
    }

    #[test]
    fn test_read_bytes_up_to_the_last_byte() {
        let mem = [7u8; 100];
        assert_eq!(read_bytes(&mem, 0, 100).unwrap().len(), 100);
        assert!(read_bytes(&mem, 100, 0).unwrap().is_empty());
        assert!(read_bytes(&mem, 0, 101).is_err());
        assert!(read_bytes(&mem, 99, 2).is_err());
    }
}
