//! Little-endian readers and alignment helpers

/// Read a little-endian `u32` at `offset`, or `None` if it runs past `data`.
pub fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Round `n` up to the next multiple of 4.
pub const fn align4(n: usize) -> usize {
    (n + 3) & !3
}
