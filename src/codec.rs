/// codec.rs — big-endian header and attribute encoding for the motif table.
///
/// On-disk header layout (160 bytes, all fields big-endian i32):
///
/// ```text
/// bytes   0.. 4   magic
/// bytes   4.. 8   motif_len
/// bytes   8..12   pad_len
/// bytes  12..16   num_attrs
/// bytes  16..144  attr_len[32]     (trailing slots zero)
/// bytes 144..148  data_entry_len
/// bytes 148..160  reserved
/// ```
use crate::error::{OligoError, Result};

pub const HEADER_SIZE: usize = 160;
pub const MAX_ATTRS: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub magic: i32,
    pub motif_len: i32,
    pub pad_len: i32,
    pub num_attrs: i32,
    pub attr_len: [i32; MAX_ATTRS],
    pub data_entry_len: i32,
}

impl Header {
    pub fn attr_widths(&self) -> &[i32] {
        &self.attr_len[..self.num_attrs as usize]
    }
}

/// Builds a 160-byte header. `attr_len.len()` becomes `num_attrs`; trailing
/// slots up to MAX_ATTRS are zero. Caller is responsible for keeping
/// `attr_len.len() <= MAX_ATTRS`.
pub fn encode_header(magic: i32, motif_len: i32, pad_len: i32, attr_len: &[i32]) -> [u8; HEADER_SIZE] {
    debug_assert!(attr_len.len() <= MAX_ATTRS, "too many attributes");
    let num_attrs = attr_len.len();

    let mut buf = [0u8; HEADER_SIZE];
    let mut cur = 0;
    put_i32(&mut buf, &mut cur, magic);
    put_i32(&mut buf, &mut cur, motif_len);
    put_i32(&mut buf, &mut cur, pad_len);
    put_i32(&mut buf, &mut cur, num_attrs as i32);

    let mut sum = 0i32;
    for i in 0..MAX_ATTRS {
        let v = attr_len.get(i).copied().unwrap_or(0);
        put_i32(&mut buf, &mut cur, v);
        if i < num_attrs {
            sum += v;
        }
    }
    put_i32(&mut buf, &mut cur, motif_len + pad_len + sum);
    // remaining bytes stay zero (reserved)
    buf
}

/// Parses and validates a 160-byte header.
pub fn decode_header(bytes: &[u8; HEADER_SIZE]) -> Result<Header> {
    let magic = get_i32(bytes, 0);
    let motif_len = get_i32(bytes, 4);
    let pad_len = get_i32(bytes, 8);
    let num_attrs = get_i32(bytes, 12);

    if !(0..=MAX_ATTRS as i32).contains(&num_attrs) {
        return Err(OligoError::BadFormat(format!(
            "num_attrs {num_attrs} out of range 0..={MAX_ATTRS}"
        )));
    }

    let mut attr_len = [0i32; MAX_ATTRS];
    let mut sum = 0i32;
    for i in 0..MAX_ATTRS {
        let v = get_i32(bytes, 16 + i * 4);
        attr_len[i] = v;
        if (i as i32) < num_attrs {
            if !matches!(v, 1 | 2 | 4) {
                return Err(OligoError::BadFormat(format!(
                    "attr_len[{i}] = {v}, expected one of 1, 2, 4"
                )));
            }
            sum += v;
        }
    }

    let data_entry_len = get_i32(bytes, 144);
    let expected = motif_len + pad_len + sum;
    if data_entry_len != expected {
        return Err(OligoError::BadFormat(format!(
            "data_entry_len {data_entry_len} disagrees with header fields (expected {expected})"
        )));
    }

    Ok(Header {
        magic,
        motif_len,
        pad_len,
        num_attrs,
        attr_len,
        data_entry_len,
    })
}

/// Decodes a big-endian signed attribute of the given byte width, sign-extending to i32.
pub fn read_attr(bytes: &[u8], width: i32) -> i32 {
    match width {
        1 => bytes[0] as i8 as i32,
        2 => i16::from_be_bytes([bytes[0], bytes[1]]) as i32,
        4 => i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        _ => panic!("attribute width must be 1, 2, or 4, got {width}"),
    }
}

/// Encodes `value` into `width` big-endian bytes, truncating silently on overflow
/// (matches S6: writing 1000 into a 1-byte field reads back as -24).
pub fn write_attr(buf: &mut [u8], width: i32, value: i32) {
    match width {
        1 => buf[0] = value as u8,
        2 => buf[..2].copy_from_slice(&(value as i16).to_be_bytes()),
        4 => buf[..4].copy_from_slice(&value.to_be_bytes()),
        _ => panic!("attribute width must be 1, 2, or 4, got {width}"),
    }
}

fn put_i32(buf: &mut [u8], cur: &mut usize, v: i32) {
    buf[*cur..*cur + 4].copy_from_slice(&v.to_be_bytes());
    *cur += 4;
}

fn get_i32(buf: &[u8], at: usize) -> i32 {
    i32::from_be_bytes(buf[at..at + 4].try_into().unwrap())
}
