use std::io::{self, Read};

use glam::{Mat3, Vec3};

pub mod cursor;
pub mod segment;

pub use cursor::{TrackedCursor, UnreadRun};
pub use segment::{HeaderOrder, Segment};

/// Fixed-size records read straight out of the file.
///
/// Everything on disk is little-endian, matching every platform this runs on.
pub trait BinaryData: Sized {
    fn read<R: Read>(buffer: &mut R) -> io::Result<Self>;
}

impl<T: bytemuck::Pod> BinaryData for T {
    fn read<R: Read>(buffer: &mut R) -> io::Result<Self> {
        let mut value = T::zeroed();
        buffer.read_exact(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }
}

pub(crate) fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Offset of a null-terminated string, relative to some base position.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BinOffset {
    pub index: i32,
}

impl BinOffset {
    pub fn new(index: i32) -> Self {
        Self { index }
    }

    pub fn is_null(&self) -> bool {
        self.index == 0
    }

    pub fn absolute(&self, start: u64) -> io::Result<u64> {
        start
            .checked_add_signed(self.index as i64)
            .ok_or_else(|| invalid_data(format!("offset {} before file start", { self.index })))
    }

    /// Read the string at `start + index` without moving the cursor.
    pub fn read_str(&self, buffer: &mut TrackedCursor, start: u64) -> io::Result<String> {
        let pos = self.absolute(start)?;
        read_nullstr(buffer, Some(pos))
    }
}

/// Struct of (count, offset) for reading an array of items from an mdl
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BinArray {
    pub count: i32,
    pub offset: BinOffset,
}

impl BinArray {
    pub fn new(count: i32, offset: i32) -> Self {
        Self {
            count,
            offset: BinOffset::new(offset),
        }
    }

    pub fn len(&self) -> io::Result<usize> {
        usize::try_from(self.count)
            .map_err(|_| invalid_data(format!("negative table count {}", { self.count })))
    }

    pub fn is_empty(&self) -> bool {
        self.count <= 0
    }

    /// Read `count` consecutive records starting at `start + offset`, paired with
    /// the absolute position of each record. The cursor is left where it was.
    pub fn read_table<T: BinaryData>(
        &self,
        buffer: &mut TrackedCursor,
        start: u64,
    ) -> io::Result<Vec<(u64, T)>> {
        let count = self.len()?;
        let table = self.offset.absolute(start)?;

        buffer.restore_after(|buffer| {
            buffer.seek_to(table);

            let mut v = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                let pos = buffer.position();
                v.push((pos, T::read(buffer)?));
            }
            Ok(v)
        })
    }
}

/// Read a null-terminated string, either at the cursor or at an absolute offset.
///
/// Running off the end of the file terminates the string. When an offset is
/// given the cursor is restored afterwards.
pub fn read_nullstr(buffer: &mut TrackedCursor, pos: Option<u64>) -> io::Result<String> {
    fn read_here(buffer: &mut TrackedCursor) -> io::Result<String> {
        let mut data = Vec::new();
        let mut byte = [0u8];
        while buffer.read(&mut byte)? == 1 && byte[0] != 0 {
            data.push(byte[0]);
        }
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    match pos {
        Some(pos) => buffer.restore_after(|buffer| {
            buffer.seek_to(pos);
            read_here(buffer)
        }),
        None => read_here(buffer),
    }
}

/// Read `count` absolute string offsets at the cursor, then the strings they point to.
pub fn read_offset_array(buffer: &mut TrackedCursor, count: usize) -> io::Result<Vec<String>> {
    let offsets = (0..count)
        .map(|_| BinOffset::read(buffer))
        .collect::<io::Result<Vec<_>>>()?;

    offsets
        .into_iter()
        .map(|offset| offset.read_str(buffer, 0))
        .collect()
}

pub fn read_vec3(buffer: &mut TrackedCursor) -> io::Result<Vec3> {
    Vec3::read(buffer)
}

/// Strip trailing null padding from a fixed buffer and decode it.
pub fn trim_nulls(data: &[u8]) -> String {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Text of a fixed buffer up to the first null.
pub fn fixed_str(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Split a row-major 3x4 matrix into its 3x3 part and translation column.
pub fn decompose_3x4(m: [f32; 12]) -> (Mat3, Vec3) {
    let rotation = Mat3::from_cols(
        Vec3::new(m[0], m[4], m[8]),
        Vec3::new(m[1], m[5], m[9]),
        Vec3::new(m[2], m[6], m[10]),
    );
    (rotation, Vec3::new(m[3], m[7], m[11]))
}
