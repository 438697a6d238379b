//! Tables of fixed-size records found through a `(count, offset)` pair.
//!
//! Each table kind is a [`Segment`] value describing its header order, the raw
//! record type, trailing padding and a finishing function that resolves
//! indirections (names stored as offsets from the record start and so on).

use std::{io, mem};

use super::{invalid_data, BinaryData, TrackedCursor};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderOrder {
    /// `count` then `offset`, the usual layout.
    CountOffset,
    /// `offset` then `count`.
    OffsetCount,
}

/// Finishing step: given the absolute start of a record and its raw fields,
/// produce the decoded value.
pub type FinishFn<R, T> = fn(&mut TrackedCursor, u64, &R) -> io::Result<T>;

pub struct Segment<R, T> {
    pub name: &'static str,
    pub order: HeaderOrder,
    /// Bytes after each record that belong to it but aren't decoded.
    pub padding: u64,
    /// Stop at the last complete record instead of failing on a short read.
    pub tolerate_truncation: bool,
    pub finish: FinishFn<R, T>,
}

impl<R: BinaryData, T> Segment<R, T> {
    pub fn record_size(&self) -> u64 {
        mem::size_of::<R>() as u64 + self.padding
    }

    /// Read the header pair at the cursor, decode the table it points to and
    /// leave the cursor just past the header.
    pub fn read(&self, buffer: &mut TrackedCursor) -> io::Result<Vec<T>> {
        let [first, second] = <[i32; 2]>::read(buffer)?;
        let (count, offset) = match self.order {
            HeaderOrder::CountOffset => (first, second),
            HeaderOrder::OffsetCount => (second, first),
        };
        let count = usize::try_from(count)
            .map_err(|_| invalid_data(format!("{}: negative count {count}", self.name)))?;
        let offset = u64::try_from(offset)
            .map_err(|_| invalid_data(format!("{}: negative offset {offset}", self.name)))?;

        log::debug!("{}: {} records at {:#x}", self.name, count, offset);

        buffer.restore_after(|buffer| {
            buffer.seek_to(offset);

            let mut raw = Vec::with_capacity(count.min(4096));
            for i in 0..count {
                let start = buffer.position();
                match R::read(buffer) {
                    Ok(record) => raw.push((start, record)),
                    Err(e)
                        if self.tolerate_truncation
                            && e.kind() == io::ErrorKind::UnexpectedEof =>
                    {
                        log::warn!(
                            "{}: table truncated after {} of {} records",
                            self.name,
                            i,
                            count
                        );
                        break;
                    }
                    Err(e) => return Err(e),
                }
                buffer.skip(self.padding);
            }

            raw.iter()
                .map(|(start, record)| (self.finish)(buffer, *start, record))
                .collect()
        })
    }
}
