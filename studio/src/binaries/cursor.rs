use std::io::{self, Read, Seek, SeekFrom, Write};

/// A run of bytes the decoder never looked at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnreadRun {
    pub offset: u64,
    pub data: Vec<u8>,
}

/// In-memory reader that remembers every byte handed out by [`Read`].
///
/// Seeking past the end clamps to the end of the buffer, so reads from there
/// come back short instead of the seek failing. Writes always fail.
pub struct TrackedCursor {
    data: Vec<u8>,
    pos: u64,
    consumed: Vec<bool>,
}

impl TrackedCursor {
    pub fn new(data: Vec<u8>) -> Self {
        let consumed = vec![false; data.len()];
        Self {
            data,
            pos: 0,
            consumed,
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Absolute seek. Returns the position actually reached.
    pub fn seek_to(&mut self, pos: u64) -> u64 {
        self.pos = pos.min(self.len());
        self.pos
    }

    pub fn skip(&mut self, count: u64) -> u64 {
        self.seek_to(self.pos.saturating_add(count))
    }

    /// Run `f`, then put the cursor back where it was, whether `f` failed or not.
    pub fn restore_after<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let saved = self.pos;
        let result = f(self);
        self.pos = saved;
        result
    }

    /// Read everything from the current position onwards.
    pub fn read_remaining(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        // Reading from memory can't fail.
        let _ = self.read_to_end(&mut out);
        out
    }

    pub fn is_consumed(&self, offset: u64) -> bool {
        self.consumed
            .get(offset as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Maximal runs of bytes that no read has covered, in file order.
    pub fn unread_runs(&self) -> Vec<UnreadRun> {
        let mut runs = Vec::new();
        let mut start = None;

        for (i, &used) in self.consumed.iter().enumerate() {
            match (used, start) {
                (false, None) => start = Some(i),
                (true, Some(s)) => {
                    runs.push(UnreadRun {
                        offset: s as u64,
                        data: self.data[s..i].to_vec(),
                    });
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push(UnreadRun {
                offset: s as u64,
                data: self.data[s..].to_vec(),
            });
        }
        runs
    }
}

impl Read for TrackedCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.pos as usize;
        let count = buf.len().min(self.data.len() - start);
        let end = start + count;

        buf[..count].copy_from_slice(&self.data[start..end]);
        self.consumed[start..end].fill(true);
        self.pos = end as u64;

        Ok(count)
    }
}

impl Seek for TrackedCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::End(d) => self.len().checked_add_signed(d),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
        };
        match target {
            Some(p) => Ok(self.seek_to(p)),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative position",
            )),
        }
    }
}

impl Write for TrackedCursor {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "tracked cursor is read only",
        ))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "tracked cursor is read only",
        ))
    }
}

#[cfg(test)]
mod cursor_tests {
    use super::*;

    fn rebuild(cursor: &TrackedCursor, runs: &[UnreadRun]) -> Vec<u8> {
        // Start from consumed bytes only, then lay the unread runs over the gaps.
        let mut out: Vec<u8> = cursor
            .data()
            .iter()
            .enumerate()
            .map(|(i, b)| if cursor.is_consumed(i as u64) { *b } else { 0xAA })
            .collect();
        for run in runs {
            let start = run.offset as usize;
            out[start..start + run.data.len()].copy_from_slice(&run.data);
        }
        out
    }

    #[test]
    fn unread_runs_are_the_complement() {
        let data: Vec<u8> = (0..32).collect();
        let mut cursor = TrackedCursor::new(data.clone());

        let mut buf = [0; 4];
        cursor.read_exact(&mut buf).unwrap();
        cursor.seek_to(10);
        cursor.read_exact(&mut buf).unwrap();
        // Reading the same bytes twice is fine.
        cursor.seek_to(12);
        cursor.read_exact(&mut buf).unwrap();
        cursor.seek_to(30);
        let mut two = [0; 2];
        cursor.read_exact(&mut two).unwrap();

        let runs = cursor.unread_runs();
        assert_eq!(
            runs,
            vec![
                UnreadRun {
                    offset: 4,
                    data: (4..10).collect()
                },
                UnreadRun {
                    offset: 16,
                    data: (16..30).collect()
                },
            ]
        );
        assert_eq!(rebuild(&cursor, &runs), data);
    }

    #[test]
    fn untouched_buffer_is_one_run() {
        let cursor = TrackedCursor::new(vec![1, 2, 3]);
        assert_eq!(
            cursor.unread_runs(),
            vec![UnreadRun {
                offset: 0,
                data: vec![1, 2, 3]
            }]
        );
        assert!(TrackedCursor::new(Vec::new()).unread_runs().is_empty());
    }

    #[test]
    fn seek_past_end_clamps() {
        let mut cursor = TrackedCursor::new(vec![0; 8]);
        assert_eq!(cursor.seek(SeekFrom::Start(100)).unwrap(), 8);
        let mut buf = [0; 4];
        assert_eq!(cursor.read(&mut buf).unwrap(), 0);
        assert_eq!(
            cursor.read_exact(&mut buf).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
        assert!(cursor.seek(SeekFrom::Current(-100)).is_err());
        assert_eq!(cursor.seek(SeekFrom::End(-2)).unwrap(), 6);
    }

    #[test]
    fn restore_after_keeps_position_on_error() {
        let mut cursor = TrackedCursor::new(vec![0; 8]);
        cursor.seek_to(2);
        let result: io::Result<()> = cursor.restore_after(|c| {
            c.seek_to(7);
            let mut buf = [0; 4];
            c.read_exact(&mut buf)
        });
        assert!(result.is_err());
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn writes_are_rejected() {
        let mut cursor = TrackedCursor::new(vec![0; 8]);
        assert_eq!(
            cursor.write(&[1]).unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
    }
}
