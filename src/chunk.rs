//! Chunk reader
//!
//! Reads the decimal integers found on lines terminating inside a half-open
//! byte range `[start, end)` of a file. When `start` lands mid-line, the
//! partial leading line is skipped, since it belongs to whichever task
//! covers the range that contains its newline; when `start` already
//! coincides with a line's first byte, nothing is discarded. This is what
//! lets an arbitrary partition of a file into byte ranges reconstruct
//! exactly the same sequence of integers as a single top-to-bottom read.

use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

/// Lazily yields the integers on lines contained in `[start, end)` of `path`.
pub struct ChunkReader {
    reader: BufReader<File>,
    remaining: u64,
    line_buf: String,
}

impl ChunkReader {
    /// Open `path` and seek to `start`, discarding the partial leading line
    /// unless `start` already coincides with the start of a line.
    pub fn open(path: &std::path::Path, start: u64, end: u64) -> Result<Self> {
        let mut file = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut remaining = end.saturating_sub(start);
        let needs_discard = start > 0 && !starts_at_line_boundary(&mut file, start)?;

        file.seek(SeekFrom::Start(start))
            .with_context(|| format!("failed to seek to offset {start} in {}", path.display()))?;
        let mut reader = BufReader::new(file);

        if needs_discard {
            let mut discard = Vec::new();
            let consumed = read_until_bounded(&mut reader, &mut discard, remaining)?;
            remaining = remaining.saturating_sub(consumed);
        }

        Ok(Self {
            reader,
            remaining,
            line_buf: String::new(),
        })
    }
}

/// `start` sits at a line boundary if it is 0 or the byte immediately
/// preceding it is `\n`. Leaves `file`'s cursor position unspecified; the
/// caller always re-seeks before reading.
fn starts_at_line_boundary(file: &mut File, start: u64) -> Result<bool> {
    if start == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(start - 1))
        .with_context(|| format!("failed to seek to offset {}", start - 1))?;
    let mut byte = [0u8; 1];
    file.read_exact(&mut byte)
        .with_context(|| format!("failed to read byte at offset {}", start - 1))?;
    Ok(byte[0] == b'\n')
}

impl Iterator for ChunkReader {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        loop {
            if self.remaining == 0 {
                return None;
            }
            self.line_buf.clear();
            let mut raw = Vec::new();
            let consumed =
                read_until_bounded(&mut self.reader, &mut raw, self.remaining).ok()?;
            if consumed == 0 {
                return None;
            }
            self.remaining = self.remaining.saturating_sub(consumed);

            // A trailing line that starts inside our range but was truncated
            // by `end` (no newline seen before the bound) belongs to the
            // next task, not to us.
            let ends_in_newline = raw.last() == Some(&b'\n');
            if !ends_in_newline && self.remaining == 0 {
                return None;
            }

            let line = String::from_utf8_lossy(&raw);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Ok(value) = trimmed.parse::<u64>() {
                return Some(value);
            }
            // Unparseable line: skip silently, try the next one.
        }
    }
}

/// Reads into `buf` up to and including the next `\n`, or until `bound`
/// bytes have been consumed, or EOF — whichever comes first. Returns the
/// number of bytes consumed from the stream.
fn read_until_bounded<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, bound: u64) -> Result<u64> {
    let mut consumed: u64 = 0;
    loop {
        if consumed >= bound {
            return Ok(consumed);
        }
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if available.is_empty() {
            return Ok(consumed);
        }
        let remaining_bound = (bound - consumed) as usize;
        let slice = &available[..available.len().min(remaining_bound)];
        match slice.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                buf.extend_from_slice(&slice[..=pos]);
                let used = pos + 1;
                reader.consume(used);
                consumed += used as u64;
                return Ok(consumed);
            }
            None => {
                let used = slice.len();
                buf.extend_from_slice(slice);
                reader.consume(used);
                consumed += used as u64;
                if used == 0 {
                    return Ok(consumed);
                }
            }
        }
    }
}

/// Reads the whole file sequentially, one integer per valid line. Used as
/// the ground-truth reference in tests and by callers that want a
/// single-threaded count to compare against the parallel result.
pub fn read_integers_whole_file(path: &std::path::Path) -> Result<Vec<u64>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut values = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(v) = trimmed.parse::<u64>() {
            values.push(v);
        }
    }
    Ok(values)
}

/// `File::metadata().len()` wrapped with context, matching this codebase's
/// startup-error convention.
pub fn file_size(path: &std::path::Path) -> Result<u64> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let size = file.seek(SeekFrom::End(0))?;
    // Leave the cursor where we found it isn't necessary; callers always re-open.
    let _ = file.read(&mut []);
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn whole_range_reads_all_lines() {
        let f = write_temp("2\n3\n4\n5\n6\n7\n8\n9\n");
        let size = file_size(f.path()).unwrap();
        let values: Vec<u64> = ChunkReader::open(f.path(), 0, size).unwrap().collect();
        assert_eq!(values, vec![2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn split_across_a_clean_line_boundary() {
        // "11\n13\n17\n" -> byte 3 is right after the first newline.
        let f = write_temp("11\n13\n17\n");
        let a: Vec<u64> = ChunkReader::open(f.path(), 0, 3).unwrap().collect();
        let b: Vec<u64> = ChunkReader::open(f.path(), 3, 9).unwrap().collect();
        assert_eq!(a, vec![11]);
        assert_eq!(b, vec![13, 17]);
    }

    #[test]
    fn split_mid_line_skips_partial_leading_line() {
        // "12\n13\n17\n": split at byte 2, which lands exactly on the '\n'.
        let f = write_temp("12\n13\n17\n");
        let a: Vec<u64> = ChunkReader::open(f.path(), 0, 2).unwrap().collect();
        let b: Vec<u64> = ChunkReader::open(f.path(), 2, 9).unwrap().collect();
        assert!(a.is_empty());
        assert_eq!(b, vec![13, 17]);
    }

    #[test]
    fn unparseable_line_is_skipped() {
        let f = write_temp("7\nfoo\n11\n");
        let size = file_size(f.path()).unwrap();
        let values: Vec<u64> = ChunkReader::open(f.path(), 0, size).unwrap().collect();
        assert_eq!(values, vec![7, 11]);
    }

    #[test]
    fn arbitrary_partition_matches_whole_file_read() {
        let contents = "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11\n12\n13\n";
        let f = write_temp(contents);
        let size = file_size(f.path()).unwrap();
        let reference = read_integers_whole_file(f.path()).unwrap();

        for split in 0..size {
            let mut combined: Vec<u64> = ChunkReader::open(f.path(), 0, split).unwrap().collect();
            combined.extend(ChunkReader::open(f.path(), split, size).unwrap());
            assert_eq!(combined, reference, "failed at split {split}");
        }
    }

    #[test]
    fn no_trailing_partial_line_double_counted() {
        // Last line has no trailing newline.
        let f = write_temp("2\n3\n5");
        let size = file_size(f.path()).unwrap();
        let mid = 2; // splits right after "2\n"
        let a: Vec<u64> = ChunkReader::open(f.path(), 0, mid).unwrap().collect();
        let b: Vec<u64> = ChunkReader::open(f.path(), mid, size).unwrap().collect();
        assert_eq!(a, vec![2]);
        assert_eq!(b, vec![3, 5]);
    }
}
