use crate::compiler::source::Source;
use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::thread;

/// Split `len` bytes into at most `workers` contiguous `(offset, size)` ranges.
pub fn chunk_ranges(len: u64, workers: usize) -> Vec<(u64, u64)> {
    let workers = workers.max(1) as u64;
    let chunk = ((len + workers - 1) / workers).max(1);

    let mut ranges = Vec::new();
    let mut offset = 0;
    while offset < len {
        let size = chunk.min(len - offset);
        ranges.push((offset, size));
        offset += size;
    }
    ranges
}

fn read_range(path: &Path, offset: u64, size: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;

    let mut buf = vec![0; size as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a whole file with one thread per chunk. The chunks are stitched back together in file
/// order, so the result never depends on how many workers were used.
pub fn read_chunked(path: &Path, workers: usize) -> Result<Vec<u8>> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("could not stat '{}'", path.display()))?
        .len();
    let ranges = chunk_ranges(len, workers);

    debug!(
        "reading {} byte(s) from '{}' in {} chunk(s)",
        len,
        path.display(),
        ranges.len()
    );

    let handles = ranges
        .into_iter()
        .map(|(offset, size)| {
            let path = path.to_owned();
            thread::spawn(move || read_range(&path, offset, size))
        })
        .collect::<Vec<_>>();

    let mut bytes = Vec::with_capacity(len as usize);
    for handle in handles {
        let chunk = handle
            .join()
            .map_err(|_| anyhow!("a reader thread for '{}' panicked", path.display()))?
            .with_context(|| format!("could not read '{}'", path.display()))?;
        bytes.extend(chunk);
    }

    Ok(bytes)
}

pub fn read_source(path: &Path, workers: usize) -> Result<Source> {
    let bytes = read_chunked(path, workers)?;
    let text = String::from_utf8(bytes)
        .with_context(|| format!("'{}' is not valid UTF-8", path.display()))?;

    Ok(Source::new(&text))
}

#[cfg(test)]
mod tests {
    use super::{chunk_ranges, read_chunked, read_source};
    use std::path::PathBuf;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("manv-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn ranges_cover_everything_once() {
        assert_eq!(chunk_ranges(10, 3), vec![(0, 4), (4, 4), (8, 2)]);
        assert_eq!(chunk_ranges(2, 5), vec![(0, 1), (1, 1)]);
        assert_eq!(chunk_ranges(7, 0), vec![(0, 7)]);
        assert!(chunk_ranges(0, 3).is_empty());
    }

    #[test]
    fn worker_count_does_not_change_content() {
        let text = "const msg: str = \"héllo wörld\";\nvar err: int;\n// ünïcode comment\nsyscall 1, 1, msg, 13, err;\n";
        let path = scratch_file("chunked.mv", text);

        for workers in 1..=8 {
            assert_eq!(read_chunked(&path, workers).unwrap(), text.as_bytes());
        }

        let source = read_source(&path, 4).unwrap();
        assert_eq!(source.len(), 4);
        assert_eq!(source.get(3).unwrap().content(), "// ünïcode comment");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("manv-this-file-does-not-exist.mv");
        assert!(read_source(&path, 2).is_err());
    }
}
