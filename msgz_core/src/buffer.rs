use bytes::{Bytes, BytesMut};

/// One logical payload stored as an ordered sequence of byte ranges.
///
/// Each range is an independently reference-counted [`Bytes`], so appending a
/// range from another buffer never copies the underlying bytes. `len()` is
/// kept equal to the sum of the range lengths by every operation.
#[derive(Debug, Clone, Default)]
pub struct ChunkedBuffer {
    chunks: Vec<Bytes>,
    len: usize,
}

/// How [`ChunkedBuffer::resplit`] re-chunks a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Keep the existing range boundaries.
    Identity,
    /// Collapse everything into a single range.
    MergeAll,
    /// Ranges of `n` bytes each (the last may be shorter). `Every(1)` puts
    /// every byte in its own range.
    Every(usize),
}

impl ChunkedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chunks(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        let mut buf = Self::new();
        for chunk in chunks {
            buf.push(chunk);
        }
        buf
    }

    /// Append one range. Zero-length ranges are kept as-is.
    pub fn push(&mut self, chunk: Bytes) {
        self.len += chunk.len();
        self.chunks.push(chunk);
    }

    /// Append every range of `other` by reference.
    pub fn extend_from(&mut self, other: &ChunkedBuffer) {
        self.chunks.reserve(other.chunks.len());
        for chunk in &other.chunks {
            self.push(chunk.clone());
        }
    }

    /// Total number of bytes across all ranges.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of ranges.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bytes> {
        self.chunks.iter()
    }

    /// Release every range at index `count` and beyond.
    ///
    /// Used to roll a buffer back to a previously observed `chunk_count()`.
    pub fn truncate_chunks(&mut self, count: usize) {
        if count >= self.chunks.len() {
            return;
        }
        for chunk in self.chunks.drain(count..) {
            self.len -= chunk.len();
        }
    }

    /// Remove the last `n` bytes (or everything, if shorter) and return them.
    pub fn trim_end(&mut self, n: usize) -> ChunkedBuffer {
        let mut remaining = n.min(self.len);
        let mut removed = Vec::new();
        while remaining > 0 {
            let Some(mut last) = self.chunks.pop() else {
                break;
            };
            if last.len() <= remaining {
                remaining -= last.len();
                self.len -= last.len();
                removed.push(last);
            } else {
                let tail = last.split_off(last.len() - remaining);
                self.len -= remaining;
                remaining = 0;
                self.chunks.push(last);
                removed.push(tail);
            }
        }
        removed.reverse();
        ChunkedBuffer::from_chunks(removed)
    }

    /// Drop every range.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    /// Merge all ranges into one contiguous `Bytes`.
    pub fn to_bytes(&self) -> Bytes {
        match self.chunks.as_slice() {
            [] => Bytes::new(),
            [single] => single.clone(),
            many => {
                let mut merged = BytesMut::with_capacity(self.len);
                for chunk in many {
                    merged.extend_from_slice(chunk);
                }
                merged.freeze()
            }
        }
    }

    /// The same bytes under different range boundaries.
    pub fn resplit(&self, mode: SplitMode) -> ChunkedBuffer {
        match mode {
            SplitMode::Identity => self.clone(),
            SplitMode::MergeAll => ChunkedBuffer::from_chunks([self.to_bytes()]),
            SplitMode::Every(n) => {
                let n = n.max(1);
                let merged = self.to_bytes();
                let total = merged.len();
                ChunkedBuffer::from_chunks(
                    (0..total)
                        .step_by(n)
                        .map(|start| merged.slice(start..(start + n).min(total))),
                )
            }
        }
    }
}

impl<'a> IntoIterator for &'a ChunkedBuffer {
    type Item = &'a Bytes;
    type IntoIter = std::slice::Iter<'a, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<Bytes> for ChunkedBuffer {
    fn from(chunk: Bytes) -> Self {
        ChunkedBuffer::from_chunks([chunk])
    }
}

impl From<Vec<u8>> for ChunkedBuffer {
    fn from(data: Vec<u8>) -> Self {
        Bytes::from(data).into()
    }
}

impl From<&'static [u8]> for ChunkedBuffer {
    fn from(data: &'static [u8]) -> Self {
        Bytes::from_static(data).into()
    }
}
