//! The interval contract and the reference codec.
//!
//! The tree never looks inside an interval beyond its `[start, end]` range.
//! Everything else (the payload, its encoding) is supplied by an
//! [`IntervalCodec`] injected when the tree is created or opened.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::{HistoryTreeError, HistoryTreeResult};

/// A record covering the closed time range `[start, end]`.
pub trait HtInterval: Clone + Send + Sync + 'static {
    /// First timestamp covered.
    fn start(&self) -> i64;

    /// Last timestamp covered.
    fn end(&self) -> i64;
}

/// Serializes intervals into node blocks.
///
/// `encode` must write exactly `encoded_size(interval)` bytes, and `decode`
/// must consume exactly the bytes `encode` wrote.
pub trait IntervalCodec: Send + Sync + 'static {
    /// The interval type this codec handles.
    type Interval: HtInterval;

    /// Number of bytes `encode` writes for this interval.
    fn encoded_size(&self, interval: &Self::Interval) -> usize;

    /// Appends the interval to `buf`.
    fn encode(&self, interval: &Self::Interval, buf: &mut BytesMut);

    /// Reads one interval from the front of `buf`.
    fn decode(&self, buf: &mut Bytes) -> HistoryTreeResult<Self::Interval>;
}

// =============================================================================
// Reference Interval
// =============================================================================

/// A general-purpose interval: a time range, an integer attribute and an
/// opaque value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasicInterval {
    /// First timestamp covered.
    pub start: i64,
    /// Last timestamp covered.
    pub end: i64,
    /// Caller-defined key, e.g. the attribute this state belongs to.
    pub attribute: i32,
    /// Opaque payload.
    pub value: Bytes,
}

impl BasicInterval {
    /// Fixed part of the encoding: start, end, attribute and value length.
    pub const FIXED_SIZE: usize = 8 + 8 + 4 + 4;

    /// Creates a new interval.
    pub fn new(start: i64, end: i64, attribute: i32, value: impl Into<Bytes>) -> Self {
        Self {
            start,
            end,
            attribute,
            value: value.into(),
        }
    }

    /// Creates an interval whose encoding is exactly `size` bytes.
    ///
    /// `size` is clamped to at least [`Self::FIXED_SIZE`].
    pub fn with_encoded_size(start: i64, end: i64, attribute: i32, size: usize) -> Self {
        let padding = size.saturating_sub(Self::FIXED_SIZE);
        Self::new(start, end, attribute, vec![0u8; padding])
    }
}

impl HtInterval for BasicInterval {
    fn start(&self) -> i64 {
        self.start
    }

    fn end(&self) -> i64 {
        self.end
    }
}

/// Codec for [`BasicInterval`].
///
/// Layout (little-endian):
///
/// ```text
/// ┌──────────┬──────────┬───────────────┬───────────────┬─────────────┐
/// │ start i64│ end i64  │ attribute i32 │ value_len i32 │ value bytes │
/// └──────────┴──────────┴───────────────┴───────────────┴─────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCodec;

impl IntervalCodec for BasicCodec {
    type Interval = BasicInterval;

    fn encoded_size(&self, interval: &BasicInterval) -> usize {
        BasicInterval::FIXED_SIZE + interval.value.len()
    }

    fn encode(&self, interval: &BasicInterval, buf: &mut BytesMut) {
        buf.put_i64_le(interval.start);
        buf.put_i64_le(interval.end);
        buf.put_i32_le(interval.attribute);
        buf.put_i32_le(interval.value.len() as i32);
        buf.put_slice(&interval.value);
    }

    fn decode(&self, buf: &mut Bytes) -> HistoryTreeResult<BasicInterval> {
        if buf.remaining() < BasicInterval::FIXED_SIZE {
            return Err(HistoryTreeError::deserialization(format!(
                "interval header needs {} bytes, {} left",
                BasicInterval::FIXED_SIZE,
                buf.remaining()
            )));
        }
        let start = buf.get_i64_le();
        let end = buf.get_i64_le();
        let attribute = buf.get_i32_le();
        let len = buf.get_i32_le();
        let len = usize::try_from(len).map_err(|_| {
            HistoryTreeError::deserialization(format!("negative value length {len}"))
        })?;
        if buf.remaining() < len {
            return Err(HistoryTreeError::deserialization(format!(
                "value needs {len} bytes, {} left",
                buf.remaining()
            )));
        }
        let value = buf.split_to(len);
        Ok(BasicInterval {
            start,
            end,
            attribute,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_codec_roundtrip() {
        let codec = BasicCodec;
        let interval = BasicInterval::new(10, 20, 3, &b"running"[..]);

        let mut buf = BytesMut::new();
        codec.encode(&interval, &mut buf);
        assert_eq!(buf.len(), codec.encoded_size(&interval));

        let mut bytes = buf.freeze();
        let decoded = codec.decode(&mut bytes).unwrap();
        assert_eq!(decoded, interval);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_with_encoded_size() {
        let codec = BasicCodec;
        let interval = BasicInterval::with_encoded_size(0, 1, 0, 64);
        assert_eq!(codec.encoded_size(&interval), 64);

        let tiny = BasicInterval::with_encoded_size(0, 1, 0, 3);
        assert_eq!(codec.encoded_size(&tiny), BasicInterval::FIXED_SIZE);
    }

    #[test]
    fn test_decode_truncated() {
        let codec = BasicCodec;
        let mut buf = BytesMut::new();
        codec.encode(&BasicInterval::new(0, 5, 1, &b"abcdef"[..]), &mut buf);

        let mut short = buf.freeze().slice(..BasicInterval::FIXED_SIZE + 2);
        assert!(matches!(
            codec.decode(&mut short),
            Err(HistoryTreeError::Deserialization(_))
        ));

        let mut empty = Bytes::new();
        assert!(codec.decode(&mut empty).is_err());
    }

    #[test]
    fn test_decode_negative_length() {
        let mut buf = BytesMut::new();
        buf.put_i64_le(0);
        buf.put_i64_le(1);
        buf.put_i32_le(0);
        buf.put_i32_le(-4);
        let mut bytes = buf.freeze();
        assert!(BasicCodec.decode(&mut bytes).is_err());
    }

    #[test]
    fn test_interval_trait() {
        let interval = BasicInterval::new(3, 9, 0, Bytes::new());
        assert_eq!(HtInterval::start(&interval), 3);
        assert_eq!(HtInterval::end(&interval), 9);
    }
}
