use bytes::{Bytes, BytesMut};

use crate::buffer::ChunkedBuffer;
use crate::error::CompressError;

/// Capacity of each output range allocated by [`drive`].
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Whether more input follows the range being fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flush {
    Continue,
    /// This is the final input; the engine must complete the stream.
    Finish,
}

/// Engine state after one [`StreamCodec::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Some work was done; call again if the output window filled up.
    Progress,
    /// No progress was possible with the space offered. Not a fault: the
    /// driver supplies a fresh window and retries.
    Exhausted,
    /// The stream is complete. No further output will be produced.
    StreamEnd,
}

/// Result of one [`StreamCodec::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub consumed: usize,
    pub produced: usize,
    pub status: Status,
}

/// Push-style interface to a stateful compression engine.
///
/// A codec instance lives for exactly one compress or decompress call. The
/// driver hands it input ranges in order together with the unfilled tail
/// of the current output window; the engine consumes as much input and
/// writes as much output as it can, keeping its internal state across
/// calls and window boundaries.
///
/// Engines with a one-shot block API are adapted to this interface by
/// staging input until [`Flush::Finish`] and draining the result.
pub trait StreamCodec {
    /// Short name used in fault reports.
    fn name(&self) -> &'static str;

    fn feed(&mut self, input: &[u8], output: &mut [u8], flush: Flush)
        -> Result<Step, CompressError>;

    /// Whether an empty payload should still be run through the engine.
    ///
    /// Encoders return `true` and emit their framing for the empty stream.
    /// Decoders return `false`: an empty payload decodes to nothing.
    fn finishes_empty_input(&self) -> bool {
        true
    }
}

/// Run `input` through `codec`, appending the result to `output` in ranges
/// of `chunk_size` bytes (the final range is trimmed to what was written).
///
/// On error every range appended by this call is released, so `output` is
/// exactly as it was before the call.
pub fn drive<C>(
    codec: &mut C,
    input: &ChunkedBuffer,
    output: &mut ChunkedBuffer,
    chunk_size: usize,
) -> Result<(), CompressError>
where
    C: StreamCodec + ?Sized,
{
    let mark = output.chunk_count();
    let result = drive_ranges(codec, input, output, chunk_size.max(1));
    if let Err(err) = &result {
        output.truncate_chunks(mark);
        tracing::info!(codec = codec.name(), error = %err, "codec stream failed");
    }
    result
}

fn drive_ranges<C>(
    codec: &mut C,
    input: &ChunkedBuffer,
    output: &mut ChunkedBuffer,
    chunk_size: usize,
) -> Result<(), CompressError>
where
    C: StreamCodec + ?Sized,
{
    if input.is_empty() && !codec.finishes_empty_input() {
        output.push(Bytes::new());
        return Ok(());
    }

    let empty = [Bytes::new()];
    let ranges = if input.chunk_count() == 0 {
        &empty[..]
    } else {
        input.chunks()
    };
    let last = ranges.len() - 1;

    let mut window = BytesMut::zeroed(chunk_size);
    let mut filled = 0usize;
    let mut status = Status::Progress;

    for (index, range) in ranges.iter().enumerate() {
        let flush = if index == last {
            Flush::Finish
        } else {
            Flush::Continue
        };
        let mut pending: &[u8] = range;

        loop {
            if filled == window.len() {
                let full = std::mem::replace(&mut window, BytesMut::zeroed(chunk_size));
                output.push(full.freeze());
                filled = 0;
            }

            let space = window.len() - filled;
            let step = codec.feed(pending, &mut window[filled..], flush)?;
            if step.consumed > pending.len() || step.produced > space {
                return Err(CompressError::codec(
                    codec.name(),
                    "engine reported more progress than was possible",
                ));
            }
            pending = &pending[step.consumed..];
            filled += step.produced;
            status = step.status;

            if status == Status::StreamEnd || filled < window.len() {
                break;
            }
        }

        if !pending.is_empty() {
            return Err(CompressError::codec(
                codec.name(),
                format!("{} input bytes not consumed", pending.len()),
            ));
        }
    }

    if status != Status::StreamEnd {
        return Err(CompressError::codec(codec.name(), "stream did not complete"));
    }

    window.truncate(filled);
    output.push(window.freeze());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits every input byte twice, holding back whatever does not fit in
    /// the current window.
    #[derive(Default)]
    struct DoublingCodec {
        backlog: std::collections::VecDeque<u8>,
    }

    impl StreamCodec for DoublingCodec {
        fn name(&self) -> &'static str {
            "doubling"
        }

        fn feed(
            &mut self,
            input: &[u8],
            output: &mut [u8],
            flush: Flush,
        ) -> Result<Step, CompressError> {
            for &b in input {
                self.backlog.extend([b, b]);
            }
            let n = self.backlog.len().min(output.len());
            for (slot, b) in output.iter_mut().zip(self.backlog.drain(..n)) {
                *slot = b;
            }
            let status = if flush == Flush::Finish && self.backlog.is_empty() {
                Status::StreamEnd
            } else {
                Status::Progress
            };
            Ok(Step { consumed: input.len(), produced: n, status })
        }
    }

    /// Reports a fault as soon as it sees the byte 0xff.
    struct PoisonCodec;

    impl StreamCodec for PoisonCodec {
        fn name(&self) -> &'static str {
            "poison"
        }

        fn feed(
            &mut self,
            input: &[u8],
            output: &mut [u8],
            flush: Flush,
        ) -> Result<Step, CompressError> {
            if input.contains(&0xff) {
                return Err(CompressError::codec("poison", "poisoned byte"));
            }
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            let status = if flush == Flush::Finish && n == input.len() {
                Status::StreamEnd
            } else {
                Status::Progress
            };
            Ok(Step { consumed: n, produced: n, status })
        }
    }

    #[test]
    fn engine_backlog_spills_into_fresh_windows() {
        let input = ChunkedBuffer::from(b"abcdefghij".to_vec()).resplit(crate::SplitMode::Every(3));
        let mut output = ChunkedBuffer::new();
        drive(&mut DoublingCodec::default(), &input, &mut output, 4).unwrap();

        let sizes: Vec<usize> = output.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 4, 4, 4, 4]);
        assert_eq!(&output.to_bytes()[..], b"aabbccddeeffgghhiijj");
    }

    /// Like zlib's buffer error: fills the window and reports `Exhausted`
    /// until its backlog is gone.
    #[derive(Default)]
    struct SoftLimitCodec {
        backlog: std::collections::VecDeque<u8>,
        exhausted: usize,
    }

    impl StreamCodec for SoftLimitCodec {
        fn name(&self) -> &'static str {
            "soft-limit"
        }

        fn feed(
            &mut self,
            input: &[u8],
            output: &mut [u8],
            flush: Flush,
        ) -> Result<Step, CompressError> {
            self.backlog.extend(input.iter().copied());
            let n = self.backlog.len().min(output.len());
            for (slot, b) in output.iter_mut().zip(self.backlog.drain(..n)) {
                *slot = b;
            }
            let status = if !self.backlog.is_empty() {
                self.exhausted += 1;
                Status::Exhausted
            } else if flush == Flush::Finish {
                Status::StreamEnd
            } else {
                Status::Progress
            };
            Ok(Step { consumed: input.len(), produced: n, status })
        }
    }

    #[test]
    fn exhausted_with_full_window_is_retried() {
        let input = ChunkedBuffer::from_chunks([
            Bytes::from_static(b"abcdefghi"),
            Bytes::from_static(b"jk"),
        ]);
        let mut codec = SoftLimitCodec::default();
        let mut output = ChunkedBuffer::new();
        drive(&mut codec, &input, &mut output, 4).unwrap();

        let sizes: Vec<usize> = output.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 4, 3]);
        assert_eq!(&output.to_bytes()[..], b"abcdefghijk");
        assert!(codec.exhausted >= 2);
    }

    #[test]
    fn input_exactly_filling_windows() {
        let input = ChunkedBuffer::from(b"abcdefgh".to_vec());
        let mut output = ChunkedBuffer::new();
        drive(&mut PoisonCodec, &input, &mut output, 4).unwrap();
        assert_eq!(output.chunk_count(), 2);
        assert_eq!(&output.to_bytes()[..], b"abcdefgh");
    }

    #[test]
    fn fault_rolls_back_output() {
        let mut output = ChunkedBuffer::from(b"kept".to_vec());
        let input = ChunkedBuffer::from_chunks([
            Bytes::from(vec![1u8; 3000]),
            Bytes::from_static(&[1, 2, 0xff]),
        ]);
        let err = drive(&mut PoisonCodec, &input, &mut output, 1024).unwrap_err();
        assert!(err.is_fault());
        assert_eq!(output.chunk_count(), 1);
        assert_eq!(&output.to_bytes()[..], b"kept");
    }

    #[test]
    fn unfinished_stream_is_a_fault() {
        // Never reports StreamEnd.
        struct Stall;
        impl StreamCodec for Stall {
            fn name(&self) -> &'static str {
                "stall"
            }
            fn feed(&mut self, input: &[u8], _: &mut [u8], _: Flush) -> Result<Step, CompressError> {
                Ok(Step { consumed: input.len(), produced: 0, status: Status::Exhausted })
            }
        }

        let mut output = ChunkedBuffer::new();
        let err = drive(&mut Stall, &ChunkedBuffer::from(b"x".to_vec()), &mut output, 16).unwrap_err();
        assert_eq!(err, CompressError::codec("stall", "stream did not complete"));
        assert_eq!(output.chunk_count(), 0);
    }

    #[test]
    fn unconsumed_input_is_a_fault() {
        // Stops after the first byte of every range.
        struct Stubborn;
        impl StreamCodec for Stubborn {
            fn name(&self) -> &'static str {
                "stubborn"
            }
            fn feed(&mut self, input: &[u8], _: &mut [u8], _: Flush) -> Result<Step, CompressError> {
                Ok(Step { consumed: input.len().min(1), produced: 0, status: Status::StreamEnd })
            }
        }

        let mut output = ChunkedBuffer::new();
        let err = drive(&mut Stubborn, &ChunkedBuffer::from(b"xyz".to_vec()), &mut output, 16)
            .unwrap_err();
        assert!(err.is_fault());
        assert!(output.is_empty());
    }

    #[test]
    fn empty_input_is_finished_once() {
        let mut output = ChunkedBuffer::new();
        drive(&mut DoublingCodec::default(), &ChunkedBuffer::new(), &mut output, 8).unwrap();
        assert_eq!(output.chunk_count(), 1);
        assert!(output.is_empty());
    }
}
