use msgz_core::{CompressError, Flush, Status, Step, StreamCodec};
use zstd::stream::raw::{Decoder, Encoder, InBuffer, Operation, OutBuffer};

const NAME: &str = "zstd";

/// Default zstd level (1 = fast / larger, 22 = slow / smallest).
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

fn fault(err: std::io::Error) -> CompressError {
    CompressError::codec(NAME, err.to_string())
}

const FINISHED: Step = Step {
    consumed: 0,
    produced: 0,
    status: Status::StreamEnd,
};

/// Streaming zstd encoder producing a single frame.
pub struct ZstdEncoder {
    inner: Encoder<'static>,
    done: bool,
}

impl ZstdEncoder {
    pub fn new(level: i32) -> Result<Self, CompressError> {
        Ok(Self {
            inner: Encoder::new(level).map_err(fault)?,
            done: false,
        })
    }
}

impl StreamCodec for ZstdEncoder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn feed(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<Step, CompressError> {
        if self.done {
            return Ok(FINISHED);
        }
        let capacity = output.len();
        let mut src = InBuffer::around(input);
        let mut dst = OutBuffer::around(output);

        while src.pos() < input.len() && dst.pos() < capacity {
            let before = (src.pos(), dst.pos());
            self.inner.run(&mut src, &mut dst).map_err(fault)?;
            if (src.pos(), dst.pos()) == before {
                break;
            }
        }

        let mut status = Status::Progress;
        if flush == Flush::Finish && src.pos() == input.len() && dst.pos() < capacity {
            // Returns the number of bytes still waiting to be flushed.
            if self.inner.finish(&mut dst, true).map_err(fault)? == 0 {
                self.done = true;
                status = Status::StreamEnd;
            }
        }

        Ok(Step {
            consumed: src.pos(),
            produced: dst.pos(),
            status,
        })
    }
}

/// Streaming zstd decoder accepting exactly one frame.
pub struct ZstdDecoder {
    inner: Decoder<'static>,
    done: bool,
}

impl ZstdDecoder {
    pub fn new() -> Result<Self, CompressError> {
        Ok(Self {
            inner: Decoder::new().map_err(fault)?,
            done: false,
        })
    }
}

impl StreamCodec for ZstdDecoder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn feed(&mut self, input: &[u8], output: &mut [u8], _flush: Flush) -> Result<Step, CompressError> {
        if self.done {
            return Ok(FINISHED);
        }
        let capacity = output.len();
        let mut src = InBuffer::around(input);
        let mut dst = OutBuffer::around(output);

        // Keep running with empty input too: the decoder may still hold
        // output that did not fit in the previous window.
        while dst.pos() < capacity {
            let before = (src.pos(), dst.pos());
            // A zero hint means the frame is fully decoded and flushed.
            if self.inner.run(&mut src, &mut dst).map_err(fault)? == 0 {
                self.done = true;
                break;
            }
            if (src.pos(), dst.pos()) == before {
                break;
            }
        }

        Ok(Step {
            consumed: src.pos(),
            produced: dst.pos(),
            status: if self.done {
                Status::StreamEnd
            } else {
                Status::Progress
            },
        })
    }

    fn finishes_empty_input(&self) -> bool {
        false
    }
}
