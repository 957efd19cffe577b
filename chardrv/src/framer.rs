//! Byte-to-line framing
//!
//! A framer accumulates received bytes into complete lines. The driver feeds it from the
//! receive interrupt, one byte per call, and pops complete lines from task context. Both
//! calls run inside a short critical section, so implementations must never block and
//! should keep every operation bounded.

use core::ops::Deref;
use core::str::Utf8Error;

use heapless::{Deque, Vec};

use crate::config::Config;

/// Two-operation framing contract used by the driver
pub trait Framer {
    /// Owned completed line. The default value is the "no line" result.
    type Line: Default + AsRef<[u8]>;

    /// Maximum number of completed lines the framer can hold at once
    const MAX_LINES: usize;

    /// Feeds one byte. Returns `true` if the byte completed a line that was queued.
    ///
    /// A completed line that the framer discards must not be reported.
    fn push_byte(&mut self, byte: u8) -> bool;

    /// Removes the oldest completed line.
    fn pop_line(&mut self) -> Option<Self::Line>;

    /// Number of completed lines waiting to be popped
    fn pending_lines(&self) -> usize;

    fn stats(&self) -> FramerStats {
        FramerStats::default()
    }
}

/// Counters of data dropped by a framer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramerStats {
    /// Bytes dropped because the line storage was full. The affected lines are truncated.
    pub dropped_bytes: u32,
    /// Completed lines discarded because the line queue was full
    pub dropped_lines: u32,
}

/// Owned line of at most `N` bytes, terminator excluded
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Line<const N: usize>(Vec<u8, N>);

impl<const N: usize> Line<N> {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        core::str::from_utf8(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<u8, N> {
        self.0
    }
}

impl<const N: usize> Deref for Line<N> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> AsRef<[u8]> for Line<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for Line<N> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=[u8]:a}", self.as_bytes())
    }
}

/// Default framer with static storage
///
/// Bytes of all queued lines and of the line under construction share one `BUF`-byte ring.
/// At most `LINES` completed lines are queued.
///
/// Overflow policy:
/// * When the ring is full, further bytes of the current line are dropped and the line is
///   delivered truncated.
/// * When `LINES` lines are already queued, a newly completed line is discarded.
///
/// A terminator that follows another terminator (or starts the stream) completes nothing,
/// so `"\r\n"` ends exactly one line.
///
/// [`pop_line`](Framer::pop_line) copies a whole line out of the ring inside the critical
/// section shared with the receive interrupt. A large `BUF` therefore adds directly to the
/// worst-case receive interrupt latency.
pub struct LineFramer<const BUF: usize, const LINES: usize> {
    config: Config,
    bytes: Deque<u8, BUF>,
    lines: Deque<usize, LINES>,
    partial: usize,
    stats: FramerStats,
}

impl<const BUF: usize, const LINES: usize> LineFramer<BUF, LINES> {
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            bytes: Deque::new(),
            lines: Deque::new(),
            partial: 0,
            stats: FramerStats {
                dropped_bytes: 0,
                dropped_lines: 0,
            },
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bytes of the line under construction
    pub fn partial_len(&self) -> usize {
        self.partial
    }

    fn complete_line(&mut self) -> bool {
        let len = core::mem::replace(&mut self.partial, 0);
        if len == 0 {
            return false;
        }
        if self.lines.push_back(len).is_err() {
            for _ in 0..len {
                unwrap!(self.bytes.pop_back());
            }
            self.stats.dropped_lines = self.stats.dropped_lines.saturating_add(1);
            return false;
        }
        true
    }
}

impl<const BUF: usize, const LINES: usize> Default for LineFramer<BUF, LINES> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<const BUF: usize, const LINES: usize> Framer for LineFramer<BUF, LINES> {
    type Line = Line<BUF>;

    const MAX_LINES: usize = LINES;

    fn push_byte(&mut self, byte: u8) -> bool {
        if self.config.is_terminator(byte) {
            return self.complete_line();
        }

        match self.bytes.push_back(byte) {
            Ok(()) => self.partial += 1,
            Err(_) => self.stats.dropped_bytes = self.stats.dropped_bytes.saturating_add(1),
        }
        false
    }

    fn pop_line(&mut self) -> Option<Self::Line> {
        let len = self.lines.pop_front()?;
        let mut line = Vec::new();
        for _ in 0..len {
            let byte = unwrap!(self.bytes.pop_front());
            unwrap!(line.push(byte));
        }
        Some(Line(line))
    }

    fn pending_lines(&self) -> usize {
        self.lines.len()
    }

    fn stats(&self) -> FramerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::core::ByteSet;

    fn feed<F: Framer>(framer: &mut F, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| framer.push_byte(b)).count()
    }

    #[test]
    fn null_terminated_line() {
        let mut framer = LineFramer::<64, 16>::default();
        assert!(!framer.push_byte(b'm'));
        assert_eq!(feed(&mut framer, b"akapaka"), 0);
        assert!(framer.push_byte(0));

        let line = framer.pop_line().unwrap();
        assert_eq!(line.as_str(), Ok("makapaka"));
        assert!(framer.pop_line().is_none());
    }

    #[test]
    fn crlf_completes_single_line() {
        let mut framer = LineFramer::<64, 16>::default();
        assert_eq!(feed(&mut framer, b"one\r\ntwo\r\n\n\r"), 2);
        assert_eq!(framer.pending_lines(), 2);
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"one");
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"two");
        assert_eq!(framer.pending_lines(), 0);
    }

    #[test]
    fn exceptional_chars_are_data() {
        let mut config = Config::default();
        config.exceptional_chars = ByteSet::new_eq(b'\r');
        let mut framer = LineFramer::<64, 4>::new(config);

        assert_eq!(feed(&mut framer, b"a\rb\n"), 1);
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"a\rb");
    }

    #[test]
    fn custom_terminators() {
        let mut config = Config::default();
        config.terminators = ByteSet::from_bytes(b";");
        let mut framer = LineFramer::<64, 4>::new(config);

        assert_eq!(feed(&mut framer, b"x\ny;z"), 1);
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"x\ny");
        assert_eq!(framer.partial_len(), 1);
    }

    #[test]
    fn full_ring_truncates_line() {
        let mut framer = LineFramer::<4, 4>::default();
        assert_eq!(feed(&mut framer, b"abcdef\n"), 1);
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"abcd");
        assert_eq!(framer.stats().dropped_bytes, 2);

        // Storage is reusable once the line is popped
        assert_eq!(feed(&mut framer, b"gh\n"), 1);
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"gh");
    }

    #[test]
    fn full_queue_discards_new_line() {
        let mut framer = LineFramer::<64, 2>::default();
        assert_eq!(feed(&mut framer, b"1\n2\n3\n"), 2);
        assert_eq!(framer.stats().dropped_lines, 1);
        assert_eq!(framer.pending_lines(), 2);

        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"1");
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"2");
        assert!(framer.pop_line().is_none());

        // Bytes of the discarded line are released
        assert_eq!(feed(&mut framer, b"4\n"), 1);
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"4");
    }

    #[test]
    fn partial_line_survives_pop() {
        let mut framer = LineFramer::<16, 4>::default();
        assert_eq!(feed(&mut framer, b"ab\ncd"), 1);
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"ab");
        assert_eq!(feed(&mut framer, b"e\0"), 1);
        assert_eq!(framer.pop_line().unwrap().as_bytes(), b"cde");
    }

    #[test]
    fn empty_line_is_default() {
        let line = Line::<8>::default();
        assert!(line.is_empty());
        assert_eq!(line.as_str(), Ok(""));
        assert_eq!(&*line, b"");
    }
}
