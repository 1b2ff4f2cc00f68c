//! Surroundings Remover
//!
//! Windowed view over an immutable snapshot of a growing buffer. Markers are
//! stripped from either end of the window by moving its bounds; the buffer
//! itself is never copied or mutated.
//!
//! The window is the half-open byte range `start..end`, with
//! `0 <= start <= end <= buffer.len()`. Both bounds always sit on UTF-8 char
//! boundaries.

/// Text recently appended to the buffer, split by whether it landed inside the
/// current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaInfo<'a> {
    /// Part of the recently added region that lies inside the window
    pub delta: &'a str,
    /// Part of the recently added region already trimmed off the window's end
    pub ignored_suffix: &'a str,
}

/// Strips prefixes and suffixes from a buffer snapshot while tolerating
/// markers that are only partially present yet.
#[derive(Debug, Clone)]
pub struct SurroundingsRemover<'a> {
    buffer: &'a str,
    start: usize,
    end: usize,
}

impl<'a> SurroundingsRemover<'a> {
    pub fn new(buffer: &'a str) -> Self {
        Self {
            buffer,
            start: 0,
            end: buffer.len(),
        }
    }

    /// Current value of the window.
    pub fn value(&self) -> &'a str {
        &self.buffer[self.start..self.end]
    }

    /// Current `(start, end)` bounds of the window.
    pub fn window(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Put the window back to bounds previously returned by [`Self::window`].
    pub fn restore(&mut self, (start, end): (usize, usize)) {
        debug_assert!(start <= end && end <= self.buffer.len());
        self.start = start;
        self.end = end;
    }

    /// Advance the start through as much of `prefix` as matches.
    ///
    /// Returns `true` only if the whole prefix was consumed. A partial match
    /// still advances the window: the rest of the marker may not have arrived.
    pub fn remove_prefix(&mut self, prefix: &str) -> bool {
        let mut consumed = 0;
        for (have, want) in self.value().chars().zip(prefix.chars()) {
            if have != want {
                break;
            }
            consumed += have.len_utf8();
        }
        self.start += consumed;
        consumed == prefix.len()
    }

    /// Retract the end past the longest prefix of `suffix` that the value ends
    /// with.
    ///
    /// Longest first, so one backtick of a closing fence never shadows the
    /// full fence. Returns `true` only on a full match.
    pub fn remove_suffix(&mut self, suffix: &str) -> bool {
        let value = self.value();
        let max = value.len().min(suffix.len());
        for len in (1..=max).rev() {
            if !suffix.is_char_boundary(len) {
                continue;
            }
            if value.ends_with(&suffix[..len]) {
                self.end -= len;
                return len == suffix.len();
            }
        }
        false
    }

    /// Scan the value for `until`.
    ///
    /// When found, the start moves to the match (or just past it when
    /// `consume` is set) and the absolute byte offset of the match is
    /// returned. When absent, the whole value is consumed so that a marker
    /// still being written (such as a language tag) never leaks out.
    pub fn remove_from_start_until_full_match(&mut self, until: &str, consume: bool) -> Option<usize> {
        match self.value().find(until) {
            Some(offset) => {
                let index = self.start + offset;
                self.start = if consume { index + until.len() } else { index };
                Some(index)
            }
            None => {
                self.start = self.end;
                None
            }
        }
    }

    /// Split the most recently appended `recently_added_len` bytes of the
    /// buffer into the part visible in the window and the part already
    /// trimmed off its end.
    pub fn delta_info(&self, recently_added_len: usize) -> DeltaInfo<'a> {
        let mut added_at = self.buffer.len().saturating_sub(recently_added_len);
        while !self.buffer.is_char_boundary(added_at) {
            added_at -= 1;
        }

        let delta_start = self.start.max(added_at);
        let delta = if delta_start < self.end {
            &self.buffer[delta_start..self.end]
        } else {
            ""
        };
        let ignored_suffix = &self.buffer[self.end.max(added_at)..];

        DeltaInfo {
            delta,
            ignored_suffix,
        }
    }
}
