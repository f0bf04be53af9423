use crate::error::{DecodeError, DecodeResult};

/// Stack of end offsets for the containers a decoder has entered, innermost last.
#[derive(Clone, Debug)]
pub struct DepthTracker {
    ends: Vec<usize>,
    max_depth: usize,
}

impl DepthTracker {
    pub fn new(max_depth: usize) -> Self {
        Self {
            ends: Vec::new(),
            max_depth,
        }
    }

    /// Open a container whose payload ends at `end`.
    pub fn enter(&mut self, end: usize) -> DecodeResult<()> {
        if self.ends.len() >= self.max_depth {
            return Err(DecodeError::DepthLimitExceeded {
                max: self.max_depth,
            });
        }
        self.ends.push(end);
        Ok(())
    }

    /// Close the innermost container, returning where its payload ended.
    pub fn leave(&mut self) -> DecodeResult<usize> {
        self.ends
            .pop()
            .ok_or(DecodeError::LeaveAtOutermostContainer)
    }

    /// End offset of the innermost open container, or `outer` at the top level.
    pub fn end_or(&self, outer: usize) -> usize {
        self.ends.last().copied().unwrap_or(outer)
    }

    pub fn depth(&self) -> usize {
        self.ends.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting() {
        let mut tracker = DepthTracker::new(2);
        assert_eq!(tracker.end_or(50), 50);
        tracker.enter(40).unwrap();
        tracker.enter(30).unwrap();
        assert_eq!(
            tracker.enter(20),
            Err(DecodeError::DepthLimitExceeded { max: 2 })
        );
        assert_eq!(tracker.depth(), 2);
        assert_eq!(tracker.end_or(50), 30);
        assert_eq!(tracker.leave(), Ok(30));
        assert_eq!(tracker.leave(), Ok(40));
        assert_eq!(tracker.leave(), Err(DecodeError::LeaveAtOutermostContainer));
    }
}
