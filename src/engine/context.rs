//! Per-block execution context.

/// Height of the block being executed and the in-block order counter.
///
/// The counter orders orders created at the same height; the block driver
/// resets it once per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockContext {
    pub height: u64,
    pub order_index: u64,
}

impl BlockContext {
    pub fn new(height: u64) -> Self {
        Self {
            height,
            order_index: 0,
        }
    }

    /// Take the next in-block order index.
    #[inline]
    pub fn next_order_index(&mut self) -> u64 {
        let index = self.order_index;
        self.order_index += 1;
        index
    }

    /// Start a new block at `height`.
    pub fn reset(&mut self, height: u64) {
        self.height = height;
        self.order_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_index_sequence() {
        let mut ctx = BlockContext::new(5);
        assert_eq!(ctx.next_order_index(), 0);
        assert_eq!(ctx.next_order_index(), 1);
        assert_eq!(ctx.order_index, 2);

        ctx.reset(6);
        assert_eq!(ctx.height, 6);
        assert_eq!(ctx.next_order_index(), 0);
    }
}
