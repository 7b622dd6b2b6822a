use alox_core::ir::{BlockId, Body, InstId, Instruction};

/// Owns a function body under construction and the cursor pointing at the
/// block that receives new instructions.
pub(super) struct BlockBuilder {
    body: Body,
    current: BlockId,
}

impl BlockBuilder {
    pub fn new() -> Self {
        let mut body = Body::new();
        let current = body.add_block();
        Self { body, current }
    }

    pub fn current(&self) -> BlockId {
        self.current
    }

    /// Move the cursor to a new block. An empty current block is reused.
    pub fn create_block(&mut self) -> BlockId {
        if self.body.block(self.current).instructions.is_empty() {
            return self.current;
        }
        self.create_fresh_block()
    }

    /// Move the cursor to a new block even if the current one is empty.
    pub fn create_fresh_block(&mut self) -> BlockId {
        self.current = self.body.add_block();
        self.current
    }

    pub fn emit(&mut self, instruction: Instruction) -> InstId {
        self.body.push(self.current, instruction)
    }

    /// Append to an earlier block without moving the cursor.
    pub fn append_to(&mut self, block: BlockId, instruction: Instruction) -> InstId {
        self.body.push(block, instruction)
    }

    pub fn is_terminated(&self, block: BlockId) -> bool {
        self.body.is_terminated(block)
    }

    pub fn finish(self) -> Body {
        self.body
    }
}
