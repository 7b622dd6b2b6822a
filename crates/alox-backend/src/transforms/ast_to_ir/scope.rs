use alox_core::ir::InstId;
use std::collections::HashMap;

/// Locals of one function, one frame per lexical block.
pub(super) struct LocalVariableTable {
    frames: Vec<HashMap<String, InstId>>,
}

impl LocalVariableTable {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        // the base frame lives as long as the function
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn define(&mut self, name: impl Into<String>, slot: InstId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), slot);
        }
    }

    /// The innermost slot named `name`.
    pub fn lookup(&self, name: &str) -> Option<InstId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }
}
