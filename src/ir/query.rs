use std::ops::ControlFlow;

use slotmap::{Key, SecondaryMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraversalError {
    #[error("invalid block reference")]
    InvalidBlock,
}

/// Control-flow graph of recorded blocks, as seen by a backend.
pub trait BlockGraph {
    type Key: Key;

    fn successors(&self, block: Self::Key) -> Option<&[Self::Key]>;

    /// Depth-first walk over every block reachable from `entry`, each visited once.
    fn traverse_from<F, B>(
        &self,
        entry: Self::Key,
        mut visitor: F,
    ) -> Result<Option<B>, TraversalError>
    where
        F: FnMut(Self::Key) -> ControlFlow<B, ()>,
    {
        let mut stack = Vec::new();
        let mut visited_blocks = SecondaryMap::new();

        fn push_new_block<K: Key>(stack: &mut Vec<K>, map: &mut SecondaryMap<K, ()>, block: K) {
            if !map.contains_key(block) {
                stack.push(block);
                map.insert(block, ());
            }
        }

        push_new_block(&mut stack, &mut visited_blocks, entry);

        while let Some(block) = stack.pop() {
            if let ControlFlow::Break(b) = visitor(block) {
                return Ok(Some(b));
            }
            let successors = self
                .successors(block)
                .ok_or(TraversalError::InvalidBlock)?;
            for successor in successors.iter().rev() {
                push_new_block(&mut stack, &mut visited_blocks, *successor);
            }
        }

        Ok(None)
    }

    /// Every block reachable from `entry`, in depth-first order.
    fn reachable_from(&self, entry: Self::Key) -> Result<Vec<Self::Key>, TraversalError> {
        let mut blocks = Vec::new();
        self.traverse_from(entry, |block| {
            blocks.push(block);
            ControlFlow::<(), ()>::Continue(())
        })?;
        Ok(blocks)
    }
}
