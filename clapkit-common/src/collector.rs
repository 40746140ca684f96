//! Slot-ordered collection of concurrently read files
//!
//! File reads complete in arbitrary order; merging must not start until every
//! expected file has arrived, and the merge must see the files in selection
//! order, not completion order. The collector tracks one slot per expected
//! file and only releases the batch once every slot is filled. There is no
//! timeout and no cancellation — a new batch simply replaces the old one.

use uuid::Uuid;

use crate::error::{Error, Result};

/// One raw file awaiting parse/merge
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

/// Accumulator for a fixed-size batch of file reads
#[derive(Debug)]
pub struct BatchCollector {
    id: Uuid,
    slots: Vec<Option<SourceFile>>,
}

impl BatchCollector {
    pub fn new(expected: usize) -> Self {
        BatchCollector {
            id: Uuid::new_v4(),
            slots: (0..expected).map(|_| None).collect(),
        }
    }

    /// Batch identity, used to tell a stale completion from the current batch.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn expected(&self) -> usize {
        self.slots.len()
    }

    pub fn received(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Record one completed read. `slot` is the file's selection-order index.
    pub fn insert(&mut self, slot: usize, name: impl Into<String>, content: impl Into<String>) -> Result<()> {
        let expected = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(Error::SlotOutOfRange { slot, expected })?;
        if entry.is_some() {
            return Err(Error::SlotAlreadyFilled(slot));
        }
        *entry = Some(SourceFile {
            name: name.into(),
            content: content.into(),
        });
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_some())
    }

    /// The batch in selection order, only once every slot is filled.
    pub fn into_sources(self) -> Option<Vec<SourceFile>> {
        if self.slots.iter().all(|slot| slot.is_some()) {
            Some(self.slots.into_iter().flatten().collect())
        } else {
            None
        }
    }
}
