//! Cache line: a tagged data block with a MESI state and an LRU stamp.

use std::fmt;

/// MESI coherence state of a cache line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MesiState {
    /// Line holds the only copy and it differs from memory.
    Modified,
    /// Line holds the only copy and it matches memory.
    Exclusive,
    /// Line matches memory; other caches may hold copies.
    Shared,
    /// Line holds nothing; tag and data are meaningless.
    Invalid,
}

impl MesiState {
    /// A line is dirty exactly when it is Modified; there is no separate dirty bit.
    #[inline]
    pub fn is_dirty(self) -> bool {
        matches!(self, MesiState::Modified)
    }
}

impl fmt::Display for MesiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            MesiState::Modified => 'M',
            MesiState::Exclusive => 'E',
            MesiState::Shared => 'S',
            MesiState::Invalid => 'I',
        };
        write!(f, "{}", letter)
    }
}

/// One line of a cache set.
///
/// Storage exists for the life of the set; invalidation only changes the
/// state, never the allocation.
#[derive(Clone, Debug)]
pub struct CacheLine {
    state: MesiState,
    tag: u32,
    data: Vec<u8>,
    lru: u32,
}

impl CacheLine {
    /// Creates an invalid line with storage for one block.
    pub fn new(block_size: usize) -> Self {
        Self {
            state: MesiState::Invalid,
            tag: 0,
            data: vec![0; block_size],
            lru: 0,
        }
    }

    /// Returns the coherence state.
    #[inline]
    pub fn state(&self) -> MesiState {
        self.state
    }

    /// Changes the coherence state without touching tag or data.
    #[inline]
    pub fn set_state(&mut self, state: MesiState) {
        self.state = state;
    }

    /// True when the line holds a block (state is not Invalid).
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.state != MesiState::Invalid
    }

    /// True when the line must be written back before replacement.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Returns the tag. Only meaningful while the line is valid.
    #[inline]
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// True when the line is valid and holds `tag`.
    #[inline]
    pub fn matches(&self, tag: u32) -> bool {
        self.is_valid() && self.tag == tag
    }

    /// Returns the LRU stamp (higher is more recent).
    #[inline]
    pub fn lru(&self) -> u32 {
        self.lru
    }

    /// Sets the LRU stamp.
    #[inline]
    pub fn set_lru(&mut self, stamp: u32) {
        self.lru = stamp;
    }

    /// Installs a fetched block into this line.
    pub fn fill(&mut self, tag: u32, data: Vec<u8>, state: MesiState) {
        debug_assert_eq!(data.len(), self.data.len());
        self.tag = tag;
        self.data = data;
        self.state = state;
    }

    /// Drops the block: state becomes Invalid, storage is kept.
    pub fn invalidate(&mut self) {
        self.state = MesiState::Invalid;
    }

    /// Writes a 4-byte word at a word-aligned block offset.
    ///
    /// The payload is opaque to the simulation; only the state change matters.
    pub fn write_word(&mut self, offset: u32, value: u32) {
        let at = (offset & !0x3) as usize;
        if at + 4 <= self.data.len() {
            self.data[at..at + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    /// Returns the stored block.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
