//! Block arena types.
//!
//! The cache's storage is a single fixed-size arena of uniform blocks. A
//! block serves either as a data leaf or as an interior translation table;
//! the per-block level field selects the live interpretation. All
//! inter-block references are arena indices, never pointers.

/// Reuse-counter saturation ceiling.
pub const REUSE_CEILING: u8 = 32;

/// One slot of a translation table (including the root table): a validity
/// bit plus an arena index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BthEntry {
    /// Whether the slot references a block.
    pub valid: bool,
    /// Arena index of the referenced block.
    pub index: u32,
}

/// Per-block usage metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockMeta {
    /// Whether the block holds live contents.
    pub valid: bool,
    /// Whether a leaf's data diverges from the backing store.
    pub dirty: bool,
    /// Pinned; a locked block is never selected as a victim.
    pub locked: bool,
    /// 0 = unused, 1..leaf = interior table, leaf = user data.
    pub level: u8,
    /// Whether some ancestor slot still references this block.
    pub parent_valid: bool,
    /// Saturating reuse counter, aged by the victim scanner.
    pub reuse: u8,
}

/// One arena block: metadata, tag/parent link, and storage interpreted as
/// either an interior table or a data buffer depending on the level field.
#[derive(Clone, Debug)]
pub struct Block {
    /// Usage metadata.
    pub meta: BlockMeta,
    /// Leaf tag (block-granular address), 0 when not a live leaf.
    pub tag: u64,
    /// Parent reference: the root-table slot index for level-1 blocks, the
    /// parent's arena index otherwise.
    pub parent: u32,
    /// Interior translation table (fan-out slots).
    pub table: Vec<BthEntry>,
    /// Data buffer (block-size bytes).
    pub data: Vec<u8>,
}

impl Block {
    /// Creates an unused block with zeroed storage.
    pub fn new(fanout: u64, block_size: u64) -> Self {
        Self {
            meta: BlockMeta::default(),
            tag: 0,
            parent: 0,
            table: vec![BthEntry::default(); fanout as usize],
            data: vec![0; block_size as usize],
        }
    }

    /// Saturating increment of the reuse counter.
    #[inline]
    pub fn bump_reuse(&mut self) {
        if self.meta.reuse < REUSE_CEILING {
            self.meta.reuse += 1;
        }
    }

    /// Reinitializes the block for use at `level`: storage zeroed, valid
    /// and parent-valid set, reuse counter primed at 1.
    pub fn reset(&mut self, level: u8) {
        self.data.fill(0);
        self.table.fill(BthEntry::default());
        self.tag = 0;
        self.parent = 0;
        self.meta = BlockMeta {
            valid: true,
            dirty: false,
            locked: false,
            level,
            parent_valid: true,
            reuse: 1,
        };
    }
}
