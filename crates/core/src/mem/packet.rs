//! Memory packets.
//!
//! A `Packet` is the unit of traffic on both sides of the cache: CPU-side
//! reads and writes of up to one block, and memory-side line fetches and
//! dirty writebacks. A packet starts life as a request and is turned into
//! a response in place once satisfied.

use crate::common::addr;

/// Memory command carried by a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemCmd {
    /// Read request; the response carries the data.
    ReadReq,
    /// Write request; the request carries the data.
    WriteReq,
    /// Writeback of a dirty block; consumed by the backing store, no
    /// response is generated.
    WritebackDirty,
}

/// A request or response packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    cmd: MemCmd,
    addr: u64,
    data: Vec<u8>,
    response: bool,
}

impl Packet {
    /// Creates a read request; the payload is zeroed until a response
    /// fills it.
    pub fn read_req(addr: u64, size: usize) -> Self {
        Self {
            cmd: MemCmd::ReadReq,
            addr,
            data: vec![0; size],
            response: false,
        }
    }

    /// Creates a write request carrying `data`.
    pub fn write_req(addr: u64, data: Vec<u8>) -> Self {
        Self {
            cmd: MemCmd::WriteReq,
            addr,
            data,
            response: false,
        }
    }

    /// Creates a dirty-block writeback carrying `data`.
    pub fn writeback(addr: u64, data: Vec<u8>) -> Self {
        Self {
            cmd: MemCmd::WritebackDirty,
            addr,
            data,
            response: false,
        }
    }

    /// Returns the packet's address.
    #[inline(always)]
    pub fn addr(&self) -> u64 {
        self.addr
    }

    /// Returns the access size in bytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the command.
    #[inline(always)]
    pub fn cmd(&self) -> MemCmd {
        self.cmd
    }

    /// Returns whether this packet is a response.
    #[inline(always)]
    pub fn is_response(&self) -> bool {
        self.response
    }

    /// Returns whether this is a read.
    #[inline(always)]
    pub fn is_read(&self) -> bool {
        self.cmd == MemCmd::ReadReq
    }

    /// Returns whether this carries data to be written (a write or a
    /// writeback).
    #[inline(always)]
    pub fn is_write(&self) -> bool {
        matches!(self.cmd, MemCmd::WriteReq | MemCmd::WritebackDirty)
    }

    /// Marks the packet as a response.
    pub fn make_response(&mut self) {
        self.response = true;
    }

    /// Returns the packet payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the packet payload mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the block-aligned base of the packet's address.
    pub fn block_addr(&self, block_size: u64) -> u64 {
        addr::block_addr(self.addr, block_size)
    }

    /// Returns the byte offset of the packet within its block.
    pub fn offset_in_block(&self, block_size: u64) -> usize {
        (self.addr & (block_size - 1)) as usize
    }

    /// Returns whether the access fits inside one block.
    pub fn fits_in_block(&self, block_size: u64) -> bool {
        (self.addr - self.block_addr(block_size)) as usize + self.data.len()
            <= block_size as usize
    }

    /// Copies the packet payload into a resident block at the packet's
    /// block offset.
    ///
    /// # Panics
    ///
    /// Panics if the access spans past the end of the block; such packets
    /// violate the port contract.
    pub fn write_data_to_block(&self, block: &mut [u8], block_size: u64) {
        assert!(
            self.fits_in_block(block_size),
            "access at {:#x} size {} spans multiple cache blocks",
            self.addr,
            self.data.len()
        );
        let off = self.offset_in_block(block_size);
        block[off..off + self.data.len()].copy_from_slice(&self.data);
    }

    /// Fills the packet payload from a resident block at the packet's
    /// block offset.
    ///
    /// # Panics
    ///
    /// Panics if the access spans past the end of the block.
    pub fn set_data_from_block(&mut self, block: &[u8], block_size: u64) {
        assert!(
            self.fits_in_block(block_size),
            "access at {:#x} size {} spans multiple cache blocks",
            self.addr,
            self.data.len()
        );
        let off = self.offset_in_block(block_size);
        let len = self.data.len();
        self.data.copy_from_slice(&block[off..off + len]);
    }
}
