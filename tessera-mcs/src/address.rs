//! Hash addresses for domain separation.
//!
//! Every keyed hash invocation in the scheme is bound to a 32-byte address
//! identifying the exact position of the call within the key pair: which
//! layer, which tree, which chain, which hash step. Two distinct invocations
//! within a key pair never share an address.

/// Address type constants.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrType {
    /// WOTS+ one-time-signature address (chain computation and seed
    /// derivation).
    Ots = 0,
    /// L-tree public key compression address.
    LTree = 1,
    /// Tree node address (chain tree and root tree internal nodes).
    Node = 2,
}

/// 32-byte structured address.
///
/// Layout (big-endian words):
/// - Bytes 0-3: layer
/// - Bytes 4-11: tree
/// - Bytes 12-15: type
/// - Bytes 16-19: OTS index / L-tree index / padding
/// - Bytes 20-23: chain index / tree height
/// - Bytes 24-27: hash index / tree index
/// - Bytes 28-31: key-and-mask tag (0 = key, 1 = mask / left mask,
///   2 = right mask)
///
/// Addresses are values: the struct is `Copy`, and each use site works on
/// its own image.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Address {
    bytes: [u8; 32],
}

impl Default for Address {
    fn default() -> Self {
        Self::new()
    }
}

impl Address {
    /// Create a new zeroed address.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: [0u8; 32] }
    }

    /// Get the raw bytes of the address.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Set the layer address (bytes 0-3).
    pub fn set_layer(&mut self, layer: u32) {
        self.bytes[0..4].copy_from_slice(&layer.to_be_bytes());
    }

    /// Get the layer address.
    #[must_use]
    pub fn layer(&self) -> u32 {
        u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }

    /// Set the tree address (bytes 4-11).
    pub fn set_tree(&mut self, tree: u64) {
        self.bytes[4..12].copy_from_slice(&tree.to_be_bytes());
    }

    /// Get the tree address.
    #[must_use]
    pub fn tree(&self) -> u64 {
        u64::from_be_bytes([
            self.bytes[4],
            self.bytes[5],
            self.bytes[6],
            self.bytes[7],
            self.bytes[8],
            self.bytes[9],
            self.bytes[10],
            self.bytes[11],
        ])
    }

    /// Set the address type (bytes 12-15).
    pub fn set_type(&mut self, addr_type: AddrType) {
        self.bytes[12..16].copy_from_slice(&(addr_type as u32).to_be_bytes());
    }

    /// Get the address type word.
    #[must_use]
    pub fn addr_type(&self) -> u32 {
        u32::from_be_bytes([self.bytes[12], self.bytes[13], self.bytes[14], self.bytes[15]])
    }

    /// Set the OTS index (bytes 16-19, OTS addresses).
    pub fn set_ots_index(&mut self, ots: u32) {
        self.bytes[16..20].copy_from_slice(&ots.to_be_bytes());
    }

    /// Get the OTS index.
    #[must_use]
    pub fn ots_index(&self) -> u32 {
        u32::from_be_bytes([self.bytes[16], self.bytes[17], self.bytes[18], self.bytes[19]])
    }

    /// Set the L-tree index (bytes 16-19, L-tree addresses).
    pub fn set_ltree_index(&mut self, ltree: u32) {
        self.bytes[16..20].copy_from_slice(&ltree.to_be_bytes());
    }

    /// Set the chain index (bytes 20-23, OTS addresses).
    pub fn set_chain_index(&mut self, chain: u32) {
        self.bytes[20..24].copy_from_slice(&chain.to_be_bytes());
    }

    /// Get the chain index.
    #[must_use]
    pub fn chain_index(&self) -> u32 {
        u32::from_be_bytes([self.bytes[20], self.bytes[21], self.bytes[22], self.bytes[23]])
    }

    /// Set the hash index (bytes 24-27, OTS addresses).
    pub fn set_hash_index(&mut self, hash: u32) {
        self.bytes[24..28].copy_from_slice(&hash.to_be_bytes());
    }

    /// Get the hash index.
    #[must_use]
    pub fn hash_index(&self) -> u32 {
        u32::from_be_bytes([self.bytes[24], self.bytes[25], self.bytes[26], self.bytes[27]])
    }

    /// Set the tree height (bytes 20-23, L-tree and node addresses).
    pub fn set_tree_height(&mut self, height: u32) {
        self.bytes[20..24].copy_from_slice(&height.to_be_bytes());
    }

    /// Get the tree height.
    #[must_use]
    pub fn tree_height(&self) -> u32 {
        u32::from_be_bytes([self.bytes[20], self.bytes[21], self.bytes[22], self.bytes[23]])
    }

    /// Set the tree index (bytes 24-27, L-tree and node addresses).
    pub fn set_tree_index(&mut self, index: u32) {
        self.bytes[24..28].copy_from_slice(&index.to_be_bytes());
    }

    /// Get the tree index.
    #[must_use]
    pub fn tree_index(&self) -> u32 {
        u32::from_be_bytes([self.bytes[24], self.bytes[25], self.bytes[26], self.bytes[27]])
    }

    /// Set the key-and-mask tag (bytes 28-31).
    pub fn set_key_and_mask(&mut self, key_and_mask: u32) {
        self.bytes[28..32].copy_from_slice(&key_and_mask.to_be_bytes());
    }

    /// Get the key-and-mask tag.
    #[must_use]
    pub fn key_and_mask(&self) -> u32 {
        u32::from_be_bytes([self.bytes[28], self.bytes[29], self.bytes[30], self.bytes[31]])
    }

    /// Create a WOTS+ address for the one-time key `ots_index` within the
    /// given layer and tree.
    #[must_use]
    pub fn ots(layer: u32, tree: u64, ots_index: u32) -> Self {
        let mut addr = Self::new();
        addr.set_layer(layer);
        addr.set_tree(tree);
        addr.set_type(AddrType::Ots);
        addr.set_ots_index(ots_index);
        addr
    }

    /// Create an L-tree address for the leaf `ltree_index` within the given
    /// layer and tree.
    #[must_use]
    pub fn ltree(layer: u32, tree: u64, ltree_index: u32) -> Self {
        let mut addr = Self::new();
        addr.set_layer(layer);
        addr.set_tree(tree);
        addr.set_type(AddrType::LTree);
        addr.set_ltree_index(ltree_index);
        addr
    }

    /// Create a tree node address within the given layer and tree.
    #[must_use]
    pub fn node(layer: u32, tree: u64) -> Self {
        let mut addr = Self::new();
        addr.set_layer(layer);
        addr.set_tree(tree);
        addr.set_type(AddrType::Node);
        addr
    }
}

impl core::fmt::Debug for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Address")
            .field("layer", &self.layer())
            .field("tree", &self.tree())
            .field("type", &self.addr_type())
            .finish()
    }
}
