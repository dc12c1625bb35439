use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Identifier of a registered miner; doubles as the block's coinbase.
pub type MinerId = u64;

/// Unsigned block content, produced by the ledger as a mining template.
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    #[serde(rename = "coinBase")]
    pub coinbase: MinerId,
    #[serde(skip)]
    pub timestamp: i64, // creation time of the template (Unix seconds)
    #[serde(skip)]
    pub payload: Vec<u8>,
    #[serde(skip)]
    pub prev_hash: Vec<u8>,
    #[serde(rename = "prevBlockHashHex")]
    pub prev_hash_hex: String,
    #[serde(rename = "targetBit")]
    pub target_bits: f64,
}

/// Result of a successful search, stamped again when the ledger accepts it.
/// Genesis is never mined and carries no digest.
#[derive(Debug, Clone, Serialize)]
pub struct Proof {
    #[serde(rename = "actualTimestamp")]
    pub timestamp: i64,
    pub nonce: u64,
    #[serde(skip)]
    pub hash: Option<[u8; 32]>,
    #[serde(rename = "hashHex")]
    pub hash_hex: String,
}

/// A sealed block. Only the hex renderings and scalar fields are serialized.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    #[serde(flatten)]
    pub header: Header,
    #[serde(flatten)]
    pub proof: Proof,
}

/// Difficulty as used by both the miner and the validator: floor of the
/// real-valued target, clamped to the digest width.
pub fn effective_bits(target_bits: f64) -> u32 {
    if target_bits.is_nan() || target_bits <= 0.0 {
        return 0;
    }
    target_bits.floor().min(256.0) as u32
}

/// `true` iff `hash`, read as a big-endian 256-bit integer, is strictly
/// below `2^(256 - bits)`.
pub fn meets_target(hash: &[u8; 32], bits: u32) -> bool {
    let mut zeros = 0u32;
    for byte in hash {
        if *byte == 0 {
            zeros += 8;
            continue;
        }
        zeros += byte.leading_zeros();
        break;
    }
    zeros >= bits
}

/// Lowercase hex text of an integer, `-` prefixed when negative.
pub fn int_to_hex(n: i64) -> Vec<u8> {
    if n < 0 {
        format!("-{:x}", n.unsigned_abs()).into_bytes()
    } else {
        format!("{:x}", n).into_bytes()
    }
}

impl Header {
    /// Every field of the hash preimage except the nonce, in wire order.
    pub fn preimage_prefix(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(64 + self.prev_hash.len() + self.payload.len());
        data.extend_from_slice(format!("{:x}", self.coinbase).as_bytes());
        data.extend_from_slice(&self.prev_hash);
        data.extend_from_slice(&self.payload);
        data.extend_from_slice(&int_to_hex(self.timestamp));
        data.extend_from_slice(format!("{:x}", effective_bits(self.target_bits)).as_bytes());
        data
    }

    /// Full hash preimage for `nonce`.
    pub fn preimage(&self, nonce: u64) -> Vec<u8> {
        let mut data = self.preimage_prefix();
        data.extend_from_slice(format!("{:x}", nonce).as_bytes());
        data
    }

    pub fn digest(&self, nonce: u64) -> [u8; 32] {
        Sha256::digest(self.preimage(nonce)).into()
    }
}

impl Block {
    /// Create the genesis block (first block in the chain). It has an empty
    /// digest, so block 1 links to an empty previous hash.
    pub fn genesis() -> Self {
        Self {
            header: Header {
                coinbase: 0,
                timestamp: 0,
                payload: Vec::new(),
                prev_hash: Vec::new(),
                prev_hash_hex: String::new(),
                target_bits: 0.0,
            },
            proof: Proof {
                timestamp: Utc::now().timestamp(),
                nonce: 0,
                hash: None,
                hash_hex: String::new(),
            },
        }
    }

    /// Seal `header` with a found nonce and its digest.
    pub fn seal(header: Header, nonce: u64, hash: [u8; 32]) -> Self {
        Self {
            header,
            proof: Proof {
                timestamp: Utc::now().timestamp(),
                nonce,
                hash: Some(hash),
                hash_hex: hex::encode(hash),
            },
        }
    }

    /// Same block with its acceptance time replaced.
    pub fn stamped(mut self, timestamp: i64) -> Self {
        self.proof.timestamp = timestamp;
        self
    }

    /// Digest bytes as the next block links to them; empty for genesis.
    pub fn hash(&self) -> &[u8] {
        match &self.proof.hash {
            Some(hash) => hash,
            None => &[],
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.header.prev_hash.is_empty()
            && self.header.payload.is_empty()
            && self.proof.nonce == 0
            && self.proof.hash.is_none()
            && self.proof.hash_hex.is_empty()
    }

    pub fn timestamp(&self) -> i64 {
        self.proof.timestamp
    }

    /// Recompute the digest and check it against the declared target.
    /// Does NOT check linkage or the ledger's current difficulty.
    pub fn is_valid(&self) -> bool {
        let Some(hash) = self.proof.hash else {
            return false;
        };
        if self.header.digest(self.proof.nonce) != hash {
            return false;
        }
        meets_target(&hash, effective_bits(self.header.target_bits))
    }
}
