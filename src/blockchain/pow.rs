use sha2::{Digest, Sha256};

use super::block::{Block, Header, effective_bits, meets_target};

/// How a proof search ended.
#[derive(Debug)]
pub enum SearchOutcome {
    Found(Block),
    /// A peer sealed the height first; the template is stale.
    Cancelled,
    /// Nonce space ran out without a solution. Re-template and retry.
    Exhausted,
}

/// Perform Proof-of-Work over `header`: walk the nonce space from zero until
/// the digest has at least `floor(target_bits)` leading zero bits.
///
/// `cancelled` is polled before every attempt and must not block. Once it
/// returns `true` the search is abandoned and nothing is kept.
pub fn search<F>(header: &Header, mut cancelled: F) -> SearchOutcome
where
    F: FnMut() -> bool,
{
    let bits = effective_bits(header.target_bits);

    // Absorb the constant part of the preimage once; each attempt only hashes the nonce.
    let mut base = Sha256::new();
    base.update(header.preimage_prefix());

    for nonce in 0..=u64::MAX {
        if cancelled() {
            return SearchOutcome::Cancelled;
        }

        let mut hasher = base.clone();
        hasher.update(format!("{:x}", nonce).as_bytes());
        let hash: [u8; 32] = hasher.finalize().into();

        if meets_target(&hash, bits) {
            return SearchOutcome::Found(Block::seal(header.clone(), nonce, hash));
        }
    }

    SearchOutcome::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn template(bits: f64) -> Header {
        Header {
            coinbase: 3,
            timestamp: 1_700_000_123,
            payload: b"simulated block data:3:0".to_vec(),
            prev_hash: vec![7u8; 32],
            prev_hash_hex: hex::encode([7u8; 32]),
            target_bits: bits,
        }
    }

    #[test]
    fn mining_produces_leading_zero_bits() {
        let header = template(8.0);
        let block = match search(&header, || false) {
            SearchOutcome::Found(b) => b,
            other => panic!("expected a block, got {other:?}"),
        };
        assert_eq!(block.hash()[0], 0);
        assert!(block.is_valid());
        assert_eq!(block.proof.hash, Some(header.digest(block.proof.nonce)));
        assert_eq!(block.proof.hash_hex, hex::encode(block.hash()));
    }

    #[test]
    fn search_finds_the_lowest_satisfying_nonce() {
        let header = template(6.0);
        let SearchOutcome::Found(block) = search(&header, || false) else {
            panic!("expected a block");
        };
        for nonce in 0..block.proof.nonce {
            assert!(!meets_target(&header.digest(nonce), 6));
        }
    }

    #[test]
    fn fractional_bits_use_the_floor() {
        let SearchOutcome::Found(block) = search(&template(4.9), || false) else {
            panic!("expected a block");
        };
        assert!(meets_target(&block.proof.hash.unwrap(), 4));
        assert!(block.is_valid());
    }

    #[test]
    fn cancellation_is_polled_before_the_first_attempt() {
        let polls = Cell::new(0);
        let outcome = search(&template(8.0), || {
            polls.set(polls.get() + 1);
            true
        });
        assert!(matches!(outcome, SearchOutcome::Cancelled));
        assert_eq!(polls.get(), 1);
    }

    #[test]
    fn cancellation_mid_search_discards_progress() {
        let polls = Cell::new(0u32);
        // 200 bits is never reached within a handful of attempts.
        let outcome = search(&template(200.0), || {
            polls.set(polls.get() + 1);
            polls.get() > 50
        });
        assert!(matches!(outcome, SearchOutcome::Cancelled));
        assert_eq!(polls.get(), 51);
    }
}
