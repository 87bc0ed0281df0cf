//! Constants and small numeric helpers shared across the library.

/// The four DNA bases, in the order neighbour candidates are generated.
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Per-base seed values for the rolling hash.
///
/// One fixed 64-bit pattern per base; the window hash is the XOR of the
/// rotated seeds of its bases, which is what makes single-base rolls O(1).
pub const SEED_A: u64 = 0x3c8b_fbb3_95c6_0474;
/// Rolling-hash seed for C.
pub const SEED_C: u64 = 0x3193_c185_62a0_2b4c;
/// Rolling-hash seed for G.
pub const SEED_G: u64 = 0x2032_3ed0_8257_2324;
/// Rolling-hash seed for T.
pub const SEED_T: u64 = 0x2955_49f5_4be2_4456;

/// Seed for the hash family that maps a window's base hash to filter bit
/// positions. Fixed so runs are reproducible.
pub const FILTER_HASH_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Emit an assembly progress line after this many processed reads.
pub const ASSEMBLY_PROGRESS_STEP: u64 = 1000;

/// Emit a filter-load progress line after this many loaded reads.
pub const LOAD_PROGRESS_STEP: u64 = 10_000;

/// Byte budget for one batched acquisition of the shared input reader
/// during filter loading.
pub const LOAD_BATCH_BYTES: usize = 100_000;

/// Round `num` up to the nearest multiple of `base`.
#[inline]
pub const fn round_up_to_multiple(num: u64, base: u64) -> u64 {
    if base == 0 {
        return num;
    }
    let remainder = num % base;
    if remainder == 0 {
        num
    } else {
        num + base - remainder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_to_multiple() {
        assert_eq!(round_up_to_multiple(0, 64), 0);
        assert_eq!(round_up_to_multiple(1, 64), 64);
        assert_eq!(round_up_to_multiple(64, 64), 64);
        assert_eq!(round_up_to_multiple(65, 64), 128);
        assert_eq!(round_up_to_multiple(7, 0), 7);
    }

    #[test]
    fn test_base_seeds_distinct() {
        let seeds = [SEED_A, SEED_C, SEED_G, SEED_T];
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert_ne!(seeds[i], seeds[j]);
            }
        }
    }
}
