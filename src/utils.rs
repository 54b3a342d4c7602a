const FNV_OFFSET_BASIS_64: u64 = 0xCBF29CE484222325;
const FNV_PRIME_64: u64 = 1099511628211;

/// FNV-1a mix of a key number, hashing its eight bytes least significant
/// first.
///
/// http://en.wikipedia.org/wiki/Fowler_Noll_Vo_hash
///
/// ```plain
/// algorithm fnv-1a is
///     hash := FNV_offset_basis
///
///     for each byte_of_data to be hashed do
///         hash := hash XOR byte_of_data
///         hash := hash × FNV_prime
///
///     return hash
/// ```
pub fn fnvhash64(mut val: u64) -> u64 {
    let mut hash = FNV_OFFSET_BASIS_64;

    for _ in 0..8 {
        let byte = val as u8;
        val >>= 8;

        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME_64);
    }

    hash
}
