//! The byte-combination at the heart of the engine.
//!
//! A patch payload is combined positionally with the base artifact:
//! byte `i` of the output is `base[i] XOR patch[i]`. The operation is
//! never run in reverse to undo a patch; reverting always restores
//! the pristine backup instead, which avoids accumulating drift when
//! a user switches between versions.

/// Combine a base artifact with a patch payload.
///
/// Output length is `min(base.len(), patch.len())`: the combination
/// truncates to the shorter buffer. The payloads the server issues
/// are always at least as long as the base file, so in practice the
/// output has exactly the base length; the truncation rule exists so
/// that a short or corrupt payload produces a well-defined (and
/// detectably wrong-hashed) result rather than a panic.
///
/// Pure function: no I/O, deterministic for identical inputs.
pub fn apply(base: &[u8], patch: &[u8]) -> Vec<u8> {
    base.iter().zip(patch.iter()).map(|(b, p)| b ^ p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_apply_equal_lengths() {
        let base = [0x01, 0x02];
        let patch = [0x01, 0x01];
        assert_eq!(apply(&base, &patch), vec![0x00, 0x03]);
    }

    #[test]
    fn test_apply_is_deterministic() {
        let base = b"some base artifact bytes";
        let patch = b"patch payload bytes here";
        assert_eq!(apply(base, patch), apply(base, patch));
    }

    #[test]
    fn test_apply_truncates_to_base_when_patch_longer() {
        let base = [0xFF, 0x00];
        let patch = [0x0F, 0xF0, 0xAA, 0xBB];
        assert_eq!(apply(&base, &patch), vec![0xF0, 0xF0]);
    }

    #[test]
    fn test_apply_truncates_to_patch_when_patch_shorter() {
        let base = [0x10, 0x20, 0x30, 0x40];
        let patch = [0x01];
        assert_eq!(apply(&base, &patch), vec![0x11]);
    }

    #[test]
    fn test_apply_empty_inputs() {
        assert!(apply(&[], &[0x01, 0x02]).is_empty());
        assert!(apply(&[0x01, 0x02], &[]).is_empty());
        assert!(apply(&[], &[]).is_empty());
    }

    #[test]
    fn test_apply_identity_patch_of_zeroes() {
        let base = [0xDE, 0xAD, 0xBE, 0xEF];
        let patch = [0x00; 4];
        assert_eq!(apply(&base, &patch), base.to_vec());
    }

    proptest! {
        /// Applying the same equal-length patch twice returns the base.
        #[test]
        fn prop_apply_is_involutive(data in proptest::collection::vec(any::<(u8, u8)>(), 0..512)) {
            let base: Vec<u8> = data.iter().map(|(b, _)| *b).collect();
            let patch: Vec<u8> = data.iter().map(|(_, p)| *p).collect();

            let once = apply(&base, &patch);
            let twice = apply(&once, &patch);
            prop_assert_eq!(twice, base);
        }

        /// Output length is always the shorter of the two inputs.
        #[test]
        fn prop_output_length_is_min(
            base in proptest::collection::vec(any::<u8>(), 0..256),
            patch in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            prop_assert_eq!(apply(&base, &patch).len(), base.len().min(patch.len()));
        }
    }
}
