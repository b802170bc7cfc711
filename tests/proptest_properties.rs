use deltafuzz::synth::{
    GenConfig, MixError, generate_base, generate_original_sized, generate_variant,
    generate_variant_rounds, mix, mutate_global, mutate_local,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

proptest! {
    #[test]
    fn prop_generate_base_exact_length(seed in any::<u64>(), size in 0usize..20_000) {
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert_eq!(generate_base(&mut rng, size).len(), size);
    }

    #[test]
    fn prop_mix_preserves_length(
        seed in any::<u64>(),
        a in proptest::collection::vec(any::<u8>(), 0..4096),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let b = generate_base(&mut rng, a.len());
        let len = a.len();
        prop_assert_eq!(mix(&mut rng, a, &b).unwrap().len(), len);
    }

    #[test]
    fn prop_mix_rejects_unequal_lengths(
        seed in any::<u64>(),
        a in proptest::collection::vec(any::<u8>(), 0..512),
        extra in 1usize..64,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let b = vec![0u8; a.len() + extra];
        let left = a.len();
        prop_assert_eq!(
            mix(&mut rng, a, &b),
            Err(MixError::LengthMismatch { left, right: left + extra })
        );
    }

    #[test]
    fn prop_mutate_global_preserves_length(
        seed in any::<u64>(),
        buf in proptest::collection::vec(any::<u8>(), 1..8192),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let len = buf.len();
        prop_assert_eq!(mutate_global(&mut rng, buf).len(), len);
    }

    #[test]
    fn prop_mutate_local_on_empty_is_non_empty(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert!(!mutate_local(&mut rng, Vec::new()).is_empty());
    }

    #[test]
    fn prop_zero_round_variant_is_identity(
        seed in any::<u64>(),
        original in proptest::collection::vec(any::<u8>(), 0..4096),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert_eq!(generate_variant_rounds(&mut rng, &original, 0), original);
    }

    #[test]
    fn prop_generation_is_seed_deterministic(seed in any::<u64>(), size in 0usize..8192) {
        let a = generate_original_sized(&mut StdRng::seed_from_u64(seed), size);
        let b = generate_original_sized(&mut StdRng::seed_from_u64(seed), size);
        prop_assert_eq!(&a, &b);

        let config = GenConfig::default();
        let va = generate_variant(&mut StdRng::seed_from_u64(seed ^ 1), &a, &config);
        let vb = generate_variant(&mut StdRng::seed_from_u64(seed ^ 1), &b, &config);
        prop_assert_eq!(va, vb);
    }
}
