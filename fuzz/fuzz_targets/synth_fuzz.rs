#![no_main]
use deltafuzz::synth::{
    generate_base, generate_original_sized, generate_variant_rounds, mix, mutate_global,
    mutate_local,
};
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::StdRng;

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }

    // First 8 bytes seed the RNG, next 2 pick a size.
    let seed = u64::from_le_bytes(data[..8].try_into().unwrap());
    let size = u16::from_le_bytes([data[8], data[9]]) as usize;
    let payload = &data[10..];
    let mut rng = StdRng::seed_from_u64(seed);

    assert_eq!(generate_base(&mut rng, size).len(), size);

    let other = generate_base(&mut rng, payload.len());
    let mixed = mix(&mut rng, payload.to_vec(), &other).unwrap();
    assert_eq!(mixed.len(), payload.len());

    assert_eq!(mutate_global(&mut rng, payload.to_vec()).len(), payload.len());

    let local = mutate_local(&mut rng, payload.to_vec());
    if payload.is_empty() {
        assert!(!local.is_empty());
    }

    let original = generate_original_sized(&mut rng, size);
    assert_eq!(original.len(), size);
    assert_eq!(generate_variant_rounds(&mut rng, &original, 0), original);
});
