#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tessera_mcs::{Context, Params, PrivateKey, PublicKey};

#[derive(Debug, Arbitrary)]
struct KeygenInput {
    sk_seed: [u8; 32],
    sk_prf: [u8; 32],
    pub_seed: [u8; 32],
}

fuzz_target!(|input: KeygenInput| {
    let ctx = Context::new(Params::new(32, 16, 1, 2, 1).unwrap())
        .unwrap()
        .with_threads(1);

    // Derivation from any seeds must succeed and be deterministic.
    let (sk, pk) =
        PrivateKey::derive(ctx.clone(), &input.sk_seed, &input.sk_prf, &input.pub_seed).unwrap();
    let (_, pk2) =
        PrivateKey::derive(ctx, &input.sk_seed, &input.sk_prf, &input.pub_seed).unwrap();
    assert_eq!(pk, pk2);

    // Keys must survive a wire roundtrip.
    let restored = PublicKey::from_bytes(&pk.to_bytes()).unwrap();
    assert_eq!(restored, pk);

    let restored = PrivateKey::from_bytes(&sk.to_bytes()).unwrap();
    assert_eq!(restored.public_key(), pk);
});
