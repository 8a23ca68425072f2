#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tessera_mcs::{Context, MsgSignature, Params, PrivateKey, RootSignature};

#[derive(Debug, Arbitrary)]
struct VerifyInput {
    sig_bytes: Vec<u8>,
    message: Vec<u8>,
    anchor: [u8; 32],
}

fuzz_target!(|input: VerifyInput| {
    let params = Params::new(32, 16, 1, 2, 1).unwrap();
    let ctx = Context::new(params).unwrap().with_threads(1);
    let (_, pk) = PrivateKey::derive(ctx, &[1u8; 32], &[2u8; 32], &[3u8; 32]).unwrap();

    // Decoding arbitrary bytes either fails cleanly or yields a signature
    // that verification handles without panicking.
    if let Ok(sig) = MsgSignature::from_bytes(&input.sig_bytes, &params) {
        let _ = pk.verify_channel_msg(&sig, &input.message, &input.anchor);
        let reencoded = sig.to_bytes();
        assert_eq!(reencoded, input.sig_bytes, "wire format must roundtrip");
    }

    if let Ok(sig) = RootSignature::from_bytes(&input.sig_bytes, &params) {
        let _ = pk.verify_channel_root(&sig, &input.anchor);
    }
});
