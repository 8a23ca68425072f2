//! End-to-end channel signing flows: creation, message signing, growth,
//! exhaustion, tampering, and cross-channel replay.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tessera_mcs::{
    ChannelVerifier, Context, Error, GrowSignature, MsgSignature, Params, PrivateKey, PublicKey,
};

fn setup(root_height: u32, chan_height: u32, growth: u32) -> (PrivateKey, PublicKey) {
    let ctx = Context::new(Params::new(32, 16, root_height, chan_height, growth).unwrap())
        .unwrap()
        .with_threads(1);
    PrivateKey::derive(ctx, &[0x11u8; 32], &[0x22u8; 32], &[0x33u8; 32]).unwrap()
}

#[test]
fn test_sign_and_verify_first_messages() {
    let (sk, pk) = setup(5, 4, 2);
    let (chan, root_sig) = sk.create_channel().unwrap();
    assert_eq!(chan, 1);
    assert!(pk.verify_channel_root(&root_sig, root_sig.root_hash()));

    let mut verifier = ChannelVerifier::new(pk.clone(), chan, &root_sig).unwrap();

    let messages: [&[u8]; 3] = [b"m1", b"m2", b"m3"];
    for (i, msg) in messages.iter().enumerate() {
        let sig = sk.sign_channel_msg(chan, msg, false).unwrap();
        assert_eq!(sig.seq_no(), i as u32);
        assert_eq!(sig.chain_seq_no(), i as u32 + 1);
        assert_eq!(sig.layer(), 1);
        assert!(verifier.verify_msg(&sig, msg), "message {i}");
    }
}

#[test]
fn test_stateless_verification_chains_anchors() {
    let (sk, pk) = setup(5, 4, 2);
    let (chan, root_sig) = sk.create_channel().unwrap();

    let s1 = sk.sign_channel_msg(chan, b"m1", false).unwrap();
    let s2 = sk.sign_channel_msg(chan, b"m2", false).unwrap();

    // The first signature verifies against the signed chain root; each
    // signature's auth path anchors the next.
    assert!(pk.verify_channel_msg(&s1, b"m1", root_sig.root_hash()));
    assert!(pk.verify_channel_msg(&s2, b"m2", s1.auth_path()));
    assert!(!pk.verify_channel_msg(&s2, b"m2", root_sig.root_hash()));
}

#[test]
fn test_grow_cycle() {
    let (sk, pk) = setup(5, 4, 2);
    let (chan, root_sig) = sk.create_channel().unwrap();
    let mut verifier = ChannelVerifier::new(pk, chan, &root_sig).unwrap();

    for msg in [b"m1", b"m2", b"m3"] {
        let sig = sk.sign_channel_msg(chan, msg, false).unwrap();
        assert!(verifier.verify_msg(&sig, msg));
    }

    // The fourth key is reserved for growth.
    assert!(matches!(
        sk.sign_channel_msg(chan, b"m4", false),
        Err(Error::MustGrowFirst { idx: 1 })
    ));

    let grow = sk.grow_channel(chan).unwrap();
    assert_eq!(grow.msg_sig().chain_seq_no(), 4);
    assert!(verifier.verify_grow(&grow));

    // Layer 2 has height chanH + ge = 6.
    let sig = sk.sign_channel_msg(chan, b"m4", false).unwrap();
    assert_eq!(sig.layer(), 2);
    assert_eq!(sig.chain_seq_no(), 1);
    assert_eq!(sig.seq_no(), 4);
    assert!(verifier.verify_msg(&sig, b"m4"));
}

#[test]
fn test_two_grow_cycles() {
    let (sk, pk) = setup(5, 2, 1);
    let (chan, root_sig) = sk.create_channel().unwrap();
    let mut verifier = ChannelVerifier::new(pk, chan, &root_sig).unwrap();

    // Layer 1 (height 2): one message, then grow.
    let sig = sk.sign_channel_msg(chan, b"a", false).unwrap();
    assert!(verifier.verify_msg(&sig, b"a"));
    let grow = sk.grow_channel(chan).unwrap();
    assert!(verifier.verify_grow(&grow));

    // Layer 2 (height 3): two messages, then grow.
    for msg in [b"b", b"c"] {
        let sig = sk.sign_channel_msg(chan, msg, false).unwrap();
        assert!(verifier.verify_msg(&sig, msg));
    }
    let grow = sk.grow_channel(chan).unwrap();
    assert!(verifier.verify_grow(&grow));

    let sig = sk.sign_channel_msg(chan, b"d", false).unwrap();
    assert_eq!(sig.layer(), 3);
    assert!(verifier.verify_msg(&sig, b"d"));
}

#[test]
fn test_root_tree_exhaustion() {
    let (sk, _) = setup(2, 4, 2);
    for expected in 1..=4 {
        let (idx, _) = sk.create_channel().unwrap();
        assert_eq!(idx, expected);
    }
    assert!(matches!(sk.create_channel(), Err(Error::OutOfRootKeys)));
}

#[test]
fn test_tampered_wots_sig_rejected() {
    let (sk, pk) = setup(5, 4, 2);
    let (chan, root_sig) = sk.create_channel().unwrap();
    let sig = sk.sign_channel_msg(chan, b"m1", false).unwrap();

    // Flip one bit inside the WOTS signature region
    // (after seqNo | chainSeqNo | chIdx | layer | drv).
    let mut bytes = sig.to_bytes();
    bytes[16 + 32] ^= 0x01;
    let tampered = MsgSignature::from_bytes(&bytes, pk.params()).unwrap();

    let root_before = pk.root().to_vec();
    assert!(!pk.verify_channel_msg(&tampered, b"m1", root_sig.root_hash()));
    assert!(pk.verify_channel_msg(&sig, b"m1", root_sig.root_hash()));
    assert_eq!(pk.root(), root_before);
}

#[test]
fn test_tampered_message_and_auth_node_rejected() {
    let (sk, pk) = setup(5, 4, 2);
    let (chan, root_sig) = sk.create_channel().unwrap();
    let sig = sk.sign_channel_msg(chan, b"m1", false).unwrap();

    assert!(!pk.verify_channel_msg(&sig, b"m2", root_sig.root_hash()));

    let mut bad_anchor = root_sig.root_hash().to_vec();
    bad_anchor[0] ^= 0x80;
    assert!(!pk.verify_channel_msg(&sig, b"m1", &bad_anchor));
}

#[test]
fn test_cross_channel_replay_rejected() {
    let (sk, pk) = setup(5, 4, 2);
    let (chan1, root_sig1) = sk.create_channel().unwrap();
    let (chan2, root_sig2) = sk.create_channel().unwrap();
    assert_eq!((chan1, chan2), (1, 2));

    let sig = sk.sign_channel_msg(chan1, b"m1", false).unwrap();

    // Rewrite the channel index to 2 and replay against channel 2.
    let mut bytes = sig.to_bytes();
    bytes[11] = 2;
    let replayed = MsgSignature::from_bytes(&bytes, pk.params()).unwrap();
    assert_eq!(replayed.chan_idx(), 2);

    assert!(!pk.verify_channel_msg(&replayed, b"m1", root_sig2.root_hash()));
    // Still valid where it came from.
    assert!(pk.verify_channel_msg(&sig, b"m1", root_sig1.root_hash()));
}

#[test]
fn test_verifier_rejects_out_of_order_signatures() {
    let (sk, pk) = setup(5, 4, 2);
    let (chan, root_sig) = sk.create_channel().unwrap();
    let mut verifier = ChannelVerifier::new(pk, chan, &root_sig).unwrap();

    let s1 = sk.sign_channel_msg(chan, b"m1", false).unwrap();
    let s2 = sk.sign_channel_msg(chan, b"m2", false).unwrap();

    // Skipping s1 must fail; replaying s1 after acceptance must fail.
    assert!(!verifier.verify_msg(&s2, b"m2"));
    assert!(verifier.verify_msg(&s1, b"m1"));
    assert!(!verifier.verify_msg(&s1, b"m1"));
    assert!(verifier.verify_msg(&s2, b"m2"));
}

#[test]
fn test_parallel_and_sequential_keys_match() {
    let params = Params::new(32, 16, 4, 8, 2).unwrap();
    let seq_ctx = Context::new(params).unwrap().with_threads(1);
    let par_ctx = Context::new(params).unwrap().with_threads(8);

    let (sk_seq, pk_seq) =
        PrivateKey::derive(seq_ctx, &[1u8; 32], &[2u8; 32], &[3u8; 32]).unwrap();
    let (sk_par, pk_par) =
        PrivateKey::derive(par_ctx, &[1u8; 32], &[2u8; 32], &[3u8; 32]).unwrap();

    assert_eq!(pk_seq, pk_par);
    assert_eq!(pk_seq.to_bytes(), pk_par.to_bytes());

    let (_, rs_seq) = sk_seq.create_channel().unwrap();
    let (_, rs_par) = sk_par.create_channel().unwrap();
    assert_eq!(rs_seq.to_bytes(), rs_par.to_bytes());

    let m_seq = sk_seq.sign_channel_msg(1, b"block", false).unwrap();
    let m_par = sk_par.sign_channel_msg(1, b"block", false).unwrap();
    assert_eq!(m_seq.to_bytes(), m_par.to_bytes());
}

#[test]
fn test_generated_keypair_roundtrip() {
    let ctx = Context::new(Params::new(32, 16, 3, 3, 1).unwrap())
        .unwrap()
        .with_threads(1);
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let (sk, pk) = PrivateKey::generate(ctx, &mut rng).unwrap();

    let (chan, root_sig) = sk.create_channel().unwrap();
    let sig = sk.sign_channel_msg(chan, b"block", false).unwrap();

    let mut verifier = ChannelVerifier::new(pk, chan, &root_sig).unwrap();
    assert!(verifier.verify_msg(&sig, b"block"));
}

#[test]
fn test_wire_roundtrips_with_real_signatures() {
    let (sk, pk) = setup(5, 4, 2);
    let (chan, root_sig) = sk.create_channel().unwrap();
    let params = *pk.params();

    let restored = tessera_mcs::RootSignature::from_bytes(&root_sig.to_bytes(), &params).unwrap();
    assert_eq!(restored, root_sig);

    // First message signature embeds the root signature.
    let s1 = sk.sign_channel_msg(chan, b"m1", false).unwrap();
    assert!(s1.root_sig().is_some());
    let restored = MsgSignature::from_bytes(&s1.to_bytes(), &params).unwrap();
    assert_eq!(restored, s1);
    assert_eq!(restored.root_sig().unwrap(), &root_sig);

    let s2 = sk.sign_channel_msg(chan, b"m2", false).unwrap();
    assert!(s2.root_sig().is_none());
    assert_eq!(MsgSignature::from_bytes(&s2.to_bytes(), &params).unwrap(), s2);

    sk.sign_channel_msg(chan, b"m3", false).unwrap();
    let grow = sk.grow_channel(chan).unwrap();
    assert_eq!(
        GrowSignature::from_bytes(&grow.to_bytes(), &params).unwrap(),
        grow
    );

    let pk2 = PublicKey::from_bytes(&pk.to_bytes()).unwrap();
    assert_eq!(pk2, pk);
    assert!(pk2.verify_channel_root(&root_sig, root_sig.root_hash()));
}

#[test]
fn test_embedded_root_sig_bootstraps_verifier() {
    let (sk, pk) = setup(5, 4, 2);
    let (chan, _) = sk.create_channel().unwrap();

    // A verifier that only ever sees the first message signature can
    // anchor from its embedded root signature.
    let s1 = sk.sign_channel_msg(chan, b"m1", false).unwrap();
    let embedded = s1.root_sig().unwrap();
    let mut verifier = ChannelVerifier::new(pk, chan, embedded).unwrap();
    assert!(verifier.verify_msg(&s1, b"m1"));
}

#[test]
fn test_sha512_parameter_set() {
    let ctx = Context::new(Params::new(64, 16, 2, 2, 1).unwrap())
        .unwrap()
        .with_threads(1);
    let (sk, pk) = PrivateKey::derive(ctx, &[1u8; 64], &[2u8; 64], &[3u8; 64]).unwrap();

    let (chan, root_sig) = sk.create_channel().unwrap();
    let sig = sk.sign_channel_msg(chan, b"block", false).unwrap();

    let mut verifier = ChannelVerifier::new(pk, chan, &root_sig).unwrap();
    assert!(verifier.verify_msg(&sig, b"block"));
}

#[test]
fn test_w256_parameter_set() {
    let ctx = Context::new(Params::new(32, 256, 2, 2, 1).unwrap())
        .unwrap()
        .with_threads(1);
    let (sk, pk) = PrivateKey::derive(ctx, &[1u8; 32], &[2u8; 32], &[3u8; 32]).unwrap();

    let (chan, root_sig) = sk.create_channel().unwrap();
    let sig = sk.sign_channel_msg(chan, b"block", false).unwrap();

    let mut verifier = ChannelVerifier::new(pk, chan, &root_sig).unwrap();
    assert!(verifier.verify_msg(&sig, b"block"));
}
