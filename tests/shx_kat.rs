//! Known-answer and equivalence checks for the extended Serpent engine.

use xsc_rs::{KdfDigest, KeyMaterial, Shx};

fn init_pair(material: &KeyMaterial) -> (Shx, Shx) {
    let mut enc = Shx::new();
    let mut dec = Shx::new();
    enc.initialize(true, material).expect("encrypt init");
    dec.initialize(false, material).expect("decrypt init");
    (enc, dec)
}

// Serpent-256 variable-key KAT, vector 1 (NESSIE set 1 vector 0):
// key = 8000...00, plaintext = 0.
#[test]
fn serpent256_variable_key_vector() {
    let mut key = vec![0u8; 32];
    key[0] = 0x80;
    let material = KeyMaterial::new(key);
    let (enc, dec) = init_pair(&material);
    assert_eq!(enc.rounds(), 32);
    assert_eq!(enc.name(), "Serpent256");

    let plain = [0u8; 16];
    let expected = hex::decode("a223aa1288463c0e2be38ebd825616c0").unwrap();

    let mut cipher_text = [0u8; 16];
    enc.transform(&plain, &mut cipher_text).unwrap();
    assert_eq!(&cipher_text[..], &expected[..]);

    let mut recovered = [0u8; 16];
    dec.transform(&cipher_text, &mut recovered).unwrap();
    assert_eq!(recovered, plain);
}

#[test]
fn zero_key_zero_block_round_trips() {
    let material = KeyMaterial::new(vec![0u8; 32]);
    let (enc, dec) = init_pair(&material);

    let plain = [0u8; 16];
    let mut cipher_text = [0u8; 16];
    let mut recovered = [0u8; 16];
    enc.transform(&plain, &mut cipher_text).unwrap();
    assert_ne!(cipher_text, plain);
    dec.transform(&cipher_text, &mut recovered).unwrap();
    assert_eq!(recovered, plain);
}

#[test]
fn encrypt_decrypt_inverse_over_random_material() {
    // fixed pseudo-random coverage across all classical key sizes
    let mut state = 0x1234_5678_9ABC_DEF0u64;
    let mut next_byte = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 56) as u8
    };

    for key_len in [16usize, 24, 32, 64] {
        let key: Vec<u8> = (0..key_len).map(|_| next_byte()).collect();
        let material = KeyMaterial::new(key);
        let (enc, dec) = init_pair(&material);

        for _ in 0..16 {
            let plain: Vec<u8> = (0..16).map(|_| next_byte()).collect();
            let mut cipher_text = [0u8; 16];
            let mut recovered = [0u8; 16];
            enc.transform(&plain, &mut cipher_text).unwrap();
            dec.transform(&cipher_text, &mut recovered).unwrap();
            assert_eq!(&recovered[..], &plain[..], "key length {key_len}");
        }
    }
}

#[test]
fn classical_sixtyfour_byte_key_selects_forty_rounds() {
    let material = KeyMaterial::new(vec![0x3Cu8; 64]);
    let (enc, _) = init_pair(&material);
    assert_eq!(enc.rounds(), 40);
}

// Bulk transforms must equal independent scalar transforms, block by block.
#[test]
fn wide_paths_match_scalar() {
    let material = KeyMaterial::new((0u8..32).collect());
    let (enc, dec) = init_pair(&material);

    let plain: Vec<u8> = (0..2048u32).map(|i| (i * 31 + 7) as u8).collect();
    let mut scalar = vec![0u8; plain.len()];
    for (p, c) in plain.chunks_exact(16).zip(scalar.chunks_exact_mut(16)) {
        enc.transform(p, c).unwrap();
    }

    let mut wide = vec![0u8; plain.len()];
    for (p, c) in plain.chunks_exact(256).zip(wide.chunks_exact_mut(256)) {
        enc.transform_2048(p, c).unwrap();
    }
    assert_eq!(scalar, wide);

    let mut wide = vec![0u8; plain.len()];
    for (p, c) in plain.chunks_exact(128).zip(wide.chunks_exact_mut(128)) {
        enc.transform_1024(p, c).unwrap();
    }
    assert_eq!(scalar, wide);

    let mut wide = vec![0u8; plain.len()];
    for (p, c) in plain.chunks_exact(64).zip(wide.chunks_exact_mut(64)) {
        enc.transform_512(p, c).unwrap();
    }
    assert_eq!(scalar, wide);

    // and the wide decrypt path recovers the plaintext
    let mut recovered = vec![0u8; plain.len()];
    for (c, p) in scalar.chunks_exact(256).zip(recovered.chunks_exact_mut(256)) {
        dec.transform_2048(c, p).unwrap();
    }
    assert_eq!(recovered, plain);
}

#[test]
fn hkdf_schedule_is_deterministic_and_key_separated() {
    let key_a = KeyMaterial::new(vec![0xA5u8; 64]);
    let key_b = KeyMaterial::new(vec![0xA6u8; 64]);

    let mut one = Shx::with_kdf(KdfDigest::Sha512, 40).unwrap();
    let mut two = Shx::with_kdf(KdfDigest::Sha512, 40).unwrap();
    let mut other = Shx::with_kdf(KdfDigest::Sha512, 40).unwrap();
    one.initialize(true, &key_a).unwrap();
    two.initialize(true, &key_a).unwrap();
    other.initialize(true, &key_b).unwrap();
    assert_eq!(one.name(), "SHX512");

    let plain = [0u8; 16];
    let (mut c1, mut c2, mut c3) = ([0u8; 16], [0u8; 16], [0u8; 16]);
    one.transform(&plain, &mut c1).unwrap();
    two.transform(&plain, &mut c2).unwrap();
    other.transform(&plain, &mut c3).unwrap();
    assert_eq!(c1, c2);
    assert_ne!(c1, c3);
}

// At the saturation key size (2x the digest block) the key tail beyond
// one block feeds Extract as the salt; a key holding only the prefix
// extracts with the empty default salt and must key a different stream.
#[test]
fn hkdf_extract_salt_splits_at_saturation() {
    let digest = KdfDigest::Sha512;
    let saturated = vec![0x42u8; digest.block_size() * 2];
    let prefix_only = saturated[..digest.block_size()].to_vec();

    let mut with_salt = Shx::with_kdf(digest, 40).unwrap();
    with_salt
        .initialize(true, &KeyMaterial::new(saturated))
        .unwrap();
    let mut empty_salt = Shx::with_kdf(digest, 40).unwrap();
    empty_salt
        .initialize(true, &KeyMaterial::new(prefix_only))
        .unwrap();

    let plain = [0u8; 16];
    let (mut a, mut b) = ([0u8; 16], [0u8; 16]);
    with_salt.transform(&plain, &mut a).unwrap();
    empty_salt.transform(&plain, &mut b).unwrap();
    assert_ne!(a, b);
}

#[test]
fn sixtyfour_byte_key_is_legal_in_sha512_mode() {
    // below the SHA-512 block size: Extract still runs, with an empty salt
    let mut cipher = Shx::with_kdf(KdfDigest::Sha512, 48).unwrap();
    cipher
        .initialize(true, &KeyMaterial::new(vec![0u8; 64]))
        .unwrap();
    assert_eq!(cipher.rounds(), 48);
}

#[test]
fn uninitialized_transform_is_rejected() {
    let cipher = Shx::new();
    let (input, mut output) = ([0u8; 16], [0u8; 16]);
    assert!(matches!(
        cipher.transform(&input, &mut output),
        Err(xsc_rs::Error::NotInitialized { .. })
    ));
}
