//! End-to-end tests for the knapsack cryptosystem
//!
//! Key generation → Encrypt → Decrypt = Original Bytes

use knapsack_lll::knapsack::{
    decode, decrypt, encode, encrypt, Ciphertext, Knapsack, PrivateKey, PublicKey,
    SuperincreasingSet,
};
use knapsack_lll::params::{BlockSize, SetParams};
use knapsack_lll::KnapsackError;

fn bat_knapsack() -> Knapsack {
    let set = SuperincreasingSet::from_u64(&[3, 5, 9, 18, 38, 75, 155, 310]).unwrap();
    let private = PrivateKey::from_u64(672, 13).unwrap();
    Knapsack::from_parts(BlockSize::new(1).unwrap(), &set, private).unwrap()
}

#[test]
fn test_e2e_known_vector() {
    let knapsack = bat_knapsack();
    assert_eq!(
        knapsack.public_key(),
        &PublicKey::from_u64(&[39, 65, 117, 234, 494, 303, 671, 670]).unwrap()
    );

    let cipher = knapsack.encrypt(b"Bat").unwrap();
    assert_eq!(cipher.to_string(), "736, 852, 719");
    assert_eq!(knapsack.decrypt(&cipher).unwrap(), b"Bat");
}

#[test]
fn test_e2e_compatible_private_keys() {
    let knapsack = bat_knapsack();
    let cipher = knapsack.encrypt(b"Bat").unwrap();

    let other = PrivateKey::from_u64(113, 13).unwrap();
    let plain = decrypt(&cipher, &other, knapsack.public_key()).unwrap();
    assert_eq!(decode(&plain), b"Bat");
}

#[test]
fn test_e2e_wikipedia_example() {
    let set = SuperincreasingSet::from_u64(&[2, 7, 11, 21, 42, 89, 180, 354]).unwrap();
    let private = PrivateKey::from_u64(881, 588).unwrap();
    let public = PublicKey::derive(&set, &private).unwrap();
    assert_eq!(
        public,
        PublicKey::from_u64(&[295, 592, 301, 14, 28, 353, 120, 236]).unwrap()
    );

    let block_size = BlockSize::new(1).unwrap();
    let cipher = encrypt(&encode(b"a", block_size), &public).unwrap();
    assert_eq!(cipher, Ciphertext::from_u64(&[1129], block_size));

    let plain = decrypt(&cipher, &private, &public).unwrap();
    assert_eq!(decode(&plain), b"a");
}

#[test]
fn test_e2e_random_instances() {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    for bytes in 1..=8 {
        let block_size = BlockSize::new(bytes).unwrap();
        let knapsack = Knapsack::random(block_size, &SetParams::default(), &mut rng).unwrap();

        for len in [0, 1, bytes, bytes + 1, 3 * bytes + 2] {
            let mut data = vec![0u8; len];
            rng.fill(&mut data[..]);

            let cipher = knapsack.encrypt(&data).unwrap();
            assert_eq!(cipher.blocks().len(), len.div_ceil(bytes));
            assert_eq!(
                knapsack.decrypt(&cipher).unwrap(),
                data,
                "block size {} length {}",
                bytes,
                len
            );
        }
    }
}

#[test]
fn test_e2e_trailing_zero_bytes_survive() {
    let mut rng = rand::thread_rng();
    let knapsack =
        Knapsack::random(BlockSize::new(4).unwrap(), &SetParams::default(), &mut rng).unwrap();

    let data = b"zero\0\0tail\0\0\0";
    let cipher = knapsack.encrypt(data).unwrap();
    assert_eq!(knapsack.decrypt(&cipher).unwrap(), data);
}

#[test]
fn test_e2e_serialized_ciphertext() {
    let knapsack = bat_knapsack();
    let cipher = knapsack.encrypt(b"Bat!").unwrap();

    let json = serde_json::to_string(&cipher).unwrap();
    let restored: Ciphertext = serde_json::from_str(&json).unwrap();
    assert_eq!(knapsack.decrypt(&restored).unwrap(), b"Bat!");
}

#[test]
fn test_e2e_invalid_key_material() {
    assert!(matches!(
        PrivateKey::from_u64(902, 464),
        Err(KnapsackError::InvalidKey(_))
    ));
    assert!(matches!(
        BlockSize::new(9),
        Err(KnapsackError::InvalidBlockSize(9))
    ));
    assert!(SuperincreasingSet::from_u64(&[3, 5, 13, 18, 99, 108, 323, 350]).is_err());

    let set = SuperincreasingSet::from_u64(&[3, 5, 9, 18, 38, 75, 155, 310]).unwrap();
    let small = PrivateKey::from_u64(619, 13).unwrap();
    assert!(Knapsack::from_parts(BlockSize::new(1).unwrap(), &set, small).is_err());
}
