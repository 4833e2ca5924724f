use super::{BuildConfig, BuildError, Builder, InvalidInput, Phf};
use core::time::Duration;

const KEYS: [&str; 6] = ["Je", "suis", "un", "ensemble", "de", "clés"];
const VALUES: [usize; 6] = [9, 12, 15, 18, 21, 24];

fn synthetic_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("key number {i}")).collect()
}

#[test]
fn identity_small() {
    let phf = Phf::build(&KEYS).unwrap();
    assert_eq!(phf.codomain_size(), 6);
    let indices: Vec<usize> = KEYS.iter().map(|key| phf.evaluate(key)).collect();
    assert_eq!(indices, [0, 1, 2, 3, 4, 5]);
}

#[test]
fn explicit_values() {
    let phf = Phf::build_with_values(&KEYS, &VALUES).unwrap();
    assert_eq!(phf.codomain_size(), 25);
    assert_eq!(phf.evaluate("Je"), 9);
    assert_eq!(phf.evaluate("clés"), 24);

    let mut image: Vec<usize> = KEYS.iter().map(|key| phf.evaluate(key)).collect();
    image.sort_unstable();
    assert_eq!(image, VALUES);
}

#[test]
fn bytes_and_strings_are_interchangeable() {
    let owned: Vec<Vec<u8>> = KEYS.iter().map(|key| key.as_bytes().to_vec()).collect();
    let from_bytes = Phf::build(&owned).unwrap();
    let from_strs = Phf::build(&KEYS).unwrap();
    assert_eq!(from_bytes, from_strs);
    assert_eq!(from_bytes.evaluate("clés"), 5);
    assert_eq!(from_bytes.evaluate(&[b'c', b'l', 0xc3, 0xa9, b's'][..]), 5);
}

#[test]
fn large_bijection() {
    let keys = synthetic_keys(16384);
    let phf = Phf::build(&keys).unwrap();
    assert_eq!(phf.codomain_size(), 16384);
    assert_eq!(phf.bucket_count(), 16384);

    let mut seen = vec![false; 16384];
    for (i, key) in keys.iter().enumerate() {
        let index = phf.evaluate(key);
        assert_eq!(index, i, "{key} misplaced");
        assert!(!seen[index], "{index} hit twice");
        seen[index] = true;
    }
}

#[cfg(feature = "serde")]
#[test]
fn serialized_function_evaluates_identically() {
    let keys = synthetic_keys(2000);
    let phf = Phf::build(&keys).unwrap();

    let json = serde_json::to_vec(&phf).unwrap();
    let from_json: Phf = serde_json::from_slice(&json).unwrap();
    let from_bincode: Phf = bincode::deserialize(&bincode::serialize(&phf).unwrap()).unwrap();
    let from_parts = Phf::from_raw_parts(phf.to_raw_parts()).unwrap();

    for key in &keys {
        let expected = phf.evaluate(key);
        assert_eq!(from_json.evaluate(key), expected);
        assert_eq!(from_bincode.evaluate(key), expected);
        assert_eq!(from_parts.evaluate(key), expected);
    }
}

#[test]
fn deterministic() {
    let keys = synthetic_keys(3000);
    let first = Phf::build(&keys).unwrap();
    let second = Phf::build(&keys).unwrap();
    assert_eq!(first.into_raw_parts(), second.into_raw_parts());

    let first = Phf::build_with_values(&KEYS, &VALUES).unwrap();
    let second = Phf::build_with_values(&KEYS, &VALUES).unwrap();
    assert_eq!(first, second);
}

#[test]
fn value_assignment_ignores_input_order() {
    let forward = Phf::build_with_values(&KEYS, &VALUES).unwrap();

    let mut pairs: Vec<(&str, usize)> = KEYS.iter().copied().zip(VALUES).collect();
    pairs.reverse();
    pairs.swap(1, 4);
    let keys: Vec<&str> = pairs.iter().map(|(key, _)| *key).collect();
    let values: Vec<usize> = pairs.iter().map(|(_, value)| *value).collect();
    let shuffled = Phf::build_with_values(&keys, &values).unwrap();

    for (key, value) in KEYS.iter().zip(VALUES) {
        assert_eq!(forward.evaluate(key), value);
        assert_eq!(shuffled.evaluate(key), value);
    }
}

#[test]
fn sparse_values() {
    let keys = synthetic_keys(200);
    let values: Vec<usize> = (0..200).map(|i| i * 7 + 3).collect();
    let phf = Phf::build_with_values(&keys, &values).unwrap();
    assert_eq!(phf.codomain_size(), 199 * 7 + 4);
    for (key, value) in keys.iter().zip(&values) {
        assert_eq!(phf.evaluate(key), *value);
    }
}

#[test]
fn rejected_before_hashing() {
    // A zero time budget would time out as soon as hashing starts
    let builder = Builder::new()
        .with_config(BuildConfig::default().with_time_budget(Some(Duration::ZERO)));

    assert_eq!(
        builder.build(&["a", "b", "a"]),
        Err(BuildError::InvalidInput(InvalidInput::DuplicateKey {
            first: 0,
            second: 2
        })),
    );
    assert_eq!(
        builder.build_with_values(&KEYS, &[0, 1, 2]),
        Err(BuildError::InvalidInput(InvalidInput::LengthMismatch {
            keys: 6,
            values: 3
        })),
    );
    assert_eq!(
        builder.build_with_values(&["a", "b"], &[4, 4]),
        Err(BuildError::InvalidInput(InvalidInput::DuplicateValue {
            first: 0,
            second: 1
        })),
    );
}

#[test]
fn failures_are_reproducible() {
    // A single pilot per bucket and a single seed pair may or may not be enough, but the outcome
    // must not change between runs
    let config = BuildConfig::default().with_max_pilots(1).with_max_retries(1);
    let keys = synthetic_keys(1000);
    let builder = Builder::new().with_config(config);
    let first = builder.build(&keys);
    let second = builder.build(&keys);
    assert_eq!(first, second);
    match first {
        Ok(phf) => {
            for (i, key) in keys.iter().enumerate() {
                assert_eq!(phf.evaluate(key), i);
            }
        }
        Err(error) => {
            assert!(!error.is_invalid_input());
            assert!(
                matches!(error, BuildError::Exhausted { attempts: 1, .. }),
                "unexpected error {error:?}"
            );
        }
    }
}

#[test]
fn padded_table() {
    let keys = synthetic_keys(5000);
    let phf = Builder::new()
        .with_config(BuildConfig::default().with_load_factor(0.5))
        .build(&keys)
        .unwrap();
    assert_eq!(phf.codomain_size(), 5000);
    assert_eq!(phf.bucket_count(), 10000);
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(phf.evaluate(key), i);
    }
}

#[test]
#[ignore = "slow without optimizations"]
fn build_1m_strings() {
    let keys = synthetic_keys(1_000_000);
    let phf = Phf::build(&keys).unwrap();
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(phf.evaluate(key), i);
    }
}
