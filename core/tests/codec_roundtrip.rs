use rollcall_core::{
    codec::{decode, encode, ALPHABET},
    error::CodecError,
};

#[test]
fn roundtrip_holds_for_valid_values() {
    let cases: Vec<Vec<usize>> = vec![
        vec![],
        (0..64).collect(),
        (0..64).rev().collect(),
        vec![10; 40],
        vec![5, 7, 10, 13, 63, 0, 62],
    ];
    for values in cases {
        let text = encode(values.iter().copied()).unwrap();
        assert_eq!(text.len(), values.len());
        assert_eq!(decode(&text).unwrap(), values);
    }
}

#[test]
fn weight_vector_encoding_matches_alphabet_order() {
    assert_eq!(encode([0, 1, 25, 26, 51, 52, 61, 62, 63]).unwrap(), "ABZaz09+/");
    assert_eq!(encode(vec![10; 4]).unwrap(), "KKKK");
    assert_eq!(ALPHABET.len(), 64);
}

#[test]
fn encode_rejects_out_of_range() {
    assert_eq!(
        encode([1, 64, 2]),
        Err(CodecError::OutOfRange { value: 64, len: 64 })
    );
}

#[test]
fn decode_rejects_foreign_characters() {
    for (text, bad) in [("AB-C", '-'), ("AB C", ' '), ("ąB", 'ą'), ("AB=", '=')] {
        assert_eq!(decode(text), Err(CodecError::UnknownCharacter(bad)));
    }
}
