use rollcall_core::{
    allow::AllowList,
    error::DeskError,
    ledger::WeightVector,
    rng::DrawRng,
    sequence::{DrawMode, DrawSequence},
    snapshot::DrawState,
};

const N: usize = 40;
const TARGET: usize = 500;

fn fresh(seed: u64) -> (DrawSequence, DrawRng) {
    let mut rng = DrawRng::new(seed);
    let mut seq = DrawSequence::new(WeightVector::uniform(N), TARGET).unwrap();
    seq.reserve(&mut rng);
    (seq, rng)
}

fn assert_no_adjacent_repeats(seq: &DrawSequence) {
    let pending: Vec<usize> = seq.pending().collect();
    for (i, pair) in pending.windows(2).enumerate() {
        assert_ne!(pair[0], pair[1], "repeat at positions {i} and {}", i + 1);
    }
}

#[test]
fn reserve_fills_to_target_without_repeats() {
    let (seq, _) = fresh(1);
    assert_eq!(seq.len(), TARGET);
    assert_eq!(seq.cursor(), 0);
    assert_no_adjacent_repeats(&seq);
}

#[test]
fn reserve_without_repeats_even_with_two_values() {
    let weights = WeightVector::from_weights(vec![63, 1]).unwrap();
    let mut rng = DrawRng::new(5);
    let mut seq = DrawSequence::new(weights, 100).unwrap();
    seq.reserve(&mut rng);
    assert_no_adjacent_repeats(&seq);
    // Two values and no repeats leaves exactly one shape: alternation.
    let pending: Vec<usize> = seq.pending().collect();
    assert!(pending.iter().step_by(2).all(|&v| v == pending[0]));
}

#[test]
fn consecutive_draws_never_repeat() {
    let (mut seq, mut rng) = fresh(2);
    let mut last = None;
    for _ in 0..2_000 {
        let x = seq.advance(&mut rng);
        assert_ne!(Some(x), last);
        last = Some(x);
        assert_eq!(seq.len(), TARGET);
    }
    assert_no_adjacent_repeats(&seq);
}

#[test]
fn peek_does_not_mutate() {
    let (seq, _) = fresh(3);
    let before = seq.state();
    assert_eq!(seq.peek(), before.buffer.first().copied());
    assert_eq!(seq.peek(), seq.peek());
    assert_eq!(seq.state(), before);
}

#[test]
fn advance_pops_head_and_advances_cursor() {
    let (mut seq, mut rng) = fresh(4);
    let before = seq.state();
    let x = seq.advance(&mut rng);
    assert_eq!(x, before.buffer[0]);
    assert_eq!(seq.cursor(), 1);
    let after = seq.state();
    assert_eq!(&after.buffer[..TARGET - 1], &before.buffer[1..]);
}

#[test]
fn allow_list_discards_and_spends_rejected_values() {
    let (mut seq, mut rng) = fresh(5);
    let before = seq.state();
    let first_three = before
        .buffer
        .iter()
        .position(|&v| v == 3)
        .expect("value 3 within the first reservation");

    let x = seq
        .next_matching(&AllowList::only([3], N), DrawMode::Continuing, &mut rng)
        .unwrap();

    assert_eq!(x, 3);
    // Every non-3 draw before the first 3 was consumed, plus the 3 itself.
    assert_eq!(seq.cursor(), first_three as u64 + 1);
    let after = seq.state();
    assert_eq!(&after.buffer[..TARGET - first_three - 1], &before.buffer[first_three + 1..]);
}

#[test]
fn starting_mode_offers_head_without_consuming() {
    let (mut seq, mut rng) = fresh(6);
    let before = seq.state();
    let head = before.buffer[0];

    let x = seq
        .next_matching(&AllowList::all(N), DrawMode::Starting, &mut rng)
        .unwrap();
    assert_eq!(x, head);
    assert_eq!(seq.state(), before);

    // The next continuing draw consumes that same head.
    let y = seq
        .next_matching(&AllowList::all(N), DrawMode::Continuing, &mut rng)
        .unwrap();
    assert_eq!(y, head);
    assert_eq!(seq.cursor(), 1);
}

#[test]
fn starting_mode_consumes_when_head_is_denied() {
    let (mut seq, mut rng) = fresh(7);
    let head = seq.peek().unwrap();
    let everything_but_head = AllowList::only((0..N).filter(|&v| v != head), N);

    let x = seq
        .next_matching(&everything_but_head, DrawMode::Starting, &mut rng)
        .unwrap();
    assert_ne!(x, head);
    // Head discarded, the next value (never equal to head) accepted.
    assert_eq!(seq.cursor(), 2);
}

#[test]
fn unreachable_allow_list_fails_fast() {
    let (mut seq, mut rng) = fresh(8);
    let before = seq.state();
    let err = seq
        .next_matching(&AllowList::only([], N), DrawMode::Continuing, &mut rng)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidAllowList { .. }));
    assert_eq!(seq.state(), before);
}

#[test]
fn heavier_values_come_up_more_often() {
    let mut weights = vec![10; N];
    weights[0] = 60;
    weights[1] = 1;
    let mut rng = DrawRng::new(9);
    let mut seq = DrawSequence::new(WeightVector::from_weights(weights).unwrap(), TARGET).unwrap();
    seq.reserve(&mut rng);

    let mut counts = [0usize; N];
    for _ in 0..20_000 {
        counts[seq.advance(&mut rng)] += 1;
    }
    assert!(counts[0] > counts[2] * 3, "counts: {counts:?}");
    assert!(counts[1] * 3 < counts[2], "counts: {counts:?}");
}

#[test]
fn restore_reproduces_head() {
    let (mut seq, mut rng) = fresh(10);
    seq.advance(&mut rng);
    let saved = seq.state();

    let restored = DrawSequence::restore("xyzzy", WeightVector::uniform(N), TARGET, saved.clone()).unwrap();
    assert_eq!(restored.peek(), seq.peek());
    assert_eq!(restored.cursor(), 1);
    assert_eq!(restored.state(), saved);
}

#[test]
fn restore_rejects_corrupt_state() {
    let repeated = DrawState { cursor: 3, buffer: vec![1, 2, 2, 5] };
    let err = DrawSequence::restore("xyzzy", WeightVector::uniform(N), TARGET, repeated).unwrap_err();
    assert!(matches!(err, DeskError::CorruptState { .. }), "{err:?}");

    let out_of_range = DrawState { cursor: 3, buffer: vec![1, 40] };
    let err = DrawSequence::restore("xyzzy", WeightVector::uniform(N), TARGET, out_of_range).unwrap_err();
    assert!(matches!(err, DeskError::CorruptState { .. }), "{err:?}");
}

#[test]
fn single_drawable_value_is_rejected() {
    let weights = WeightVector::from_weights(vec![5]).unwrap();
    assert!(DrawSequence::new(weights, TARGET).is_err());
}

#[test]
fn new_weights_keep_pending_draws() {
    let (mut seq, mut rng) = fresh(11);
    let before = seq.state();
    let mut weights = vec![10; N];
    weights[7] = 63;
    seq.set_weights(WeightVector::from_weights(weights).unwrap()).unwrap();
    assert_eq!(seq.state(), before);
    seq.advance(&mut rng);
    assert_eq!(seq.weights().get(7), Some(63));

    assert!(seq.set_weights(WeightVector::uniform(N + 1)).is_err());
}
