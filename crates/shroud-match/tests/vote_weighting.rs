//! Statistical check of the weighted arena draw.

use rand::SeedableRng;
use rand::rngs::StdRng;
use shroud_match::Ballot;
use shroud_model::PlayerId;

#[test]
fn test_draw_frequencies_follow_votes() {
    let mut ballot = Ballot::new(vec!["A".into(), "B".into(), "C".into()]);
    ballot.cast(PlayerId(1), "B");
    ballot.cast(PlayerId(2), "B");
    ballot.cast(PlayerId(3), "C");
    assert_eq!(ballot.pool(), vec![("A", 1), ("B", 3), ("C", 2)]);

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let (mut a, mut b, mut c) = (0u32, 0u32, 0u32);
    for _ in 0..10_000 {
        match ballot.draw(&mut rng).as_deref() {
            Some("A") => a += 1,
            Some("B") => b += 1,
            Some("C") => c += 1,
            other => panic!("unexpected draw {other:?}"),
        }
    }

    // Expected 1/6, 1/2, 1/3; each band is about ten standard deviations.
    assert!(a > 0 && b > 0 && c > 0);
    assert!((1300..=2050).contains(&a), "A drawn {a} times");
    assert!((4500..=5500).contains(&b), "B drawn {b} times");
    assert!((2900..=3750).contains(&c), "C drawn {c} times");
}

#[test]
fn test_unvoted_candidates_can_still_win() {
    let mut ballot = Ballot::new(vec!["A".into(), "B".into()]);
    for id in 0..20 {
        ballot.cast(PlayerId(id), "B");
    }
    let mut rng = StdRng::seed_from_u64(7);
    let a_wins = (0..10_000)
        .filter(|_| ballot.draw(&mut rng).as_deref() == Some("A"))
        .count();
    assert!(a_wins > 0);
    assert!(a_wins < 1_000);
}
