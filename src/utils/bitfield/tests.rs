use crate::utils::bitfield::Bitfield;

#[test]
fn lowest_first() {
    let mut bf = Bitfield::default();
    bf.take(0);
    bf.take(1);
    assert_eq!(bf.acquire(), 2);
    assert_eq!(bf.acquire(), 3);
    assert_eq!(bf.acquire(), 4);
    bf.release(3);
    assert_eq!(bf.acquire(), 3);
    assert_eq!(bf.acquire(), 5);
}

#[test]
fn grows_past_one_segment() {
    let mut bf = Bitfield::default();
    let vals: Vec<_> = (0..200).map(|_| bf.acquire()).collect();
    assert_eq!(vals, (0..200).collect::<Vec<u32>>());
    bf.release(150);
    assert_eq!(bf.acquire(), 150);
}

#[test]
fn release_unknown_value() {
    let mut bf = Bitfield::default();
    bf.release(1000);
    assert_eq!(bf.acquire(), 0);
}
