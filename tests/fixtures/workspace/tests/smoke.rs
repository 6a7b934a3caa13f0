#[test]
fn doubles() {
    assert_eq!(sample::compute(3), 6);
}
