use crate::proto::Receiver;

#[test]
fn in_order_data_advances_next_expected() {
    let mut r = Receiver::default();
    let a = r.on_data(0);
    assert_eq!((a.ack, a.newly_delivered, a.duplicate), (1, 1, false));
    let b = r.on_data(1);
    assert_eq!((b.ack, b.newly_delivered), (2, 1));
}

#[test]
fn gap_is_buffered_and_filled() {
    let mut r = Receiver::default();
    r.on_data(0);
    let a = r.on_data(2);
    assert_eq!((a.ack, a.newly_delivered, a.duplicate), (1, 0, false));
    let b = r.on_data(3);
    assert_eq!(b.ack, 1);
    assert_eq!(r.buffered(), 2);

    let c = r.on_data(1);
    assert_eq!((c.ack, c.newly_delivered), (4, 3));
    assert_eq!(r.buffered(), 0);
}

#[test]
fn duplicates_re_ack_next_expected() {
    let mut r = Receiver::default();
    r.on_data(0);
    r.on_data(1);
    let d = r.on_data(0);
    assert_eq!((d.ack, d.newly_delivered, d.duplicate), (2, 0, true));
    r.on_data(5);
    let d = r.on_data(5);
    assert!(d.duplicate);
    assert_eq!(d.ack, 2);
}

#[test]
fn next_expected_is_monotonic_for_any_arrival_order() {
    let mut r = Receiver::default();
    let arrivals = [4u64, 0, 0, 2, 7, 1, 3, 3, 6, 5, 9, 8, 2];
    let mut last = 0;
    for seq in arrivals {
        let rc = r.on_data(seq);
        assert!(rc.ack >= last, "ack went backwards at seq {seq}");
        assert_eq!(rc.ack, r.next_expected());
        last = rc.ack;
    }
    assert_eq!(r.next_expected(), 10);
}
