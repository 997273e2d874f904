use lazy_stream::{
    DoublyLinkedStream, LinearStream, Stream, StreamConfig, StreamError, StreamResult,
    TraversalDirection,
};

fn chain(values: &[i32]) -> DoublyLinkedStream<i32> {
    DoublyLinkedStream::from_iterable(values.to_vec()).unwrap()
}

fn collect<S: LinearStream>(stream: &S) -> Vec<S::Value> {
    stream.iter().collect::<StreamResult<Vec<_>>>().unwrap()
}

fn collect_back(stream: &DoublyLinkedStream<i32>) -> Vec<i32> {
    stream.iter_back().collect::<StreamResult<Vec<_>>>().unwrap()
}

fn assert_round_trips(head: &DoublyLinkedStream<i32>) {
    let mut node = head.clone();
    while let Some(next) = node.next().unwrap() {
        let back = next.previous().unwrap().unwrap();
        assert_eq!(back.value(), node.value());
        node = next;
    }
}

#[test]
fn test_default_has_no_predecessor() {
    let node = DoublyLinkedStream::new(1, || Ok(None));
    assert!(node.previous().unwrap().is_none());
    assert!(node.next().unwrap().is_none());
}

#[test]
fn test_hand_built_links() {
    let first: DoublyLinkedStream<&str> = DoublyLinkedStream::with_previous(
        "first",
        || Ok(Some(DoublyLinkedStream::new("second", || Ok(None)))),
        || Ok(Some(DoublyLinkedStream::new("zeroth", || Ok(None)))),
    );
    assert_eq!(first.next().unwrap().unwrap().value(), "second");
    assert_eq!(first.previous().unwrap().unwrap().value(), "zeroth");
}

#[test]
fn test_round_trip_over_chain() {
    let head = chain(&[1, 2, 3, 4]);
    assert_round_trips(&head);

    let second = head.next().unwrap().unwrap();
    assert!(second.previous().unwrap().unwrap().ptr_eq(&head));
}

#[test]
fn test_round_trip_over_mapped_streams() {
    let left = chain(&[1, 2, 3]);
    let right = chain(&[10, 20, 30]);
    let sums = DoublyLinkedStream::zip_map(|v: &[i32]| v[0] + v[1], &[left, right], true).unwrap();
    assert_eq!(collect(&sums), vec![11, 22, 33]);
    assert_round_trips(&sums);

    let last = sums.starter(2).unwrap();
    assert_eq!(collect_back(&last), vec![33, 22, 11]);
}

#[test]
fn test_zip_map_walks_backwards_from_the_middle() {
    let left = chain(&[1, 2, 3]).starter(1).unwrap();
    let right = chain(&[10, 20, 30]).starter(1).unwrap();
    let products = DoublyLinkedStream::zip_map(|v: &[i32]| v[0] * v[1], &[left, right], false).unwrap();

    assert_eq!(products.value(), 40);
    assert_eq!(products.previous().unwrap().unwrap().value(), 10);
    assert_eq!(products.next().unwrap().unwrap().value(), 90);
    assert!(!products.is_next_resolved());
}

#[test]
fn test_filter_next_direction() {
    let head = chain(&[1, 2, 3, 4, 5, 6]);
    let evens = head.filter(|v| v % 2 == 0).unwrap().unwrap();
    assert_eq!(collect(&evens), vec![2, 4, 6]);
    assert!(evens.previous().unwrap().is_none());
    assert_round_trips(&evens);
}

#[test]
fn test_filter_previous_direction_from_tail() {
    let tail = chain(&[1, 2, 3, 4, 5, 6]).starter(5).unwrap();
    assert_eq!(tail.value(), 6);

    let odd = tail
        .filter_toward(|v| v % 2 == 1, TraversalDirection::Previous)
        .unwrap()
        .unwrap();
    assert_eq!(odd.value(), 5);
    assert!(odd.next().unwrap().is_none());
    assert_eq!(collect_back(&odd), vec![5, 3, 1]);

    let three = odd.previous().unwrap().unwrap();
    assert!(three.next().unwrap().unwrap().ptr_eq(&odd));
}

#[test]
fn test_filter_without_match_in_direction() {
    let head = chain(&[2, 4, 5]);
    let none = head.filter_toward(|v| v % 2 == 1, TraversalDirection::Previous).unwrap();
    assert!(none.is_none());
}

#[test]
fn test_reversed_view() {
    let middle = chain(&[1, 2, 3, 4, 5]).starter(2).unwrap();
    let reversed = middle.reversed();
    assert_eq!(reversed.value(), 3);
    assert_eq!(collect(&reversed), vec![3, 2, 1]);
    assert_eq!(collect(&reversed.reversed()), vec![3, 4, 5]);
    assert_eq!(collect(&middle), vec![3, 4, 5]);

    reversed.set_value(30);
    assert_eq!(middle.value(), 30);
}

#[test]
fn test_reversed_view_round_trips() {
    let tail = chain(&[1, 2, 3]).starter(2).unwrap();
    let reversed = tail.reversed();
    let second = reversed.next().unwrap().unwrap();
    assert_eq!(second.value(), 2);
    assert!(second.previous().unwrap().unwrap().ptr_eq(&reversed));
}

#[test]
fn test_signed_offsets() {
    let node = chain(&[0, 1, 2, 3, 4]).starter(3).unwrap();
    assert_eq!(node.offset(-2).unwrap().value(), 1);
    assert_eq!(node.offset(1).unwrap().value(), 4);
    assert_eq!(node.offset(0).unwrap().value(), 3);
    assert!(matches!(node.offset(-4), Err(StreamError::IndexOutOfRange { index: 4 })));
    assert!(matches!(node.offset(2), Err(StreamError::IndexOutOfRange { index: 2 })));
}

#[test]
fn test_walk_in_both_directions() {
    let head = chain(&[0, 1, 2, 3]);
    let last = head.walk(3, TraversalDirection::Next).unwrap();
    assert_eq!(last.value(), 3);
    assert_eq!(last.walk(3, TraversalDirection::Previous).unwrap().value(), 0);
}

#[test]
fn test_contains_searches_both_ways() {
    let middle = chain(&[1, 2, 3, 4]).starter(2).unwrap();
    assert!(middle.contains(&1).unwrap());
    assert!(middle.contains(&4).unwrap());
    assert!(!middle.contains(&9).unwrap());
}

#[test]
fn test_slicing() {
    let head = chain(&[0, 1, 2, 3, 4, 5]);
    let window = head.slice(1..4, 1).unwrap().unwrap();
    assert_eq!(collect(&window), vec![1, 2, 3]);

    let strided = head.slice(.., 2).unwrap().unwrap();
    assert_eq!(collect(&strided), vec![0, 2, 4]);

    let four = strided.starter(2).unwrap();
    assert_eq!(four.value(), 4);
    assert_eq!(collect_back(&four), vec![4, 2, 0]);
}

#[test]
fn test_window_steps_back_past_its_start() {
    let head = chain(&[0, 1, 2, 3, 4, 5]);
    let window = head.slice(2..4, 1).unwrap().unwrap();
    let before = window.previous().unwrap().unwrap();
    assert_eq!(before.value(), 1);
    assert_eq!(collect(&before), vec![1, 2, 3]);
}

#[test]
fn test_unmemoized_chain_round_trips_by_value() {
    let head = DoublyLinkedStream::from_iterator(vec![1, 2, 3].into_iter(), false).unwrap();
    assert!(!head.does_memoize());
    assert_round_trips(&head);
    assert_eq!(collect(&head), vec![1, 2, 3]);
    assert_eq!(collect(&head), vec![1, 2, 3]);
}

#[test]
fn test_debug_representation() {
    let head = chain(&[1]);
    let repr = format!("{:?}", head);
    assert!(repr.starts_with("DoublyLinkedStream { value: 1, next_thunk: "));
    assert!(repr.contains("previous_thunk: "));
    assert!(repr.ends_with("does_memoize: true }"));
}

#[test]
fn test_unmemoized_combinators() {
    let head =
        DoublyLinkedStream::from_iterable_with_config(1..=6, StreamConfig::non_memoizing()).unwrap();

    let evens = head.filter(|v| v % 2 == 0).unwrap().unwrap();
    assert!(!evens.does_memoize());
    assert_eq!(collect(&evens), vec![2, 4, 6]);
    assert_round_trips(&evens);
    assert!(!evens.is_next_resolved());

    let tail = head.starter(5).unwrap();
    let odd = tail
        .filter_toward(|v| v % 2 == 1, TraversalDirection::Previous)
        .unwrap()
        .unwrap();
    assert_eq!(collect_back(&odd), vec![5, 3, 1]);

    let middle = head.starter(2).unwrap();
    assert_eq!(collect(&middle.reversed()), vec![3, 2, 1]);
    assert!(middle.contains(&1).unwrap());
    assert!(middle.contains(&6).unwrap());
    assert!(!middle.contains(&7).unwrap());

    let strided = head.slice(1..6, 2).unwrap().unwrap();
    assert!(!strided.does_memoize());
    assert_eq!(collect(&strided), vec![2, 4, 6]);
    assert_eq!(collect_back(&strided.starter(2).unwrap()), vec![6, 4, 2]);

    let window = head.slice(2..4, 1).unwrap().unwrap();
    assert_eq!(collect(&window), vec![3, 4]);
    assert_eq!(collect(&window.previous().unwrap().unwrap()), vec![2, 3, 4]);
}

#[test]
fn test_positional_views_share_payload() {
    let head = chain(&[1, 2, 3, 4]);

    let window = head.slice(1..3, 1).unwrap().unwrap();
    window.set_value(20);
    assert_eq!(head.get(1).unwrap(), 20);

    let evens = head.filter(|v| v % 2 == 0).unwrap().unwrap();
    evens.set_value(21);
    assert_eq!(head.get(1).unwrap(), 21);

    let mapped = head.map(|v| *v);
    mapped.set_value(100);
    assert_eq!(head.value(), 1);
}

#[test]
fn test_dropped_head_is_rebuilt_on_the_way_back() {
    let tail = chain(&[1, 2, 3, 4]).starter(3).unwrap();
    assert_eq!(collect_back(&tail), vec![4, 3, 2, 1]);

    let third = tail.previous().unwrap().unwrap();
    assert!(third.next().unwrap().unwrap().ptr_eq(&tail));
}

#[test]
fn test_long_chain_drops() {
    let head = DoublyLinkedStream::from_iterable(0..100_000u64).unwrap();
    let last = head.starter(99_999).unwrap();
    assert_eq!(last.value(), 99_999);
    assert_eq!(last.offset(-10).unwrap().value(), 99_989);
    drop(last);
    drop(head);
}
