use lazy_stream::{
    DoublyLinkedStream, LinearStream, SinglyLinkedStream, Slot, Stream, StreamError, StreamResult,
};
use std::cell::Cell;
use std::rc::Rc;

fn finite(values: &[i32]) -> SinglyLinkedStream<i32> {
    SinglyLinkedStream::from_iterable(values.to_vec()).unwrap()
}

#[test]
fn test_failed_thunk_is_not_cached() {
    let attempts = Rc::new(Cell::new(0));
    let counter = Rc::clone(&attempts);
    let stream = SinglyLinkedStream::new(0, move || {
        counter.set(counter.get() + 1);
        if counter.get() == 1 {
            return Err(StreamError::from("transient failure"));
        }
        Ok(Some(SinglyLinkedStream::new(1, || Ok(None))))
    });

    let first = stream.next();
    assert!(matches!(first, Err(StreamError::Custom(ref msg)) if msg == "transient failure"));
    assert!(!stream.is_next_resolved());

    let second = stream.next().unwrap().unwrap();
    assert_eq!(second.value(), 1);
    assert!(stream.is_next_resolved());

    let third = stream.next().unwrap().unwrap();
    assert!(third.ptr_eq(&second));
    assert_eq!(attempts.get(), 2);
}

#[test]
fn test_iteration_stops_at_first_error() {
    let stream = SinglyLinkedStream::new(1, || {
        Ok(Some(SinglyLinkedStream::new(2, || Err(StreamError::Custom("boom".to_string())))))
    });

    let values: Vec<StreamResult<i32>> = stream.iter().collect();
    assert_eq!(
        values,
        vec![Ok(1), Ok(2), Err(StreamError::Custom("boom".to_string()))]
    );

    let collected: StreamResult<Vec<i32>> = stream.iter().collect();
    assert!(collected.is_err());
}

#[test]
fn test_error_surfaces_through_combinators() {
    let stream = SinglyLinkedStream::new(1, || Err(StreamError::from("no successor")));

    let mapped = stream.map(|v| v * 10);
    assert_eq!(mapped.value(), 10);
    assert!(mapped.next().is_err());

    let filtered = stream.filter(|v| *v > 1);
    assert!(matches!(filtered, Err(StreamError::Custom(_))));

    assert!(stream.contains(&5).is_err());
    assert!(stream.get(1).is_err());
}

#[test]
fn test_try_zip_map_fails_where_forced() {
    let stream = finite(&[1, 2, 0, 4]);
    let inverses = SinglyLinkedStream::try_zip_map(
        |v: &[i32]| {
            if v[0] == 0 {
                Err(StreamError::from("division by zero"))
            } else {
                Ok(12 / v[0])
            }
        },
        &[stream],
        true,
    )
    .unwrap();

    assert_eq!(inverses.value(), 12);
    assert_eq!(inverses.get(1).unwrap(), 6);
    assert!(matches!(inverses.get(2), Err(StreamError::Custom(_))));
}

#[test]
fn test_try_zip_map_fails_eagerly_on_head() {
    let stream = finite(&[0]);
    let result = SinglyLinkedStream::try_zip_map(
        |_: &[i32]| -> StreamResult<i32> { Err(StreamError::from("bad head")) },
        &[stream],
        true,
    );
    assert!(result.is_err());
}

#[test]
fn test_zip_map_without_inputs() {
    let result = SinglyLinkedStream::<i32>::zip_map(|v: &[i32]| v.len(), &[], true);
    assert!(matches!(result, Err(StreamError::NoInputs)));

    let result = DoublyLinkedStream::<i32>::zip_map(|v: &[i32]| v.len(), &[], true);
    assert!(matches!(result, Err(StreamError::NoInputs)));
}

#[test]
fn test_zero_step_is_rejected() {
    let stream = finite(&[1, 2, 3]);
    assert!(matches!(stream.slice(.., 0), Err(StreamError::InvalidStep { step: 0 })));
}

#[test]
fn test_index_out_of_range() {
    let stream = finite(&[1, 2, 3]);
    assert!(matches!(stream.get(3), Err(StreamError::IndexOutOfRange { index: 3 })));
    assert!(matches!(stream.starter(10), Err(StreamError::IndexOutOfRange { index: 10 })));
}

#[test]
fn test_unbound_slot() {
    let slot: Slot<SinglyLinkedStream<i32>> = Slot::new();
    let reader = slot.clone();
    let stream = SinglyLinkedStream::new(0, move || reader.get().map(Some));

    assert!(matches!(stream.next(), Err(StreamError::UnboundCell)));
    assert!(!stream.is_next_resolved());

    assert!(slot.bind(stream.clone()).is_ok());
    assert!(stream.next().unwrap().unwrap().ptr_eq(&stream));
}

#[test]
fn test_error_messages() {
    assert_eq!(
        StreamError::IndexOutOfRange { index: 4 }.to_string(),
        "node index out of range: 4"
    );
    assert_eq!(
        StreamError::InvalidStep { step: 0 }.to_string(),
        "step must be a positive integer, not 0"
    );
    assert_eq!(StreamError::from("oops").to_string(), "Stream error: oops");
}

#[test]
fn test_doubly_try_zip_map_fails_where_forced() {
    let middle = DoublyLinkedStream::from_iterable(vec![0, 2, 4])
        .unwrap()
        .starter(1)
        .unwrap();
    let halves = DoublyLinkedStream::try_zip_map(
        |v: &[i32]| {
            if v[0] == 0 {
                Err(StreamError::from("zero has no half here"))
            } else {
                Ok(v[0] / 2)
            }
        },
        &[middle],
        true,
    )
    .unwrap();

    assert_eq!(halves.value(), 1);
    assert_eq!(halves.next().unwrap().unwrap().value(), 2);
    assert!(matches!(halves.previous(), Err(StreamError::Custom(_))));
    assert!(!halves.is_previous_resolved());

    let backwards: StreamResult<Vec<i32>> = halves.iter_back().collect();
    assert!(backwards.is_err());
}
