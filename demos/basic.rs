use lazy_stream::{LinearStream, SinglyLinkedStream, Slot, StreamResult};

fn main() -> StreamResult<()> {
    // A stream whose successor is itself
    let ones = Slot::tie(|ones| SinglyLinkedStream::new(1u64, move || ones.get().map(Some)));
    println!("Stream of ones:");
    println!("{:?}", prefix(&ones, 10)?);
    println!();

    // Each natural number is the previous one plus one
    let ints = Slot::tie(|ints| {
        let ones = ones.clone();
        SinglyLinkedStream::new(1u64, move || {
            let sum = SinglyLinkedStream::zip_map(
                |values: &[u64]| values[0] + values[1],
                &[ones.clone(), ints.get()?],
                true,
            )?;
            Ok(Some(sum))
        })
    });
    println!("{:?}", ints);
    println!("Stream of natural numbers:");
    println!("{:?}", prefix(&ints, 10)?);

    Ok(())
}

fn prefix<S: LinearStream>(stream: &S, n: usize) -> StreamResult<Vec<S::Value>> {
    match stream.slice(..n, 1)? {
        Some(window) => window.iter().collect(),
        None => Ok(Vec::new()),
    }
}
