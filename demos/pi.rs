use lazy_stream::{LinearStream, SinglyLinkedStream, Slot, Stream, StreamResult};

type Floats = SinglyLinkedStream<f64>;

fn main() -> StreamResult<()> {
    let numerators = Slot::tie(|numerators| {
        SinglyLinkedStream::new(4.0, move || {
            let numerators = numerators.clone();
            Ok(Some(SinglyLinkedStream::new(-4.0, move || {
                numerators.get().map(Some)
            })))
        })
    });
    let denominators = Slot::tie(|denominators: Slot<Floats>| {
        SinglyLinkedStream::new(1.0, move || {
            Ok(Some(denominators.get()?.map(|x: &f64| x + 2.0)))
        })
    });

    let leibniz = SinglyLinkedStream::zip_map(
        |values: &[f64]| values[0] / values[1],
        &[numerators, denominators],
        true,
    )?;
    println!("The Leibniz sequence:");
    println!("{:?}", prefix(&leibniz, 10)?);
    println!();

    let partial_sums = Slot::tie(|sums| {
        let terms = leibniz.clone();
        SinglyLinkedStream::new(leibniz.value(), move || {
            let rest = terms.next()?.ok_or("the Leibniz sequence is infinite")?;
            let sums = SinglyLinkedStream::zip_map(
                |values: &[f64]| values[0] + values[1],
                &[rest, sums.get()?],
                true,
            )?;
            Ok(Some(sums))
        })
    });
    println!("The partial sums of the Leibniz sequence:");
    println!("{:?}", prefix(&partial_sums, 10)?);
    println!();

    let transformation = shanks_transformation(&partial_sums)?;
    println!("The Shanks transformation of the partial sums of the Leibniz sequence:");
    println!("{:?}", prefix(&transformation, 10)?);
    println!();

    let tableau = make_tableau(partial_sums);
    println!(
        "The tableau of successive Shanks transformations of the partial sums \
         of the Leibniz sequence:"
    );
    for row in prefix(&tableau, 10)? {
        println!("{:?}", row);
    }
    println!();

    let acceleration = tableau.map(|row: &Floats| row.value());
    println!(
        "The first value of each stream in the tableau of successive Shanks \
         transformations of the partial sums of the Leibniz sequence:"
    );
    println!("{:?}", prefix(&acceleration, 10)?);
    println!();

    println!("The value of the Leibniz series:");
    println!("{}", acceleration.get(59)?);
    println!();

    println!("The value of pi that is provided by std::f64::consts::PI:");
    println!("{}", std::f64::consts::PI);

    Ok(())
}

/// Accelerates a converging alternating series
fn shanks_transformation(stream: &Floats) -> StreamResult<Floats> {
    let s0 = stream.value();
    let s1 = stream.get(1)?;
    let s2 = stream.get(2)?;
    let denominator = s0 - s1 - (s1 - s2);

    let value = if denominator == 0.0 {
        s1
    } else {
        s2 - (s2 - s1).powi(2) / denominator
    };

    let stream = stream.clone();
    Ok(SinglyLinkedStream::new(value, move || {
        let next = stream.next()?.ok_or("the partial sums are infinite")?;
        shanks_transformation(&next).map(Some)
    }))
}

/// Stream of streams, each the Shanks transformation of the one before
fn make_tableau(stream: Floats) -> SinglyLinkedStream<Floats> {
    let first = stream.clone();
    SinglyLinkedStream::new(first, move || {
        Ok(Some(make_tableau(shanks_transformation(&stream)?)))
    })
}

fn prefix<S: LinearStream>(stream: &S, n: usize) -> StreamResult<Vec<S::Value>> {
    match stream.slice(..n, 1)? {
        Some(window) => window.iter().collect(),
        None => Ok(Vec::new()),
    }
}
