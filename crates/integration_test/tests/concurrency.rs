#![allow(missing_docs)]

use std::{
    sync::{Arc, Barrier},
    thread,
};

use wirepack::Layout;
use wirepack_integration_test::{Telemetry, v3};

const THREADS: usize = 16;

#[test]
fn first_use_races_to_one_layout() {
    let barrier = Arc::new(Barrier::new(THREADS));

    let layouts = (0..THREADS)
        .map(|_| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                Layout::of::<v3::Envelope>().unwrap()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    for layout in &layouts[1..] {
        assert!(Arc::ptr_eq(&layouts[0], layout));
    }
}

#[test]
fn parallel_encode_and_decode() {
    thread::scope(|scope| {
        for worker in 0..THREADS {
            scope.spawn(move || {
                for seed in 0..64 {
                    #[allow(clippy::cast_possible_truncation)]
                    let value = Telemetry::new((worker * 64 + seed) as u32);
                    let bytes = wirepack::serialize(&value).unwrap();

                    assert_eq!(wirepack::deserialize::<Telemetry>(&bytes).unwrap(), value);
                }
            });
        }
    });
}
