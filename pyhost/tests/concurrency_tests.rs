//! Many host threads calling into one interpreter

use pyhost::{load_module, Value};
use std::sync::{Arc, Barrier};
use std::thread;

fn as_f64(v: &Value) -> f64 {
    v.as_float().unwrap()
}

#[test]
fn calls_from_many_threads_are_serialized() {
    const THREADS: usize = 8;
    const CALLS: usize = 5;

    pyhost::append_sys_path([concat!(env!("CARGO_MANIFEST_DIR"), "/tests/python")]).unwrap();
    let module = Arc::new(load_module("pyhost_concurrency").unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let module = Arc::clone(&module);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..CALLS)
                    .map(|i| {
                        let tag = Value::Int((t * CALLS + i) as i64);
                        module.call("enter_and_leave", &[tag]).unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut windows = Vec::new();
    let mut idents = Vec::new();
    for h in handles {
        for result in h.join().unwrap() {
            let parts = result.as_array().unwrap();
            windows.push((as_f64(&parts[0]), as_f64(&parts[1])));
            idents.push(parts[2].as_int().unwrap());
        }
    }
    assert_eq!(windows.len(), THREADS * CALLS);

    windows.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in windows.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "overlapping calls: {:?}", pair);
    }

    idents.dedup();
    assert_eq!(idents.len(), 1, "python ran on more than one thread");

    let count = module.call("call_count", &[]).unwrap();
    assert_eq!(count, Value::Int((THREADS * CALLS) as i64));
}

#[test]
fn concurrent_release_of_shared_objects() {
    let module = load_module("json").unwrap();
    let mut objects: Vec<_> = (0..16)
        .map(|_| module.object().clone_ref().unwrap())
        .collect();

    thread::scope(|s| {
        for obj in objects.iter_mut() {
            s.spawn(move || {
                obj.release().unwrap();
                obj.release().unwrap();
            });
        }
    });
    assert!(objects.iter().all(|o| o.is_null()));

    // The module's own reference is untouched.
    let out = module.call("dumps", &[Value::Int(1)]).unwrap();
    assert_eq!(out, Value::from("1"));
}
