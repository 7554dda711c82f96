#![allow(unsafe_code)]

use fanin::{first_successful, just, just_error, sync_wait, when_any};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

struct CountingAllocator;

static ALLOC_COUNT: AtomicU64 = AtomicU64::new(0);
static ALLOC_COUNTING_ENABLED: AtomicBool = AtomicBool::new(false);

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if ALLOC_COUNTING_ENABLED.load(Ordering::Relaxed) {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

// The counter is process-wide, so this file holds a single test.
fn measure_allocs<F: FnOnce()>(f: F) -> u64 {
    ALLOC_COUNTING_ENABLED.store(true, Ordering::SeqCst);
    let before = ALLOC_COUNT.load(Ordering::SeqCst);
    f();
    let after = ALLOC_COUNT.load(Ordering::SeqCst);
    ALLOC_COUNTING_ENABLED.store(false, Ordering::SeqCst);
    after - before
}

fn race_of(children: usize) -> u64 {
    measure_allocs(|| {
        let winner = match children {
            2 => sync_wait::<(i32,), (), _>(when_any((just(1), just(2)))),
            _ => sync_wait::<(i32,), (), _>(when_any((
                just(1),
                just(2),
                just(3),
                just(4),
                just(5),
                just(6),
            ))),
        };
        assert_eq!(winner.ok(), Some(Some((1,))));
    })
}

fn first_successful_of(errors: usize) -> u64 {
    measure_allocs(|| {
        let winner = match errors {
            1 => sync_wait::<(i32,), i32, _>(first_successful((just(1), just_error(2)))),
            _ => sync_wait::<(i32,), i32, _>(first_successful((
                just(1),
                just_error(2),
                just_error(3),
                just_error(4),
                just_error(5),
                just_error(6),
            ))),
        };
        assert_eq!(winner.ok(), Some(Some((1,))));
    })
}

#[test]
fn completions_after_the_decision_do_not_allocate() {
    // The executor and the log callsites set themselves up on first use.
    race_of(2);
    first_successful_of(1);

    assert_eq!(race_of(2), race_of(6));
    assert_eq!(first_successful_of(1), first_successful_of(5));
}
