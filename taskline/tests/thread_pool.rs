use taskline::callback::bind_once;
use taskline::runtime::{NoopObserver, TaskInfo, TaskObserver};
use taskline::sync::{ScopedSignaller, WaitableEvent};
use taskline::{Error, TaskRunner, ThreadPool, from_here};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

fn started_pool(workers: usize) -> ThreadPool {
    let mut pool = ThreadPool::builder()
        .worker_count(workers)
        .thread_name("test-pool")
        .observer(Arc::new(NoopObserver))
        .build();
    pool.start().unwrap();
    pool
}

/// Shares one signaller between tasks; the event fires once the last of
/// them is gone.
fn completion(event: &Arc<WaitableEvent>) -> Arc<ScopedSignaller> {
    Arc::new(ScopedSignaller::new(event))
}

#[test]
fn sequenced_runner_preserves_post_order() {
    let pool = started_pool(4);
    let sequence = pool.create_sequenced_task_runner();

    let order = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(WaitableEvent::new());
    {
        let all_done = completion(&done);
        for i in 0..200 {
            let order = order.clone();
            let all_done = all_done.clone();
            assert!(sequence.post_task(
                from_here!(),
                bind_once(
                    move || {
                        order.lock().unwrap().push(i);
                        drop(all_done);
                    },
                    (),
                ),
            ));
        }
    }

    done.wait();
    assert_eq!(*order.lock().unwrap(), (0..200).collect::<Vec<_>>());
}

#[test]
fn sequenced_tasks_never_overlap() {
    let pool = started_pool(4);
    let done = Arc::new(WaitableEvent::new());
    let violations = Arc::new(AtomicUsize::new(0));

    let sequences: Vec<_> = (0..3).map(|_| pool.create_sequenced_task_runner()).collect();
    {
        let all_done = completion(&done);
        for sequence in &sequences {
            let in_flight = Arc::new(AtomicBool::new(false));
            for _ in 0..30 {
                let in_flight = in_flight.clone();
                let violations = violations.clone();
                let all_done = all_done.clone();
                sequence.post_task(
                    from_here!(),
                    bind_once(
                        move || {
                            if in_flight.swap(true, Ordering::SeqCst) {
                                violations.fetch_add(1, Ordering::SeqCst);
                            }
                            thread::sleep(Duration::from_micros(200));
                            in_flight.store(false, Ordering::SeqCst);
                            drop(all_done);
                        },
                        (),
                    ),
                );
            }
        }
    }

    done.wait();
    assert_eq!(violations.load(Ordering::SeqCst), 0);
}

#[test]
fn sequenced_runner_knows_its_sequence() {
    let pool = started_pool(2);
    let first = pool.create_sequenced_task_runner();
    let second = pool.create_sequenced_task_runner();
    assert!(!first.runs_tasks_in_current_sequence());

    let seen = Arc::new(Mutex::new(None));
    let done = Arc::new(WaitableEvent::new());
    {
        let (this_runner, other, seen) = (first.clone(), second.clone(), seen.clone());
        first.post_task(
            from_here!(),
            bind_once(
                move |_done: ScopedSignaller| {
                    *seen.lock().unwrap() = Some((
                        this_runner.runs_tasks_in_current_sequence(),
                        other.runs_tasks_in_current_sequence(),
                    ));
                },
                (ScopedSignaller::new(&done),),
            ),
        );
    }

    done.wait();
    assert_eq!(*seen.lock().unwrap(), Some((true, false)));
}

#[test]
fn single_thread_runner_stays_on_one_thread() {
    let pool = started_pool(4);
    let pinned = pool.create_single_thread_task_runner();

    let threads = Arc::new(Mutex::new(Vec::<ThreadId>::new()));
    let in_sequence = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(WaitableEvent::new());
    {
        let all_done = completion(&done);
        for _ in 0..50 {
            let threads = threads.clone();
            let in_sequence = in_sequence.clone();
            let this_runner = pinned.clone();
            let all_done = all_done.clone();
            pinned.post_task(
                from_here!(),
                bind_once(
                    move || {
                        threads.lock().unwrap().push(thread::current().id());
                        if this_runner.runs_tasks_in_current_sequence() {
                            in_sequence.fetch_add(1, Ordering::SeqCst);
                        }
                        drop(all_done);
                    },
                    (),
                ),
            );
        }
    }

    done.wait();

    let threads = threads.lock().unwrap();
    assert_eq!(threads.len(), 50);
    assert!(threads.iter().all(|id| *id == threads[0]));
    assert_eq!(in_sequence.load(Ordering::SeqCst), 50);
}

#[test]
fn runners_pinned_to_the_same_worker_share_its_sequence() {
    let pool = started_pool(1);
    let first = pool.create_single_thread_task_runner();
    let second = pool.create_single_thread_task_runner();

    let shared = Arc::new(AtomicBool::new(false));
    let done = Arc::new(WaitableEvent::new());
    {
        let (shared, second) = (shared.clone(), second.clone());
        first.post_task(
            from_here!(),
            bind_once(
                move |_done: ScopedSignaller| {
                    shared.store(second.runs_tasks_in_current_sequence(), Ordering::SeqCst)
                },
                (ScopedSignaller::new(&done),),
            ),
        );
    }

    done.wait();
    assert!(shared.load(Ordering::SeqCst));
}

#[test]
fn unsequenced_runner_runs_everything() {
    let pool = started_pool(4);
    let runner = pool.get_task_runner();

    let sum = Arc::new(AtomicUsize::new(0));
    let threads = Arc::new(Mutex::new(HashSet::<ThreadId>::new()));
    let done = Arc::new(WaitableEvent::new());
    {
        let all_done = completion(&done);
        for i in 1..=100 {
            let sum = sum.clone();
            let threads = threads.clone();
            let all_done = all_done.clone();
            runner.post_task(
                from_here!(),
                bind_once(
                    move || {
                        sum.fetch_add(i, Ordering::SeqCst);
                        threads.lock().unwrap().insert(thread::current().id());
                        drop(all_done);
                    },
                    (),
                ),
            );
        }
    }

    done.wait();
    assert_eq!(sum.load(Ordering::SeqCst), 5050);
    assert!(!threads.lock().unwrap().contains(&thread::current().id()));
}

#[test]
fn delayed_pool_tasks_run_after_immediate_ones() {
    let pool = started_pool(1);
    let runner = pool.get_task_runner();

    let order = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(WaitableEvent::new());
    {
        let order = order.clone();
        runner.post_delayed_task(
            from_here!(),
            bind_once(
                move |_done: ScopedSignaller| order.lock().unwrap().push("delayed"),
                (ScopedSignaller::new(&done),),
            ),
            Duration::from_millis(50),
        );
    }
    {
        let order = order.clone();
        runner.post_task(
            from_here!(),
            bind_once(move || order.lock().unwrap().push("immediate"), ()),
        );
    }

    done.wait();
    assert_eq!(*order.lock().unwrap(), vec!["immediate", "delayed"]);
}

#[test]
fn work_posted_before_start_runs_after_start() {
    let mut pool = ThreadPool::new(2);
    let sequence = pool.create_sequenced_task_runner();

    let done = Arc::new(WaitableEvent::new());
    assert!(sequence.post_task(
        from_here!(),
        bind_once(|_done: ScopedSignaller| {}, (ScopedSignaller::new(&done),)),
    ));

    assert!(!done.timed_wait(Duration::from_millis(20)));
    pool.start().unwrap();
    done.wait();
}

#[test]
fn dropped_sequenced_runner_still_drains() {
    let pool = started_pool(2);
    let ran = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(WaitableEvent::new());

    {
        let sequence = pool.create_sequenced_task_runner();
        let all_done = completion(&done);
        for _ in 0..10 {
            let ran = ran.clone();
            let all_done = all_done.clone();
            sequence.post_task(
                from_here!(),
                bind_once(
                    move || {
                        ran.fetch_add(1, Ordering::SeqCst);
                        drop(all_done);
                    },
                    (),
                ),
            );
        }
    }

    done.wait();
    assert_eq!(ran.load(Ordering::SeqCst), 10);
}

fn post_far_future<R: TaskRunner + ?Sized>(
    runner: &R,
    ran: &Arc<AtomicUsize>,
    all_dropped: &Arc<ScopedSignaller>,
) -> bool {
    let ran = ran.clone();
    let all_dropped = all_dropped.clone();
    runner.post_delayed_task(
        from_here!(),
        bind_once(
            move || {
                ran.fetch_add(1, Ordering::SeqCst);
                drop(all_dropped);
            },
            (),
        ),
        Duration::from_secs(60),
    )
}

fn accepts_posts<R: TaskRunner + ?Sized>(runner: &R) -> bool {
    runner.post_task(from_here!(), bind_once(|| {}, ()))
}

#[test]
fn stop_discards_pending_work_and_rejects_posts() {
    let mut pool = started_pool(2);
    let parallel = pool.get_task_runner();
    let sequenced = pool.create_sequenced_task_runner();
    let pinned = pool.create_single_thread_task_runner();

    let ran = Arc::new(AtomicUsize::new(0));
    let dropped = Arc::new(WaitableEvent::new());
    {
        let all_dropped = completion(&dropped);
        assert!(post_far_future(parallel.as_ref(), &ran, &all_dropped));
        assert!(post_far_future(sequenced.as_ref(), &ran, &all_dropped));
        assert!(post_far_future(pinned.as_ref(), &ran, &all_dropped));
    }

    pool.stop();
    pool.stop();

    assert!(!pool.is_running());
    assert!(dropped.is_signaled());
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    assert!(!accepts_posts(parallel.as_ref()));
    assert!(!accepts_posts(sequenced.as_ref()));
    assert!(!accepts_posts(pinned.as_ref()));
    assert!(!accepts_posts(pool.create_sequenced_task_runner().as_ref()));
}

#[test]
fn stopped_pool_cannot_restart() {
    let mut pool = started_pool(1);
    assert!(matches!(pool.start(), Err(Error::AlreadyRunning(_))));

    pool.stop();
    assert!(matches!(pool.start(), Err(Error::PoolStopped)));
}

#[derive(Default)]
struct CountingObserver {
    before: AtomicUsize,
    after: AtomicUsize,
}

impl TaskObserver for CountingObserver {
    fn will_run_task(&self, _task: &TaskInfo) {
        self.before.fetch_add(1, Ordering::SeqCst);
    }

    fn did_run_task(&self, _task: &TaskInfo, _elapsed: Duration) {
        self.after.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn observer_sees_every_task() {
    let observer = Arc::new(CountingObserver::default());
    let mut pool = ThreadPool::builder()
        .worker_count(2)
        .observer(observer.clone())
        .build();
    pool.start().unwrap();

    let sequence = pool.create_sequenced_task_runner();
    for _ in 0..9 {
        sequence.post_task(from_here!(), bind_once(|| {}, ()));
    }
    let done = Arc::new(WaitableEvent::new());
    sequence.post_task(
        from_here!(),
        bind_once(|_done: ScopedSignaller| {}, (ScopedSignaller::new(&done),)),
    );

    done.wait();
    pool.stop();

    assert_eq!(observer.before.load(Ordering::SeqCst), 10);
    assert_eq!(observer.after.load(Ordering::SeqCst), 10);
}

#[test]
fn builder_configures_worker_count() {
    let pool = ThreadPool::builder().worker_count(3).build();
    assert_eq!(pool.worker_count(), 3);
    assert!(!pool.is_running());
}

#[test]
#[should_panic(expected = "worker_count must be > 0")]
fn zero_workers_panics() {
    let _ = ThreadPool::new(0);
}

#[test]
fn huge_delay_is_accepted_and_discarded_on_stop() {
    let mut pool = started_pool(1);
    let sequenced = pool.create_sequenced_task_runner();

    let ran = Arc::new(AtomicUsize::new(0));
    let dropped = Arc::new(WaitableEvent::new());
    {
        let all_dropped = completion(&dropped);
        let ran = ran.clone();
        assert!(sequenced.post_delayed_task(
            from_here!(),
            bind_once(
                move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                    drop(all_dropped);
                },
                (),
            ),
            Duration::MAX,
        ));
    }

    let next = Arc::new(WaitableEvent::new());
    sequenced.post_task(
        from_here!(),
        bind_once(|_next: ScopedSignaller| {}, (ScopedSignaller::new(&next),)),
    );
    assert!(next.timed_wait(Duration::from_secs(5)));

    pool.stop();

    assert!(dropped.is_signaled());
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

/// Posts a panicking task and then a regular one through `runner`.
///
/// Returns `true` if the regular task ran.
fn survives_a_panicking_task<R: TaskRunner + ?Sized>(runner: &R) -> bool {
    assert!(runner.post_task(
        from_here!(),
        bind_once(|| panic!("task failed on purpose"), ()),
    ));

    let ran = Arc::new(AtomicBool::new(false));
    let done = Arc::new(WaitableEvent::new());
    {
        let ran = ran.clone();
        assert!(runner.post_task(
            from_here!(),
            bind_once(
                move |_done: ScopedSignaller| ran.store(true, Ordering::SeqCst),
                (ScopedSignaller::new(&done),),
            ),
        ));
    }

    done.timed_wait(Duration::from_secs(5)) && ran.load(Ordering::SeqCst)
}

#[test]
fn panicking_task_keeps_the_worker_serving_every_runner() {
    // One worker: any runner kind that lost it would never run again.
    let pool = started_pool(1);

    assert!(survives_a_panicking_task(pool.create_single_thread_task_runner().as_ref()));
    assert!(survives_a_panicking_task(pool.create_sequenced_task_runner().as_ref()));
    assert!(survives_a_panicking_task(pool.get_task_runner().as_ref()));
    assert!(pool.is_running());
}
