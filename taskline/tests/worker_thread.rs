use taskline::callback::bind_once;
use taskline::runtime::NoopObserver;
use taskline::sync::{ScopedSignaller, WaitableEvent};
use taskline::{Error, WorkerThread, from_here};

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

fn started_worker() -> WorkerThread {
    let mut worker = WorkerThread::builder()
        .name("test-worker")
        .observer(Arc::new(NoopObserver))
        .build();
    worker.start().unwrap();
    worker
}

#[test]
fn tasks_run_in_post_order_on_the_worker() {
    let worker = started_worker();
    let runner = worker.task_runner().unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    let threads = Arc::new(Mutex::new(Vec::<ThreadId>::new()));

    for i in 0..20 {
        let order = order.clone();
        let threads = threads.clone();
        assert!(runner.post_task(
            from_here!(),
            bind_once(
                move || {
                    order.lock().unwrap().push(i);
                    threads.lock().unwrap().push(thread::current().id());
                },
                (),
            ),
        ));
    }

    worker.flush_for_testing();

    assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());

    let threads = threads.lock().unwrap();
    assert!(threads.iter().all(|id| *id == threads[0]));
    assert_ne!(threads[0], thread::current().id());
}

#[test]
fn runs_tasks_in_current_sequence_only_inside_tasks() {
    let worker = started_worker();
    let runner = worker.task_runner().unwrap();
    assert!(!runner.runs_tasks_in_current_sequence());

    let inside = Arc::new(AtomicBool::new(false));
    {
        let runner = runner.clone();
        let inside = inside.clone();
        runner.clone().post_task(
            from_here!(),
            bind_once(
                move || inside.store(runner.runs_tasks_in_current_sequence(), Ordering::SeqCst),
                (),
            ),
        );
    }

    worker.flush_for_testing();
    assert!(inside.load(Ordering::SeqCst));
}

#[test]
fn delayed_tasks_run_by_deadline() {
    let worker = started_worker();
    let runner = worker.task_runner().unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(WaitableEvent::new());

    let record = |label: &'static str| {
        let order = order.clone();
        bind_once(move || order.lock().unwrap().push(label), ())
    };

    {
        let order = order.clone();
        runner.post_delayed_task(
            from_here!(),
            bind_once(
                move |_finished: ScopedSignaller| order.lock().unwrap().push("300ms"),
                (ScopedSignaller::new(&finished),),
            ),
            Duration::from_millis(300),
        );
    }
    runner.post_task(from_here!(), record("immediate"));
    runner.post_delayed_task(from_here!(), record("100ms"), Duration::from_millis(100));

    finished.wait();
    assert_eq!(*order.lock().unwrap(), vec!["immediate", "100ms", "300ms"]);
}

#[test]
fn delay_is_a_lower_bound() {
    let worker = started_worker();
    let runner = worker.task_runner().unwrap();

    let delay = Duration::from_millis(50);
    let ran_at = Arc::new(Mutex::new(None));

    let posted_at = Instant::now();
    {
        let ran_at = ran_at.clone();
        runner.post_delayed_task(
            from_here!(),
            bind_once(move || *ran_at.lock().unwrap() = Some(Instant::now()), ()),
            delay,
        );
    }

    worker.flush_for_testing();

    let ran_at = ran_at.lock().unwrap().expect("delayed task did not run");
    assert!(ran_at.duration_since(posted_at) >= delay);
}

#[test]
fn zero_delay_behaves_like_post_task() {
    let worker = started_worker();
    let runner = worker.task_runner().unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..3 {
        let order = order.clone();
        let task = bind_once(move || order.lock().unwrap().push(i), ());
        if i % 2 == 0 {
            runner.post_delayed_task(from_here!(), task, Duration::ZERO);
        } else {
            runner.post_task(from_here!(), task);
        }
    }

    worker.flush_for_testing();
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn flush_waits_for_delayed_tasks() {
    let worker = started_worker();
    let runner = worker.task_runner().unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    {
        let ran = ran.clone();
        runner.post_delayed_task(
            from_here!(),
            bind_once(move || ran.store(true, Ordering::SeqCst), ()),
            Duration::from_millis(50),
        );
    }

    worker.flush_for_testing();
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn stop_discards_queued_tasks_and_rejects_new_ones() {
    let mut worker = started_worker();
    let runner = worker.task_runner().unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    let dropped = Arc::new(WaitableEvent::new());
    {
        let ran = ran.clone();
        assert!(runner.post_delayed_task(
            from_here!(),
            bind_once(
                move |_dropped: ScopedSignaller| ran.store(true, Ordering::SeqCst),
                (ScopedSignaller::new(&dropped),),
            ),
            Duration::from_secs(60),
        ));
    }

    worker.stop();

    assert!(!worker.is_running());
    assert!(worker.task_runner().is_none());
    assert!(dropped.is_signaled());
    assert!(!ran.load(Ordering::SeqCst));

    let rejected = Arc::new(WaitableEvent::new());
    assert!(!runner.post_task(
        from_here!(),
        bind_once(|_rejected: ScopedSignaller| {}, (ScopedSignaller::new(&rejected),)),
    ));
    assert!(rejected.is_signaled());
}

#[test]
fn stop_lets_the_running_task_finish() {
    let mut worker = started_worker();
    let runner = worker.task_runner().unwrap();

    let started = Arc::new(WaitableEvent::new());
    let finished = Arc::new(AtomicBool::new(false));
    {
        let started = started.clone();
        let finished = finished.clone();
        runner.post_task(
            from_here!(),
            bind_once(
                move || {
                    started.signal();
                    thread::sleep(Duration::from_millis(50));
                    finished.store(true, Ordering::SeqCst);
                },
                (),
            ),
        );
    }

    started.wait();
    worker.stop();

    assert!(finished.load(Ordering::SeqCst));
}

#[test]
fn restarted_worker_uses_a_new_runner() {
    let mut worker = started_worker();
    let old_runner = worker.task_runner().unwrap();
    let old_sequence = worker.sequence_id().unwrap();

    worker.stop();
    worker.start().unwrap();

    assert_ne!(worker.sequence_id().unwrap(), old_sequence);
    assert!(!old_runner.post_task(from_here!(), bind_once(|| {}, ())));

    let ran = Arc::new(AtomicBool::new(false));
    {
        let ran = ran.clone();
        assert!(worker.task_runner().unwrap().post_task(
            from_here!(),
            bind_once(move || ran.store(true, Ordering::SeqCst), ()),
        ));
    }
    worker.flush_for_testing();
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn start_while_running_is_an_error() {
    let mut worker = started_worker();
    assert!(matches!(worker.start(), Err(Error::AlreadyRunning(_))));
}

#[test]
fn dropping_the_worker_stops_it() {
    let worker = started_worker();
    let runner = worker.task_runner().unwrap();

    drop(worker);
    assert!(!runner.post_task(from_here!(), bind_once(|| {}, ())));
}

#[test]
fn huge_delay_is_accepted_and_discarded_on_stop() {
    let mut worker = started_worker();
    let runner = worker.task_runner().unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    let dropped = Arc::new(WaitableEvent::new());
    {
        let ran = ran.clone();
        assert!(runner.post_delayed_task(
            from_here!(),
            bind_once(
                move |_dropped: ScopedSignaller| ran.store(true, Ordering::SeqCst),
                (ScopedSignaller::new(&dropped),),
            ),
            Duration::MAX,
        ));
    }

    // The far-future task must not hold back work posted after it.
    let next = Arc::new(WaitableEvent::new());
    runner.post_task(
        from_here!(),
        bind_once(|_next: ScopedSignaller| {}, (ScopedSignaller::new(&next),)),
    );
    assert!(next.timed_wait(Duration::from_secs(5)));

    worker.stop();

    assert!(dropped.is_signaled());
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn panicking_task_leaves_the_worker_running() {
    let worker = started_worker();
    let runner = worker.task_runner().unwrap();

    assert!(runner.post_task(
        from_here!(),
        bind_once(|| panic!("task failed on purpose"), ()),
    ));

    let ran = Arc::new(AtomicBool::new(false));
    {
        let ran = ran.clone();
        assert!(runner.post_task(
            from_here!(),
            bind_once(move || ran.store(true, Ordering::SeqCst), ()),
        ));
    }

    worker.flush_for_testing();

    assert!(worker.is_running());
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn flush_from_the_worker_itself_panics() {
    let worker = Arc::new(started_worker());
    let runner = worker.task_runner().unwrap();

    let panicked = Arc::new(AtomicBool::new(false));
    let done = Arc::new(WaitableEvent::new());
    {
        let worker = worker.clone();
        let panicked = panicked.clone();
        let done = ScopedSignaller::new(&done);
        runner.post_task(
            from_here!(),
            bind_once(
                move || {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| worker.flush_for_testing()));
                    panicked.store(result.is_err(), Ordering::SeqCst);

                    // The last handle to the worker must not be dropped on its
                    // own thread.
                    drop(worker);
                    drop(done);
                },
                (),
            ),
        );
    }

    done.wait();
    assert!(panicked.load(Ordering::SeqCst));

    let worker = Arc::try_unwrap(worker).unwrap();
    drop(worker);
}
