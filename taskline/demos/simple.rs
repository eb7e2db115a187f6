use taskline::callback::bind_once;
use taskline::sync::{ScopedSignaller, WaitableEvent};
use taskline::{SingleThreadTaskRunner, ThreadPool, WorkerThread, from_here};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn ping_pong(
    current: Arc<dyn SingleThreadTaskRunner>,
    next: Arc<dyn SingleThreadTaskRunner>,
    five_left: Arc<WaitableEvent>,
    finished: ScopedSignaller,
    n: u32,
) {
    tracing::info!(
        thread = ?thread::current().id(),
        n,
        on_current = current.runs_tasks_in_current_sequence(),
        on_next = next.runs_tasks_in_current_sequence(),
        "ping_pong"
    );

    if n == 5 {
        five_left.signal();
    }

    if n > 0 {
        next.post_task(
            from_here!(),
            bind_once(ping_pong, (next.clone(), current, five_left, finished, n - 1)),
        );
    }
}

fn thread_example() {
    let mut t1 = WorkerThread::builder().name("ping").build();
    let mut t2 = WorkerThread::builder().name("pong").build();
    t1.start().expect("failed to start ping thread");
    t2.start().expect("failed to start pong thread");

    let (Some(tr1), Some(tr2)) = (t1.task_runner(), t2.task_runner()) else {
        unreachable!("started workers have task runners");
    };

    let five_left = Arc::new(WaitableEvent::new());
    let finished = Arc::new(WaitableEvent::new());

    tr1.post_task(
        from_here!(),
        bind_once(
            ping_pong,
            (
                tr1.clone(),
                tr2.clone(),
                five_left.clone(),
                ScopedSignaller::new(&finished),
                10,
            ),
        ),
    );

    five_left.wait();
    tracing::info!("thread_example: at most 5 calls left");
    finished.wait();
    tracing::info!("thread_example: finished");

    t2.stop();
    t1.stop();
}

fn thread_delayed_example() {
    let mut worker = WorkerThread::new();
    worker.start().expect("failed to start worker");
    let runner = worker.task_runner().expect("started worker has a task runner");

    let finished = Arc::new(WaitableEvent::new());

    runner.post_delayed_task(
        from_here!(),
        bind_once(
            |_finished: ScopedSignaller| tracing::info!("delayed (300ms) task executing"),
            (ScopedSignaller::new(&finished),),
        ),
        Duration::from_millis(300),
    );
    runner.post_task(
        from_here!(),
        bind_once(|| tracing::info!("non-delayed task executing"), ()),
    );
    runner.post_delayed_task(
        from_here!(),
        bind_once(|| tracing::info!("delayed (100ms) task executing"), ()),
        Duration::from_millis(100),
    );

    finished.wait();
    tracing::info!("thread_delayed_example: finished");

    worker.stop();
}

fn thread_pool_unsequenced_example() {
    let mut pool = ThreadPool::new(2);
    pool.start().expect("failed to start pool");

    let runner = pool.get_task_runner();
    let sum = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(WaitableEvent::new());

    {
        // Every task holds the signaller; the last one to finish fires it.
        let all_done = Arc::new(ScopedSignaller::new(&done));
        for i in 1..=100 {
            let sum = sum.clone();
            let all_done = all_done.clone();
            runner.post_task(
                from_here!(),
                bind_once(
                    move || {
                        sum.fetch_add(i, Ordering::Relaxed);
                        drop(all_done);
                    },
                    (),
                ),
            );
        }
    }

    done.wait();
    tracing::info!(sum = sum.load(Ordering::Relaxed), "thread_pool_unsequenced_example: finished");

    pool.stop();
}

fn thread_pool_sequenced_example() {
    let mut pool = ThreadPool::new(4);
    pool.start().expect("failed to start pool");

    let sequence = pool.create_sequenced_task_runner();
    let order = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(WaitableEvent::new());

    for i in 0..10 {
        let order = order.clone();
        sequence.post_task(
            from_here!(),
            bind_once(move || order.lock().unwrap().push(i), ()),
        );
    }
    sequence.post_task(
        from_here!(),
        bind_once(|_done: ScopedSignaller| {}, (ScopedSignaller::new(&done),)),
    );

    done.wait();
    tracing::info!(order = ?order.lock().unwrap(), "thread_pool_sequenced_example: finished");

    pool.stop();
}

fn thread_pool_single_thread_example() {
    let mut pool = ThreadPool::new(4);
    pool.start().expect("failed to start pool");

    let pinned = pool.create_single_thread_task_runner();
    let threads = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(WaitableEvent::new());

    {
        let all_done = Arc::new(ScopedSignaller::new(&done));
        for _ in 0..5 {
            let threads = threads.clone();
            let all_done = all_done.clone();
            pinned.post_task(
                from_here!(),
                bind_once(
                    move || {
                        threads.lock().unwrap().push(thread::current().id());
                        drop(all_done);
                    },
                    (),
                ),
            );
        }
    }

    done.wait();
    let threads = threads.lock().unwrap();
    tracing::info!(
        tasks = threads.len(),
        same_thread = threads.windows(2).all(|pair| pair[0] == pair[1]),
        "thread_pool_single_thread_example: finished"
    );
    drop(threads);

    pool.stop();
}

#[taskline::main(log_filter = "info")]
fn main() {
    let started = Instant::now();

    thread_example();
    thread_delayed_example();
    thread_pool_unsequenced_example();
    thread_pool_sequenced_example();
    thread_pool_single_thread_example();

    tracing::info!(elapsed_ms = started.elapsed().as_secs_f64() * 1000.0, "example finished");
}
