use std::error::Error;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use dagwork::engine::{Completion, DoneGate, PanicPolicy, Termination, WorkFlow};
use dagwork::errors::FlowError;
use dagwork_test_utils::{Latch, Recorder, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn explode(_: &()) {
    panic!("kaboom");
}

#[tokio::test(flavor = "multi_thread")]
async fn many_exit_paths_signal_done_once() -> TestResult {
    init_tracing();

    const PATHS: usize = 16;

    let rec = Recorder::new();
    let mut flow: WorkFlow<()> = WorkFlow::new();
    for i in 0..PATHS {
        let name = format!("path{i}");
        let node = flow.new_named_node(name.clone(), rec.task(&name));
        flow.add_start_node(node);
        flow.connect_to_end(node);
    }
    assert_eq!(flow.graph().node(flow.end()).dependency().len(), PATHS);

    let running = flow.start(CancellationToken::new(), ())?;
    let completion = with_timeout(running.wait_done()).await?;

    assert_eq!(completion, Completion::Finished);
    assert_eq!(rec.len(), PATHS);
    Ok(())
}

#[test]
fn concurrent_gate_fires_are_observed_once() {
    const WRITERS: usize = 16;

    let gate = Arc::new(DoneGate::new());
    let barrier = Arc::new(Barrier::new(WRITERS + 1));

    let writers: Vec<_> = (0..WRITERS)
        .map(|i| {
            let gate = Arc::clone(&gate);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let termination = if i % 2 == 0 {
                    Termination::Completed
                } else {
                    Termination::Interrupted
                };
                gate.fire(termination)
            })
        })
        .collect();

    barrier.wait();
    let wins = writers
        .into_iter()
        .map(|w| w.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(wins, 1);
    assert!(gate.is_fired());

    let rt = tokio::runtime::Runtime::new().unwrap();
    let outcome = rt.block_on(async { gate.wait().await.clone() });
    assert!(matches!(
        outcome,
        Termination::Completed | Termination::Interrupted
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn interrupt_releases_waiter_and_is_idempotent() -> TestResult {
    init_tracing();

    let rec = Recorder::new();
    let latch = Latch::new();

    let mut flow: WorkFlow<()> = WorkFlow::new();
    let slow = {
        let latch = latch.clone();
        let rec = rec.clone();
        flow.new_named_node("slow", move |_: &()| {
            rec.record("slow:started");
            latch.wait();
        })
    };
    let after = flow.new_named_node("after", rec.task("after"));
    flow.add_start_node(slow);
    flow.add_edge(slow, after);
    flow.connect_to_end(after);

    let running = flow.start(CancellationToken::new(), ())?;
    let handle = running.interrupt_handle();

    while rec.count("slow:started") == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    handle.interrupt();
    let completion = with_timeout(running.wait_done()).await?;
    assert_eq!(completion, Completion::Interrupted);

    // Second interrupt after the wait returned is a no-op.
    handle.interrupt();
    assert!(handle.is_terminated());

    // The in-flight branch stops at its next node boundary.
    latch.release();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(rec.count("after"), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn interrupt_before_start_runs_nothing() -> TestResult {
    init_tracing();

    let rec = Recorder::new();
    let mut flow: WorkFlow<()> = WorkFlow::new();
    let a = flow.new_named_node("a", rec.task("a"));
    flow.add_start_node(a);
    flow.connect_to_end(a);

    flow.interrupt_handle().interrupt();

    let running = flow.start(CancellationToken::new(), ())?;
    assert!(running.is_terminated());
    assert_eq!(with_timeout(running.wait_done()).await?, Completion::Interrupted);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rec.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_token_stops_traversal_and_wait() -> TestResult {
    init_tracing();

    let rec = Recorder::new();
    let latch = Latch::new();
    let cancel = CancellationToken::new();

    let mut flow: WorkFlow<()> = WorkFlow::new();
    let first = {
        let latch = latch.clone();
        let rec = rec.clone();
        flow.new_named_node("first", move |_: &()| {
            rec.record("first");
            latch.wait();
        })
    };
    let second = flow.new_named_node("second", rec.task("second"));
    flow.add_start_node(first);
    flow.add_edge(first, second);
    flow.connect_to_end(second);

    let running = flow.start(cancel.clone(), ())?;
    while rec.count("first") == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    cancel.cancel();
    latch.release();

    let completion = with_timeout(running.wait_done()).await?;
    assert_eq!(completion, Completion::Interrupted);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(rec.count("second"), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn deadline_interrupts_a_stuck_flow() -> TestResult {
    init_tracing();

    let latch = Latch::new();
    let mut flow: WorkFlow<()> = WorkFlow::new();
    let stuck = {
        let latch = latch.clone();
        flow.new_named_node("stuck", move |_: &()| {
            latch.wait();
        })
    };
    flow.add_start_node(stuck);
    flow.connect_to_end(stuck);

    let running = flow.start(CancellationToken::new(), ())?;
    let handle = running.interrupt_handle();
    let deadline = Duration::from_millis(50);

    let result = with_timeout(running.wait_done_timeout(deadline)).await;
    assert_eq!(result, Err(FlowError::DeadlineExceeded(deadline)));
    assert!(handle.is_terminated());

    latch.release();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn deadline_is_not_hit_by_a_fast_flow() -> TestResult {
    init_tracing();

    let mut flow: WorkFlow<()> = WorkFlow::new();
    let a = flow.new_node(|_: &()| {});
    flow.add_start_node(a);
    flow.connect_to_end(a);

    let running = flow.start(CancellationToken::new(), ())?;
    let completion = with_timeout(running.wait_done_timeout(Duration::from_secs(3))).await?;
    assert_eq!(completion, Completion::Finished);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn task_can_fail_the_flow() -> TestResult {
    init_tracing();

    let rec = Recorder::new();
    let mut flow: WorkFlow<()> = WorkFlow::new();
    let handle = flow.interrupt_handle();

    let check = flow.new_named_node("check", move |_: &()| {
        handle.fail("check found a problem");
    });
    let deploy = flow.new_named_node("deploy", rec.task("deploy"));
    flow.add_start_node(check);
    flow.add_edge(check, deploy);
    flow.connect_to_end(deploy);

    let running = flow.start(CancellationToken::new(), ())?;
    let result = with_timeout(running.wait_done()).await;

    assert_eq!(
        result,
        Err(FlowError::Failed("check found a problem".to_string()))
    );
    assert_eq!(rec.count("deploy"), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_task_aborts_by_default() -> TestResult {
    init_tracing();

    let rec = Recorder::new();
    let mut flow: WorkFlow<()> = WorkFlow::new();
    assert_eq!(flow.panic_policy(), PanicPolicy::Abort);

    let boom = flow.new_named_node("boom", explode);
    let next = flow.new_named_node("next", rec.task("next"));
    flow.add_start_node(boom);
    flow.add_edge(boom, next);
    flow.connect_to_end(next);

    let running = flow.start(CancellationToken::new(), ())?;
    let result = with_timeout(running.wait_done()).await;

    assert_eq!(
        result,
        Err(FlowError::TaskPanicked {
            node: "boom".to_string(),
            message: "kaboom".to_string(),
        })
    );
    assert_eq!(rec.count("next"), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_task_can_be_skipped() -> TestResult {
    init_tracing();

    let rec = Recorder::new();
    let mut flow: WorkFlow<()> = WorkFlow::new().with_panic_policy(PanicPolicy::Continue);

    let boom = flow.new_named_node("boom", explode);
    let next = flow.new_named_node("next", rec.task("next"));
    flow.add_start_node(boom);
    flow.add_edge(boom, next);
    flow.connect_to_end(next);

    let running = flow.start(CancellationToken::new(), ())?;
    let completion = with_timeout(running.wait_done()).await?;

    assert_eq!(completion, Completion::Finished);
    assert_eq!(rec.count("next"), 1);
    Ok(())
}
