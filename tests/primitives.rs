#![allow(missing_docs)]
#![cfg(not(feature = "loom"))]

use cwf::{
    backlog::BacklogCounter,
    queue::WorkQueue,
    task::{Completion, TaskState},
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

#[test]
fn queue_hands_items_out_in_fifo_order() {
    let queue = WorkQueue::new();
    for i in 0..5 {
        queue.produce(i);
    }
    assert_eq!(queue.len(), 5);
    let drained: Vec<_> = (0..5).map(|_| queue.consume()).collect();
    assert_eq!(drained, [0, 1, 2, 3, 4]);
    assert!(queue.is_empty());
}

#[test]
fn consumer_blocks_until_an_item_arrives() {
    let queue = Arc::new(WorkQueue::<&'static str>::new());
    let received = Arc::new(AtomicBool::new(false));
    let consumer = {
        let (queue, received) = (Arc::clone(&queue), Arc::clone(&received));
        thread::spawn(move || {
            let item = queue.consume();
            received.store(true, Ordering::Release);
            item
        })
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!received.load(Ordering::Acquire));
    queue.produce("hello");
    assert_eq!(consumer.join().unwrap(), "hello");
}

#[test]
fn sentinels_stop_every_consumer() {
    // `None` is the poison item.
    let queue = Arc::new(WorkQueue::<Option<usize>>::new());
    let processed = Arc::new(AtomicUsize::new(0));
    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let (queue, processed) = (Arc::clone(&queue), Arc::clone(&processed));
            thread::spawn(move || {
                while let Some(value) = queue.consume() {
                    processed.fetch_add(value, Ordering::Relaxed);
                }
            })
        })
        .collect();
    for value in 1..=100 {
        queue.produce(Some(value));
    }
    for _ in &consumers {
        queue.produce(None);
    }
    for consumer in consumers {
        consumer.join().unwrap();
    }
    assert_eq!(processed.load(Ordering::Relaxed), 5050);
    assert!(queue.is_empty());
}

#[test]
fn backlog_counts_up_and_down() {
    let backlog = BacklogCounter::new();
    assert!(backlog.is_zero());
    backlog.up(3);
    assert_eq!(backlog.count(), 3);
    assert_eq!(backlog.down(1), 2);
    assert!(!backlog.is_zero());
    assert_eq!(backlog.down(2), 0);
    assert!(backlog.is_zero());
}

#[test]
fn backlog_down_saturates_at_zero() {
    let backlog = BacklogCounter::with_count(2);
    assert_eq!(backlog.down(5), 0);
    assert_eq!(backlog.down(1), 0);
    backlog.wait_for_zero();
}

#[test]
fn backlog_wait_wakes_every_waiter() {
    let backlog = Arc::new(BacklogCounter::with_count(10));
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let backlog = Arc::clone(&backlog);
            thread::spawn(move || backlog.wait_for_zero())
        })
        .collect();
    for _ in 0..10 {
        thread::sleep(Duration::from_millis(1));
        backlog.down(1);
    }
    for waiter in waiters {
        waiter.join().unwrap();
    }
    assert!(backlog.is_zero());
}

#[test]
fn completion_wait_after_settle_returns_immediately() {
    let completion = Completion::new();
    assert_eq!(completion.state(), TaskState::Pending);
    completion.settle(TaskState::Skipped);
    assert_eq!(completion.wait(), TaskState::Skipped);
    assert_eq!(completion.state(), TaskState::Skipped);
}

#[test]
fn completion_wakes_all_waiters() {
    let completion = Arc::new(Completion::new());
    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let completion = Arc::clone(&completion);
            thread::spawn(move || completion.wait())
        })
        .collect();
    thread::sleep(Duration::from_millis(20));
    completion.settle(TaskState::Succeeded);
    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), TaskState::Succeeded);
    }
}

#[test]
#[should_panic(expected = "Completion::settle: [2]")]
fn completion_settles_only_once() {
    let completion = Completion::new();
    completion.settle(TaskState::Succeeded);
    completion.settle(TaskState::Failed);
}

#[test]
fn rejected_settle_keeps_first_state() {
    let completion = Arc::new(Completion::new());
    completion.settle(TaskState::Succeeded);
    let second = {
        let completion = Arc::clone(&completion);
        thread::spawn(move || completion.settle(TaskState::Failed)).join()
    };
    assert!(second.is_err());
    assert_eq!(completion.state(), TaskState::Succeeded);
    assert_eq!(completion.wait(), TaskState::Succeeded);
}
