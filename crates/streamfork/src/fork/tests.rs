use crate::{
    CharSource, Characteristics, EngineConfig, Error, ForkSource, IterSource, ReduceEngine,
    Result, Spliterator, StreamForker, count_words, count_words_iteratively,
};
use crossbeam_channel::{bounded, unbounded};
use std::collections::HashSet;
use std::time::Duration;

fn engine(threads: usize) -> ReduceEngine {
    ReduceEngine::new(EngineConfig::with_threads(threads)).unwrap()
}

/// Yields `0..fail_at`, then fails.
struct FailingSource {
    next: u32,
    fail_at: u32,
    panic: bool,
}

impl Spliterator for FailingSource {
    type Item = u32;

    fn try_advance(&mut self) -> Result<(u32, bool)> {
        if self.next == self.fail_at {
            assert!(!self.panic, "source panicked at {}", self.next);
            return Err(Error::Source {
                reason: format!("failed at {}", self.next),
            });
        }
        self.next += 1;
        Ok((self.next - 1, true))
    }

    fn try_split(&mut self) -> Option<Self> {
        None
    }

    fn estimate_size(&self) -> usize {
        0
    }

    fn characteristics(&self) -> Characteristics {
        Characteristics::ORDERED
    }
}

#[derive(Debug, thiserror::Error)]
#[error("odd value {0}")]
struct OddValue(u32);

#[test]
fn word_and_char_forks_over_short_sentence() {
    let chars: Vec<char> = "ab cd".chars().collect();
    let mut forker = StreamForker::new(CharSource::whitespace(&chars));
    forker
        .fork('A', |src| count_words_iteratively(&src.collect::<String>()))
        .unwrap()
        .fork('B', |src| src.map(|c| c.to_ascii_uppercase()).count())
        .unwrap();
    assert_eq!(forker.len(), 2);

    let results = forker.get_results().unwrap();
    assert_eq!(results.get::<usize>(&'A').unwrap(), 2);
    assert_eq!(results.get::<usize>(&'B').unwrap(), 5);
}

#[test]
fn last_registration_wins() {
    let mut forker = StreamForker::new(IterSource::new(1..=3_u32));
    forker
        .fork("sum", |src| src.sum::<u32>())
        .unwrap()
        .fork("sum", |src| src.product::<u32>())
        .unwrap();
    assert_eq!(forker.len(), 1);

    let results = forker.get_results().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results.keys().collect::<Vec<_>>(), vec![&"sum"]);
    assert_eq!(results.get::<u32>(&"sum").unwrap(), 6);
}

#[test]
fn unknown_key_fails_without_waiting() {
    let (gate_tx, gate_rx) = bounded::<()>(0);
    let mut forker = StreamForker::with_engine(IterSource::new(0..10_u32), &engine(2));
    forker
        .fork("gated", move |src: ForkSource<u32>| {
            gate_rx.recv().ok();
            src.count()
        })
        .unwrap();
    let results = forker.get_results().unwrap();

    // The only fork is parked on the gate, so this must not block.
    let err = results.get::<usize>(&"missing").unwrap_err();
    assert!(matches!(err, Error::UnknownForkKey { ref key } if key == "\"missing\""));
    assert!(!results.contains(&"missing"));

    gate_tx.send(()).unwrap();
    assert_eq!(results.get::<usize>(&"gated").unwrap(), 10);
}

#[test]
fn failing_fork_does_not_affect_others() {
    let mut forker = StreamForker::with_engine(IterSource::new(0..100_u32), &engine(4));
    forker
        .fork("count", |src| src.count())
        .unwrap()
        .fork("boom", |src: ForkSource<u32>| -> usize {
            for n in src {
                assert!(n < 50, "exploded at {n}");
            }
            0
        })
        .unwrap()
        .fork("max", |src| src.max())
        .unwrap();
    let results = forker.get_results().unwrap();

    assert_eq!(results.get::<usize>(&"count").unwrap(), 100);
    assert_eq!(results.get::<Option<u32>>(&"max").unwrap(), Some(99));

    for _ in 0..2 {
        match results.get::<usize>(&"boom") {
            Err(Error::ForkComputation { key, reason, source }) => {
                assert_eq!(key, "\"boom\"");
                assert!(reason.contains("exploded at 50"), "{reason}");
                assert!(source.is_none());
            }
            other => panic!("expected ForkComputation, got {other:?}"),
        }
    }
}

#[test]
fn fallible_fork_error_becomes_source() {
    let mut forker = StreamForker::new(IterSource::new([2_u32, 4, 7, 8]));
    forker
        .try_fork("evens", |src| {
            src.map(|n| if n % 2 == 0 { Ok(n) } else { Err(OddValue(n)) })
                .collect::<core::result::Result<Vec<_>, _>>()
        })
        .unwrap()
        .try_fork("total", |src| Ok::<_, OddValue>(src.sum::<u32>()))
        .unwrap();
    let results = forker.get_results().unwrap();

    assert_eq!(results.get::<u32>(&"total").unwrap(), 21);
    let err = results.get::<Vec<u32>>(&"evens").unwrap_err();
    assert!(matches!(err, Error::ForkComputation { ref reason, .. } if reason == "odd value 7"));
    let source = std::error::Error::source(&err).expect("error source");
    assert_eq!(source.to_string(), "odd value 7");
}

#[test]
fn empty_source_ends_every_fork() {
    let chars: Vec<char> = Vec::new();
    let mut forker = StreamForker::new(CharSource::whitespace(&chars));
    for key in 0..8 {
        forker.fork(key, |src| src.collect::<Vec<char>>()).unwrap();
    }
    let results = forker.get_results().unwrap();

    for key in 0..8 {
        assert!(results.get::<Vec<char>>(&key).unwrap().is_empty());
    }
}

#[test]
fn each_fork_sees_every_element_in_order() {
    let expected: Vec<u32> = (0..10_000).collect();
    let mut forker = StreamForker::with_engine(IterSource::new(expected.clone()), &engine(3));
    for key in 0..5 {
        forker.fork(key, |src| src.collect::<Vec<u32>>()).unwrap();
    }
    let results = forker.get_results().unwrap();

    for key in 0..5 {
        assert_eq!(results.get::<Vec<u32>>(&key).unwrap(), expected, "fork {key}");
    }
}

#[test]
fn more_forks_than_threads_all_complete() {
    let mut forker = StreamForker::with_engine(IterSource::new(0..1_000_u64), &engine(2));
    for key in 0..32_u64 {
        forker.fork(key, move |src| src.map(|n| n * key).sum::<u64>()).unwrap();
    }
    let results = forker.get_results().unwrap();

    for key in 0..32_u64 {
        assert_eq!(results.get::<u64>(&key).unwrap(), key * 499_500);
    }
}

#[test]
fn blocked_fork_does_not_stall_delivery_to_others() {
    let (gate_tx, gate_rx) = bounded::<()>(0);
    let mut forker = StreamForker::with_engine(IterSource::new(0..5_000_u32), &engine(4));
    forker
        .fork("slow", move |src: ForkSource<u32>| {
            gate_rx.recv().ok();
            src.count()
        })
        .unwrap()
        .fork("fast", |src| src.count())
        .unwrap();

    // Returns once the whole source is queued, even though "slow" has not
    // read anything yet.
    let results = forker.get_results().unwrap();
    assert_eq!(results.get::<usize>(&"fast").unwrap(), 5_000);

    gate_tx.send(()).unwrap();
    assert_eq!(results.get::<usize>(&"slow").unwrap(), 5_000);
}

#[test]
fn consumer_that_stops_early_is_harmless() {
    let mut forker = StreamForker::new(IterSource::new(0..1_000_u32));
    forker
        .fork("head", |src| src.take(3).collect::<Vec<_>>())
        .unwrap()
        .fork("all", |src| src.count())
        .unwrap();
    let results = forker.get_results().unwrap();

    assert_eq!(results.get::<Vec<u32>>(&"head").unwrap(), vec![0, 1, 2]);
    assert_eq!(results.get::<usize>(&"all").unwrap(), 1_000);
}

#[test]
fn registration_is_frozen_after_trigger() {
    let mut forker = StreamForker::new(IterSource::new(0..3_u32));
    forker.fork(1, |src| src.count()).unwrap();
    assert!(!forker.is_triggered());

    let results = forker.get_results().unwrap();
    assert!(forker.is_triggered());
    assert!(matches!(
        forker.fork(2, |src| src.count()),
        Err(Error::DuplicateTrigger)
    ));
    assert!(matches!(forker.get_results(), Err(Error::DuplicateTrigger)));
    assert_eq!(results.get::<usize>(&1).unwrap(), 3);
}

#[test]
fn forker_without_forks_still_drains() {
    let mut forker: StreamForker<_, &str> = StreamForker::new(IterSource::new(0..3_u32));
    assert!(forker.is_empty());
    let results = forker.get_results().unwrap();
    assert!(results.is_empty());
}

#[test]
fn wrong_type_keeps_result_then_taken() {
    let mut forker = StreamForker::new(IterSource::new(0..4_u32));
    forker.fork("n", |src| src.count()).unwrap();
    let results = forker.get_results().unwrap();

    assert!(matches!(
        results.get::<u32>(&"n"),
        Err(Error::ResultTypeMismatch { expected: "u32", .. })
    ));
    assert_eq!(results.get::<usize>(&"n").unwrap(), 4);
    assert!(matches!(
        results.get::<usize>(&"n"),
        Err(Error::ResultTaken { .. })
    ));
}

#[test]
fn cloned_results_can_be_read_repeatedly() {
    let mut forker = StreamForker::new(IterSource::new(["ab", "cd", "ef"]));
    forker
        .fork("joined", |src| src.collect::<Vec<_>>().concat())
        .unwrap();
    forker
        .try_fork("odd", |src: ForkSource<&str>| {
            let n = src.count() as u32;
            if n % 2 == 0 { Ok(n) } else { Err(OddValue(n)) }
        })
        .unwrap();
    let results = forker.get_results().unwrap();

    for _ in 0..3 {
        assert_eq!(results.get_cloned::<String>(&"joined").unwrap(), "abcdef");
    }
    assert!(matches!(
        results.get_cloned::<u8>(&"joined"),
        Err(Error::ResultTypeMismatch { .. })
    ));
    for _ in 0..2 {
        assert!(matches!(
            results.get_cloned::<u32>(&"odd"),
            Err(Error::ForkComputation { .. })
        ));
    }

    // A plain get still takes the value out.
    assert_eq!(results.get::<String>(&"joined").unwrap(), "abcdef");
    assert!(matches!(
        results.get_cloned::<String>(&"joined"),
        Err(Error::ResultTaken { .. })
    ));
}

#[test]
fn source_error_still_ends_every_fork() {
    let (seen_tx, seen_rx) = unbounded();
    let mut forker = StreamForker::new(FailingSource {
        next: 0,
        fail_at: 3,
        panic: false,
    });
    for key in 0..3 {
        let seen_tx = seen_tx.clone();
        forker
            .fork(key, move |src: ForkSource<u32>| {
                seen_tx.send(src.collect::<Vec<_>>()).ok();
            })
            .unwrap();
    }

    let err = forker.get_results().unwrap_err();
    assert!(matches!(err, Error::Source { ref reason } if reason == "failed at 3"));
    for _ in 0..3 {
        let seen = seen_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(seen, vec![0, 1, 2]);
    }
}

#[test]
fn source_panic_still_ends_every_fork() {
    let (seen_tx, seen_rx) = unbounded();
    let mut forker = StreamForker::new(FailingSource {
        next: 0,
        fail_at: 2,
        panic: true,
    });
    forker
        .fork("only", move |src: ForkSource<u32>| {
            seen_tx.send(src.collect::<Vec<_>>()).ok();
        })
        .unwrap();

    let walk = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| forker.get_results()));
    assert!(walk.is_err());
    let seen = seen_rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(seen, vec![0, 1]);
}

#[test]
fn forks_run_on_the_engine_pool() {
    let engine = ReduceEngine::new(EngineConfig {
        num_threads: 2,
        thread_name_prefix: String::from("forks"),
    })
    .unwrap();
    let mut forker = StreamForker::with_engine(IterSource::new(0..1_u8), &engine);
    forker
        .fork((), |src| {
            src.for_each(drop);
            std::thread::current().name().map(String::from)
        })
        .unwrap();
    let results = forker.get_results().unwrap();

    let name = results.get::<Option<String>>(&()).unwrap().unwrap();
    assert!(name.starts_with("forks-"), "{name}");
}

#[test]
fn fork_can_reduce_on_the_shared_pool() {
    const TEXT: &str = " Nel   mezzo del cammin  di nostra  vita \
                        mi  ritrovai in una  selva oscura ";
    let engine = engine(2);
    let chars: Vec<char> = TEXT.chars().collect();
    let mut forker = StreamForker::with_engine(CharSource::whitespace(&chars), &engine);
    let inner = engine.clone();
    forker
        .fork("parallel", move |src| count_words(&src.collect::<String>(), &inner))
        .unwrap()
        .fork("distinct", |src| {
            src.filter(|c| !c.is_whitespace()).collect::<HashSet<char>>().len()
        })
        .unwrap();
    let results = forker.get_results().unwrap();

    assert_eq!(results.get::<Result<usize>>(&"parallel").unwrap().unwrap(), 13);
    assert!(results.get::<usize>(&"distinct").unwrap() > 0);
}

#[test]
fn results_can_be_awaited() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .unwrap();

    runtime.block_on(async {
        let mut forker = StreamForker::new(IterSource::new(0..10_u32));
        forker
            .fork("sum", |src| src.sum::<u32>())
            .unwrap()
            .fork("len", |src| src.count())
            .unwrap();
        let results = forker.get_results().unwrap();

        let len = results.get_async::<usize>(&"len").await;
        let sum = results.get_async::<u32>(&"sum").await;
        assert_eq!(sum.unwrap(), 45);
        assert_eq!(len.unwrap(), 10);
    });
}

#[tokio::test]
async fn awaiting_unknown_key_fails() {
    let mut forker = StreamForker::new(IterSource::new(0..1_u32));
    forker.fork(1_u8, |src| src.count()).unwrap();
    let results = forker.get_results().unwrap();

    assert!(matches!(
        results.get_async::<usize>(&2).await,
        Err(Error::UnknownForkKey { .. })
    ));
    assert_eq!(results.get_async::<usize>(&1).await.unwrap(), 1);
}

#[test]
fn handle_is_shareable_across_threads() {
    let mut forker = StreamForker::new(IterSource::new(0..100_u32));
    for key in 0..4_u32 {
        forker.fork(key, move |src| src.filter(|n| n % 4 == key).count()).unwrap();
    }
    let results = forker.get_results().unwrap();

    std::thread::scope(|s| {
        for key in 0..4_u32 {
            let results = &results;
            s.spawn(move || assert_eq!(results.get::<usize>(&key).unwrap(), 25));
        }
    });
}
