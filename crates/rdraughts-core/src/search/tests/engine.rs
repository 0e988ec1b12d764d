//! MinimaxEngine のテスト

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::controller::{SearchController, SearchLimits, StopFlag};
use crate::error::SearchError;
use crate::eval::{Evaluator, HeuristicEvaluator};
use crate::position::{GameOutcome, Position};
use crate::result::TerminationReason;
use crate::search::{MinimaxConfig, MinimaxEngine};
use crate::types::{Color, Value, Variant};

fn engine() -> MinimaxEngine {
    MinimaxEngine::new(Arc::new(HeuristicEvaluator::default()))
}

#[test]
fn test_single_legal_move_is_returned_without_search() {
    let pos = Position::from_fen(Variant::English, "W:W22,30:B18").unwrap();
    let result = engine()
        .search(&pos, &MinimaxConfig::default(), &SearchLimits::unlimited())
        .unwrap();
    assert_eq!(result.termination, TerminationReason::ForcedMove);
    assert_eq!(result.best_move.notation(Variant::English), "22x15");
    assert_eq!(result.stats.nodes, 0);
}

#[test]
fn test_terminal_position_is_an_error() {
    let pos = Position::from_fen(Variant::English, "B:W32,27,24:B28").unwrap();
    let err = engine()
        .search(&pos, &MinimaxConfig::default(), &SearchLimits::unlimited())
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::TerminalPosition(GameOutcome::Win(Color::White))
    ));
}

#[test]
fn test_iterative_deepening_matches_fixed_depth() {
    let pos = Position::startpos(Variant::English);
    let fixed = MinimaxConfig {
        max_depth: 4,
        iterative_deepening: false,
        ..MinimaxConfig::default()
    };
    let deepening = MinimaxConfig {
        max_depth: 4,
        ..MinimaxConfig::default()
    };
    let limits = SearchLimits::unlimited();
    let a = engine().search(&pos, &fixed, &limits).unwrap();
    let b = engine().search(&pos, &deepening, &limits).unwrap();
    assert_eq!(a.value(), b.value());
    assert_eq!(a.termination, TerminationReason::DepthLimit);
    assert_eq!(b.stats.depth, 4);
    assert_eq!(b.pv()[0], b.best_move);
}

#[test]
fn test_aspiration_window_keeps_the_value() {
    let pos = Position::startpos(Variant::English);
    let base = MinimaxConfig {
        max_depth: 4,
        ..MinimaxConfig::default()
    };
    let asp = MinimaxConfig {
        aspiration: true,
        aspiration_window: 10,
        ..base.clone()
    };
    let limits = SearchLimits::unlimited();
    let a = engine().search(&pos, &base, &limits).unwrap();
    let b = engine().search(&pos, &asp, &limits).unwrap();
    assert_eq!(a.value(), b.value());
}

/// 指定回数評価したら停止を要求する評価関数
struct StopsAfter {
    inner: HeuristicEvaluator,
    calls: AtomicUsize,
    limit: usize,
    stop: StopFlag,
}

impl Evaluator for StopsAfter {
    fn evaluate(&self, pos: &Position) -> Value {
        if self.calls.fetch_add(1, Ordering::Relaxed) + 1 >= self.limit {
            self.stop.request_stop();
        }
        self.inner.evaluate(pos)
    }
}

#[test]
fn test_interrupted_research_keeps_the_last_completed_best_move() {
    let cfg = MinimaxConfig {
        max_depth: 8,
        aspiration: true,
        aspiration_window: 10,
        ..MinimaxConfig::default()
    };
    let positions = [
        Position::startpos(Variant::English),
        Position::from_fen(Variant::English, "W:W21,22,23,25,26,27,29,30,31,32:B1,2,3,5,6,7,9,10,11,12").unwrap(),
    ];
    let mut interrupted = 0;
    for pos in &positions {
        for limit in (1..=80).map(|i| i * 250).chain([3886]) {
            let stop = StopFlag::new();
            let evaluator = StopsAfter {
                inner: HeuristicEvaluator::default(),
                calls: AtomicUsize::new(0),
                limit,
                stop: stop.clone(),
            };
            let limits = SearchController::default().limits(None, stop);
            let res = MinimaxEngine::new(Arc::new(evaluator))
                .search(pos, &cfg, &limits)
                .unwrap();
            if res.termination != TerminationReason::Stopped || res.stats.depth == 0 {
                continue;
            }
            interrupted += 1;
            // 打ち切り前に完了した深さまでの探索と同じ手を返す
            let capped = MinimaxConfig {
                max_depth: res.stats.depth,
                ..cfg.clone()
            };
            let expected = engine().search(pos, &capped, &SearchLimits::unlimited()).unwrap();
            assert_eq!(
                res.best_move, expected.best_move,
                "limit {limit} depth {}",
                res.stats.depth
            );
            assert_eq!(res.value(), expected.value());
        }
    }
    assert!(interrupted > 0);
}

#[test]
fn test_stop_before_first_iteration_returns_a_legal_move() {
    let pos = Position::startpos(Variant::English);
    let limits = SearchLimits::unlimited();
    limits.stop.request_stop();
    let cfg = MinimaxConfig {
        max_depth: 12,
        ..MinimaxConfig::default()
    };
    let result = engine().search(&pos, &cfg, &limits).unwrap();
    assert_eq!(result.termination, TerminationReason::Stopped);
    assert!(pos.legal_moves().contains(&result.best_move));
}

#[test]
fn test_time_limit_is_respected() {
    let pos = Position::startpos(Variant::International);
    let cfg = MinimaxConfig {
        max_depth: 16,
        time_limit: Some(Duration::from_millis(50)),
        ..MinimaxConfig::default()
    };
    let result = engine().search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    assert!(result.elapsed < Duration::from_secs(5));
    if result.stats.depth < 16 {
        assert_eq!(result.termination, TerminationReason::Time);
    }
    assert!(pos.legal_moves().contains(&result.best_move));
}

#[test]
fn test_endgame_oracle_proves_the_loss() {
    let pos = Position::from_fen(Variant::English, "B:W13,14:B6").unwrap();
    let cfg = MinimaxConfig {
        endgame_tablebase: true,
        ..MinimaxConfig::default()
    };
    let result = engine().search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    assert_eq!(result.value(), Some(Value::loss_in(2)));
    assert!(result.stats.endgame_hits > 0);
    // 証明済みの勝敗が出たら深さを打ち切る
    assert!(result.stats.depth <= 2);
}

#[test]
fn test_deterministic_parallel_search_is_reproducible() {
    let pos = Position::startpos(Variant::English);
    let cfg = MinimaxConfig {
        max_depth: 5,
        parallel: true,
        workers: 4,
        deterministic_ordering: true,
        ..MinimaxConfig::default()
    };
    let controller = SearchController::new(8);
    let run = || {
        let mut e = MinimaxEngine::with_controller(
            Arc::new(HeuristicEvaluator::default()),
            controller.clone(),
        );
        e.search(&pos, &cfg, &SearchLimits::unlimited()).unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.best_move, b.best_move);
    assert_eq!(a.value(), b.value());
    assert_eq!(a.stats.workers, 4);
    assert_eq!(controller.budget().in_use(), 0);

    let sequential = MinimaxConfig {
        parallel: false,
        ..cfg.clone()
    };
    let c = engine().search(&pos, &sequential, &SearchLimits::unlimited()).unwrap();
    assert_eq!(a.value(), c.value());
}

#[test]
fn test_parallel_workers_share_the_budget() {
    let pos = Position::startpos(Variant::English);
    let cfg = MinimaxConfig {
        max_depth: 3,
        parallel: true,
        workers: 4,
        ..MinimaxConfig::default()
    };
    let controller = SearchController::new(2);
    let mut e = MinimaxEngine::with_controller(
        Arc::new(HeuristicEvaluator::default()),
        controller.clone(),
    );
    let result = e.search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    assert_eq!(result.stats.workers, 2);
    assert_eq!(controller.budget().in_use(), 0);
}

/// ワーカースレッドでだけ panic する評価関数
struct PanicsOnWorkers(HeuristicEvaluator);

impl Evaluator for PanicsOnWorkers {
    fn evaluate(&self, pos: &Position) -> Value {
        let on_worker = std::thread::current()
            .name()
            .is_some_and(|n| n.starts_with("minimax-worker"));
        if on_worker {
            panic!("evaluator failure on worker thread");
        }
        self.0.evaluate(pos)
    }
}

#[test]
fn test_failed_workers_fall_back_to_the_caller() {
    let pos = Position::startpos(Variant::English);
    let cfg = MinimaxConfig {
        max_depth: 3,
        parallel: true,
        workers: 3,
        ..MinimaxConfig::default()
    };
    let mut e = MinimaxEngine::new(Arc::new(PanicsOnWorkers(HeuristicEvaluator::default())));
    let result = e.search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    assert_eq!(result.stats.failed_workers, 3);

    let sequential = MinimaxConfig {
        parallel: false,
        ..cfg.clone()
    };
    let expected = engine().search(&pos, &sequential, &SearchLimits::unlimited()).unwrap();
    assert_eq!(result.value(), expected.value());
}
