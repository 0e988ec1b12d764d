//! 探索器を公開APIから通して確認するシナリオテスト

use std::sync::Arc;
use std::time::{Duration, Instant};

use rdraughts_core::mcts::{LeafEvaluation, RolloutPolicy};
use rdraughts_core::{
    Algorithm, Engine, EngineConfig, HeuristicEvaluator, MctsConfig, MctsEngine, MinimaxConfig,
    MinimaxEngine, Position, SearchController, SearchError, SearchLimits, StopFlag,
    TerminationReason, Variant,
};

fn evaluator() -> Arc<HeuristicEvaluator> {
    Arc::new(HeuristicEvaluator::default())
}

fn english(fen: &str) -> Position {
    Position::from_fen(Variant::English, fen).expect("valid FEN")
}

/// 枝刈りなしの素のミニマックス設定
fn plain(depth: i32) -> MinimaxConfig {
    MinimaxConfig {
        max_depth: depth,
        alpha_beta: false,
        transposition: false,
        move_ordering: false,
        quiescence: false,
        iterative_deepening: false,
        ..MinimaxConfig::default()
    }
}

#[test]
fn test_alpha_beta_visits_fewer_nodes_than_minimax() {
    let pos = Position::startpos(Variant::English);
    let mut engine = MinimaxEngine::new(evaluator());

    let full = engine.search(&pos, &plain(4), &SearchLimits::unlimited()).unwrap();
    engine.clear();
    let ab = engine
        .search(&pos, &MinimaxConfig { alpha_beta: true, ..plain(4) }, &SearchLimits::unlimited())
        .unwrap();

    assert_eq!(full.value(), ab.value());
    assert!(
        ab.stats.nodes < full.stats.nodes,
        "alpha-beta nodes {} should be below minimax nodes {}",
        ab.stats.nodes,
        full.stats.nodes
    );
}

#[test]
fn test_single_legal_move_is_returned_without_search() {
    let pos = english("W:W22,30:B18");
    assert_eq!(pos.legal_moves().len(), 1);

    let mut minimax = MinimaxEngine::new(evaluator());
    let res = minimax.search(&pos, &MinimaxConfig::default(), &SearchLimits::unlimited()).unwrap();
    assert_eq!(res.termination, TerminationReason::ForcedMove);
    assert_eq!(res.best_move.notation(Variant::English), "22x15");
    assert_eq!(res.stats.nodes, 0);

    let mut mcts = MctsEngine::new(evaluator());
    let res = mcts.search(&pos, &MctsConfig::default(), &SearchLimits::unlimited()).unwrap();
    assert_eq!(res.termination, TerminationReason::ForcedMove);
    assert_eq!(res.best_move.notation(Variant::English), "22x15");
}

#[test]
fn test_terminal_position_errors_for_both_algorithms() {
    let pos = english("B:W32,27,24:B28");
    let mut engine = Engine::new(evaluator());
    for algorithm in [Algorithm::Minimax, Algorithm::Mcts] {
        let cfg = EngineConfig { algorithm, ..EngineConfig::default() };
        let err = engine.search(&pos, &cfg, &SearchLimits::unlimited()).unwrap_err();
        assert!(matches!(err, SearchError::TerminalPosition(_)));
    }
}

#[test]
fn test_mcts_finds_the_winning_double_capture() {
    // 22x15x8 で黒の駒が尽きる。もう一方の 23x14 は勝ちにならない
    let pos = english("W:W22,23:B18,11");
    let notations: Vec<String> =
        pos.legal_moves().iter().map(|m| m.notation(Variant::English)).collect();
    assert_eq!(notations.len(), 2);
    assert!(notations.contains(&"22x15x8".to_string()));

    let cfg = MctsConfig {
        iterations: 1000,
        rollout_cutoff_depth: Some(10),
        leaf_evaluation: LeafEvaluation::Heuristic,
        seed: Some(11),
        ..MctsConfig::default()
    };
    let mut mcts = MctsEngine::new(evaluator());
    let res = mcts.search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    assert_eq!(res.best_move.notation(Variant::English), "22x15x8");

    let best = res.visits().iter().max_by_key(|v| v.visits).unwrap();
    assert_eq!(best.mv, res.best_move);
}

#[test]
fn test_minimax_finds_the_winning_double_capture() {
    let pos = english("W:W22,23:B18,11");
    let mut engine = MinimaxEngine::new(evaluator());
    let res = engine.search(&pos, &MinimaxConfig::default(), &SearchLimits::unlimited()).unwrap();
    assert_eq!(res.best_move.notation(Variant::English), "22x15x8");
    assert!(res.value().unwrap().is_win());
}

#[test]
fn test_deterministic_parallel_search_is_reproducible() {
    let start = Position::startpos(Variant::English);
    let pos = start.do_move(&start.legal_moves()[2]);
    let cfg = MinimaxConfig {
        max_depth: 5,
        parallel: true,
        workers: 4,
        deterministic_ordering: true,
        ..MinimaxConfig::default()
    };

    let run = || {
        let mut engine = MinimaxEngine::with_controller(evaluator(), SearchController::new(8));
        engine.search(&pos, &cfg, &SearchLimits::unlimited()).unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.best_move, second.best_move);
    assert_eq!(first.value(), second.value());
    assert_eq!(first.stats.workers, 4);

    let mut sequential = MinimaxEngine::new(evaluator());
    let seq = sequential
        .search(&pos, &MinimaxConfig { parallel: false, ..cfg.clone() }, &SearchLimits::unlimited())
        .unwrap();
    assert_eq!(seq.value(), first.value());
}

#[test]
fn test_mcts_seed_reproduces_the_search() {
    let pos = Position::startpos(Variant::English);
    let cfg = MctsConfig {
        iterations: 300,
        seed: Some(2024),
        rollout_policy: RolloutPolicy::Heuristic,
        rollout_cutoff_depth: Some(20),
        leaf_evaluation: LeafEvaluation::Heuristic,
        ..MctsConfig::default()
    };
    let a = MctsEngine::new(evaluator()).search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    let b = MctsEngine::new(evaluator()).search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    assert_eq!(a.best_move, b.best_move);
    assert_eq!(a.visits(), b.visits());
}

#[test]
fn test_mcts_root_visits_sum_to_iterations() {
    let pos = Position::startpos(Variant::International);
    let cfg = MctsConfig {
        iterations: 120,
        seed: Some(5),
        rollout_cutoff_depth: Some(12),
        leaf_evaluation: LeafEvaluation::Heuristic,
        ..MctsConfig::default()
    };
    let res = MctsEngine::new(evaluator()).search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    assert_eq!(res.termination, TerminationReason::IterationsExhausted);
    assert_eq!(res.visits().iter().map(|v| v.visits).sum::<u32>(), 120);
}

#[test]
fn test_progressive_widening_limits_root_children() {
    let pos = Position::startpos(Variant::International);
    let cfg = MctsConfig {
        iterations: 25,
        seed: Some(9),
        progressive_widening: true,
        pw_k: 1.0,
        pw_alpha: 0.5,
        rollout_cutoff_depth: Some(6),
        leaf_evaluation: LeafEvaluation::Heuristic,
        ..MctsConfig::default()
    };
    let res = MctsEngine::new(evaluator()).search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    // ceil(1.0 * 25^0.5) = 5
    assert!(res.visits().len() <= 5, "expanded {} children", res.visits().len());
    assert!(pos.legal_moves().len() > 5);
}

#[test]
fn test_iterative_deepening_matches_fixed_depth() {
    let pos = english("W:W21,22,23,25,27,30:B5,6,9,11,12,14");
    let fixed = MinimaxConfig {
        max_depth: 5,
        iterative_deepening: false,
        ..MinimaxConfig::default()
    };
    let id = MinimaxConfig { iterative_deepening: true, ..fixed.clone() };

    let a = MinimaxEngine::new(evaluator()).search(&pos, &fixed, &SearchLimits::unlimited()).unwrap();
    let b = MinimaxEngine::new(evaluator()).search(&pos, &id, &SearchLimits::unlimited()).unwrap();
    assert_eq!(a.value(), b.value());
    assert_eq!(b.stats.depth, 5);
}

#[test]
fn test_transposition_table_does_not_change_the_value() {
    let pos = Position::startpos(Variant::English);
    let base = MinimaxConfig {
        max_depth: 5,
        iterative_deepening: false,
        transposition: false,
        ..MinimaxConfig::default()
    };
    let with_tt = MinimaxConfig { transposition: true, ..base.clone() };

    let a = MinimaxEngine::new(evaluator()).search(&pos, &base, &SearchLimits::unlimited()).unwrap();
    let b = MinimaxEngine::new(evaluator()).search(&pos, &with_tt, &SearchLimits::unlimited()).unwrap();
    assert_eq!(a.value(), b.value());
}

#[test]
fn test_time_limit_bounds_the_search() {
    let pos = Position::startpos(Variant::International);
    let cfg = MinimaxConfig {
        max_depth: 16,
        time_limit: Some(Duration::from_millis(100)),
        ..MinimaxConfig::default()
    };
    let start = Instant::now();
    let res = MinimaxEngine::new(evaluator()).search(&pos, &cfg, &SearchLimits::unlimited()).unwrap();
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(res.termination, TerminationReason::Time);
    assert!(pos.legal_moves().contains(&res.best_move));
}

#[test]
fn test_stop_before_search_still_returns_a_legal_move() {
    let pos = Position::startpos(Variant::English);
    let stop = StopFlag::new();
    stop.request_stop();
    let limits = SearchController::default().limits(None, stop);

    let res = MinimaxEngine::new(evaluator()).search(&pos, &MinimaxConfig::default(), &limits).unwrap();
    assert_eq!(res.termination, TerminationReason::Stopped);
    assert!(pos.legal_moves().contains(&res.best_move));

    let res = MctsEngine::new(evaluator()).search(&pos, &MctsConfig::default(), &limits).unwrap();
    assert_eq!(res.termination, TerminationReason::Stopped);
    assert!(pos.legal_moves().contains(&res.best_move));
}

#[test]
fn test_json_config_with_unknown_keys_drives_the_engine() {
    let cfg = EngineConfig::from_json(
        r#"{
            "algorithm": "minimax",
            "depth": 4,
            "killerMoves": true,
            "moveOrdering": false,
            "someFutureOption": 42
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.unknown_keys().collect::<Vec<_>>(), vec!["someFutureOption"]);

    let (normalized, adjustments) = cfg.normalize();
    assert!(!normalized.minimax.killer_moves);
    assert!(adjustments.iter().any(|a| a.feature == "killerMoves"));

    let res = Engine::new(evaluator())
        .search(&Position::startpos(Variant::English), &cfg, &SearchLimits::unlimited())
        .unwrap();
    assert_eq!(res.stats.depth, 4);
}
