//! alpha_beta モジュールのテスト

use crate::controller::{AbortReason, SearchLimits};
use crate::eval::HeuristicEvaluator;
use crate::position::Position;
use crate::result::SearchStats;
use crate::search::alpha_beta::{SearchContext, SearchState, search_node, search_root};
use crate::search::config::MinimaxConfig;
use crate::search::history::HistoryTable;
use crate::search::qsearch::qsearch;
use crate::search::search_helpers::static_eval;
use crate::search::types::{RootMove, RootMoves};
use crate::tt::TranspositionTable;
use crate::types::{Depth, Value, Variant};

fn root_moves(pos: &Position) -> RootMoves {
    RootMoves::new(
        pos.legal_moves()
            .into_iter()
            .enumerate()
            .map(|(i, mv)| RootMove::new(mv, i))
            .collect(),
    )
}

/// ルートを1回だけ探索して値と統計を返す
fn search_once(cfg: &MinimaxConfig, pos: &Position, depth: Depth) -> (Value, SearchStats) {
    let eval = HeuristicEvaluator::default();
    let limits = SearchLimits::unlimited();
    let tt = TranspositionTable::new(1 << 16);
    let ctx = SearchContext {
        config: cfg,
        evaluator: &eval,
        tt: if cfg.transposition { Some(&tt) } else { None },
        endgame: None,
        limits: &limits,
        thread_id: 0,
    };
    let mut st = SearchState::new(HistoryTable::new());
    let mut rm = root_moves(pos);
    let value = search_root(&mut st, &ctx, pos, &mut rm, depth, -Value::INFINITE, Value::INFINITE);
    assert!(st.abort.is_none());
    (value, st.stats)
}

fn plain_config() -> MinimaxConfig {
    MinimaxConfig {
        transposition: false,
        ..MinimaxConfig::default()
    }
}

#[test]
fn test_alpha_beta_matches_minimax() {
    let pos = Position::startpos(Variant::English);
    for depth in 1..=3 {
        let ab = plain_config();
        let mm = MinimaxConfig {
            alpha_beta: false,
            ..plain_config()
        };
        let (v_ab, s_ab) = search_once(&ab, &pos, depth);
        let (v_mm, s_mm) = search_once(&mm, &pos, depth);
        assert_eq!(v_ab, v_mm, "depth {depth}");
        assert!(s_ab.nodes <= s_mm.nodes, "depth {depth}");
    }
}

#[test]
fn test_transposition_table_does_not_change_value() {
    let pos = Position::startpos(Variant::English);
    let with_tt = MinimaxConfig::default();
    let (v_tt, stats) = search_once(&with_tt, &pos, 4);
    let (v_plain, _) = search_once(&plain_config(), &pos, 4);
    assert_eq!(v_tt, v_plain);
    assert!(stats.tt_hits > 0);
}

#[test]
fn test_immediate_win_is_found() {
    let pos = Position::from_fen(Variant::English, "W:W10:B6").unwrap();
    let (value, _) = search_once(&MinimaxConfig::default(), &pos, 3);
    assert_eq!(value, Value::win_in(1));
}

#[test]
fn test_loss_in_two_from_losing_side() {
    // 黒の2手はどちらも最後の駒を取られる
    let pos = Position::from_fen(Variant::English, "B:W13,14:B6").unwrap();
    assert_eq!(pos.legal_moves().len(), 2);
    let (value, _) = search_once(&MinimaxConfig::default(), &pos, 4);
    assert_eq!(value, Value::loss_in(2));
}

#[test]
fn test_stop_flag_aborts_search() {
    let pos = Position::startpos(Variant::English);
    let cfg = MinimaxConfig::default();
    let eval = HeuristicEvaluator::default();
    let limits = SearchLimits::unlimited();
    limits.stop.request_stop();
    let ctx = SearchContext {
        config: &cfg,
        evaluator: &eval,
        tt: None,
        endgame: None,
        limits: &limits,
        thread_id: 0,
    };
    let mut st = SearchState::new(HistoryTable::new());
    let mut rm = root_moves(&pos);
    search_root(&mut st, &ctx, &pos, &mut rm, 8, -Value::INFINITE, Value::INFINITE);
    assert_eq!(st.abort, Some(AbortReason::Stopped));
}

#[test]
fn test_lmr_reduces_late_quiet_moves() {
    let pos = Position::startpos(Variant::English);
    let cfg = MinimaxConfig {
        lmr: true,
        ..MinimaxConfig::default()
    };
    let (_, stats) = search_once(&cfg, &pos, 6);
    assert!(stats.lmr_reductions > 0);
    assert!(stats.lmr_researches <= stats.lmr_reductions);
}

#[test]
fn test_null_move_cuts_in_quiet_positions() {
    let pos = Position::startpos(Variant::English);
    let cfg = MinimaxConfig {
        null_move: true,
        ..MinimaxConfig::default()
    };
    let (value, stats) = search_once(&cfg, &pos, 6);
    assert!(stats.null_move_cutoffs > 0);
    assert!(!value.is_decisive());
}

#[test]
fn test_qsearch_resolves_forced_captures() {
    let cfg = MinimaxConfig::default();
    let eval = HeuristicEvaluator::default();
    let limits = SearchLimits::unlimited();
    let ctx = SearchContext {
        config: &cfg,
        evaluator: &eval,
        tt: None,
        endgame: None,
        limits: &limits,
        thread_id: 0,
    };
    let mut st = SearchState::new(HistoryTable::new());

    // 取れば黒の駒がなくなる
    let pos = Position::from_fen(Variant::English, "W:W22,30:B18").unwrap();
    let v = qsearch(&mut st, &ctx, &pos, 0, -Value::INFINITE, Value::INFINITE, 0);
    assert_eq!(v, Value::win_in(1));

    // 捕獲がなければ静的評価
    let quiet = Position::from_fen(Variant::English, "W:W18:B22").unwrap();
    let v = qsearch(&mut st, &ctx, &quiet, 0, -Value::INFINITE, Value::INFINITE, 0);
    assert_eq!(v, static_eval(&ctx, &quiet));
    assert!(st.stats.qnodes >= 3);
}

#[test]
fn test_depth_zero_without_quiescence_is_static() {
    let cfg = MinimaxConfig {
        quiescence: false,
        ..MinimaxConfig::default()
    };
    let eval = HeuristicEvaluator::default();
    let limits = SearchLimits::unlimited();
    let ctx = SearchContext {
        config: &cfg,
        evaluator: &eval,
        tt: None,
        endgame: None,
        limits: &limits,
        thread_id: 0,
    };
    let mut st = SearchState::new(HistoryTable::new());
    let pos = Position::from_fen(Variant::English, "W:W22,30:B18").unwrap();
    let v = search_node(&mut st, &ctx, &pos, 0, -Value::INFINITE, Value::INFINITE, 1, true);
    assert_eq!(v, static_eval(&ctx, &pos));
}
