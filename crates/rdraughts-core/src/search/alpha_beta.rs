//! アルファベータ探索の本体
//!
//! 探索は自由関数で書き、ワーカーごとの可変状態を `SearchState`、
//! 共有の読み取り専用データを `SearchContext` にまとめて渡す。
//!
//! 値はすべて手番側視点（negamax）。fail-soft。

use crate::controller::{AbortReason, SearchLimits};
use crate::eval::Evaluator;
use crate::position::Position;
use crate::result::SearchStats;
use crate::tt::TranspositionTable;
use crate::types::{Bound, Depth, Move, Value};

use super::config::MinimaxConfig;
use super::endgame::EndgameOracle;
use super::history::{HistoryTable, KillerTable};
use super::movepicker::{ScoredMove, order_moves};
use super::pruning::{lmr_reduction, try_null_move_pruning};
use super::qsearch::qsearch;
use super::search_helpers::{CHECK_INTERVAL, check_abort, static_eval};
use super::types::{RootMoves, SEARCH_PLY_LIMIT, value_from_tt, value_to_tt};

// =============================================================================
// 状態とコンテキスト
// =============================================================================

/// ワーカーごとの可変状態
pub(super) struct SearchState {
    pub sel_depth: i32,
    pub abort: Option<AbortReason>,
    pub calls_cnt: i32,
    pub killers: KillerTable,
    pub history: HistoryTable,
    pub stats: SearchStats,
}

impl SearchState {
    pub fn new(history: HistoryTable) -> Self {
        Self {
            sel_depth: 0,
            abort: None,
            calls_cnt: CHECK_INTERVAL,
            killers: KillerTable::new(),
            history,
            stats: SearchStats::default(),
        }
    }
}

/// 探索中に変化しない共有データ
#[derive(Clone, Copy)]
pub(super) struct SearchContext<'a> {
    pub config: &'a MinimaxConfig,
    pub evaluator: &'a dyn Evaluator,
    pub tt: Option<&'a TranspositionTable>,
    pub endgame: Option<&'a EndgameOracle>,
    pub limits: &'a SearchLimits,
    pub thread_id: usize,
}

impl SearchContext<'_> {
    /// 置換表の値を信用できる深さか
    ///
    /// 決定的な並列探索では、同じ深さの探索結果のみを使う。
    /// 深い結果は浅い探索の値の境界にならず、ワーカーの到着順で値が変わる。
    #[inline]
    fn tt_depth_ok(&self, entry_depth: Depth, depth: Depth) -> bool {
        if self.config.parallel && self.config.deterministic_ordering {
            entry_depth == depth
        } else {
            entry_depth >= depth
        }
    }
}

// =============================================================================
// 内部ノード
// =============================================================================

/// 内部ノードの探索
#[allow(clippy::too_many_arguments)]
pub(super) fn search_node(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &Position,
    depth: Depth,
    mut alpha: Value,
    mut beta: Value,
    ply: i32,
    allow_null: bool,
) -> Value {
    let cfg = ctx.config;

    if check_abort(st, ctx) {
        return Value::ZERO;
    }
    st.stats.nodes += 1;
    st.sel_depth = st.sel_depth.max(ply);

    // 終局判定
    let us = pos.side_to_move();
    if pos.count(us) == 0 {
        return Value::loss_in(ply);
    }
    let moves = pos.legal_moves();
    if moves.is_empty() {
        return Value::loss_in(ply);
    }
    if pos.is_quiet_draw() {
        return Value::DRAW;
    }
    if ply >= SEARCH_PLY_LIMIT {
        return static_eval(ctx, pos);
    }

    // 終盤の証明探索
    if let Some(oracle) = ctx.endgame {
        if let Some(v) = oracle.probe(pos, ply, ctx.limits) {
            st.stats.endgame_hits += 1;
            return v;
        }
    }

    if depth <= 0 {
        return if cfg.quiescence {
            qsearch(st, ctx, pos, 0, alpha, beta, ply)
        } else {
            static_eval(ctx, pos)
        };
    }

    if !cfg.alpha_beta {
        alpha = -Value::INFINITE;
        beta = Value::INFINITE;
    }

    // 置換表
    let key = pos.key_with_clock();
    let tt = if cfg.transposition { ctx.tt } else { None };
    let mut tt_move = None;
    if let Some(entry) = tt.and_then(|t| t.probe(key)) {
        st.stats.tt_hits += 1;
        tt_move = entry.move_key;
        if ctx.tt_depth_ok(entry.depth, depth) {
            let v = value_from_tt(entry.value, ply);
            match entry.bound {
                Bound::Exact => {
                    st.stats.tt_cutoffs += 1;
                    return v;
                }
                Bound::Lower if cfg.alpha_beta => alpha = alpha.max(v),
                Bound::Upper if cfg.alpha_beta => beta = beta.min(v),
                _ => {}
            }
            if alpha >= beta {
                st.stats.tt_cutoffs += 1;
                return v;
            }
        }
    }

    let capture_forced = moves[0].is_capture();

    // Null move pruning
    if allow_null && !capture_forced {
        if let Some(v) = try_null_move_pruning(st, ctx, pos, depth, beta, ply) {
            return v;
        }
        if st.abort.is_some() {
            return Value::ZERO;
        }
    }

    let original_alpha = alpha;
    let ordered = order_moves(st, ctx, us, moves, tt_move, ply);
    let mut best_value = -Value::INFINITE;
    let mut best_move: Option<&Move> = None;

    for (move_count, ScoredMove { mv, .. }) in ordered.iter().enumerate() {
        let child = pos.do_move(mv);
        let new_depth = depth - 1;
        let reduction = lmr_reduction(st, ctx, depth, move_count, mv, ply);

        let mut value;
        if reduction > 0 {
            st.stats.lmr_reductions += 1;
            value = -search_node(
                st,
                ctx,
                &child,
                new_depth - reduction,
                -(alpha + 1),
                -alpha,
                ply + 1,
                true,
            );
            if value > alpha && st.abort.is_none() {
                st.stats.lmr_researches += 1;
                value = -search_node(st, ctx, &child, new_depth, -beta, -alpha, ply + 1, true);
            }
        } else {
            value = -search_node(st, ctx, &child, new_depth, -beta, -alpha, ply + 1, true);
        }

        if st.abort.is_some() {
            return Value::ZERO;
        }

        if value > best_value {
            best_value = value;
            best_move = Some(mv);
        }
        if cfg.alpha_beta && value > alpha {
            alpha = value;
            if alpha >= beta {
                if mv.is_quiet() {
                    if cfg.killer_moves {
                        st.killers.record(ply, mv);
                    }
                    if cfg.history_heuristic {
                        st.history.record_cutoff(us, mv, depth);
                    }
                }
                break;
            }
        }
        if cfg.butterfly_heuristic && mv.is_quiet() {
            st.history.record_attempt(us, mv, depth);
        }
    }

    if let Some(tt) = tt {
        let bound = if !cfg.alpha_beta {
            Bound::Exact
        } else if best_value >= beta {
            Bound::Lower
        } else if best_value > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        let move_key = match bound {
            Bound::Upper => None,
            _ => best_move.map(Move::key16),
        };
        tt.store(key, value_to_tt(best_value, ply), depth, bound, move_key);
    }

    best_value
}

// =============================================================================
// ルート
// =============================================================================

/// ルートの1手を探索する（並列ワーカーも使う）
pub(super) fn search_root_move(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &Position,
    mv: &Move,
    depth: Depth,
    alpha: Value,
    beta: Value,
) -> Value {
    st.stats.nodes += 1;
    let child = pos.do_move(mv);
    -search_node(st, ctx, &child, depth - 1, -beta, -alpha, 1, true)
}

/// ルート局面の探索（逐次）
///
/// 各手の評価を `root_moves` に書き込み、最善値を返す。
/// 中断した場合の戻り値は意味を持たない（呼び出し側が `st.abort` を見る）。
pub(super) fn search_root(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &Position,
    root_moves: &mut RootMoves,
    depth: Depth,
    mut alpha: Value,
    beta: Value,
) -> Value {
    let cfg = ctx.config;
    let us = pos.side_to_move();
    let original_alpha = alpha;
    let mut best_value = -Value::INFINITE;
    let mut best_idx = None;

    for i in 0..root_moves.len() {
        let mv = root_moves[i].mv.clone();
        let value = search_root_move(st, ctx, pos, &mv, depth, alpha, beta);
        if st.abort.is_some() {
            return best_value;
        }
        root_moves[i].score = value;

        if value > best_value {
            best_value = value;
            best_idx = Some(i);
        }
        if cfg.alpha_beta && value > alpha {
            alpha = value;
            if alpha >= beta {
                if mv.is_quiet() && cfg.history_heuristic {
                    st.history.record_cutoff(us, &mv, depth);
                }
                break;
            }
        }
        if cfg.butterfly_heuristic && mv.is_quiet() {
            st.history.record_attempt(us, &mv, depth);
        }
    }

    if let Some(idx) = best_idx {
        store_root(ctx, pos, &root_moves[idx].mv, best_value, depth, original_alpha, beta);
    }
    best_value
}

/// ルート局面の結果を置換表に書く
pub(super) fn store_root(
    ctx: &SearchContext<'_>,
    pos: &Position,
    best: &Move,
    value: Value,
    depth: Depth,
    alpha: Value,
    beta: Value,
) {
    let cfg = ctx.config;
    let Some(tt) = ctx.tt.filter(|_| cfg.transposition) else {
        return;
    };
    let bound = if !cfg.alpha_beta || (value > alpha && value < beta) {
        Bound::Exact
    } else if value >= beta {
        Bound::Lower
    } else {
        Bound::Upper
    };
    tt.store(pos.key_with_clock(), value_to_tt(value, 0), depth, bound, Some(best.key16()));
}
