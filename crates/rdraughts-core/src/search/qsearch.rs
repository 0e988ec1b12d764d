//! 静止探索
//!
//! 捕獲が強制されている局面だけを展開する。捕獲がなければ静的評価を返す。
//! 捕獲は義務なので stand pat は使わない。

use crate::position::Position;
use crate::types::{Depth, Value};

use super::alpha_beta::{SearchContext, SearchState};
use super::movepicker::order_moves;
use super::search_helpers::{check_abort, static_eval};
use super::types::SEARCH_PLY_LIMIT;

/// 静止探索
///
/// `qply` は静止探索に入ってからの深さ。`max_quiescence_depth` に達したら
/// 捕獲が残っていても静的評価で打ち切る。
pub(super) fn qsearch(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &Position,
    qply: Depth,
    mut alpha: Value,
    mut beta: Value,
    ply: i32,
) -> Value {
    let cfg = ctx.config;

    if check_abort(st, ctx) {
        return Value::ZERO;
    }
    st.stats.qnodes += 1;
    st.sel_depth = st.sel_depth.max(ply);

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
    if !moves[0].is_capture() || qply >= cfg.max_quiescence_depth || ply >= SEARCH_PLY_LIMIT {
        return static_eval(ctx, pos);
    }

    if !cfg.alpha_beta {
        alpha = -Value::INFINITE;
        beta = Value::INFINITE;
    }

    let mut best_value = -Value::INFINITE;
    for sm in order_moves(st, ctx, us, moves, None, ply) {
        let child = pos.do_move(&sm.mv);
        let value = -qsearch(st, ctx, &child, qply + 1, -beta, -alpha, ply + 1);
        if st.abort.is_some() {
            return Value::ZERO;
        }
        best_value = best_value.max(value);
        if cfg.alpha_beta && value > alpha {
            alpha = value;
            if alpha >= beta {
                break;
            }
        }
    }
    best_value
}
