//! 枝刈りヘルパー群
//!
//! - Null Move Pruning
//! - Late Move Reductions

use crate::position::Position;
use crate::types::{Depth, Move, Value};

use super::alpha_beta::{SearchContext, SearchState, search_node};
use super::search_helpers::static_eval;

// =============================================================================
// Null Move Pruning
// =============================================================================

/// Null move を試せる最小の駒数（少ないとツークツワンクが多い）
const NULL_MOVE_MIN_PIECES: u32 = 4;

/// Null move pruning
///
/// 手番をパスしても浅い探索で beta を超えるなら、この局面はカットできる。
/// 呼び出し側で捕獲が強制されていないことを確認しておく。
pub(super) fn try_null_move_pruning(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &Position,
    depth: Depth,
    beta: Value,
    ply: i32,
) -> Option<Value> {
    let cfg = ctx.config;
    let r = cfg.null_move_reduction;
    if !cfg.null_move
        || ply == 0
        || depth <= r
        || pos.count(pos.side_to_move()) < NULL_MOVE_MIN_PIECES
        || beta.is_decisive()
        || static_eval(ctx, pos) < beta
    {
        return None;
    }

    let null_pos = pos.do_null_move();
    let value = -search_node(st, ctx, &null_pos, depth - 1 - r, -beta, -beta + 1, ply + 1, false);
    if st.abort.is_some() {
        return None;
    }
    if value >= beta {
        st.stats.null_move_cutoffs += 1;
        // パスで得た勝ちは証明にならない
        return Some(if value.is_win() { beta } else { value });
    }
    None
}

// =============================================================================
// Late Move Reductions
// =============================================================================

/// 後半の静かな手の削減量（0なら通常の深さで探索）
pub(super) fn lmr_reduction(
    st: &SearchState,
    ctx: &SearchContext<'_>,
    depth: Depth,
    move_count: usize,
    mv: &Move,
    ply: i32,
) -> Depth {
    let cfg = ctx.config;
    if !cfg.lmr
        || ply == 0
        || depth < cfg.lmr_min_depth
        || move_count < cfg.lmr_min_moves
        || !mv.is_quiet()
        || st.killers.slot_of(ply, mv).is_some()
    {
        return 0;
    }
    // 削減後も最低1手は読む
    cfg.lmr_reduction.min(depth - 2).max(0)
}
