//! 探索ヘルパー関数群
//!
//! 中断チェック、評価、読み筋の復元等の基本操作。

use crate::position::Position;
use crate::tt::TranspositionTable;
use crate::types::{Move, Value};

use super::alpha_beta::{SearchContext, SearchState};

// =============================================================================
// 中断チェック
// =============================================================================

/// 実際に時計と停止フラグを見る間隔（ノード数）
pub(super) const CHECK_INTERVAL: i32 = 512;

/// 中断チェック
#[inline]
pub(super) fn check_abort(st: &mut SearchState, ctx: &SearchContext<'_>) -> bool {
    // すでに中断している場合は即座に返す
    if st.abort.is_some() {
        return true;
    }

    // 頻度制御：512回に1回だけ実際のチェックを行う
    st.calls_cnt -= 1;
    if st.calls_cnt > 0 {
        return false;
    }
    st.calls_cnt = CHECK_INTERVAL;

    if let Some(reason) = ctx.limits.poll() {
        log::debug!(
            "worker {} aborting: {:?} after {} nodes",
            ctx.thread_id,
            reason,
            st.stats.nodes
        );
        st.abort = Some(reason);
        return true;
    }
    false
}

// =============================================================================
// 評価
// =============================================================================

/// 静的評価（手番側視点、勝敗スコアの範囲には入れない）
#[inline]
pub(super) fn static_eval(ctx: &SearchContext<'_>, pos: &Position) -> Value {
    ctx.evaluator
        .evaluate(pos)
        .max(Value::LOSS_IN_MAX_PLY + 1)
        .min(Value::WIN_IN_MAX_PLY - 1)
}

// =============================================================================
// 読み筋
// =============================================================================

/// 置換表を辿って読み筋を復元する
///
/// 先頭は必ず `best`。置換表の指し手が合法手に一致しなくなるか、
/// 局面が繰り返したら打ち切る。
pub(super) fn extract_pv(
    tt: Option<&TranspositionTable>,
    pos: &Position,
    best: &Move,
    max_len: usize,
) -> Vec<Move> {
    let mut pv = vec![best.clone()];
    let Some(tt) = tt else {
        return pv;
    };

    let mut seen = vec![pos.key()];
    let mut cur = pos.do_move(best);
    while pv.len() < max_len {
        if seen.contains(&cur.key()) || cur.outcome().is_some() {
            break;
        }
        seen.push(cur.key());
        let Some(key16) = tt.probe(cur.key_with_clock()).and_then(|e| e.move_key) else {
            break;
        };
        let Some(mv) = cur.legal_moves().into_iter().find(|m| m.key16() == key16) else {
            break;
        };
        cur = cur.do_move(&mv);
        pv.push(mv);
    }
    pv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bound, Variant};

    #[test]
    fn test_extract_pv_follows_tt_moves() {
        let pos = Position::startpos(Variant::English);
        let tt = TranspositionTable::new(1 << 12);
        let first = pos.legal_moves()[0].clone();
        let after = pos.do_move(&first);
        let reply = after.legal_moves()[0].clone();
        tt.store(after.key_with_clock(), Value::ZERO, 3, Bound::Exact, Some(reply.key16()));

        let pv = extract_pv(Some(&tt), &pos, &first, 8);
        assert_eq!(pv.len(), 2);
        assert_eq!(pv[0], first);
        assert_eq!(pv[1], reply);
    }

    #[test]
    fn test_extract_pv_without_tt() {
        let pos = Position::startpos(Variant::English);
        let first = pos.legal_moves()[0].clone();
        assert_eq!(extract_pv(None, &pos, &first, 8), vec![first]);
    }
}
