//! 指し手の並べ替え
//!
//! 優先順位:
//! 1. 置換表の最善手
//! 2. 捕獲（取る駒が多いほど先）
//! 3. 成り
//! 4. キラー手（このplyでbetaカットを起こした静かな手）
//! 5. History / butterfly の重み
//! 6. 残り（指し手生成順）
//!
//! 安定ソートなので同点の手は生成順を保つ。

use crate::types::{Color, Move, MoveList};

use super::alpha_beta::{SearchContext, SearchState};
use super::history::HISTORY_SCORE_MAX;

// =============================================================================
// 定数
// =============================================================================

const TT_MOVE_SCORE: i32 = 1_000_000;
const CAPTURE_SCORE: i32 = 500_000;
const CAPTURE_PER_PIECE: i32 = 25_000;
const CAPTURE_PER_KING: i32 = 10_000;
const PROMOTION_SCORE: i32 = 150_000;
const KILLER_SCORES: [i32; 2] = [120_000, 110_000];

const _: () = assert!(HISTORY_SCORE_MAX < KILLER_SCORES[1]);

/// 並べ替え済みの指し手
#[derive(Debug, Clone)]
pub(super) struct ScoredMove {
    pub mv: Move,
    pub score: i32,
    /// 指し手生成順のインデックス
    pub gen_index: usize,
}

/// 置換表の指し手指紋が一致するか
#[inline]
pub(super) fn is_tt_move(mv: &Move, tt_move: Option<u16>) -> bool {
    tt_move.is_some_and(|k| mv.key16() == k)
}

/// 指し手に並べ替え用のスコアを付ける
fn score_move(
    st: &SearchState,
    ctx: &SearchContext<'_>,
    us: Color,
    mv: &Move,
    tt_move: Option<u16>,
    ply: i32,
) -> i32 {
    let cfg = ctx.config;
    if is_tt_move(mv, tt_move) {
        return TT_MOVE_SCORE;
    }
    let mut score = 0;
    if mv.is_capture() {
        score += CAPTURE_SCORE
            + CAPTURE_PER_PIECE * mv.capture_count() as i32
            + CAPTURE_PER_KING * mv.captured_kings() as i32;
    }
    if mv.is_promotion() {
        score += PROMOTION_SCORE;
    }
    if !mv.is_capture() {
        if cfg.killer_moves {
            if let Some(slot) = st.killers.slot_of(ply, mv) {
                return score + KILLER_SCORES[slot];
            }
        }
        if cfg.history_heuristic {
            score += st.history.score(us, mv, cfg.butterfly_heuristic);
        }
    }
    score
}

/// 指し手を並べ替える
///
/// `move_ordering` が無効なら生成順のまま返す。
pub(super) fn order_moves(
    st: &SearchState,
    ctx: &SearchContext<'_>,
    us: Color,
    moves: MoveList,
    tt_move: Option<u16>,
    ply: i32,
) -> Vec<ScoredMove> {
    let ordering = ctx.config.move_ordering;
    let mut scored: Vec<ScoredMove> = moves
        .into_iter()
        .enumerate()
        .map(|(gen_index, mv)| {
            let score = if ordering {
                score_move(st, ctx, us, &mv, tt_move, ply)
            } else {
                0
            };
            ScoredMove {
                mv,
                score,
                gen_index,
            }
        })
        .collect();
    if ordering {
        scored.sort_by(|a, b| b.score.cmp(&a.score));
    }
    scored
}
