//! 探索用の補助型
//!
//! - `RootMove` / `RootMoves`: ルートの候補手と反復ごとの評価
//! - `value_to_tt` / `value_from_tt`: 勝敗スコアのply補正

use crate::types::{MAX_PLY, Move, Value};

/// ルートの候補手
#[derive(Debug, Clone)]
pub struct RootMove {
    pub mv: Move,
    /// 今回の反復での評価（未探索なら -INFINITE）
    pub score: Value,
    /// 前回完了した反復での評価
    pub previous_score: Value,
    /// 指し手生成順のインデックス（決定的なタイブレーク用）
    pub gen_index: usize,
}

impl RootMove {
    pub fn new(mv: Move, gen_index: usize) -> Self {
        Self {
            mv,
            score: -Value::INFINITE,
            previous_score: -Value::INFINITE,
            gen_index,
        }
    }
}

/// ルートの候補手リスト
#[derive(Debug, Clone, Default)]
pub struct RootMoves {
    moves: Vec<RootMove>,
}

impl RootMoves {
    pub fn new(moves: Vec<RootMove>) -> Self {
        Self { moves }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&RootMove> {
        self.moves.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RootMove> {
        self.moves.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RootMove> {
        self.moves.iter_mut()
    }

    /// 反復の開始時に今回の評価をリセットする
    pub fn reset_scores(&mut self) {
        for rm in &mut self.moves {
            rm.score = -Value::INFINITE;
        }
    }

    /// 評価の降順に安定ソートする（同点は前回の順序を保つ）
    pub fn sort(&mut self) {
        self.moves.sort_by(|a, b| b.score.cmp(&a.score));
    }

    /// 指定インデックスの手を先頭に移し、残りを評価順に並べる
    pub fn promote(&mut self, idx: usize) {
        if idx < self.moves.len() {
            let best = self.moves.remove(idx);
            self.moves.sort_by(|a, b| b.score.cmp(&a.score));
            self.moves.insert(0, best);
        }
    }

    /// 反復の完了時に今回の評価を前回の評価として保存する
    pub fn commit(&mut self) {
        for rm in &mut self.moves {
            rm.previous_score = rm.score;
        }
    }
}

impl std::ops::Index<usize> for RootMoves {
    type Output = RootMove;

    fn index(&self, idx: usize) -> &RootMove {
        &self.moves[idx]
    }
}

impl std::ops::IndexMut<usize> for RootMoves {
    fn index_mut(&mut self, idx: usize) -> &mut RootMove {
        &mut self.moves[idx]
    }
}

/// 置換表に保存する値に変換（勝敗スコアをルート基準から現局面基準へ）
#[inline]
pub fn value_to_tt(v: Value, ply: i32) -> Value {
    if v.is_win() {
        v + ply
    } else if v.is_loss() {
        v - ply
    } else {
        v
    }
}

/// 置換表の値を現在のplyに合わせて戻す
#[inline]
pub fn value_from_tt(v: Value, ply: i32) -> Value {
    if v.is_win() {
        (v - ply).max(Value::WIN_IN_MAX_PLY)
    } else if v.is_loss() {
        (v + ply).min(Value::LOSS_IN_MAX_PLY)
    } else {
        v
    }
}

/// 探索深さの上限（ルートからのply）
pub const SEARCH_PLY_LIMIT: i32 = MAX_PLY - 1;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn test_value_tt_roundtrip() {
        let v = Value::win_in(7);
        let stored = value_to_tt(v, 3);
        assert_eq!(stored, Value::win_in(4));
        assert_eq!(value_from_tt(stored, 3), v);

        let l = Value::loss_in(6);
        assert_eq!(value_from_tt(value_to_tt(l, 2), 2), l);
        assert_eq!(value_to_tt(Value::new(55), 9), Value::new(55));
    }

    #[test]
    fn test_root_moves_sort_is_stable() {
        let mk = |c: u8| Move::step(Square::new(5, c), Square::new(4, c + 1), false);
        let mut rms = RootMoves::new(vec![
            RootMove::new(mk(0), 0),
            RootMove::new(mk(2), 1),
            RootMove::new(mk(4), 2),
        ]);
        let scores = [Value::new(10), Value::new(30), Value::new(10)];
        for (rm, s) in rms.iter_mut().zip(scores) {
            rm.score = s;
        }
        rms.sort();
        let order: Vec<usize> = rms.iter().map(|rm| rm.gen_index).collect();
        assert_eq!(order, vec![1, 0, 2]);

        rms.promote(2);
        let order: Vec<usize> = rms.iter().map(|rm| rm.gen_index).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }
}
