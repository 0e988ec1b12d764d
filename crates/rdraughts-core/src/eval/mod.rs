//! 評価関数
//!
//! - `Evaluator`: 局面 → 評価値。**手番側から見た値**を返す
//! - `MaterialEvaluator`: 駒割りのみ
//! - `HeuristicEvaluator`: 駒割り + 配置・機動力・捕獲圧などの重み付き和
//!
//! 探索から複数スレッドで同時に呼ばれるため `Send + Sync` を要求する。

mod heuristic;

pub use heuristic::{EvalWeights, HeuristicEvaluator};

use crate::position::Position;
use crate::types::Value;

/// 評価関数のトレイト
///
/// 返す値は手番側視点（正なら手番側が有利）。勝敗確定スコアの範囲
/// （`Value::WIN_IN_MAX_PLY` 以上）は返してはならない。
pub trait Evaluator: Send + Sync {
    /// Evaluate position from side to move perspective
    fn evaluate(&self, pos: &Position) -> Value;
}

/// Implement Evaluator for Arc<T> where T: Evaluator
impl<T: Evaluator + ?Sized> Evaluator for std::sync::Arc<T> {
    fn evaluate(&self, pos: &Position) -> Value {
        (**self).evaluate(pos)
    }
}

impl<T: Evaluator + ?Sized> Evaluator for &T {
    fn evaluate(&self, pos: &Position) -> Value {
        (**self).evaluate(pos)
    }
}

/// 駒割りのみの評価関数
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, pos: &Position) -> Value {
        let us = pos.side_to_move();
        let them = !us;
        let score = Value::MAN_VALUE * (pos.men(us) as i32 - pos.men(them) as i32)
            + Value::KING_VALUE * (pos.kings(us) as i32 - pos.kings(them) as i32);
        Value::new(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variant;

    #[test]
    fn test_material_is_side_to_move_relative() {
        let pos = Position::from_fen(Variant::English, "W:W21,22:B1").unwrap();
        assert_eq!(MaterialEvaluator.evaluate(&pos), Value::new(100));
        let flipped = pos.do_null_move();
        assert_eq!(MaterialEvaluator.evaluate(&flipped), Value::new(-100));
    }

    #[test]
    fn test_startpos_material_is_balanced() {
        let pos = Position::startpos(Variant::International);
        assert_eq!(MaterialEvaluator.evaluate(&pos), Value::ZERO);
    }
}
