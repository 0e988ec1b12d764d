//! ヒューリスティック評価関数
//!
//! 駒ごとの項目（駒価値、前進度、中央度、自陣最下段の守り）に、
//! 成り間近の兵、盤端、斜めの連携、機動力、捕獲の圧力を加える。
//! 重みは兵1枚 = 100 の単位。

use serde::{Deserialize, Serialize};

use crate::position::{Position, count_captures};
use crate::types::{Color, Piece, Square, Value};

use super::Evaluator;

/// 評価の重み
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvalWeights {
    pub man: f64,
    pub king: f64,
    pub progress: f64,
    pub center: f64,
    pub back_row: f64,
    pub mobility: f64,
    pub promotion: f64,
    pub edge: f64,
    pub support: f64,
    pub capture_pressure: f64,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            man: 100.0,
            king: 180.0,
            progress: 10.0,
            center: 8.0,
            back_row: 12.0,
            mobility: 5.0,
            promotion: 14.0,
            edge: 6.0,
            support: 7.0,
            capture_pressure: 4.0,
        }
    }
}

/// ヒューリスティック評価関数
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEvaluator {
    weights: EvalWeights,
}

impl HeuristicEvaluator {
    pub fn new(weights: EvalWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    /// 指定色から見た評価（浮動小数、兵 = 100）
    pub fn score_for(&self, pos: &Position, perspective: Color) -> f64 {
        let w = &self.weights;
        let size = pos.variant().size();
        let mut material = [0.0f64; Color::NUM];
        let mut promotion = [0.0f64; Color::NUM];
        let mut edges = [0.0f64; Color::NUM];
        let mut support = [0.0f64; Color::NUM];

        for color in [Color::White, Color::Black] {
            let c = color.index();
            for (sq, pc) in pos.pieces(color) {
                let base = if pc.is_king() { w.king } else { w.man };
                material[c] += base
                    + w.progress * forward_progress(sq, pc, size)
                    + w.center * center_bias(sq, size)
                    + w.back_row * home_row_guard(sq, pc, size);
                promotion[c] += promotion_threat(sq, pc, size);
                edges[c] += edge_anchor(sq, size);
                support[c] += support_network(pos, sq, pc, size);
            }
        }

        let mobility = [
            pos.moves_for(Color::White).len() as f64,
            pos.moves_for(Color::Black).len() as f64,
        ];
        let pressure = [
            count_captures(pos, Color::White) as f64,
            count_captures(pos, Color::Black) as f64,
        ];

        let us = perspective.index();
        let them = perspective.opponent().index();
        material[us] - material[them]
            + w.mobility * (mobility[us] - mobility[them])
            + w.promotion * (promotion[us] - promotion[them])
            + w.edge * (edges[us] - edges[them])
            + w.support * (support[us] - support[them])
            + w.capture_pressure * (pressure[us] - pressure[them])
    }
}

impl Evaluator for HeuristicEvaluator {
    fn evaluate(&self, pos: &Position) -> Value {
        let raw = self.score_for(pos, pos.side_to_move()).round() as i32;
        let bound = Value::WIN_IN_MAX_PLY.raw() - 1;
        Value::new(raw.clamp(-bound, bound))
    }
}

// =============================================================================
// 各項目（0.0〜1.0）
// =============================================================================

/// 成りまでの近さ（キングは常に1）
fn forward_progress(sq: Square, pc: Piece, size: u8) -> f64 {
    if pc.is_king() {
        return 1.0;
    }
    let max_rank = (size - 1) as f64;
    match pc.color() {
        Color::White => (max_rank - sq.row() as f64) / max_rank,
        Color::Black => sq.row() as f64 / max_rank,
    }
}

/// 盤の中央への近さ
fn center_bias(sq: Square, size: u8) -> f64 {
    let center = (size - 1) as f64 / 2.0;
    let delta = (sq.row() as f64 - center).abs() + (sq.col() as f64 - center).abs();
    (1.0 - delta / (2.0 * center)).max(0.0)
}

/// 自陣最下段に残った兵（相手の成りを防ぐ）
fn home_row_guard(sq: Square, pc: Piece, size: u8) -> f64 {
    if pc.is_king() {
        return 0.0;
    }
    let home = match pc.color() {
        Color::White => size - 1,
        Color::Black => 0,
    };
    if sq.row() == home { 1.0 } else { 0.0 }
}

/// 成り間近の兵
fn promotion_threat(sq: Square, pc: Piece, size: u8) -> f64 {
    if pc.is_king() {
        return 0.0;
    }
    let max_rank = (size - 1) as f64;
    let target = match pc.color() {
        Color::White => 0.0,
        Color::Black => max_rank,
    };
    let distance = (sq.row() as f64 - target).abs();
    (1.0 - distance / max_rank).max(0.0)
}

/// 盤端の駒
fn edge_anchor(sq: Square, size: u8) -> f64 {
    let col = sq.col();
    if col == 0 || col == size - 1 {
        1.0
    } else if col == 1 || col == size - 2 {
        0.5
    } else {
        0.0
    }
}

/// 斜めに隣接する味方の数 / 4
fn support_network(pos: &Position, sq: Square, pc: Piece, size: u8) -> f64 {
    let mut n = 0;
    for (dr, dc) in [(-1, -1), (-1, 1), (1, -1), (1, 1)] {
        let friendly = sq
            .offset(dr, dc, 1, size)
            .and_then(|nb| pos.piece_on(nb))
            .is_some_and(|p| p.color() == pc.color());
        if friendly {
            n += 1;
        }
    }
    n as f64 / 4.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variant;

    #[test]
    fn test_startpos_is_symmetric() {
        // 初期局面は点対称なので評価は0
        for variant in [Variant::English, Variant::International] {
            let pos = Position::startpos(variant);
            assert_eq!(HeuristicEvaluator::default().evaluate(&pos), Value::ZERO);
        }
    }

    #[test]
    fn test_extra_man_is_favoured() {
        let pos = Position::from_fen(Variant::English, "W:W21,22,23:B1,2").unwrap();
        let eval = HeuristicEvaluator::default();
        assert!(eval.evaluate(&pos).raw() > 50);
        assert!(eval.evaluate(&pos.do_null_move()).raw() < -50);
    }

    #[test]
    fn test_king_outweighs_man() {
        let eval = HeuristicEvaluator::default();
        let man = Position::from_fen(Variant::English, "W:W18:B1").unwrap();
        let king = Position::from_fen(Variant::English, "W:WK18:B1").unwrap();
        assert!(eval.evaluate(&king) > eval.evaluate(&man));
    }
}
