//! プレイアウトと葉の評価
//!
//! 値はすべて [-1, 1] の実数。評価値は `tanh(score / scale)` で正規化する。

use rand::Rng;

use crate::eval::Evaluator;
use crate::position::Position;
use crate::types::{Color, Depth, Move, Value, Variant};

use super::config::{LeafEvaluation, MctsConfig, RolloutPolicy};
use super::node::outcome_reward;

/// 正規化のスケール（10×10 は駒が多く評価値の幅も大きいので緩める）
#[inline]
fn eval_scale(variant: Variant) -> f64 {
    match variant {
        Variant::English => 300.0,
        Variant::International => 500.0,
    }
}

/// 評価値を [-1, 1] に正規化する
#[inline]
pub fn normalize_eval(score: Value, variant: Variant) -> f64 {
    (score.raw() as f64 / eval_scale(variant)).tanh()
}

/// 手番側から見た正規化済みの評価を、指定した側から見た値にする
#[inline]
fn from_perspective(value: f64, pos: &Position, perspective: Color) -> f64 {
    if pos.side_to_move() == perspective { value } else { -value }
}

/// 正規化した値での浅いnegamax（手番側視点）
pub fn shallow_negamax(evaluator: &dyn Evaluator, pos: &Position, depth: Depth) -> f64 {
    if let Some(outcome) = pos.outcome() {
        return outcome_reward(outcome, pos.side_to_move());
    }
    if depth <= 0 {
        return normalize_eval(evaluator.evaluate(pos), pos.variant());
    }
    pos.legal_moves()
        .iter()
        .map(|mv| -shallow_negamax(evaluator, &pos.do_move(mv), depth - 1))
        .fold(f64::NEG_INFINITY, f64::max)
}

/// 各手を `depth` plyの読みで評価し、最大の手を選ぶ（同点はランダム）
fn best_by_search<R: Rng + ?Sized>(
    evaluator: &dyn Evaluator,
    pos: &Position,
    moves: &[Move],
    depth: Depth,
    rng: &mut R,
) -> usize {
    let mut best = f64::NEG_INFINITY;
    let mut ties: Vec<usize> = Vec::new();
    for (i, mv) in moves.iter().enumerate() {
        let v = -shallow_negamax(evaluator, &pos.do_move(mv), depth - 1);
        if v > best {
            best = v;
            ties.clear();
            ties.push(i);
        } else if v == best {
            ties.push(i);
        }
    }
    match ties.len() {
        0 => 0,
        1 => ties[0],
        n => ties[rng.random_range(0..n)],
    }
}

/// 1手で最も評価の高い手（ランダムなしの最初の最善手）
///
/// 1回も反復できなかったときの代替に使う。
pub fn best_one_ply(evaluator: &dyn Evaluator, pos: &Position) -> Option<(Move, f64)> {
    pos.legal_moves()
        .into_iter()
        .map(|mv| {
            let v = -shallow_negamax(evaluator, &pos.do_move(&mv), 0);
            (mv, v)
        })
        .fold(None, |best: Option<(Move, f64)>, (mv, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((mv, v)),
        })
}

/// プレイアウトの1手を選ぶ
pub fn choose_rollout_move<R: Rng + ?Sized>(
    policy: RolloutPolicy,
    evaluator: &dyn Evaluator,
    pos: &Position,
    moves: &[Move],
    rng: &mut R,
) -> usize {
    match policy {
        RolloutPolicy::UniformRandom => rng.random_range(0..moves.len()),
        RolloutPolicy::Heuristic => best_by_search(evaluator, pos, moves, 1, rng),
        RolloutPolicy::MinimaxGuided { depth } => best_by_search(evaluator, pos, moves, depth, rng),
    }
}

/// 一様ランダムに終局まで指す（`max_plies` で終わらなければ引き分け）
fn random_playout<R: Rng + ?Sized>(pos: &Position, perspective: Color, max_plies: u32, rng: &mut R) -> f64 {
    let mut cur = pos.clone();
    for _ in 0..max_plies {
        if let Some(outcome) = cur.outcome() {
            return outcome_reward(outcome, perspective);
        }
        let moves = cur.legal_moves();
        let mv = &moves[rng.random_range(0..moves.len())];
        cur = cur.do_move(mv);
    }
    cur.outcome().map_or(0.0, |o| outcome_reward(o, perspective))
}

/// 打ち切った局面の評価（`perspective` 側から見た値）
pub fn leaf_value<R: Rng + ?Sized>(
    leaf: LeafEvaluation,
    evaluator: &dyn Evaluator,
    pos: &Position,
    perspective: Color,
    remaining_plies: u32,
    rng: &mut R,
) -> f64 {
    match leaf {
        LeafEvaluation::RandomTerminal => random_playout(pos, perspective, remaining_plies, rng),
        LeafEvaluation::Heuristic => {
            let v = normalize_eval(evaluator.evaluate(pos), pos.variant());
            from_perspective(v, pos, perspective)
        }
        LeafEvaluation::ShallowMinimax { depth } => {
            let v = shallow_negamax(evaluator, pos, depth);
            from_perspective(v, pos, perspective)
        }
    }
}

/// ノードの局面からのシミュレーション
///
/// 戻り値はこの局面に指した側（手番の反対側）から見た報酬。
pub fn simulate<R: Rng + ?Sized>(
    cfg: &MctsConfig,
    evaluator: &dyn Evaluator,
    pos: &Position,
    rng: &mut R,
) -> f64 {
    let perspective = !pos.side_to_move();
    let max_depth = cfg.max_rollout_depth;
    let cutoff = cfg.cutoff_depth();
    let mut cur = pos.clone();
    for ply in 0..max_depth {
        if let Some(outcome) = cur.outcome() {
            return outcome_reward(outcome, perspective);
        }
        if ply >= cutoff {
            return leaf_value(cfg.leaf_evaluation, evaluator, &cur, perspective, max_depth - ply, rng);
        }
        let moves = cur.legal_moves();
        let idx = choose_rollout_move(cfg.rollout_policy, evaluator, &cur, &moves, rng);
        cur = cur.do_move(&moves[idx]);
    }
    match cur.outcome() {
        Some(outcome) => outcome_reward(outcome, perspective),
        None => leaf_value(cfg.leaf_evaluation, evaluator, &cur, perspective, 0, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::HeuristicEvaluator;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_heuristic_leaf_is_not_saturated() {
        // 白2枚 vs 黒1枚
        let pos = Position::from_fen(Variant::English, "W:W21,22:B9").unwrap();
        let eval = HeuristicEvaluator::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let v = leaf_value(LeafEvaluation::Heuristic, &eval, &pos, Color::White, 0, &mut rng);
        assert!(v > 0.05 && v < 0.95, "{v}");
        let b = leaf_value(LeafEvaluation::Heuristic, &eval, &pos, Color::Black, 0, &mut rng);
        assert!((v + b).abs() < 1e-12);
    }

    #[test]
    fn test_scaling_is_softer_on_large_boards() {
        let v = Value::new(200);
        assert!(normalize_eval(v, Variant::English) > normalize_eval(v, Variant::International));
    }

    #[test]
    fn test_negamax_sees_the_lost_position() {
        // 黒はどちらを指しても次に最後の駒を取られる
        let pos = Position::from_fen(Variant::English, "B:W13,14:B6").unwrap();
        let eval = HeuristicEvaluator::default();
        assert_eq!(shallow_negamax(&eval, &pos, 2), -1.0);
        for mv in pos.legal_moves().iter() {
            assert_eq!(shallow_negamax(&eval, &pos.do_move(mv), 1), 1.0);
        }
    }

    #[test]
    fn test_heuristic_rollout_picks_a_best_move() {
        let pos = Position::startpos(Variant::English);
        let eval = HeuristicEvaluator::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let moves = pos.legal_moves();
        let scores: Vec<f64> = moves
            .iter()
            .map(|mv| -shallow_negamax(&eval, &pos.do_move(mv), 0))
            .collect();
        let best = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for _ in 0..10 {
            let idx = choose_rollout_move(RolloutPolicy::Heuristic, &eval, &pos, &moves, &mut rng);
            assert_eq!(scores[idx], best);
        }
    }

    #[test]
    fn test_simulation_is_reproducible_with_seed() {
        let pos = Position::startpos(Variant::English);
        let eval = HeuristicEvaluator::default();
        let cfg = MctsConfig::default();
        let run = |seed| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            (0..20).map(|_| simulate(&cfg, &eval, &pos, &mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_terminal_child_is_a_win_for_the_mover() {
        let pos = Position::from_fen(Variant::English, "W:W10:B6").unwrap();
        let eval = HeuristicEvaluator::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let child = pos.do_move(&pos.legal_moves()[0]);
        assert_eq!(simulate(&MctsConfig::default(), &eval, &child, &mut rng), 1.0);
        let (best, v) = best_one_ply(&eval, &pos).unwrap();
        assert!(best.is_capture());
        assert_eq!(v, 1.0);
    }
}
