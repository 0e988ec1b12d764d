//! JSON で受け取るエンジン設定
//!
//! キーは camelCase のフラットな形で、どのキーも省略できる。
//! 未知のキーは拒否せず `extra` に残して警告する。範囲外の値は丸めて警告する。
//! 型付きの `MinimaxConfig` / `MctsConfig` への変換は `normalize` で行う。

use std::collections::BTreeMap;
use std::fmt::Display;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mcts::{LeafEvaluation, MctsConfig, RolloutPolicy};
use crate::search::{ConfigAdjustment, MinimaxConfig};
use crate::types::Depth;

/// 探索アルゴリズム
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Minimax,
    Mcts,
}

/// プレイアウト方針の名前
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutPolicyName {
    #[default]
    Random,
    Heuristic,
    MinimaxGuided,
}

/// 葉の評価方法の名前
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafEvaluationName {
    #[default]
    RandomTerminal,
    HeuristicEval,
    MinimaxEval,
}

/// エンジン設定（JSON）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub algorithm: Algorithm,

    // ミニマックス
    pub depth: Depth,
    pub alpha_beta: bool,
    pub transposition: bool,
    pub tt_capacity: usize,
    pub move_ordering: bool,
    pub killer_moves: bool,
    pub iterative_deepening: bool,
    pub quiescence: bool,
    pub max_quiescence_depth: Depth,
    pub aspiration: bool,
    pub aspiration_window: i32,
    pub history_heuristic: bool,
    pub butterfly_heuristic: bool,
    pub null_move: bool,
    pub null_move_reduction: Depth,
    pub lmr: bool,
    pub lmr_min_depth: Depth,
    pub lmr_min_moves: usize,
    pub lmr_reduction: Depth,
    pub deterministic_ordering: bool,
    pub endgame_tablebase: bool,
    pub endgame_max_pieces: u32,
    pub endgame_max_plies: u32,
    pub time_limit_ms: Option<u64>,
    pub parallel: bool,
    pub workers: usize,

    // MCTS
    pub iterations: u32,
    pub rollout_depth: u32,
    pub exploration_constant: f64,
    pub random_seed: Option<u64>,
    pub mcts_parallel: bool,
    pub mcts_workers: usize,
    pub rollout_policy: RolloutPolicyName,
    pub guidance_depth: Depth,
    pub rollout_cutoff_depth: Option<u32>,
    pub leaf_evaluation: LeafEvaluationName,
    pub mcts_transposition: bool,
    pub mcts_transposition_max_entries: usize,
    pub progressive_widening: bool,
    pub pw_k: f64,
    pub pw_alpha: f64,
    pub progressive_bias: bool,
    pub pb_weight: f64,
    pub persist_tree: bool,

    /// 未知のキー
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mm = MinimaxConfig::default();
        let mcts = MctsConfig::default();
        Self {
            algorithm: Algorithm::Minimax,
            depth: mm.max_depth,
            alpha_beta: mm.alpha_beta,
            transposition: mm.transposition,
            tt_capacity: mm.tt_capacity,
            move_ordering: mm.move_ordering,
            killer_moves: mm.killer_moves,
            iterative_deepening: mm.iterative_deepening,
            quiescence: mm.quiescence,
            max_quiescence_depth: mm.max_quiescence_depth,
            aspiration: mm.aspiration,
            aspiration_window: mm.aspiration_window,
            history_heuristic: mm.history_heuristic,
            butterfly_heuristic: mm.butterfly_heuristic,
            null_move: mm.null_move,
            null_move_reduction: mm.null_move_reduction,
            lmr: mm.lmr,
            lmr_min_depth: mm.lmr_min_depth,
            lmr_min_moves: mm.lmr_min_moves,
            lmr_reduction: mm.lmr_reduction,
            deterministic_ordering: mm.deterministic_ordering,
            endgame_tablebase: mm.endgame_tablebase,
            endgame_max_pieces: mm.endgame_max_pieces,
            endgame_max_plies: mm.endgame_max_plies,
            time_limit_ms: None,
            parallel: mm.parallel,
            workers: mm.workers,
            iterations: mcts.iterations,
            rollout_depth: mcts.max_rollout_depth,
            exploration_constant: mcts.exploration_constant,
            random_seed: None,
            mcts_parallel: mcts.parallel,
            mcts_workers: mcts.workers,
            rollout_policy: RolloutPolicyName::Random,
            guidance_depth: 1,
            rollout_cutoff_depth: None,
            leaf_evaluation: LeafEvaluationName::RandomTerminal,
            mcts_transposition: mcts.transposition,
            mcts_transposition_max_entries: mcts.transposition_max_entries,
            progressive_widening: mcts.progressive_widening,
            pw_k: mcts.pw_k,
            pw_alpha: mcts.pw_alpha,
            progressive_bias: mcts.progressive_bias,
            pb_weight: mcts.pb_weight,
            persist_tree: mcts.persist_tree,
            extra: BTreeMap::new(),
        }
    }
}

/// 型付きに変換した設定
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConfig {
    pub algorithm: Algorithm,
    pub minimax: MinimaxConfig,
    pub mcts: MctsConfig,
}

/// 範囲外なら丸めて警告する
fn clamp_logged<T: PartialOrd + Copy + Display>(key: &str, value: T, lo: T, hi: T) -> T {
    let clamped = if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    };
    if clamped != value {
        log::warn!("engine config: {key}={value} out of range [{lo}, {hi}], using {clamped}");
    }
    clamped
}

/// 浮動小数点用（NaN は既定値にする）
fn clamp_f64_logged(key: &str, value: f64, lo: f64, hi: f64, default: f64) -> f64 {
    if value.is_nan() {
        log::warn!("engine config: {key} is NaN, using {default}");
        return default;
    }
    clamp_logged(key, value, lo, hi)
}

impl EngineConfig {
    /// JSON から読み込む
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// JSON に書き出す
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 未知のキー
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.extra.keys().map(String::as_str)
    }

    /// 型付きの設定に変換し、自動修正の一覧を返す
    pub fn normalize(&self) -> (NormalizedConfig, Vec<ConfigAdjustment>) {
        for key in self.unknown_keys() {
            log::warn!("engine config: ignoring unknown option '{key}'");
        }
        let mcts_defaults = MctsConfig::default();

        let time_limit = self
            .time_limit_ms
            .map(|ms| Duration::from_millis(clamp_logged("timeLimitMs", ms, 10, 60_000)));

        let minimax = MinimaxConfig {
            max_depth: clamp_logged("depth", self.depth, 1, 16),
            alpha_beta: self.alpha_beta,
            transposition: self.transposition,
            tt_capacity: clamp_logged("ttCapacity", self.tt_capacity, 1024, 1 << 26),
            move_ordering: self.move_ordering,
            killer_moves: self.killer_moves,
            quiescence: self.quiescence,
            max_quiescence_depth: clamp_logged("maxQuiescenceDepth", self.max_quiescence_depth, 1, 16),
            iterative_deepening: self.iterative_deepening,
            time_limit,
            aspiration: self.aspiration,
            aspiration_window: clamp_logged("aspirationWindow", self.aspiration_window, 10, 200),
            history_heuristic: self.history_heuristic,
            butterfly_heuristic: self.butterfly_heuristic,
            null_move: self.null_move,
            null_move_reduction: clamp_logged("nullMoveReduction", self.null_move_reduction, 1, 4),
            lmr: self.lmr,
            lmr_min_depth: clamp_logged("lmrMinDepth", self.lmr_min_depth, 1, 10),
            lmr_min_moves: clamp_logged("lmrMinMoves", self.lmr_min_moves, 1, 12),
            lmr_reduction: clamp_logged("lmrReduction", self.lmr_reduction, 1, 3),
            deterministic_ordering: self.deterministic_ordering,
            endgame_tablebase: self.endgame_tablebase,
            endgame_max_pieces: clamp_logged("endgameMaxPieces", self.endgame_max_pieces, 2, 12),
            endgame_max_plies: clamp_logged("endgameMaxPlies", self.endgame_max_plies, 4, 200),
            parallel: self.parallel,
            workers: clamp_logged("workers", self.workers, 1, 64),
        };

        let guidance = clamp_logged("guidanceDepth", self.guidance_depth, 1, 4);
        let mcts = MctsConfig {
            iterations: clamp_logged("iterations", self.iterations, 1, 20_000),
            max_rollout_depth: clamp_logged("rolloutDepth", self.rollout_depth, 1, 300),
            rollout_cutoff_depth: self
                .rollout_cutoff_depth
                .map(|d| clamp_logged("rolloutCutoffDepth", d, 1, 300)),
            exploration_constant: clamp_f64_logged(
                "explorationConstant",
                self.exploration_constant,
                0.01,
                10.0,
                mcts_defaults.exploration_constant,
            ),
            rollout_policy: match self.rollout_policy {
                RolloutPolicyName::Random => RolloutPolicy::UniformRandom,
                RolloutPolicyName::Heuristic => RolloutPolicy::Heuristic,
                RolloutPolicyName::MinimaxGuided => RolloutPolicy::MinimaxGuided { depth: guidance },
            },
            leaf_evaluation: match self.leaf_evaluation {
                LeafEvaluationName::RandomTerminal => LeafEvaluation::RandomTerminal,
                LeafEvaluationName::HeuristicEval => LeafEvaluation::Heuristic,
                LeafEvaluationName::MinimaxEval => LeafEvaluation::ShallowMinimax { depth: guidance },
            },
            progressive_widening: self.progressive_widening,
            pw_k: clamp_f64_logged("pwK", self.pw_k, 0.1, 10.0, mcts_defaults.pw_k),
            pw_alpha: clamp_f64_logged("pwAlpha", self.pw_alpha, 0.1, 1.0, mcts_defaults.pw_alpha),
            progressive_bias: self.progressive_bias,
            pb_weight: clamp_f64_logged("pbWeight", self.pb_weight, 0.0, 10.0, mcts_defaults.pb_weight),
            transposition: self.mcts_transposition,
            transposition_max_entries: clamp_logged(
                "mctsTranspositionMaxEntries",
                self.mcts_transposition_max_entries,
                1000,
                1_000_000,
            ),
            parallel: self.mcts_parallel,
            workers: clamp_logged("mctsWorkers", self.mcts_workers, 1, 64),
            seed: self.random_seed,
            time_limit,
            persist_tree: self.persist_tree,
            max_tree_nodes: mcts_defaults.max_tree_nodes,
        };

        let (minimax, mut adjustments) = minimax.normalize();
        let (mcts, mcts_adjustments) = mcts.normalize();
        adjustments.extend(mcts_adjustments);

        (
            NormalizedConfig {
                algorithm: self.algorithm,
                minimax,
                mcts,
            },
            adjustments,
        )
    }
}
