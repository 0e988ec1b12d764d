//! MCTSの設定

use std::time::Duration;

use crate::search::ConfigAdjustment;
use crate::types::Depth;

/// プレイアウト中の指し手の選び方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutPolicy {
    /// 一様ランダム
    UniformRandom,
    /// 1手先の評価が最大の手（同点はランダム）
    Heuristic,
    /// 浅いnegamaxの評価が最大の手
    MinimaxGuided { depth: Depth },
}

/// プレイアウトを打ち切った局面の評価方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafEvaluation {
    /// 残りの手数でランダムに終局まで指す（終局しなければ引き分け）
    RandomTerminal,
    /// 静的評価を正規化した値
    Heuristic,
    /// 浅いnegamaxの値
    ShallowMinimax { depth: Depth },
}

/// MCTSの設定
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    pub iterations: u32,
    pub max_rollout_depth: u32,
    /// これより深いプレイアウトは葉の評価に切り替える（None なら `max_rollout_depth`）
    pub rollout_cutoff_depth: Option<u32>,
    pub exploration_constant: f64,
    pub rollout_policy: RolloutPolicy,
    pub leaf_evaluation: LeafEvaluation,
    pub progressive_widening: bool,
    pub pw_k: f64,
    pub pw_alpha: f64,
    pub progressive_bias: bool,
    pub pb_weight: f64,
    pub transposition: bool,
    pub transposition_max_entries: usize,
    pub parallel: bool,
    pub workers: usize,
    pub seed: Option<u64>,
    pub time_limit: Option<Duration>,
    /// 次の探索に木を持ち越す
    pub persist_tree: bool,
    /// 持ち越す木のノード数の上限
    pub max_tree_nodes: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 500,
            max_rollout_depth: 80,
            rollout_cutoff_depth: None,
            exploration_constant: 1.4,
            rollout_policy: RolloutPolicy::UniformRandom,
            leaf_evaluation: LeafEvaluation::RandomTerminal,
            progressive_widening: false,
            pw_k: 1.5,
            pw_alpha: 0.5,
            progressive_bias: false,
            pb_weight: 0.5,
            transposition: false,
            transposition_max_entries: 200_000,
            parallel: false,
            workers: 4,
            seed: None,
            time_limit: None,
            persist_tree: false,
            max_tree_nodes: 1_000_000,
        }
    }
}

/// 有限でなければ既定値、そうでなければ範囲に丸める
fn clamp_f64(v: f64, lo: f64, hi: f64, default: f64) -> f64 {
    if v.is_finite() { v.clamp(lo, hi) } else { default }
}

impl MctsConfig {
    /// プレイアウトを葉の評価に切り替える深さ
    #[inline]
    pub fn cutoff_depth(&self) -> u32 {
        self.rollout_cutoff_depth
            .map_or(self.max_rollout_depth, |c| c.min(self.max_rollout_depth))
    }

    /// 範囲外の値を丸め、矛盾する組み合わせを解消する
    pub fn normalize(mut self) -> (Self, Vec<ConfigAdjustment>) {
        let defaults = MctsConfig::default();
        let mut adjustments = Vec::new();

        self.iterations = self.iterations.clamp(1, 20_000);
        self.max_rollout_depth = self.max_rollout_depth.clamp(1, 300);
        self.rollout_cutoff_depth = self.rollout_cutoff_depth.map(|c| c.clamp(1, 300));
        self.exploration_constant =
            clamp_f64(self.exploration_constant, 0.01, 10.0, defaults.exploration_constant);
        self.pw_k = clamp_f64(self.pw_k, 0.1, 10.0, defaults.pw_k);
        self.pw_alpha = clamp_f64(self.pw_alpha, 0.1, 1.0, defaults.pw_alpha);
        self.pb_weight = clamp_f64(self.pb_weight, 0.0, 10.0, defaults.pb_weight);
        self.transposition_max_entries = self.transposition_max_entries.clamp(1000, 1_000_000);
        self.workers = self.workers.clamp(1, 64);
        self.max_tree_nodes = self.max_tree_nodes.max(1000);
        self.time_limit = self.time_limit.map(|t| {
            t.clamp(Duration::from_millis(10), Duration::from_millis(60_000))
        });
        if let RolloutPolicy::MinimaxGuided { depth } = &mut self.rollout_policy {
            *depth = (*depth).clamp(1, 4);
        }
        if let LeafEvaluation::ShallowMinimax { depth } = &mut self.leaf_evaluation {
            *depth = (*depth).clamp(1, 4);
        }

        if self.parallel && self.workers < 2 {
            self.parallel = false;
            adjustments.push(ConfigAdjustment {
                feature: "mctsParallel",
                reason: "requires at least two workers",
            });
        }
        if self.parallel && self.persist_tree {
            self.persist_tree = false;
            adjustments.push(ConfigAdjustment {
                feature: "persistTree",
                reason: "not supported with parallel rollouts",
            });
        }

        for adj in &adjustments {
            log::warn!("mcts config: {adj}");
        }
        (self, adjustments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_and_nan() {
        let cfg = MctsConfig {
            iterations: 0,
            exploration_constant: f64::NAN,
            pw_alpha: 3.0,
            rollout_policy: RolloutPolicy::MinimaxGuided { depth: 9 },
            ..MctsConfig::default()
        };
        let (cfg, adj) = cfg.normalize();
        assert_eq!(cfg.iterations, 1);
        assert_eq!(cfg.exploration_constant, 1.4);
        assert_eq!(cfg.pw_alpha, 1.0);
        assert_eq!(cfg.rollout_policy, RolloutPolicy::MinimaxGuided { depth: 4 });
        assert!(adj.is_empty());
    }

    #[test]
    fn test_single_worker_parallel_is_disabled() {
        let cfg = MctsConfig {
            parallel: true,
            workers: 1,
            ..MctsConfig::default()
        };
        let (cfg, adj) = cfg.normalize();
        assert!(!cfg.parallel);
        assert_eq!(adj[0].feature, "mctsParallel");
    }

    #[test]
    fn test_cutoff_never_exceeds_max_depth() {
        let cfg = MctsConfig {
            max_rollout_depth: 20,
            rollout_cutoff_depth: Some(50),
            ..MctsConfig::default()
        };
        assert_eq!(cfg.cutoff_depth(), 20);
        assert_eq!(MctsConfig::default().cutoff_depth(), 80);
    }
}
