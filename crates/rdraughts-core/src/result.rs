//! 探索結果と診断情報
//!
//! 評価・チューニング用のハーネスが JSON で受け取れるよう、すべて `Serialize`。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Move, Value};

/// 探索の終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    /// 最大深さまで探索した
    DepthLimit,
    /// 締め切りに達した
    Time,
    /// 指定回数のイテレーションを消化した
    IterationsExhausted,
    /// 終局局面（`SearchError::TerminalPosition` と対応）
    TerminalPosition,
    /// 合法手が1つしかなく探索しなかった
    ForcedMove,
    /// 外部から停止された
    Stopped,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationReason::DepthLimit => "depth-limit",
            TerminationReason::Time => "time",
            TerminationReason::IterationsExhausted => "iterations-exhausted",
            TerminationReason::TerminalPosition => "terminal-position",
            TerminationReason::ForcedMove => "forced-move",
            TerminationReason::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// 最善手の評価
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Score {
    /// ミニマックスの評価値（手番側視点）
    Value(Value),
    /// MCTSの平均報酬（手番側視点、-1.0〜1.0）
    WinRate(f64),
}

/// ルートの子ノードの訪問統計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootVisit {
    pub mv: Move,
    pub visits: u32,
    /// 平均報酬（手番側視点）
    pub mean_value: f64,
}

/// 読み筋または訪問分布
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchLine {
    /// 主要変化（ミニマックス）
    Pv(Vec<Move>),
    /// ルートの訪問分布（MCTS）
    Visits(Vec<RootVisit>),
}

/// 探索統計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    /// 探索ノード数（MCTSではツリーのノード数）
    pub nodes: u64,
    /// 静止探索ノード数
    pub qnodes: u64,
    /// 完了したロールアウト数
    pub rollouts: u64,
    /// 完了した深さ
    pub depth: i32,
    /// 到達した最大ply
    pub sel_depth: i32,
    pub tt_hits: u64,
    pub tt_cutoffs: u64,
    pub null_move_cutoffs: u64,
    pub lmr_reductions: u64,
    pub lmr_researches: u64,
    pub aspiration_failures: u64,
    pub endgame_hits: u64,
    /// 使用したワーカー数
    pub workers: usize,
    /// 失敗したワーカー数
    pub failed_workers: usize,
}

impl SearchStats {
    /// 並列ワーカーの統計を合算する（深さ関係は最大値）
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.qnodes += other.qnodes;
        self.rollouts += other.rollouts;
        self.depth = self.depth.max(other.depth);
        self.sel_depth = self.sel_depth.max(other.sel_depth);
        self.tt_hits += other.tt_hits;
        self.tt_cutoffs += other.tt_cutoffs;
        self.null_move_cutoffs += other.null_move_cutoffs;
        self.lmr_reductions += other.lmr_reductions;
        self.lmr_researches += other.lmr_researches;
        self.aspiration_failures += other.aspiration_failures;
        self.endgame_hits += other.endgame_hits;
    }
}

/// 探索結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub best_move: Move,
    pub score: Score,
    pub line: SearchLine,
    pub stats: SearchStats,
    pub elapsed: Duration,
    pub termination: TerminationReason,
}

impl SearchResult {
    /// ミニマックスの評価値（MCTSの結果なら None）
    pub fn value(&self) -> Option<Value> {
        match self.score {
            Score::Value(v) => Some(v),
            Score::WinRate(_) => None,
        }
    }

    /// 主要変化（MCTSの結果なら空）
    pub fn pv(&self) -> &[Move] {
        match &self.line {
            SearchLine::Pv(pv) => pv,
            SearchLine::Visits(_) => &[],
        }
    }

    /// 訪問分布（ミニマックスの結果なら空）
    pub fn visits(&self) -> &[RootVisit] {
        match &self.line {
            SearchLine::Visits(v) => v,
            SearchLine::Pv(_) => &[],
        }
    }
}
