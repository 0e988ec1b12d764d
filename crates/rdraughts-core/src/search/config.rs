//! ミニマックス探索の設定
//!
//! 依存関係のある機能（キラー手は手順並べ替えが前提、など）が前提なしで
//! 指定された場合は、呼び出しを失敗させずに依存側の機能を無効化する。
//! 無効化した内容は `ConfigAdjustment` として返し、ログにも残す。

use std::time::Duration;

use crate::types::Depth;

/// 設定の自動修正
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigAdjustment {
    /// 無効化・変更した機能
    pub feature: &'static str,
    /// 理由（前提となる機能）
    pub reason: &'static str,
}

impl std::fmt::Display for ConfigAdjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} disabled: {}", self.feature, self.reason)
    }
}

/// ミニマックス探索の設定
#[derive(Debug, Clone, PartialEq)]
pub struct MinimaxConfig {
    /// 最大探索深さ
    pub max_depth: Depth,
    pub alpha_beta: bool,
    pub transposition: bool,
    /// 置換表のエントリ数
    pub tt_capacity: usize,
    pub move_ordering: bool,
    pub killer_moves: bool,
    pub quiescence: bool,
    pub max_quiescence_depth: Depth,
    pub iterative_deepening: bool,
    /// 1手あたりの時間予算
    pub time_limit: Option<Duration>,
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
    pub parallel: bool,
    pub workers: usize,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            alpha_beta: true,
            transposition: true,
            tt_capacity: crate::tt::DEFAULT_CAPACITY,
            move_ordering: true,
            killer_moves: true,
            quiescence: true,
            max_quiescence_depth: 6,
            iterative_deepening: true,
            time_limit: None,
            aspiration: false,
            aspiration_window: 50,
            history_heuristic: true,
            butterfly_heuristic: false,
            null_move: false,
            null_move_reduction: 2,
            lmr: false,
            lmr_min_depth: 3,
            lmr_min_moves: 4,
            lmr_reduction: 1,
            deterministic_ordering: false,
            endgame_tablebase: false,
            endgame_max_pieces: 6,
            endgame_max_plies: 40,
            parallel: false,
            workers: 4,
        }
    }
}

impl MinimaxConfig {
    /// 範囲外の値を丸め、矛盾する組み合わせを解消する
    pub fn normalize(mut self) -> (Self, Vec<ConfigAdjustment>) {
        let mut adjustments = Vec::new();

        self.max_depth = self.max_depth.clamp(1, 16);
        self.max_quiescence_depth = self.max_quiescence_depth.clamp(1, 16);
        self.aspiration_window = self.aspiration_window.clamp(10, 200);
        self.null_move_reduction = self.null_move_reduction.clamp(1, 4);
        self.lmr_min_depth = self.lmr_min_depth.clamp(1, 10);
        self.lmr_min_moves = self.lmr_min_moves.clamp(1, 12);
        self.lmr_reduction = self.lmr_reduction.clamp(1, 3);
        self.endgame_max_pieces = self.endgame_max_pieces.clamp(2, 12);
        self.endgame_max_plies = self.endgame_max_plies.clamp(4, 200);
        self.workers = self.workers.clamp(1, 64);
        self.tt_capacity = self.tt_capacity.clamp(1024, 1 << 26);
        self.time_limit = self.time_limit.map(|t| {
            t.clamp(Duration::from_millis(10), Duration::from_millis(60_000))
        });

        let mut disable = |flag: &mut bool, feature: &'static str, reason: &'static str| {
            if *flag {
                *flag = false;
                adjustments.push(ConfigAdjustment { feature, reason });
            }
        };

        if !self.move_ordering {
            disable(&mut self.killer_moves, "killerMoves", "requires moveOrdering");
            disable(&mut self.history_heuristic, "historyHeuristic", "requires moveOrdering");
            disable(&mut self.butterfly_heuristic, "butterflyHeuristic", "requires moveOrdering");
            disable(&mut self.lmr, "lmr", "requires moveOrdering");
        }
        if !self.history_heuristic {
            disable(&mut self.butterfly_heuristic, "butterflyHeuristic", "requires historyHeuristic");
        }
        if !self.alpha_beta {
            disable(&mut self.aspiration, "aspiration", "requires alphaBeta");
            disable(&mut self.null_move, "nullMove", "requires alphaBeta");
            disable(&mut self.lmr, "lmr", "requires alphaBeta");
        }
        if !self.iterative_deepening {
            disable(&mut self.aspiration, "aspiration", "requires iterativeDeepening");
        }
        if self.parallel && self.workers < 2 {
            disable(&mut self.parallel, "parallel", "requires at least two workers");
        }
        if self.parallel && self.deterministic_ordering {
            // 窓に依存する枝刈りは並列時の結果をタイミング依存にする
            disable(&mut self.null_move, "nullMove", "incompatible with deterministic parallel search");
            disable(&mut self.lmr, "lmr", "incompatible with deterministic parallel search");
        }

        for adj in &adjustments {
            log::warn!("minimax config: {adj}");
        }
        (self, adjustments)
    }
}
