//! ミニマックスとMCTSをまとめたエンジン
//!
//! 設定の `algorithm` で探索器を選ぶ。評価関数とワーカー予算は両者で共有する。

mod config;

pub use config::{Algorithm, EngineConfig, LeafEvaluationName, NormalizedConfig, RolloutPolicyName};

use std::sync::Arc;

use crate::controller::{SearchController, SearchLimits};
use crate::error::SearchError;
use crate::eval::Evaluator;
use crate::mcts::MctsEngine;
use crate::position::Position;
use crate::result::SearchResult;
use crate::search::MinimaxEngine;

/// 指し手選択エンジン
pub struct Engine {
    minimax: MinimaxEngine,
    mcts: MctsEngine,
}

impl Engine {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self::with_controller(evaluator, SearchController::default())
    }

    pub fn with_controller(evaluator: Arc<dyn Evaluator>, controller: SearchController) -> Self {
        Self {
            minimax: MinimaxEngine::with_controller(Arc::clone(&evaluator), controller.clone()),
            mcts: MctsEngine::with_controller(evaluator, controller),
        }
    }

    pub fn minimax(&mut self) -> &mut MinimaxEngine {
        &mut self.minimax
    }

    pub fn mcts(&mut self) -> &mut MctsEngine {
        &mut self.mcts
    }

    /// 置換表・履歴・持ち越した木を捨てる（新しい対局の前に呼ぶ）
    pub fn clear(&mut self) {
        self.minimax.clear();
        self.mcts.clear();
    }

    /// 設定に従って最善手を探索する
    pub fn search(
        &mut self,
        pos: &Position,
        config: &EngineConfig,
        limits: &SearchLimits,
    ) -> Result<SearchResult, SearchError> {
        let (cfg, adjustments) = config.normalize();
        if !adjustments.is_empty() {
            log::debug!("{} config adjustment(s) applied", adjustments.len());
        }
        match cfg.algorithm {
            Algorithm::Minimax => self.minimax.search(pos, &cfg.minimax, limits),
            Algorithm::Mcts => self.mcts.search(pos, &cfg.mcts, limits),
        }
    }
}
