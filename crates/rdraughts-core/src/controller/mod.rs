//! 探索コントローラ
//!
//! 両エンジンが共有する時間・資源の調停。
//!
//! - `Deadline`: 絶対時刻の締め切り（呼び出し開始時に相対時間から計算）
//! - `StopFlag`: 協調的キャンセル（全ワーカーに複製して配る）
//! - `SearchLimits`: 1回の探索に渡す締め切り + 停止フラグ
//! - `WorkerBudget`: 両手番の探索で共有するワーカー数の上限
//! - `SearchController`: 上記をまとめて各エンジンに渡すハンドル

mod limits;
mod workers;

pub use limits::{AbortReason, Deadline, SearchLimits, StopFlag};
pub use workers::{WorkerBudget, WorkerLease};

use std::sync::Arc;
use std::time::Duration;

/// 既定のワーカー上限
pub const DEFAULT_WORKER_CEILING: usize = 8;

/// 探索コントローラ
///
/// 対局中の白黒2つのエンジンに同じコントローラを `clone` して渡すと、
/// 同時に動く探索ワーカーの総数が `WorkerBudget` の上限で抑えられる。
#[derive(Debug, Clone)]
pub struct SearchController {
    budget: Arc<WorkerBudget>,
}

impl SearchController {
    pub fn new(worker_ceiling: usize) -> Self {
        Self {
            budget: Arc::new(WorkerBudget::new(worker_ceiling)),
        }
    }

    /// ワーカー予算
    pub fn budget(&self) -> &Arc<WorkerBudget> {
        &self.budget
    }

    /// ワーカーを借りる（返却はリースのDrop時）
    pub fn lease(&self, requested: usize) -> WorkerLease {
        WorkerBudget::lease(&self.budget, requested)
    }

    /// 相対時間の予算から探索リミットを作る
    pub fn limits(&self, budget: Option<Duration>, stop: StopFlag) -> SearchLimits {
        SearchLimits::new(Deadline::from_budget(budget), stop)
    }
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_CEILING)
    }
}
