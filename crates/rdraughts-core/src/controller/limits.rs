//! 締め切りと停止フラグ

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// 締め切り（None なら無制限）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// 無制限
    pub const fn none() -> Self {
        Deadline(None)
    }

    /// 絶対時刻
    pub const fn at(instant: Instant) -> Self {
        Deadline(Some(instant))
    }

    /// 現在時刻からの相対時間
    pub fn after(budget: Duration) -> Self {
        Deadline(Instant::now().checked_add(budget))
    }

    /// 相対時間（None なら無制限）
    pub fn from_budget(budget: Option<Duration>) -> Self {
        budget.map_or(Deadline::none(), Deadline::after)
    }

    /// 早い方の締め切り
    pub fn min(self, other: Deadline) -> Deadline {
        match (self.0, other.0) {
            (Some(a), Some(b)) => Deadline(Some(a.min(b))),
            (a, b) => Deadline(a.or(b)),
        }
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    pub fn is_unbounded(&self) -> bool {
        self.0.is_none()
    }

    /// 締め切りを過ぎたか
    #[inline]
    pub fn expired(&self) -> bool {
        self.0.is_some_and(|t| Instant::now() >= t)
    }

    /// 残り時間
    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|t| t.saturating_duration_since(Instant::now()))
    }
}

/// 停止フラグ
///
/// `clone` したものは同じフラグを共有する。
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 停止を要求する
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 中断理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// 締め切り
    Time,
    /// 外部からの停止要求
    Stopped,
}

/// 1回の探索のリミット
#[derive(Debug, Clone)]
pub struct SearchLimits {
    pub start: Instant,
    pub deadline: Deadline,
    pub stop: StopFlag,
}

impl SearchLimits {
    pub fn new(deadline: Deadline, stop: StopFlag) -> Self {
        Self {
            start: Instant::now(),
            deadline,
            stop,
        }
    }

    /// 制限なし
    pub fn unlimited() -> Self {
        Self::new(Deadline::none(), StopFlag::new())
    }

    /// 相対時間の予算のみ
    pub fn with_budget(budget: Duration) -> Self {
        Self::new(Deadline::after(budget), StopFlag::new())
    }

    /// 開始時刻からの予算で締め切りを狭めたコピー
    pub fn tightened(&self, budget: Option<Duration>) -> SearchLimits {
        let extra = budget
            .and_then(|b| self.start.checked_add(b))
            .map_or(Deadline::none(), Deadline::at);
        SearchLimits {
            start: self.start,
            deadline: self.deadline.min(extra),
            stop: self.stop.clone(),
        }
    }

    /// 経過時間
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// 停止要求と締め切りを確認する
    #[inline]
    pub fn poll(&self) -> Option<AbortReason> {
        if self.stop.is_stopped() {
            Some(AbortReason::Stopped)
        } else if self.deadline.expired() {
            Some(AbortReason::Time)
        } else {
            None
        }
    }
}
