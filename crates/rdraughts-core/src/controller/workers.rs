//! ワーカー予算
//!
//! 同時に動く探索スレッドの総数に上限を設ける。呼び出し元のスレッドは
//! 予算がなくても常に探索を行うため、予算切れは「単一スレッドでの探索」になり、
//! 待ちは発生しない。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// ワーカー予算
#[derive(Debug)]
pub struct WorkerBudget {
    ceiling: usize,
    in_use: AtomicUsize,
}

impl WorkerBudget {
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling: ceiling.max(1),
            in_use: AtomicUsize::new(0),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.ceiling.saturating_sub(self.in_use())
    }

    /// `requested` 個までの許可を借りる
    pub fn lease(this: &Arc<Self>, requested: usize) -> WorkerLease {
        let requested = requested.max(1);
        let mut current = this.in_use.load(Ordering::Acquire);
        loop {
            let take = requested.min(this.ceiling.saturating_sub(current));
            if take == 0 {
                log::debug!(
                    "worker budget exhausted ({}/{}); running on the caller thread only",
                    current,
                    this.ceiling
                );
                return WorkerLease {
                    budget: Some(Arc::clone(this)),
                    permits: 0,
                };
            }
            match this.in_use.compare_exchange_weak(
                current,
                current + take,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return WorkerLease {
                        budget: Some(Arc::clone(this)),
                        permits: take,
                    };
                }
                Err(actual) => current = actual,
            }
        }
    }
}

/// 借りたワーカー許可（Dropで返却）
#[derive(Debug)]
pub struct WorkerLease {
    budget: Option<Arc<WorkerBudget>>,
    permits: usize,
}

impl WorkerLease {
    /// 予算に縛られないリース（単体利用・テスト用）
    pub fn unbounded(workers: usize) -> Self {
        Self {
            budget: None,
            permits: workers.max(1),
        }
    }

    /// 使ってよいスレッド数（呼び出し元を含み、最低1）
    pub fn workers(&self) -> usize {
        self.permits.max(1)
    }

    /// 実際に確保した許可数
    pub fn permits(&self) -> usize {
        self.permits
    }
}

impl Drop for WorkerLease {
    fn drop(&mut self) {
        if self.permits == 0 {
            return;
        }
        if let Some(budget) = &self.budget {
            budget.in_use.fetch_sub(self.permits, Ordering::AcqRel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_is_clamped_by_ceiling() {
        let budget = Arc::new(WorkerBudget::new(6));
        let white = WorkerBudget::lease(&budget, 4);
        assert_eq!(white.workers(), 4);
        // 黒は残り2つしか借りられない
        let black = WorkerBudget::lease(&budget, 4);
        assert_eq!(black.workers(), 2);
        assert_eq!(budget.available(), 0);

        // 予算切れでも呼び出し元スレッドの1つは使える
        let extra = WorkerBudget::lease(&budget, 3);
        assert_eq!(extra.permits(), 0);
        assert_eq!(extra.workers(), 1);

        drop(white);
        assert_eq!(budget.available(), 4);
        drop(black);
        drop(extra);
        assert_eq!(budget.in_use(), 0);
    }

    #[test]
    fn test_concurrent_leases_never_exceed_ceiling() {
        let budget = Arc::new(WorkerBudget::new(5));
        std::thread::scope(|s| {
            for _ in 0..8 {
                let budget = Arc::clone(&budget);
                s.spawn(move || {
                    for _ in 0..1000 {
                        let lease = WorkerBudget::lease(&budget, 2);
                        assert!(budget.in_use() <= budget.ceiling());
                        drop(lease);
                    }
                });
            }
        });
        assert_eq!(budget.in_use(), 0);
    }
}
