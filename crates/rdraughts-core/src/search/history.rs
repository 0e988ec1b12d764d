//! History統計
//!
//! 探索中の手の成功/失敗を記録し、手の順序付けに利用する。
//!
//! - `KillerTable`: [ply] -> betaカットを起こした静かな手（2手）
//! - `HistoryTable`: [Color][from_to] -> カット時の累積重み
//!   （butterfly 有効時は、カットしなかった試行回数も数えて比率を使う）
//!
//! キラー手はルート探索ごとに消去する。History はエンジンの寿命の間保持し、
//! ルート探索の開始時に半減させる。

use crate::types::{Color, Depth, MAX_PLY, Move, Square};

// =============================================================================
// 定数
// =============================================================================

/// from_toインデックスのサイズ
pub const FROM_TO_SIZE: usize = Square::NUM * Square::NUM;

/// キラー手のスロット数
pub const KILLER_SLOTS: usize = 2;

/// 履歴値の上限（超えたら全体を半減する）
const HISTORY_MAX: u32 = 1 << 24;

/// 並べ替えに使う履歴スコアの上限
pub const HISTORY_SCORE_MAX: i32 = 99_999;

// =============================================================================
// KillerTable
// =============================================================================

/// キラー手テーブル
#[derive(Clone)]
pub struct KillerTable {
    slots: Vec<[Option<Move>; KILLER_SLOTS]>,
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KillerTable {
    pub fn new() -> Self {
        Self {
            slots: vec![[None, None]; MAX_PLY as usize + 1],
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = [None, None];
        }
    }

    /// betaカットを起こした手を記録する（先頭に入れ、既存の先頭は2番目へ）
    pub fn record(&mut self, ply: i32, mv: &Move) {
        let Some(slot) = self.slots.get_mut(ply as usize) else {
            return;
        };
        if slot[0].as_ref() == Some(mv) {
            return;
        }
        slot[1] = slot[0].take();
        slot[0] = Some(mv.clone());
    }

    /// キラー手なら何番目のスロットかを返す
    pub fn slot_of(&self, ply: i32, mv: &Move) -> Option<usize> {
        self.slots
            .get(ply as usize)?
            .iter()
            .position(|k| k.as_ref() == Some(mv))
    }
}

// =============================================================================
// HistoryTable
// =============================================================================

/// History / butterfly テーブル
#[derive(Clone)]
pub struct HistoryTable {
    /// カットを起こした回数の重み
    cutoffs: Vec<u32>,
    /// カットしなかった試行の重み
    attempts: Vec<u32>,
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            cutoffs: vec![0; Color::NUM * FROM_TO_SIZE],
            attempts: vec![0; Color::NUM * FROM_TO_SIZE],
        }
    }

    #[inline]
    fn index(color: Color, mv: &Move) -> usize {
        color.index() * FROM_TO_SIZE + mv.from_to()
    }

    #[inline]
    fn bonus(depth: Depth) -> u32 {
        let d = depth.max(1) as u32;
        d * d
    }

    pub fn clear(&mut self) {
        self.cutoffs.fill(0);
        self.attempts.fill(0);
    }

    /// 全体を半減させる
    pub fn age(&mut self) {
        for v in self.cutoffs.iter_mut().chain(self.attempts.iter_mut()) {
            *v /= 2;
        }
    }

    /// betaカットを起こした手を記録する
    pub fn record_cutoff(&mut self, color: Color, mv: &Move, depth: Depth) {
        let idx = Self::index(color, mv);
        self.cutoffs[idx] = self.cutoffs[idx].saturating_add(Self::bonus(depth));
        if self.cutoffs[idx] >= HISTORY_MAX {
            self.age();
        }
    }

    /// カットしなかった試行を記録する（butterfly）
    pub fn record_attempt(&mut self, color: Color, mv: &Move, depth: Depth) {
        let idx = Self::index(color, mv);
        self.attempts[idx] = self.attempts[idx].saturating_add(Self::bonus(depth));
        if self.attempts[idx] >= HISTORY_MAX {
            self.age();
        }
    }

    /// 並べ替え用のスコア（0..=HISTORY_SCORE_MAX）
    pub fn score(&self, color: Color, mv: &Move, butterfly: bool) -> i32 {
        let idx = Self::index(color, mv);
        let cutoffs = self.cutoffs[idx] as u64;
        let raw = if butterfly {
            cutoffs * 1024 / (self.attempts[idx] as u64 + 1)
        } else {
            cutoffs
        };
        raw.min(HISTORY_SCORE_MAX as u64) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(a: (u8, u8), b: (u8, u8)) -> Move {
        Move::step(Square::new(a.0, a.1), Square::new(b.0, b.1), false)
    }

    #[test]
    fn test_killer_record_shifts_slots() {
        let mut killers = KillerTable::new();
        let a = mv((5, 0), (4, 1));
        let b = mv((5, 2), (4, 3));
        killers.record(3, &a);
        killers.record(3, &b);
        assert_eq!(killers.slot_of(3, &b), Some(0));
        assert_eq!(killers.slot_of(3, &a), Some(1));
        assert_eq!(killers.slot_of(4, &a), None);

        // 同じ手の再登録では順番は変わらない
        killers.record(3, &b);
        assert_eq!(killers.slot_of(3, &a), Some(1));

        killers.clear();
        assert_eq!(killers.slot_of(3, &b), None);
    }

    #[test]
    fn test_history_rewards_cutoffs() {
        let mut history = HistoryTable::new();
        let a = mv((5, 0), (4, 1));
        history.record_cutoff(Color::White, &a, 4);
        assert_eq!(history.score(Color::White, &a, false), 16);
        // 色ごとに独立
        assert_eq!(history.score(Color::Black, &a, false), 0);

        history.age();
        assert_eq!(history.score(Color::White, &a, false), 8);
    }

    #[test]
    fn test_butterfly_penalises_failed_attempts() {
        let mut history = HistoryTable::new();
        let a = mv((5, 0), (4, 1));
        let b = mv((5, 2), (4, 3));
        history.record_cutoff(Color::White, &a, 3);
        history.record_cutoff(Color::White, &b, 3);
        for _ in 0..10 {
            history.record_attempt(Color::White, &b, 3);
        }
        assert!(history.score(Color::White, &a, true) > history.score(Color::White, &b, true));
        assert_eq!(history.score(Color::White, &a, false), history.score(Color::White, &b, false));
    }
}
