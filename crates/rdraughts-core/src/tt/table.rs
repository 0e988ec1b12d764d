//! TranspositionTable本体
//!
//! - TTSlot: キーとデータの組（XOR検証）
//! - TranspositionTable: テーブル本体
//! - probe/store操作

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use crate::types::{Bound, Depth, Value};

use super::entry::TTData;
use super::{BUCKET_SIZE, GENERATION_MASK};

/// スロット
///
/// `key_xor` には `key ^ data` を格納する。
#[derive(Default)]
struct TTSlot {
    key_xor: AtomicU64,
    data: AtomicU64,
}

impl TTSlot {
    /// キーが一致すればデータを返す（破れた読み出しは不一致になる）
    #[inline]
    fn load(&self, key: u64) -> Option<TTData> {
        let data = self.data.load(Ordering::Relaxed);
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        if data == 0 || key_xor ^ data != key {
            return None;
        }
        let entry = TTData::unpack(data);
        (entry.bound != Bound::None).then_some(entry)
    }

    #[inline]
    fn raw(&self) -> Option<TTData> {
        let data = self.data.load(Ordering::Relaxed);
        if data == 0 {
            None
        } else {
            Some(TTData::unpack(data))
        }
    }

    #[inline]
    fn matches(&self, key: u64) -> bool {
        let data = self.data.load(Ordering::Relaxed);
        data != 0 && self.key_xor.load(Ordering::Relaxed) ^ data == key
    }

    #[inline]
    fn store(&self, key: u64, entry: &TTData) {
        let data = entry.pack();
        self.data.store(data, Ordering::Relaxed);
        self.key_xor.store(key ^ data, Ordering::Relaxed);
    }

    #[inline]
    fn clear(&self) {
        self.data.store(0, Ordering::Relaxed);
        self.key_xor.store(0, Ordering::Relaxed);
    }
}

/// 置換表
///
/// 全メソッドが `&self` で呼べるため、`Arc` で複数ワーカーに共有する。
pub struct TranspositionTable {
    slots: Box<[TTSlot]>,
    bucket_mask: usize,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// 要求エントリ数に対して実際に確保するエントリ数
    pub fn capacity_for(requested: usize) -> usize {
        requested.div_ceil(BUCKET_SIZE).max(1).next_power_of_two() * BUCKET_SIZE
    }

    /// 新しい置換表を作成（サイズはエントリ数、バケット数は2のべき乗に切り上げ）
    pub fn new(capacity: usize) -> Self {
        let buckets = Self::capacity_for(capacity) / BUCKET_SIZE;
        let slots = (0..buckets * BUCKET_SIZE)
            .map(|_| TTSlot::default())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            bucket_mask: buckets - 1,
            generation: AtomicU8::new(0),
        }
    }

    /// エントリ数
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 全エントリを消去する
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.clear();
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// 新しい探索の開始時に世代を進める
    pub fn new_search(&self) {
        let next = (self.generation.load(Ordering::Relaxed) + 1) & GENERATION_MASK;
        self.generation.store(next, Ordering::Relaxed);
    }

    /// 現在の世代
    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    #[inline]
    fn bucket(&self, key: u64) -> &[TTSlot] {
        // 下位ビットはバケット内で偏りやすいので上位ビットも混ぜる
        let idx = ((key ^ (key >> 32)) as usize) & self.bucket_mask;
        let start = idx * BUCKET_SIZE;
        &self.slots[start..start + BUCKET_SIZE]
    }

    /// キーに対応するエントリを探す
    pub fn probe(&self, key: u64) -> Option<TTData> {
        self.bucket(key).iter().find_map(|slot| slot.load(key))
    }

    /// 探索結果を書き込む
    ///
    /// 同一キーのエントリがあれば、正確な値・十分な深さ・古い世代のいずれかの
    /// 場合に上書きする。指し手を持たない書き込みは既存の指し手を引き継ぐ。
    pub fn store(
        &self,
        key: u64,
        value: Value,
        depth: Depth,
        bound: Bound,
        move_key: Option<u16>,
    ) {
        let generation = self.generation();
        let bucket = self.bucket(key);
        let mut entry = TTData {
            value,
            depth,
            bound,
            generation,
            move_key,
        };

        if let Some(slot) = bucket.iter().find(|s| s.matches(key)) {
            if let Some(old) = slot.raw() {
                if entry.move_key.is_none() {
                    entry.move_key = old.move_key;
                }
                let replace = bound == Bound::Exact
                    || depth + 2 >= old.depth
                    || old.generation != generation;
                if !replace {
                    return;
                }
            }
            slot.store(key, &entry);
            return;
        }

        let victim = bucket
            .iter()
            .min_by_key(|slot| match slot.raw() {
                None => i32::MIN,
                Some(old) => {
                    let age = (generation.wrapping_sub(old.generation) & GENERATION_MASK) as i32;
                    old.depth - 8 * age
                }
            })
            .unwrap_or(&bucket[0]);
        victim.store(key, &entry);
    }

    /// 使用率（千分率、現在の世代のエントリのみ数える）
    pub fn hashfull(&self) -> u32 {
        let sample = self.slots.len().min(1000);
        let generation = self.generation();
        let used = self.slots[..sample]
            .iter()
            .filter(|slot| {
                slot.raw()
                    .is_some_and(|e| e.bound != Bound::None && e.generation == generation)
            })
            .count();
        (used * 1000 / sample.max(1)) as u32
    }
}
