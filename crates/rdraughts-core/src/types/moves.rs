//! 指し手（Move）
//!
//! 1ステップの移動、または連続ジャンプによる捕獲列。
//! 同一性は開始マスとステップ列の全体で判定する（終点だけでは区別しない）。

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Square, Variant};

/// ステップ列（典型的な連続ジャンプは4以下）
pub type Path = SmallVec<[Square; 4]>;

/// 指し手リスト
pub type MoveList = SmallVec<[Move; 16]>;

/// 指し手
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Move {
    from: Square,
    path: Path,
    /// 取った駒のマス（捕獲順）
    captured: Path,
    /// 取った駒のうちキングの数
    captured_kings: u8,
    /// 着手で兵がキングになるか
    promotes: bool,
}

impl Move {
    /// 非捕獲手
    pub fn step(from: Square, to: Square, promotes: bool) -> Move {
        let mut path = Path::new();
        path.push(to);
        Move {
            from,
            path,
            captured: Path::new(),
            captured_kings: 0,
            promotes,
        }
    }

    /// 捕獲手
    pub fn capture(
        from: Square,
        path: Path,
        captured: Path,
        captured_kings: u8,
        promotes: bool,
    ) -> Move {
        debug_assert!(!path.is_empty());
        debug_assert_eq!(path.len(), captured.len());
        Move {
            from,
            path,
            captured,
            captured_kings,
            promotes,
        }
    }

    /// 開始マス
    #[inline]
    pub fn from(&self) -> Square {
        self.from
    }

    /// 終点
    #[inline]
    pub fn to(&self) -> Square {
        // path は構築時に必ず1要素以上ある
        self.path[self.path.len() - 1]
    }

    /// 経由マス（終点を含む）
    #[inline]
    pub fn path(&self) -> &[Square] {
        &self.path
    }

    /// 取った駒のマス
    #[inline]
    pub fn captured(&self) -> &[Square] {
        &self.captured
    }

    /// 捕獲手かどうか
    #[inline]
    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }

    /// 取った駒の数
    #[inline]
    pub fn capture_count(&self) -> usize {
        self.captured.len()
    }

    /// 取ったキングの数
    #[inline]
    pub fn captured_kings(&self) -> u8 {
        self.captured_kings
    }

    /// 成る手かどうか
    #[inline]
    pub fn is_promotion(&self) -> bool {
        self.promotes
    }

    /// 静かな手（捕獲も成りもしない）
    #[inline]
    pub fn is_quiet(&self) -> bool {
        !self.is_capture() && !self.promotes
    }

    /// butterfly インデックス（from × to）
    #[inline]
    pub fn from_to(&self) -> usize {
        self.from.index() * Square::NUM + self.to().index()
    }

    /// 置換表に保存する16bitの指し手指紋
    ///
    /// 0 は「指し手なし」を表すため返さない。
    pub fn key16(&self) -> u16 {
        let mut h: u32 = 0x811C_9DC5;
        h = (h ^ self.from.index() as u32).wrapping_mul(0x0100_0193);
        for sq in &self.path {
            h = (h ^ sq.index() as u32).wrapping_mul(0x0100_0193);
        }
        let folded = ((h >> 16) ^ (h & 0xFFFF)) as u16;
        if folded == 0 { 1 } else { folded }
    }

    /// PDN 表記（`11-15` / `11x18x25`）
    pub fn notation(&self, variant: Variant) -> String {
        let sep = if self.is_capture() { 'x' } else { '-' };
        let mut s = self.from.number(variant).to_string();
        for sq in &self.path {
            s.push(sep);
            s.push_str(&sq.number(variant).to_string());
        }
        s
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.path == other.path
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.path.hash(state);
    }
}
