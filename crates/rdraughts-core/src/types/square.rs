//! マス（Square）
//!
//! 盤サイズに依存しない (row, col) 表現。内部インデックスは `row * 10 + col` で、
//! 8×8 / 10×10 の両方を同じ配列で扱える。

use serde::{Deserialize, Serialize};

use super::Variant;

/// マス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    /// 内部配列の一辺（最大盤サイズ）
    pub const STRIDE: usize = 10;
    /// 内部配列のサイズ
    pub const NUM: usize = Self::STRIDE * Self::STRIDE;

    /// 行・列から生成
    #[inline]
    pub const fn new(row: u8, col: u8) -> Square {
        debug_assert!((row as usize) < Self::STRIDE && (col as usize) < Self::STRIDE);
        Square(row * Self::STRIDE as u8 + col)
    }

    /// 符号付き座標から生成（盤外なら None）
    #[inline]
    pub fn from_coords(row: i8, col: i8, size: u8) -> Option<Square> {
        let s = size as i8;
        if row < 0 || col < 0 || row >= s || col >= s {
            return None;
        }
        Some(Square::new(row as u8, col as u8))
    }

    /// 行
    #[inline]
    pub const fn row(self) -> u8 {
        self.0 / Self::STRIDE as u8
    }

    /// 列
    #[inline]
    pub const fn col(self) -> u8 {
        self.0 % Self::STRIDE as u8
    }

    /// 配列インデックス
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 暗いマス（駒を置けるマス）かどうか
    #[inline]
    pub const fn is_dark(self) -> bool {
        (self.row() + self.col()) % 2 == 1
    }

    /// 方向 (dr, dc) に `n` マス進んだマス
    #[inline]
    pub fn offset(self, dr: i8, dc: i8, n: i8, size: u8) -> Option<Square> {
        Square::from_coords(self.row() as i8 + dr * n, self.col() as i8 + dc * n, size)
    }

    /// PDN の番号（1始まり、左上から行優先で暗いマスのみ数える）
    #[inline]
    pub const fn number(self, variant: Variant) -> u32 {
        let half = (variant.size() / 2) as u32;
        self.row() as u32 * half + self.col() as u32 / 2 + 1
    }

    /// PDN の番号から生成
    pub fn from_number(variant: Variant, number: u32) -> Option<Square> {
        if number == 0 || number as usize > variant.playable_squares() {
            return None;
        }
        let half = (variant.size() / 2) as u32;
        let idx = number - 1;
        let row = (idx / half) as u8;
        let col = (2 * (idx % half)) as u8 + if row % 2 == 0 { 1 } else { 0 };
        Some(Square::new(row, col))
    }
}
