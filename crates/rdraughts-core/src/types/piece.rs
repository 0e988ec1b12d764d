//! 駒（Piece）

use serde::{Deserialize, Serialize};

use super::Color;

/// 駒（兵またはキング）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Piece {
    WhiteMan = 0,
    WhiteKing = 1,
    BlackMan = 2,
    BlackKing = 3,
}

impl Piece {
    /// 駒の種類数
    pub const NUM: usize = 4;

    /// 色と成りから生成
    #[inline]
    pub const fn new(color: Color, king: bool) -> Piece {
        match (color, king) {
            (Color::White, false) => Piece::WhiteMan,
            (Color::White, true) => Piece::WhiteKing,
            (Color::Black, false) => Piece::BlackMan,
            (Color::Black, true) => Piece::BlackKing,
        }
    }

    /// 色
    #[inline]
    pub const fn color(self) -> Color {
        match self {
            Piece::WhiteMan | Piece::WhiteKing => Color::White,
            Piece::BlackMan | Piece::BlackKing => Color::Black,
        }
    }

    /// キングかどうか
    #[inline]
    pub const fn is_king(self) -> bool {
        matches!(self, Piece::WhiteKing | Piece::BlackKing)
    }

    /// 成った駒
    #[inline]
    pub const fn promoted(self) -> Piece {
        Piece::new(self.color(), true)
    }

    /// インデックスとして使用（Zobrist用）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}
