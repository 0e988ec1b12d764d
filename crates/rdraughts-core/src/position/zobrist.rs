//! Zobristハッシュ乱数テーブル
//!
//! 固定シードの `Xoshiro256PlusPlus` から一度だけ生成する。
//! 同じ配置でもバリアントが違えば別のキーになるよう、バリアント鍵を混ぜる。

use std::sync::LazyLock;

use rand::RngCore;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::types::{Color, Piece, Square, Variant};

/// 乱数シード
const ZOBRIST_SEED: u64 = 0x2024_1129_D7A7_0B15;

/// Zobrist乱数
pub struct Zobrist {
    psq: [[u64; Square::NUM]; Piece::NUM],
    side: u64,
    variant: [u64; 2],
}

/// グローバルなZobristテーブル
pub static ZOBRIST: LazyLock<Zobrist> = LazyLock::new(|| {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(ZOBRIST_SEED);
    let mut psq = [[0u64; Square::NUM]; Piece::NUM];
    for table in psq.iter_mut() {
        for key in table.iter_mut() {
            *key = rng.next_u64();
        }
    }
    let side = rng.next_u64();
    let variant = [rng.next_u64(), rng.next_u64()];
    Zobrist { psq, side, variant }
});

/// 駒×マスの乱数
#[inline]
pub fn zobrist_psq(pc: Piece, sq: Square) -> u64 {
    ZOBRIST.psq[pc.index()][sq.index()]
}

/// 手番の乱数（黒番のときにXORする）
#[inline]
pub fn zobrist_side() -> u64 {
    ZOBRIST.side
}

/// 手番に応じた乱数
#[inline]
pub fn zobrist_turn(color: Color) -> u64 {
    match color {
        Color::White => 0,
        Color::Black => ZOBRIST.side,
    }
}

/// バリアントの乱数
#[inline]
pub fn zobrist_variant(variant: Variant) -> u64 {
    match variant {
        Variant::English => ZOBRIST.variant[0],
        Variant::International => ZOBRIST.variant[1],
    }
}
