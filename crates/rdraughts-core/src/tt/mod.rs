//! 置換表モジュール
//!
//! 探索結果をキャッシュする置換表（Transposition Table）。
//!
//! - `TTData`: エントリの中身（評価値、深さ、境界、世代、指し手指紋）
//! - `TranspositionTable`: テーブル本体
//! - 世代管理
//!
//! # ロックフリー
//!
//! 各スロットは `key ^ data` と `data` の2つの `AtomicU64` で構成する。
//! 読み出し時に `key_xor ^ data == key` を確認し、書き込み途中の破れた読み出しは
//! キーが一致しないためキャッシュミスとして扱われる。ロックは一切取らない。
//!
//! # 置換方針
//!
//! バケット（4スロット）単位で、同一キーがあればそれを更新する。なければ
//! `depth - 8 * 経過世代` が最小のスロットを置き換える。古い世代のエントリは
//! 深くても少しずつ追い出されやすくなる。

mod entry;
mod table;

pub use entry::TTData;
pub use table::TranspositionTable;

/// バケットあたりのスロット数
pub const BUCKET_SIZE: usize = 4;

/// 世代のビット数（データ内に6bitで格納）
pub const GENERATION_BITS: u32 = 6;
pub const GENERATION_MASK: u8 = (1 << GENERATION_BITS) - 1;

/// 既定のエントリ数
pub const DEFAULT_CAPACITY: usize = 1 << 20;
