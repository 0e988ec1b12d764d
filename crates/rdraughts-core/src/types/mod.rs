//! 基本型定義
//!
//! - `Color`: 手番（白/黒）
//! - `Variant`: ルール（8×8 English / 10×10 International）
//! - `Square`: マス（行・列）
//! - `Piece`: 駒（色 + 成り）
//! - `Move`: 指し手（連続ジャンプを含むステップ列）
//! - `Value`: 評価値
//! - `Bound`: 置換表の評価値境界

mod bound;
mod color;
mod moves;
mod piece;
mod square;
mod value;
mod variant;

pub use bound::Bound;
pub use color::Color;
pub use moves::{Move, MoveList, Path};
pub use piece::Piece;
pub use square::Square;
pub use value::Value;
pub use variant::Variant;

/// 最大探索深度（ply）
pub const MAX_PLY: i32 = 128;

/// 探索深度の型
pub type Depth = i32;
