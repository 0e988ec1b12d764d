//! 置換表エントリのビット表現
//!
//! ```text
//! bit  0..32  value (i32)
//! bit 32..40  depth (u8)
//! bit 40..42  bound
//! bit 42..48  generation
//! bit 48..64  move key (0 = なし)
//! ```

use crate::types::{Bound, Depth, Value};

use super::GENERATION_MASK;

/// 置換表から読み出したデータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTData {
    pub value: Value,
    pub depth: Depth,
    pub bound: Bound,
    pub generation: u8,
    /// 最善手の16bit指紋
    pub move_key: Option<u16>,
}

impl TTData {
    /// u64にパックする
    #[inline]
    pub(super) fn pack(&self) -> u64 {
        let value = self.value.raw() as u32 as u64;
        let depth = self.depth.clamp(0, u8::MAX as i32) as u64;
        let bound = self.bound as u64;
        let generation = (self.generation & GENERATION_MASK) as u64;
        let mv = self.move_key.unwrap_or(0) as u64;
        value | (depth << 32) | (bound << 40) | (generation << 42) | (mv << 48)
    }

    /// u64から復元する
    #[inline]
    pub(super) fn unpack(data: u64) -> TTData {
        let mv = (data >> 48) as u16;
        TTData {
            value: Value::new(data as u32 as i32),
            depth: ((data >> 32) & 0xFF) as Depth,
            bound: Bound::from_u8((data >> 40) as u8),
            generation: ((data >> 42) as u8) & GENERATION_MASK,
            move_key: if mv == 0 { None } else { Some(mv) },
        }
    }
}
