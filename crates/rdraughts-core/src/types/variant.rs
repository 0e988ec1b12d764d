//! ルールバリアント

use serde::{Deserialize, Serialize};

/// 盤サイズと捕獲ルールの組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// 8×8。後退捕獲なし、短距離キング
    #[serde(alias = "british", alias = "checkers")]
    English,
    /// 10×10。後退捕獲あり、飛びキング、最多捕獲ルール
    #[serde(alias = "polish")]
    International,
}

impl Variant {
    /// 盤の一辺
    #[inline]
    pub const fn size(self) -> u8 {
        match self {
            Variant::English => 8,
            Variant::International => 10,
        }
    }

    /// 使用するマス（暗いマス）の数
    #[inline]
    pub const fn playable_squares(self) -> usize {
        let s = self.size() as usize;
        s * s / 2
    }

    /// 初期配置の段数
    #[inline]
    pub const fn man_rows(self) -> u8 {
        match self {
            Variant::English => 3,
            Variant::International => 4,
        }
    }

    /// 兵が後ろ向きにも捕獲できるか
    #[inline]
    pub const fn men_capture_backward(self) -> bool {
        matches!(self, Variant::International)
    }

    /// キングが任意距離を移動・捕獲できるか
    #[inline]
    pub const fn flying_kings(self) -> bool {
        matches!(self, Variant::International)
    }

    /// 最多捕獲ルールを適用するか
    #[inline]
    pub const fn majority_capture(self) -> bool {
        matches!(self, Variant::International)
    }

    /// 引き分けになる静かな手（キングの非捕獲手）の連続ply数
    #[inline]
    pub const fn quiet_ply_limit(self) -> u16 {
        match self {
            Variant::English => 80,
            Variant::International => 50,
        }
    }

    /// 盤サイズから取得
    pub const fn from_size(size: u8) -> Option<Variant> {
        match size {
            8 => Some(Variant::English),
            10 => Some(Variant::International),
            _ => None,
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "british" | "checkers" | "8" => Ok(Variant::English),
            "international" | "polish" | "10" => Ok(Variant::International),
            other => Err(format!("unknown variant: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_geometry() {
        assert_eq!(Variant::English.playable_squares(), 32);
        assert_eq!(Variant::International.playable_squares(), 50);
        assert_eq!(Variant::from_size(10), Some(Variant::International));
        assert_eq!(Variant::from_size(9), None);
        assert_eq!("british".parse::<Variant>(), Ok(Variant::English));
    }
}
