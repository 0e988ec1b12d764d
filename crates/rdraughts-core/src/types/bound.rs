//! 評価値の境界（Bound）

/// 置換表に保存する評価値の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Bound {
    /// 未使用
    #[default]
    None = 0,
    /// 上界（alphaを超えなかった）
    Upper = 1,
    /// 下界（betaカットを起こした）
    Lower = 2,
    /// 正確な値
    Exact = 3,
}

impl Bound {
    /// u8から変換（下位2bitのみ使用）
    #[inline]
    pub const fn from_u8(v: u8) -> Bound {
        match v & 3 {
            1 => Bound::Upper,
            2 => Bound::Lower,
            3 => Bound::Exact,
            _ => Bound::None,
        }
    }

    /// 下界として使えるか
    #[inline]
    pub const fn is_lower(self) -> bool {
        (self as u8) & (Bound::Lower as u8) != 0
    }

    /// 上界として使えるか
    #[inline]
    pub const fn is_upper(self) -> bool {
        (self as u8) & (Bound::Upper as u8) != 0
    }
}
