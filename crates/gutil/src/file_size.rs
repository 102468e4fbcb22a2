//! 常用的文件大小单位（以 1024 为进制）。

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// 文件大小单位。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum FileSizeUnit {
    /// 1024^0 字节
    Byte,
    /// 1024^1 字节
    Kilobyte,
    /// 1024^2 字节
    Megabyte,
    /// 1024^3 字节
    Gigabyte,
    /// 1024^4 字节
    Terabyte,
}

impl FileSizeUnit {
    /// 一个单位包含的字节数。
    #[must_use]
    pub const fn number_of_bytes(self) -> u64 {
        match self {
            Self::Byte => 1,
            Self::Kilobyte => 1 << 10,
            Self::Megabyte => 1 << 20,
            Self::Gigabyte => 1 << 30,
            Self::Terabyte => 1 << 40,
        }
    }

    /// 在两个单位之间换算。例如 2048 `Megabyte` 换算为 `Gigabyte` 得到 2.0。
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn convert(value: f64, from: Self, to: Self) -> f64 {
        value * (from.number_of_bytes() as f64 / to.number_of_bytes() as f64)
    }
}
