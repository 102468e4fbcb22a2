//! 数值范围限制与随机数生成。

use std::fmt::Display;

use rand::{
    Rng,
    distr::{Uniform, uniform::SampleUniform},
};

use crate::types::RangeError;

/// 将 `value` 限制在 `[min, max]` 之内，返回范围内最接近的值。
///
/// # Errors
///
/// `min > max` 时返回 `RangeError::InvalidBounds`。
pub fn adjust_to_range<T>(value: T, min: T, max: T) -> Result<T, RangeError>
where
    T: PartialOrd + Display,
{
    if min > max {
        return Err(RangeError::InvalidBounds {
            min: min.to_string(),
            max: max.to_string(),
        });
    }

    Ok(if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    })
}

/// 从半开区间 `[min_inclusive, max_exclusive)` 中取一个随机值。
///
/// # Errors
///
/// 区间为空，或浮点区间的边界及跨度不是有限值时返回 `RangeError::EmptyRange`。
pub fn random_in_range<T>(min_inclusive: T, max_exclusive: T) -> Result<T, RangeError>
where
    T: SampleUniform + Display,
{
    let range = Uniform::<T>::new(&min_inclusive, &max_exclusive).map_err(|_| {
        RangeError::EmptyRange {
            min: min_inclusive.to_string(),
            max: max_exclusive.to_string(),
        }
    })?;
    Ok(rand::rng().sample(range))
}

/// # Errors
///
/// 区间为空时返回 `RangeError::EmptyRange`。
pub fn random_int(min_inclusive: i32, max_exclusive: i32) -> Result<i32, RangeError> {
    random_in_range(min_inclusive, max_exclusive)
}

/// # Errors
///
/// 区间为空时返回 `RangeError::EmptyRange`。
pub fn random_long(min_inclusive: i64, max_exclusive: i64) -> Result<i64, RangeError> {
    random_in_range(min_inclusive, max_exclusive)
}

/// 边界以及两者之差都必须是有限值。
///
/// # Errors
///
/// 区间为空或跨度溢出为无穷大时返回 `RangeError::EmptyRange`。
pub fn random_double(min_inclusive: f64, max_exclusive: f64) -> Result<f64, RangeError> {
    random_in_range(min_inclusive, max_exclusive)
}
