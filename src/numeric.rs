use ndarray::{Array, Array1, ArrayView2, Axis, Dimension};
use num_traits::{Float, ToPrimitive};

/// Assert two float values are the same up to `eps`, treating NaN as equal to NaN.
#[cfg(test)]
pub fn assert_float_eq<T>(left: T, right: T, eps: T)
where
    T: Float + std::fmt::Display,
{
    if left.is_nan() {
        assert!(right.is_nan(), "left is NaN, but right is not");
    } else {
        let diff = (left - right).abs();
        assert!(
            diff < eps,
            "values |{} - {}| ≥ {} (diff: {})",
            left,
            right,
            eps,
            diff
        );
    }
}

/// Column means ignoring NaN entries. All-NaN columns give NaN.
pub fn nan_mean_columns<T: Float>(values: ArrayView2<T>) -> Array1<T> {
    values.map_axis(Axis(0), |column| {
        let (sum, n) = column
            .iter()
            .filter(|x| !x.is_nan())
            .fold((T::zero(), 0usize), |(sum, n), &x| (sum + x, n + 1));
        if n == 0 {
            T::nan()
        } else {
            sum / T::from(n).unwrap_or_else(T::nan)
        }
    })
}

/// Counts of entries set to NaN for falling outside a valid range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutOfRange {
    pub below: usize,
    pub above: usize,
}

impl OutOfRange {
    pub fn total(&self) -> usize {
        self.below + self.above
    }
}

/// Set every entry outside `[low, high]` to NaN, returning how many were changed.
pub fn coerce_out_of_range<T, D>(values: &mut Array<T, D>, low: T, high: T) -> OutOfRange
where
    T: Float,
    D: Dimension,
{
    let mut counts = OutOfRange::default();
    values.map_inplace(|x| {
        if *x < low {
            counts.below += 1;
            *x = T::nan();
        } else if *x > high {
            counts.above += 1;
            *x = T::nan();
        }
    });
    counts
}

/// Round to `i8`, replacing NaN with `sentinel`.
pub fn to_i8_with_sentinel<T, D>(values: &Array<T, D>, sentinel: i8) -> Array<i8, D>
where
    T: Float,
    D: Dimension,
{
    values.mapv(|x| {
        if x.is_nan() {
            sentinel
        } else {
            x.round().to_i8().unwrap_or(sentinel)
        }
    })
}
