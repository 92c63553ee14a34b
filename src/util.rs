/// Asserts that a numerical value is in the provided interval `[a,b]` and panics
/// with a helpful message if not
///
/// ### Example
/// ```should_panic
/// # use dp::assert_interval;
/// let gamma = 2.0;
/// assert_interval!(gamma, 0.0, 1.0);
/// ```
/// This will panic with the message "Invalid value for \`gamma\`. Must be in the interval \[0, 1\]."
#[macro_export]
macro_rules! assert_interval {
    ($var:expr, $a:expr, $b:expr) => {
        assert!(
            $var >= $a && $var <= $b,
            "Invalid value for `{}`. Must be in the interval [{}, {}].",
            stringify!($var),
            $a,
            $b,
        );
    };
}

#[cfg(test)]
mod tests {
    #[test]
    #[should_panic(expected = "Must be in the interval [0, 1]")]
    fn assert_interval_rejects_out_of_range() {
        let gamma = 1.5;
        assert_interval!(gamma, 0.0, 1.0);
    }

    #[test]
    fn assert_interval_accepts_bounds() {
        let lo = 0.0;
        let hi = 1.0;
        assert_interval!(lo, 0.0, 1.0);
        assert_interval!(hi, 0.0, 1.0);
    }
}
