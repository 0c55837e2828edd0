//! Unit conversion and rounding helpers shared by the collectors.

/// Bytes per GiB.
pub(crate) const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Bytes per MiB.
pub(crate) const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to three decimal places.
#[must_use]
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Bytes → GiB, rounded to two decimals.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn gib(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_GIB)
}

/// Bytes → MiB, rounded to two decimals.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mib2(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_MIB)
}

/// Bytes → MiB, rounded to three decimals.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mib3(bytes: u64) -> f64 {
    round3(bytes as f64 / BYTES_PER_MIB)
}

/// `part` as a percentage of `whole`, zero when `whole` is zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}
