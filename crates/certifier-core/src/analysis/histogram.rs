//! Zero-centered latency histogram
//!
//! Latency deltas are assigned to `side_bins + 1` fixed-width bins. Bin 0 is
//! the center bin and holds values that round to zero bin widths; bin `k`
//! holds values that round to `k` bin widths.
//!
//! ## Bin width
//!
//! ```text
//! bin_width = max(1, ceil(max(|delta|) / side_bins))
//! ```
//!
//! ## Midpoint rounding
//!
//! A value that sits exactly between two bins would always land in the same
//! neighbour under a fixed rounding rule, which skews the picture for
//! quantized inputs. Midpoints are therefore alternated across one binning
//! pass: the first rounds away from zero, the next towards zero, and so on.
//!
//! ## Dropped values
//!
//! Values whose bin index falls outside `0..=side_bins` are dropped without
//! error. Bin indices are not mirrored, so any delta that rounds to a negative
//! bin (an input earlier than its cue by more than half a bin width) is
//! dropped. Non-finite values are dropped too.

use super::AnalysisError;
use serde::{Deserialize, Serialize};

/// Index of the center bin
pub const CENTER_BIN_INDEX: i32 = 0;

/// One distinct latency value in a bin with its occurrence count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinValue {
    /// Latency value
    pub value: f64,
    /// Number of times the value was binned
    pub count: u32,
}

/// A histogram cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    /// Signed bin index, 0 is the center
    index: i32,
    /// Distinct values in ascending order
    values: Vec<BinValue>,
    /// Occupancy when the histogram was built
    original_total: u32,
    /// Occupancy after the last offset recomputation
    adjustment: u32,
}

impl Bin {
    fn new(index: i32) -> Self {
        Self {
            index,
            values: Vec::new(),
            original_total: 0,
            adjustment: 0,
        }
    }

    /// Signed bin index
    pub fn index(&self) -> i32 {
        self.index
    }

    /// Whether this is the center bin
    pub fn is_center(&self) -> bool {
        self.index == CENTER_BIN_INDEX
    }

    /// Distinct values in ascending order, each with its count
    pub fn values(&self) -> &[BinValue] {
        &self.values
    }

    /// Number of values in the bin, duplicates included
    pub fn total(&self) -> u32 {
        self.values.iter().map(|v| v.count).sum()
    }

    /// Occupancy at build time
    pub fn original_total(&self) -> u32 {
        self.original_total
    }

    /// Occupancy derived by the last offset recomputation
    pub fn adjustment(&self) -> u32 {
        self.adjustment
    }

    /// Whether the adjustment differs from the build-time occupancy
    pub fn has_adjustment(&self) -> bool {
        self.adjustment != self.original_total
    }

    fn insert(&mut self, value: f64) {
        match self
            .values
            .binary_search_by(|probe| probe.value.total_cmp(&value))
        {
            Ok(i) => self.values[i].count += 1,
            Err(i) => self.values.insert(i, BinValue { value, count: 1 }),
        }
    }
}

/// Round a raw bin offset to a whole number of bins
///
/// Exact midpoints are resolved by `round_up`, which flips after every
/// midpoint: `true` moves the value one bin away from zero, `false` keeps it
/// on the bin nearer to zero. Everything else rounds to nearest, ties away
/// from zero.
///
/// # Example
/// ```
/// use certifier_core::analysis::histogram::resolve_bin_offset;
///
/// let mut round_up = true;
/// assert_eq!(resolve_bin_offset(0.5, &mut round_up), 1.0);
/// assert_eq!(resolve_bin_offset(1.5, &mut round_up), 1.0);
/// assert_eq!(resolve_bin_offset(2.4, &mut round_up), 2.0);
/// assert_eq!(resolve_bin_offset(2.5, &mut round_up), 3.0);
/// ```
pub fn resolve_bin_offset(raw: f64, round_up: &mut bool) -> f64 {
    let whole = raw.trunc();
    if (raw - whole).abs() == 0.5 {
        let step = if *round_up { 1.0 } else { 0.0 };
        *round_up = !*round_up;
        return whole + raw.signum() * step;
    }
    raw.round()
}

/// Binned latency distribution
///
/// # Example
/// ```
/// use certifier_core::analysis::histogram::Histogram;
///
/// let histogram = Histogram::build(&[0.0, 0.0, 3.0], 100).unwrap();
/// assert_eq!(histogram.bin_width(), 1.0);
/// assert_eq!(histogram.bin(0).unwrap().total(), 2);
/// assert_eq!(histogram.bin(3).unwrap().total(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Width of one bin, always >= 1
    bin_width: f64,
    /// Bins beside the center bin
    side_bins: usize,
    /// Fixed-length bin array, position == bin index
    bins: Vec<Bin>,
    /// Last offset passed to [`Histogram::apply_offset`]
    offset: f64,
    /// Values excluded from every bin
    dropped: usize,
}

impl Histogram {
    /// Histogram with no values and the minimum bin width
    pub fn empty(side_bins: usize) -> Self {
        // At least one bin beside the center
        let side_bins = side_bins.max(1);
        let bins = (0..=side_bins)
            .map(|i| Bin::new(CENTER_BIN_INDEX + i as i32))
            .collect();

        Self {
            bin_width: 1.0,
            side_bins,
            bins,
            offset: 0.0,
            dropped: 0,
        }
    }

    /// Bin a delta sequence
    ///
    /// Fails with [`AnalysisError::EmptyInput`] when `deltas` is empty; callers
    /// that still need something to render can use [`Histogram::empty`].
    pub fn build(deltas: &[f64], side_bins: usize) -> Result<Self, AnalysisError> {
        if deltas.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let mut histogram = Self::empty(side_bins);
        histogram.bin_width = Self::bin_width_for(deltas, histogram.side_bins);
        histogram.assign(deltas);

        tracing::debug!(
            values = deltas.len(),
            binned = histogram.total_count(),
            dropped = histogram.dropped,
            bin_width = histogram.bin_width,
            "histogram_built"
        );
        Ok(histogram)
    }

    /// Bin width for a delta set: `ceil(max|delta| / side_bins)`, at least 1
    pub fn bin_width_for(deltas: &[f64], side_bins: usize) -> f64 {
        let max_abs = deltas
            .iter()
            .filter(|d| d.is_finite())
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));
        (max_abs / side_bins.max(1) as f64).ceil().max(1.0)
    }

    fn assign(&mut self, deltas: &[f64]) {
        for bin in &mut self.bins {
            bin.values.clear();
        }
        self.dropped = 0;

        let mut round_up = true;
        for &delta in deltas {
            if !delta.is_finite() {
                self.dropped += 1;
                continue;
            }

            let offset = resolve_bin_offset(delta / self.bin_width, &mut round_up);
            let index = i64::from(CENTER_BIN_INDEX) + offset as i64;

            match usize::try_from(index).ok().and_then(|i| self.bins.get_mut(i)) {
                Some(bin) => bin.insert(delta),
                None => self.dropped += 1,
            }
        }

        for bin in &mut self.bins {
            bin.original_total = bin.total();
            bin.adjustment = bin.original_total;
        }
    }

    /// Store a new offset and recompute the per-bin adjustment totals
    ///
    /// Bin membership is left untouched; each bin's adjustment is re-derived
    /// from its current occupancy and compared against the build-time total.
    pub fn apply_offset(&mut self, offset: f64) {
        self.offset = offset;
        for bin in &mut self.bins {
            bin.adjustment = bin.total();
        }

        tracing::debug!(
            offset,
            adjusted_bins = self.bins.iter().filter(|b| b.has_adjustment()).count(),
            "histogram_offset_applied"
        );
    }

    /// Supply an adjustment total for one bin from outside
    ///
    /// Returns `false` if `index` is not a bin of this histogram.
    pub fn set_bin_adjustment(&mut self, index: i32, total: u32) -> bool {
        match self.bin_mut(index) {
            Some(bin) => {
                bin.adjustment = total;
                true
            }
            None => false,
        }
    }

    /// Last applied offset
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Width of one bin
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Bins beside the center bin
    pub fn side_bins(&self) -> usize {
        self.side_bins
    }

    /// All bins, ordered by index
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Bin with the given signed index
    pub fn bin(&self, index: i32) -> Option<&Bin> {
        let position = usize::try_from(index - CENTER_BIN_INDEX).ok()?;
        self.bins.get(position)
    }

    fn bin_mut(&mut self, index: i32) -> Option<&mut Bin> {
        let position = usize::try_from(index - CENTER_BIN_INDEX).ok()?;
        self.bins.get_mut(position)
    }

    /// The center bin
    pub fn center(&self) -> &Bin {
        &self.bins[0]
    }

    /// Number of values across all bins
    pub fn total_count(&self) -> usize {
        self.bins.iter().map(|b| b.total() as usize).sum()
    }

    /// Number of values dropped as out of range or non-finite
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    /// Largest bin occupancy
    pub fn max_count(&self) -> u32 {
        self.bins.iter().map(Bin::total).max().unwrap_or(0)
    }

    /// Value covered by the outermost bin
    pub fn max_value(&self) -> f64 {
        self.side_bins as f64 * self.bin_width
    }
}
