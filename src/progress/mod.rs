//! Macro-level task progress calculation.
//!
//! This module provides the pure calculation functions behind a task's progress
//! percentage. Discovery and per-item processing are sequential phases of one run,
//! so progress is a weighted blend rather than a flat item ratio: the discovery
//! phase contributes a fixed share of the total and item processing fills in the
//! remainder. Filtered automation reports per-filter instead, since its item total
//! grows as each filter is extracted.

/// Progress percentage reported when discovery begins.
pub const DISCOVERY_START: u8 = 5;

/// Share of total progress contributed by the discovery phase.
///
/// Discovery covers `[0, 40]`; item processing scales across the remaining
/// `[40, 100]`.
pub const DISCOVERY_SHARE: u8 = 40;

/// Computes task progress from item completions after discovery.
///
/// Progress stays at the discovery share until the first item completes and reaches
/// 100 only when every item has been processed. A run that discovered zero items is
/// immediately complete.
///
/// # Arguments
/// - `processed` - Number of items that reached a terminal processing outcome
/// - `total` - Number of items discovered for the run
///
/// # Returns
/// - `u8` - Progress percentage in `[DISCOVERY_SHARE, 100]`
pub fn processing_progress(processed: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }

    let processing_share = (100 - DISCOVERY_SHARE) as u64;
    let scaled = processing_share * u64::from(processed.min(total)) / u64::from(total);
    DISCOVERY_SHARE + scaled as u8
}

/// Computes task progress for a filtered automation run.
///
/// Filters are processed strictly sequentially and weighted equally, with progress
/// inside a filter scaled by its own item count. The total only reaches 100 once
/// the last item of the last filter is done.
///
/// # Arguments
/// - `filters_done` - Number of filters fully processed so far
/// - `filter_count` - Total number of filters in the run
/// - `items_done` - Items processed within the current filter
/// - `items_in_filter` - Items discovered for the current filter
///
/// # Returns
/// - `u8` - Progress percentage in `[0, 100]`
pub fn filtered_progress(
    filters_done: usize,
    filter_count: usize,
    items_done: u32,
    items_in_filter: u32,
) -> u8 {
    if filter_count == 0 {
        return 100;
    }

    let per_filter = 100.0 / filter_count as f64;
    let within = if items_in_filter == 0 {
        per_filter
    } else {
        per_filter * f64::from(items_done.min(items_in_filter)) / f64::from(items_in_filter)
    };

    let total = per_filter * filters_done as f64 + within;
    total.min(100.0) as u8
}
