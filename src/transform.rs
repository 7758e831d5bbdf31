use crate::record::{Record, RecordSet};

pub const METERS_PER_INCH: f64 = 0.0254;
pub const KILOGRAMS_PER_POUND: f64 = 0.45359237;

/// Convert heights from inches to meters and weights from pounds to kilograms.
///
/// Both values are rounded to two decimals. Names pass through untouched and
/// no range checks are made, so zero and negative values go through the same
/// arithmetic.
pub fn transform(records: RecordSet) -> RecordSet {
    records.into_iter().map(convert_units).collect()
}

pub fn convert_units(record: Record) -> Record {
    Record {
        name: record.name,
        height: round_to_cents(record.height * METERS_PER_INCH),
        weight: round_to_cents(record.weight * KILOGRAMS_PER_POUND),
    }
}

/// Half-to-even on the scaled value, the same rule numpy's `around` applies.
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
