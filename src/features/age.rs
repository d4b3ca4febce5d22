//! Age in completed years
//!
//! Ages are computed from calendar fields, not elapsed days: the year
//! difference, minus one if the (month, day) anniversary has not yet been
//! reached in the reference year.

use crate::data::{Column, ColumnType, Table, Value};
use crate::{default_reference_date, Result};
use chrono::{Datelike, NaiveDate};

/// Name of the column added by [`compute_age`]
pub const AGE_COLUMN: &str = "age";

/// Whole years between `birth` and `reference`
///
/// A 29 February birthday counts as not yet reached on 28 February of a
/// non-leap year, because (2, 28) < (2, 29).
pub fn age_in_completed_years(birth: NaiveDate, reference: NaiveDate) -> i32 {
    let years = reference.year() - birth.year();
    let had_birthday = (reference.month(), reference.day()) >= (birth.month(), birth.day());
    if had_birthday {
        years
    } else {
        years - 1
    }
}

/// New table with an integer `age` column derived from `birth_column`
///
/// Rows whose birth date is missing or does not parse get a null age.
/// `reference_date` of `None` means [`crate::DEFAULT_REFERENCE_DATE`], never
/// the current date.
pub fn compute_age(
    table: &Table,
    birth_column: &str,
    reference_date: Option<NaiveDate>,
) -> Result<Table> {
    let reference = reference_date.unwrap_or_else(default_reference_date);
    let births = table.column_values(birth_column)?;

    let ages: Vec<Value> = births
        .into_iter()
        .map(|birth| match birth.as_date() {
            Some(date) => Value::Int(i64::from(age_in_completed_years(date, reference))),
            None => Value::Null,
        })
        .collect();

    let missing = ages.iter().filter(|a| a.is_null()).count();
    if missing > 0 {
        log::debug!(
            "{} of {} rows have no usable '{}'",
            missing,
            table.len(),
            birth_column
        );
    }

    table.with_column(Column::new(AGE_COLUMN, ColumnType::Int), ages)
}
