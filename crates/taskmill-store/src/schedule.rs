use std::str::FromStr;

use cron::Schedule;

use crate::error::{Result, StoreError};

/// Parse a standard 5-field cron expression (minute, hour, day-of-month,
/// month, day-of-week).
///
/// The `cron` crate expects a leading seconds field, so a `0` is prepended
/// before parsing; the stored expression stays in 5-field form.
pub fn parse_cron(expr: &str) -> Result<Schedule> {
    let fields = expr.split_whitespace().count();
    if fields != 5 {
        return Err(StoreError::InvalidCron {
            expr: expr.to_string(),
            reason: format!("expected 5 fields, got {fields}"),
        });
    }
    Schedule::from_str(&format!("0 {expr}")).map_err(|e| StoreError::InvalidCron {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}
