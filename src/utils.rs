//! Some utility functions

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::entry::FoodLogEntry;
use crate::entry::SyncStatus;
use crate::nutrition::Totals;

/// Replace negative or non-finite amounts by zero
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parse a user-typed amount. Blank or invalid input is read as zero
pub fn parse_amount(text: &str) -> f64 {
    text.trim().parse::<f64>().map(sanitize_amount).unwrap_or(0.0)
}

/// Deserialize a nutrition amount that may be a number, a numeric string, null, or garbage (which reads as zero)
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let amount = match &value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_amount(s),
        _ => 0.0,
    };
    Ok(sanitize_amount(amount))
}

/// Deserialize an identifier the backend may send either as a number or as a string
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected a string or a number, got {}", other))),
    }
}


/// A debug utility that pretty-prints the entries of a day
pub fn print_entries(entries: &[FoodLogEntry]) {
    for entry in entries {
        print_entry(entry);
    }
    println!("    = {}", format_totals(&crate::nutrition::aggregate(entries, None)));
}

pub fn print_entry(entry: &FoodLogEntry) {
    let sync = match entry.sync_status() {
        SyncStatus::NotSynced => ".",
        SyncStatus::Synced => "=",
        SyncStatus::LocallyDeleted => "x",
    };
    println!("    {} {} {:<9} {}\t{} kcal\t{}", sync, entry.date(), entry.meal(), entry.name(), entry.nutrients().cals, entry.id());
}

pub fn format_totals(totals: &Totals) -> String {
    format!("{} kcal, {} g carbs, {} g protein, {} g fat, {} g sugar, {} mg sodium",
        totals.cals, totals.carbs, totals.protein, totals.fat, totals.sugar, totals.sodium)
}


/// Compare keys of two hashmaps for equality
pub fn keys_are_the_same<T, U, V>(left: &HashMap<T, U>, right: &HashMap<T, V>) -> bool
where
    T: Hash + Eq + Clone + std::fmt::Display,
{
    if left.len() != right.len() {
        log::debug!("Count of keys mismatch: {} and {}", left.len(), right.len());
        return false;
    }

    let keys_l: HashSet<T> = left.keys().cloned().collect();
    let keys_r: HashSet<T> = right.keys().cloned().collect();
    let result = keys_l == keys_r;
    if result == false {
        log::debug!("Keys of a map mismatch");
        for key in keys_l {
            log::debug!("   left: {}", key);
        }
        for key in keys_r {
            log::debug!("  right: {}", key);
        }
    }
    result
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts() {
        assert_eq!(parse_amount(" 42 "), 42.0);
        assert_eq!(parse_amount("12.5"), 12.5);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("-5"), 0.0);
        assert_eq!(sanitize_amount(f64::NAN), 0.0);
    }
}
