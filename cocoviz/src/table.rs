//! Column-oriented container for evaluation traces.
//!
//! A [`Table`] is an ordered mapping from column name to a `Vec<f64>`, with
//! every column holding the same number of rows. It provides only the handful
//! of operations the runtime-profile pipeline needs.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::error::{Error, ErrorDetails};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Vec<f64>>,
    height: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(name, values)` pairs.
    /// Every column must have the same length as the first one.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (name, values) in columns {
            table = table.with_column(name, values)?;
        }
        Ok(table)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    fn require(&self, name: &str) -> Result<&[f64], Error> {
        self.column(name).ok_or_else(|| {
            Error::new(ErrorDetails::ColumnNotFound {
                column: name.to_string(),
            })
        })
    }

    /// Adds `values` as column `name`, replacing an existing column of the same
    /// name in place.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self, Error> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// In-place version of [`Table::with_column`]. The table is left untouched
    /// if `values` has the wrong length.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), Error> {
        let name = name.into();
        let replaces_only_column = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !self.columns.is_empty() && !replaces_only_column && values.len() != self.height {
            return Err(Error::new(ErrorDetails::ColumnLengthMismatch {
                column: name,
                expected: self.height,
                actual: values.len(),
            }));
        }
        self.height = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    /// Renames column `from` to `to`, keeping its position.
    /// Returns `false` if there is no column named `from`.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if !self.columns.contains_key(from) {
            return false;
        }
        if from == to {
            return true;
        }
        // A column already named `to` is replaced
        self.columns.shift_remove(to);
        if let Some(index) = self.columns.get_index_of(from)
            && let Some((_, values)) = self.columns.shift_remove_index(index)
        {
            self.columns.shift_insert(index, to.to_string(), values);
        }
        true
    }

    /// Returns the first column's name, if any.
    pub fn first_column_name(&self) -> Option<&str> {
        self.columns.keys().next().map(String::as_str)
    }

    pub fn select(&self, names: &[&str]) -> Result<Table, Error> {
        let mut selected = IndexMap::with_capacity(names.len());
        for name in names {
            selected.insert((*name).to_string(), self.require(name)?.to_vec());
        }
        Ok(Table {
            columns: selected,
            height: if names.is_empty() { 0 } else { self.height },
        })
    }

    /// Stable ascending sort of all rows by column `key`.
    /// NaN values are ordered after every number.
    pub fn sort_by(&mut self, key: &str) -> Result<(), Error> {
        let keys = self.require(key)?;
        let mut permutation: Vec<usize> = (0..self.height).collect();
        permutation.sort_by(|&a, &b| compare_f64(keys[a], keys[b]));
        if permutation.iter().enumerate().all(|(i, &j)| i == j) {
            return Ok(());
        }
        for values in self.columns.values_mut() {
            *values = permutation.iter().map(|&i| values[i]).collect();
        }
        Ok(())
    }

    /// Stacks tables vertically. All tables must have the same set of columns;
    /// the column order of the first table is kept.
    pub fn concat<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Result<Table, Error> {
        let mut tables = tables.into_iter();
        let Some(first) = tables.next() else {
            return Ok(Table::new());
        };
        let mut result = first.clone();
        for table in tables {
            for name in table.columns.keys() {
                if !result.columns.contains_key(name) {
                    return Err(Error::new(ErrorDetails::ColumnNotFound {
                        column: name.clone(),
                    }));
                }
            }
            for (name, values) in &mut result.columns {
                values.extend_from_slice(table.require(name)?);
            }
            result.height += table.height;
        }
        Ok(result)
    }

    pub fn cumulative_max(&self, name: &str) -> Result<Vec<f64>, Error> {
        Ok(running_best(self.require(name)?, true))
    }

    pub fn cumulative_min(&self, name: &str) -> Result<Vec<f64>, Error> {
        Ok(running_best(self.require(name)?, false))
    }

    /// Smallest non-NaN value of column `name`, or `None` if there is none.
    pub fn min(&self, name: &str) -> Result<Option<f64>, Error> {
        Ok(self
            .require(name)?
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .min_by(|a, b| a.total_cmp(b)))
    }

    /// Largest non-NaN value of column `name`, or `None` if there is none.
    pub fn max(&self, name: &str) -> Result<Option<f64>, Error> {
        Ok(self
            .require(name)?
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .max_by(|a, b| a.total_cmp(b)))
    }

    /// Distinct non-NaN values of column `name` in ascending order.
    pub fn distinct_sorted(&self, name: &str) -> Result<Vec<f64>, Error> {
        let mut values: Vec<f64> = self
            .require(name)?
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        Ok(values)
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.total_cmp(&b),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

/// Running maximum (`larger_is_better`) or running minimum of `values`.
///
/// NaN entries never replace the current best; a leading NaN is carried until
/// the first number is seen.
pub fn running_best(values: &[f64], larger_is_better: bool) -> Vec<f64> {
    let mut best = f64::NAN;
    values
        .iter()
        .map(|&value| {
            let improves = if larger_is_better {
                value > best
            } else {
                value < best
            };
            if !value.is_nan() && (best.is_nan() || improves) {
                best = value;
            }
            best
        })
        .collect()
}
