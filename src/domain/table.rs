//! Timestamp-indexed feature table.
//!
//! Columns hold `Option` values: `None` is a missing value (warm-up, a gap in
//! an input, an undefined ratio). Floating `NaN` is never stored.

use std::ops::Range;

use chrono::{DateTime, Utc};

use crate::domain::schema::ColumnId;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Float(Vec<Option<f64>>),
    /// Categorical or binary codes.
    Code(Vec<Option<i32>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Code(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnValues::Float(v) => v[row].is_none(),
            ColumnValues::Code(v) => v[row].is_none(),
        }
    }

    /// Value as f64, codes widened.
    pub fn get_f64(&self, row: usize) -> Option<f64> {
        match self {
            ColumnValues::Float(v) => v[row],
            ColumnValues::Code(v) => v[row].map(f64::from),
        }
    }

    fn retain(&mut self, keep: &[bool]) {
        fn filter<T: Copy>(v: &mut Vec<Option<T>>, keep: &[bool]) {
            let mut i = 0;
            v.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
        match self {
            ColumnValues::Float(v) => filter(v, keep),
            ColumnValues::Code(v) => filter(v, keep),
        }
    }

    fn slice(&self, range: Range<usize>) -> ColumnValues {
        match self {
            ColumnValues::Float(v) => ColumnValues::Float(v[range].to_vec()),
            ColumnValues::Code(v) => ColumnValues::Code(v[range].to_vec()),
        }
    }

    fn select(&self, rows: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Float(v) => ColumnValues::Float(rows.iter().map(|&r| v[r]).collect()),
            ColumnValues::Code(v) => ColumnValues::Code(rows.iter().map(|&r| v[r]).collect()),
        }
    }

    /// Carries the last present value forward. Leading gaps stay missing.
    pub fn forward_fill(&mut self) -> usize {
        fn fill<T: Copy>(v: &mut [Option<T>]) -> usize {
            let mut last = None;
            let mut filled = 0;
            for slot in v.iter_mut() {
                match slot {
                    Some(value) => last = Some(*value),
                    None => {
                        if last.is_some() {
                            *slot = last;
                            filled += 1;
                        }
                    }
                }
            }
            filled
        }
        match self {
            ColumnValues::Float(v) => fill(v),
            ColumnValues::Code(v) => fill(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: ColumnId,
    pub values: ColumnValues,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    index: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
}

impl FeatureTable {
    pub fn new(index: Vec<DateTime<Utc>>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.id.to_string()).collect()
    }

    pub fn has_column(&self, id: &ColumnId) -> bool {
        self.columns.iter().any(|c| &c.id == id)
    }

    pub fn column(&self, id: &ColumnId) -> Option<&ColumnValues> {
        self.columns.iter().find(|c| &c.id == id).map(|c| &c.values)
    }

    pub fn float(&self, id: &ColumnId) -> Option<&[Option<f64>]> {
        match self.column(id) {
            Some(ColumnValues::Float(v)) => Some(v),
            _ => None,
        }
    }

    pub fn code(&self, id: &ColumnId) -> Option<&[Option<i32>]> {
        match self.column(id) {
            Some(ColumnValues::Code(v)) => Some(v),
            _ => None,
        }
    }

    /// Appends a column, replacing any existing column with the same id.
    /// Panics if the length does not match the index.
    pub fn insert(&mut self, id: ColumnId, values: ColumnValues) {
        assert_eq!(
            values.len(),
            self.index.len(),
            "column {} length does not match the index",
            id
        );
        match self.columns.iter_mut().find(|c| c.id == id) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { id, values }),
        }
    }

    pub fn insert_float(&mut self, id: ColumnId, values: Vec<Option<f64>>) {
        self.insert(id, ColumnValues::Float(values));
    }

    pub fn insert_code(&mut self, id: ColumnId, values: Vec<Option<i32>>) {
        self.insert(id, ColumnValues::Code(values));
    }

    pub fn row_has_missing(&self, row: usize) -> bool {
        self.columns.iter().any(|c| c.values.is_missing(row))
    }

    /// Keeps rows where `keep[row]` is true. Returns the number removed.
    pub fn retain_rows(&mut self, keep: &[bool]) -> usize {
        assert_eq!(keep.len(), self.index.len());
        let before = self.index.len();
        let mut i = 0;
        self.index.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        for column in &mut self.columns {
            column.values.retain(keep);
        }
        before - self.index.len()
    }

    pub fn truncate(&mut self, rows: usize) {
        if rows >= self.index.len() {
            return;
        }
        let keep: Vec<bool> = (0..self.index.len()).map(|i| i < rows).collect();
        self.retain_rows(&keep);
    }

    /// Copy of the contiguous row range.
    pub fn slice(&self, range: Range<usize>) -> FeatureTable {
        FeatureTable {
            index: self.index[range.clone()].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    id: c.id.clone(),
                    values: c.values.slice(range.clone()),
                })
                .collect(),
        }
    }

    /// Copy of the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> FeatureTable {
        FeatureTable {
            index: rows.iter().map(|&r| self.index[r]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    id: c.id.clone(),
                    values: c.values.select(rows),
                })
                .collect(),
        }
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.index.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.index.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::FeatureKind;
    use chrono::{Duration, TimeZone};

    fn index(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 1, 16, 14, 30, 0).unwrap();
        (0..n).map(|i| start + Duration::minutes(i as i64)).collect()
    }

    fn ret(symbol: &str) -> ColumnId {
        ColumnId::symbol(symbol, FeatureKind::Return(5))
    }

    #[test]
    fn retain_rows_filters_index_and_columns() {
        let mut table = FeatureTable::new(index(4));
        table.insert_float(ret("QQQ"), vec![Some(1.0), Some(2.0), None, Some(4.0)]);
        table.insert_code(ColumnId::MomentumLeader, vec![Some(0), Some(1), Some(2), Some(3)]);

        let removed = table.retain_rows(&[true, false, true, true]);

        assert_eq!(removed, 1);
        assert_eq!(table.len(), 3);
        assert_eq!(table.float(&ret("QQQ")).unwrap(), &[Some(1.0), None, Some(4.0)]);
        assert_eq!(
            table.code(&ColumnId::MomentumLeader).unwrap(),
            &[Some(0), Some(2), Some(3)]
        );
        assert_eq!(table.index()[1], index(4)[2]);
    }

    #[test]
    fn forward_fill_leaves_leading_gap() {
        let mut values = ColumnValues::Float(vec![None, Some(1.0), None, None, Some(2.0), None]);
        let filled = values.forward_fill();
        assert_eq!(filled, 3);
        assert_eq!(
            values,
            ColumnValues::Float(vec![None, Some(1.0), Some(1.0), Some(1.0), Some(2.0), Some(2.0)])
        );
    }

    #[test]
    fn insert_replaces_existing_column() {
        let mut table = FeatureTable::new(index(2));
        table.insert_float(ret("QQQ"), vec![Some(1.0), Some(2.0)]);
        table.insert_float(ret("QQQ"), vec![Some(3.0), None]);
        assert_eq!(table.columns().len(), 1);
        assert_eq!(table.float(&ret("QQQ")).unwrap(), &[Some(3.0), None]);
    }

    #[test]
    #[should_panic]
    fn insert_rejects_wrong_length() {
        let mut table = FeatureTable::new(index(3));
        table.insert_float(ret("QQQ"), vec![Some(1.0)]);
    }

    #[test]
    fn slice_and_truncate() {
        let mut table = FeatureTable::new(index(5));
        table.insert_float(ret("QQQ"), (0..5).map(|i| Some(i as f64)).collect());

        let middle = table.slice(1..3);
        assert_eq!(middle.len(), 2);
        assert_eq!(middle.float(&ret("QQQ")).unwrap(), &[Some(1.0), Some(2.0)]);

        table.truncate(3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.last_timestamp(), Some(index(5)[2]));
    }

    #[test]
    fn row_has_missing_checks_every_column() {
        let mut table = FeatureTable::new(index(2));
        table.insert_float(ret("QQQ"), vec![Some(1.0), Some(2.0)]);
        table.insert_code(ColumnId::MomentumLeader, vec![Some(0), None]);
        assert!(!table.row_has_missing(0));
        assert!(table.row_has_missing(1));
    }
}
