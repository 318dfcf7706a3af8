//! Keyed column set
//!
//! One column per synthetic identifier, created up front for every
//! original feature and filled in by whichever extraction path owns the
//! feature. Columns are materialised in identifier order, which is the
//! original feature order.

use std::collections::BTreeMap;

/// Where the values of a column came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrigin {
    /// Direct point or line sampling
    Sampled,
    /// Aggregated over the pixels the polygon owns in the zone raster
    Zonal,
    /// Re-extracted because the polygon owned no zone cell
    SmallPolygon,
    /// Polygon owned no zone cell and was not re-extracted
    Unrealized,
    /// Feature fell entirely outside the raster extent
    Outside,
}

/// Values and provenance of one feature's column
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedColumn {
    pub origin: ColumnOrigin,
    pub values: Vec<f64>,
}

/// Columns keyed by synthetic identifier, missing until populated
#[derive(Debug, Clone)]
pub struct ColumnSet {
    rows: usize,
    columns: BTreeMap<u32, KeyedColumn>,
}

impl ColumnSet {
    /// Create an all-missing column for every identifier in `1..=feature_count`
    pub fn new(feature_count: usize, rows: usize) -> Self {
        let columns = (1..=feature_count as u32)
            .map(|id| (id, KeyedColumn { origin: ColumnOrigin::Unrealized, values: vec![f64::NAN; rows] }))
            .collect();
        ColumnSet { rows, columns }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&KeyedColumn> {
        self.columns.get(&id)
    }

    /// Record the provenance of a column
    pub fn set_origin(&mut self, id: u32, origin: ColumnOrigin) {
        if let Some(column) = self.columns.get_mut(&id) {
            column.origin = origin;
        }
    }

    /// Store one value; unknown identifiers and rows are ignored
    pub fn set_value(&mut self, id: u32, row: usize, value: f64) {
        if let Some(slot) = self.columns.get_mut(&id).and_then(|c| c.values.get_mut(row)) {
            *slot = value;
        }
    }

    /// Mark features that fell outside the raster
    pub fn mark_outside(&mut self, ids: &[u32]) {
        for &id in ids {
            self.set_origin(id, ColumnOrigin::Outside);
        }
    }

    /// Columns in identifier order
    pub fn into_columns(self) -> impl Iterator<Item = (u32, KeyedColumn)> {
        self.columns.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_start_missing() {
        let set = ColumnSet::new(3, 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.rows(), 2);
        let column = set.get(2).unwrap();
        assert_eq!(column.origin, ColumnOrigin::Unrealized);
        assert!(column.values.iter().all(|v| v.is_nan()));
        assert!(set.get(4).is_none());
    }

    #[test]
    fn test_population_order_does_not_matter() {
        let mut set = ColumnSet::new(3, 1);
        set.set_value(3, 0, 30.0);
        set.set_origin(3, ColumnOrigin::SmallPolygon);
        set.mark_outside(&[2]);
        set.set_value(1, 0, 10.0);
        set.set_origin(1, ColumnOrigin::Zonal);
        set.set_value(7, 0, 70.0);
        set.set_value(1, 5, 99.0);

        let columns: Vec<(u32, KeyedColumn)> = set.into_columns().collect();
        let ids: Vec<u32> = columns.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(columns[0].1.values, vec![10.0]);
        assert_eq!(columns[1].1.origin, ColumnOrigin::Outside);
        assert_eq!(columns[2].1.origin, ColumnOrigin::SmallPolygon);
        assert_eq!(columns[2].1.values, vec![30.0]);
    }
}
