//! # Pivot selection for the decomposition
//!
//! Threshold partial pivoting combined with the Markowitz count, searched as described by Suhl and
//! Suhl, "Computing Sparse LU Factorizations for Large-Scale Linear Programming Bases" (1990).
use crate::algorithm::dual_simplex::inverse_maintenance::lower_upper::decomposition::ActiveMatrix;

/// Rows or columns bucketed by their number of nonzeros in the active submatrix.
///
/// Doubly linked lists, one per count, so that moving an item between buckets is `O(1)`.
#[derive(Clone, Debug)]
pub(super) struct CountLists {
    head: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
    previous: Vec<Option<usize>>,
    count: Vec<Option<usize>>,
}

impl CountLists {
    /// Lists for `len` items with counts in `0..=max_count`.
    pub(super) fn new(len: usize, max_count: usize) -> Self {
        Self {
            head: vec![None; max_count + 1],
            next: vec![None; len],
            previous: vec![None; len],
            count: vec![None; len],
        }
    }

    /// Add an item to the front of the list for `count`.
    pub(super) fn insert(&mut self, item: usize, count: usize) {
        debug_assert!(self.count[item].is_none());

        self.next[item] = self.head[count];
        self.previous[item] = None;
        if let Some(first) = self.head[count] {
            self.previous[first] = Some(item);
        }
        self.head[count] = Some(item);
        self.count[item] = Some(count);
    }

    /// Take an item out of its list.
    pub(super) fn remove(&mut self, item: usize) {
        if let Some(count) = self.count[item].take() {
            match self.previous[item] {
                Some(previous) => self.next[previous] = self.next[item],
                None => self.head[count] = self.next[item],
            }
            if let Some(next) = self.next[item] {
                self.previous[next] = self.previous[item];
            }
            self.next[item] = None;
            self.previous[item] = None;
        }
    }

    /// Move an item to the list for `count`.
    pub(super) fn update(&mut self, item: usize, count: usize) {
        if self.count[item] != Some(count) {
            self.remove(item);
            self.insert(item, count);
        }
    }

    /// First item with this count.
    pub(super) fn first(&self, count: usize) -> Option<usize> {
        self.head[count]
    }

    /// Items with this count, in list order.
    pub(super) fn iter(&self, count: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.head[count], move |&item| self.next[item])
    }
}

/// Outcome of a pivot search.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(super) enum PivotChoice {
    /// Pivot on this entry.
    Pivot { row: usize, column: usize, value: f64 },
    /// This active column has no entry large enough to pivot on.
    EmptyColumn(usize),
    /// No acceptable pivot remains in the active submatrix.
    Exhausted,
}

/// Deciding which element of the active submatrix to eliminate with next.
pub(super) trait PivotRule {
    /// Choose the next pivot.
    fn choose_pivot(&self, active: &ActiveMatrix) -> PivotChoice;
}

/// Markowitz search with a relative threshold on the column maximum.
#[derive(Copy, Clone, Debug)]
pub(super) struct Markowitz {
    /// Relative threshold: `|a_ij| >= threshold * max_k |a_kj|`.
    pub threshold: f64,
    /// Absolute threshold: `|a_ij| >= tolerance`.
    pub tolerance: f64,
    /// Stop after this many rows or columns with eligible pivots were searched.
    pub max_search: usize,
}

impl Markowitz {
    fn is_eligible(&self, value: f64, column_max: f64) -> bool {
        let value = value.abs();
        value >= self.tolerance && value >= self.threshold * column_max
    }
}

impl PivotRule for Markowitz {
    fn choose_pivot(&self, active: &ActiveMatrix) -> PivotChoice {
        if let Some(column) = active.column_lists.first(0) {
            return PivotChoice::EmptyColumn(column);
        }

        // (cost, row, column, value)
        let mut best: Option<(usize, usize, usize, f64)> = None;
        let mut nr_searched = 0;
        for count in 1..=active.m {
            for column in active.column_lists.iter(count) {
                let column_max = active.column_max[column];
                let mut found = false;
                for &(row, value) in &active.columns[column] {
                    if !self.is_eligible(value, column_max) {
                        continue;
                    }
                    found = true;
                    let cost = (count - 1) * (active.rows[row].len() - 1);
                    if best.is_none_or(|(best_cost, ..)| cost < best_cost) {
                        best = Some((cost, row, column, value));
                    }
                }
                if let Some((cost, row, column, value)) = best {
                    // No remaining candidate can be cheaper
                    if cost <= (count - 1) * (count - 1) {
                        return PivotChoice::Pivot { row, column, value };
                    }
                }
                if found {
                    nr_searched += 1;
                    if nr_searched >= self.max_search {
                        if let Some((_, row, column, value)) = best {
                            return PivotChoice::Pivot { row, column, value };
                        }
                    }
                }
            }

            for row in active.row_lists.iter(count) {
                let mut found = false;
                for &column in &active.rows[row] {
                    let column_count = active.columns[column].len();
                    let cost = (count - 1) * (column_count - 1);
                    if best.is_some_and(|(best_cost, ..)| cost >= best_cost) {
                        continue;
                    }
                    let value = active.value(row, column);
                    if !self.is_eligible(value, active.column_max[column]) {
                        continue;
                    }
                    found = true;
                    best = Some((cost, row, column, value));
                }
                if let Some((cost, row, column, value)) = best {
                    if cost <= count * (count - 1) {
                        return PivotChoice::Pivot { row, column, value };
                    }
                }
                if found {
                    nr_searched += 1;
                    if nr_searched >= self.max_search {
                        if let Some((_, row, column, value)) = best {
                            return PivotChoice::Pivot { row, column, value };
                        }
                    }
                }
            }
        }

        match best {
            Some((_, row, column, value)) => PivotChoice::Pivot { row, column, value },
            None => PivotChoice::Exhausted,
        }
    }
}
