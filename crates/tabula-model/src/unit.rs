//! Unit conversion tables and unit-bearing quantities.
//!
//! A [`UnitTable`] is built once from a sparse list of declared ratios and then
//! answers `convert(amount, from, to)` for every pair of units reachable
//! through any chain of declarations in O(1) per query. Finished tables are
//! immutable and shared behind an `Arc` by every [`Quantity`] that references
//! them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::error::ValueError;

/// Dense any-unit-to-any-unit conversion table.
///
/// A declaration `("km", 1000.0, "m")` reads "1 km = 1000 m". The build interns
/// unit names into integer ids, inserts each declared edge together with its
/// reciprocal into a sparse adjacency list (the first declaration of an edge
/// wins; later duplicates are no-ops), then runs one breadth-first pass per
/// source unit to fill a dense factor matrix with an identity diagonal. Units
/// in different connected components have no factor, and converting across
/// them fails.
#[derive(Debug)]
pub struct UnitTable {
    names: Vec<Arc<str>>,
    ids: HashMap<Arc<str>, usize>,
    unit_count: usize,
    factors: Vec<Option<f64>>,
}

fn intern(names: &mut Vec<Arc<str>>, ids: &mut HashMap<Arc<str>, usize>, unit: &str) -> usize {
    if let Some(&id) = ids.get(unit) {
        return id;
    }
    let name: Arc<str> = Arc::from(unit);
    let id = names.len();
    names.push(name.clone());
    ids.insert(name, id);
    id
}

impl UnitTable {
    /// Builds the closed table from declared ratios (`1 from = factor × to`).
    pub fn new<'a>(declarations: impl IntoIterator<Item = (&'a str, f64, &'a str)>) -> Arc<Self> {
        let mut names: Vec<Arc<str>> = Vec::new();
        let mut ids: HashMap<Arc<str>, usize> = HashMap::new();
        let declared: Vec<(usize, f64, usize)> = declarations
            .into_iter()
            .map(|(from, factor, to)| {
                let from = intern(&mut names, &mut ids, from);
                let to = intern(&mut names, &mut ids, to);
                (from, factor, to)
            })
            .collect();

        let unit_count = names.len();
        let mut edges: Vec<Vec<(usize, f64)>> = vec![Vec::new(); unit_count];
        for (from, factor, to) in declared {
            if !edges[from].iter().any(|&(next, _)| next == to) {
                edges[from].push((to, factor));
            }
            if !edges[to].iter().any(|&(next, _)| next == from) {
                edges[to].push((from, 1.0 / factor));
            }
        }

        // One BFS per source; each node is settled at most once per source, so
        // the closure is bounded by the U×U matrix.
        let mut factors: Vec<Option<f64>> = vec![None; unit_count * unit_count];
        for src in 0..unit_count {
            factors[src * unit_count + src] = Some(1.0);
            let mut queue = VecDeque::new();
            queue.push_back((src, 1.0));
            while let Some((node, factor)) = queue.pop_front() {
                for &(next, edge) in &edges[node] {
                    let slot = &mut factors[src * unit_count + next];
                    if slot.is_none() {
                        let derived = factor * edge;
                        *slot = Some(derived);
                        queue.push_back((next, derived));
                    }
                }
            }
        }

        Arc::new(Self {
            names,
            ids,
            unit_count,
            factors,
        })
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.ids.contains_key(unit)
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|name| name.as_ref())
    }

    fn id(&self, unit: &str) -> Result<usize, ValueError> {
        self.ids
            .get(unit)
            .copied()
            .ok_or_else(|| ValueError::invalid(format!("unknown unit {unit:?}")))
    }

    /// Multiplicative factor turning an amount of `from` into `to`.
    pub fn factor(&self, from: &str, to: &str) -> Result<f64, ValueError> {
        let from_id = self.id(from)?;
        let to_id = self.id(to)?;
        self.factors[from_id * self.unit_count + to_id]
            .ok_or_else(|| ValueError::invalid(format!("no conversion from {from:?} to {to:?}")))
    }

    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, ValueError> {
        Ok(amount * self.factor(from, to)?)
    }

    /// Constructs a quantity of this table's units.
    pub fn value(self: &Arc<Self>, amount: f64, unit: &str) -> Result<Quantity, ValueError> {
        Quantity::new(amount, unit, Arc::clone(self))
    }
}

/// A numeric amount tagged with a measurement unit and its shared table.
///
/// Validity is unit existence only; the amount may be any `f64`.
#[derive(Debug, Clone)]
pub struct Quantity {
    amount: f64,
    unit: Arc<str>,
    table: Arc<UnitTable>,
}

impl Quantity {
    pub fn new(amount: f64, unit: &str, table: Arc<UnitTable>) -> Result<Self, ValueError> {
        if !table.contains(unit) {
            return Err(ValueError::invalid(format!("unknown unit {unit:?}")));
        }
        Ok(Self {
            amount,
            unit: Arc::from(unit),
            table,
        })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn table(&self) -> &Arc<UnitTable> {
        &self.table
    }

    /// The amount expressed in `to` units.
    pub fn get(&self, to: &str) -> Result<f64, ValueError> {
        self.table.convert(self.amount, &self.unit, to)
    }

    pub fn with_amount(&self, amount: f64) -> Self {
        Self {
            amount,
            unit: self.unit.clone(),
            table: self.table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::approx_eq;

    fn conversion_table() -> Arc<UnitTable> {
        UnitTable::new([
            ("b", 2.0, "a"),
            ("c", 5.0, "a"),
            ("d", 10.0, "b"),
            ("e", 50.0, "c"),
        ])
    }

    #[test]
    fn closure_covers_every_pair() {
        let table = conversion_table();
        let expected = [
            ("a", "a", 1.0),
            ("a", "b", 1.0 / 2.0),
            ("a", "c", 1.0 / 5.0),
            ("a", "d", 1.0 / 20.0),
            ("a", "e", 1.0 / 250.0),
            ("b", "a", 2.0),
            ("b", "b", 1.0),
            ("b", "c", 2.0 / 5.0),
            ("b", "d", 1.0 / 10.0),
            ("b", "e", 2.0 / 250.0),
            ("c", "a", 5.0),
            ("c", "b", 5.0 / 2.0),
            ("c", "c", 1.0),
            ("c", "d", 5.0 / 20.0),
            ("c", "e", 1.0 / 50.0),
            ("d", "a", 20.0),
            ("d", "b", 10.0),
            ("d", "c", 20.0 / 5.0),
            ("d", "d", 1.0),
            ("d", "e", 20.0 / 250.0),
            ("e", "a", 250.0),
            ("e", "b", 250.0 / 2.0),
            ("e", "c", 50.0),
            ("e", "d", 250.0 / 20.0),
            ("e", "e", 1.0),
        ];
        for (from, to, factor) in expected {
            assert!(
                approx_eq(table.factor(from, to).unwrap(), factor),
                "{from} -> {to}"
            );
        }
    }

    #[test]
    fn transitivity_holds_across_derived_factors() {
        let table = conversion_table();
        let units = ["a", "b", "c", "d", "e"];
        for from in units {
            for via in units {
                for to in units {
                    let chained =
                        table.convert(1.0, from, via).unwrap() * table.convert(1.0, via, to).unwrap();
                    let direct = table.convert(1.0, from, to).unwrap();
                    assert!(
                        (chained - direct).abs() <= 1e-9 * direct.abs().max(1.0),
                        "{from} -> {via} -> {to}"
                    );
                }
            }
        }
    }

    #[test]
    fn duplicate_declarations_are_no_ops() {
        let table = UnitTable::new([("km", 1000.0, "m"), ("km", 5.0, "m")]);
        assert!(approx_eq(table.factor("km", "m").unwrap(), 1000.0));
        assert!(approx_eq(table.factor("m", "km").unwrap(), 0.001));
    }

    #[test]
    fn unknown_unit_fails() {
        let table = UnitTable::new([("km", 1000.0, "m")]);
        assert!(matches!(
            table.convert(1.0, "km", "furlong"),
            Err(ValueError::Invalid { .. })
        ));
        assert!(table.value(1.0, "furlong").is_err());
    }

    #[test]
    fn disconnected_components_have_no_conversion() {
        let table = UnitTable::new([("km", 1000.0, "m"), ("kg", 1000.0, "g")]);
        assert!(matches!(
            table.convert(1.0, "m", "g"),
            Err(ValueError::Invalid { .. })
        ));
        assert!(approx_eq(table.convert(2.0, "km", "m").unwrap(), 2000.0));
        assert!(approx_eq(table.convert(2.0, "kg", "g").unwrap(), 2000.0));
    }

    #[test]
    fn identity_round_trip() {
        let table = UnitTable::new([("km", 1000.0, "m")]);
        let quantity = table.value(42.5, "km").unwrap();
        assert_eq!(quantity.get("km").unwrap(), 42.5);
    }
}
