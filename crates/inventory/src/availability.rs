use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use brewpos_core::{Clock, InventoryItemId, StockError, StockResult};
use brewpos_menu::{RecipeResolver, RecipeStore, Requirement};

use crate::ledger::{StockLedger, StockStore};
use crate::reservation::OrderLine;

/// Ingredient shortfall behind an unavailable line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Shortage {
    pub item_id: InventoryItemId,
    pub required: i64,
    /// Free stock remaining for this line after earlier lines in the same
    /// request (clamped at zero).
    pub free: i64,
}

/// Availability verdict for one order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAvailability {
    pub line: OrderLine,
    /// Whether the line has a recipe. Untracked lines are always available.
    pub tracked: bool,
    pub available: bool,
    pub shortages: Vec<Shortage>,
}

/// Whole-request advisory verdict.
///
/// Advisory only: stock can change between this check and a reservation.
/// Only `reserve` is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub is_available: bool,
    pub has_ingredient_tracking: bool,
    pub lines: Vec<LineAvailability>,
    pub checked_at: DateTime<Utc>,
}

/// An order line with its resolved requirements (`None` when untracked).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    pub line: OrderLine,
    pub requirements: Option<Vec<Requirement>>,
}

/// Evaluate lines against free stock.
///
/// Lines are walked in request order with a running projection of
/// quantities earlier available lines would consume, so two lines competing
/// for the same ingredient are never both reported available when stock
/// only covers one.
pub fn project_availability(
    free_by_item: &HashMap<InventoryItemId, i64>,
    lines: Vec<ResolvedLine>,
    checked_at: DateTime<Utc>,
) -> AvailabilityReport {
    let mut projected: HashMap<InventoryItemId, i64> = HashMap::new();
    let mut out = Vec::with_capacity(lines.len());
    let mut has_tracking = false;

    for resolved in lines {
        let Some(requirements) = resolved.requirements else {
            out.push(LineAvailability {
                line: resolved.line,
                tracked: false,
                available: true,
                shortages: Vec::new(),
            });
            continue;
        };

        has_tracking = true;
        let mut shortages = Vec::new();
        for req in &requirements {
            let free = free_by_item.get(&req.item_id).copied().unwrap_or(0);
            let already = projected.get(&req.item_id).copied().unwrap_or(0);
            let remaining = free - already;
            if remaining < req.quantity {
                shortages.push(Shortage {
                    item_id: req.item_id,
                    required: req.quantity,
                    free: remaining.max(0),
                });
            }
        }

        let available = shortages.is_empty();
        if available {
            for req in &requirements {
                *projected.entry(req.item_id).or_insert(0) += req.quantity;
            }
        }
        out.push(LineAvailability {
            line: resolved.line,
            tracked: true,
            available,
            shortages,
        });
    }

    AvailabilityReport {
        is_available: out.iter().all(|l| l.available),
        has_ingredient_tracking: has_tracking,
        lines: out,
        checked_at,
    }
}

/// Read-only availability check over live ledger state.
///
/// Takes no item locks: the view is relaxed and may trail an in-flight
/// reservation by a moment, which is acceptable for advisory answers.
pub struct AvailabilityChecker<S, R> {
    ledger: Arc<StockLedger<S>>,
    resolver: RecipeResolver<R>,
    clock: Arc<dyn Clock>,
}

impl<S: StockStore, R: RecipeStore> AvailabilityChecker<S, R> {
    pub fn new(
        ledger: Arc<StockLedger<S>>,
        resolver: RecipeResolver<R>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            resolver,
            clock,
        }
    }

    pub fn check(&self, lines: &[OrderLine]) -> StockResult<AvailabilityReport> {
        let mut resolved = Vec::with_capacity(lines.len());
        for line in lines {
            match self
                .resolver
                .resolve(line.menu_item_id, line.size, line.quantity)
            {
                Ok(requirements) => resolved.push(ResolvedLine {
                    line: *line,
                    requirements: Some(requirements),
                }),
                Err(StockError::RecipeNotFound { .. }) => {
                    tracing::debug!(
                        menu_item = %line.menu_item_id,
                        size = %line.size,
                        "no recipe; treating line as untracked"
                    );
                    resolved.push(ResolvedLine {
                        line: *line,
                        requirements: None,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let free_by_item = self
            .ledger
            .list()?
            .into_iter()
            .map(|record| (record.item.id, record.levels.free()))
            .collect();

        Ok(project_availability(
            &free_by_item,
            resolved,
            self.clock.now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewpos_core::{CupSize, MenuItemId};

    fn line(quantity: i64) -> OrderLine {
        OrderLine {
            menu_item_id: MenuItemId::new(),
            size: CupSize::Regular,
            quantity,
        }
    }

    fn tracked(requirements: Vec<Requirement>) -> ResolvedLine {
        ResolvedLine {
            line: line(1),
            requirements: Some(requirements),
        }
    }

    #[test]
    fn untracked_lines_are_trivially_available() {
        let report = project_availability(
            &HashMap::new(),
            vec![ResolvedLine {
                line: line(3),
                requirements: None,
            }],
            Utc::now(),
        );

        assert!(report.is_available);
        assert!(!report.has_ingredient_tracking);
        assert!(report.lines[0].available);
        assert!(!report.lines[0].tracked);
    }

    #[test]
    fn shortage_reports_required_and_free() {
        let beans = InventoryItemId::new();
        let free = HashMap::from([(beans, 30)]);

        let report = project_availability(
            &free,
            vec![tracked(vec![Requirement {
                item_id: beans,
                quantity: 54,
            }])],
            Utc::now(),
        );

        assert!(!report.is_available);
        assert!(report.has_ingredient_tracking);
        let shortage = &report.lines[0].shortages[0];
        assert_eq!(shortage.item_id, beans);
        assert_eq!(shortage.required, 54);
        assert_eq!(shortage.free, 30);
    }

    #[test]
    fn competing_lines_are_not_both_reported_available() {
        let beans = InventoryItemId::new();
        let free = HashMap::from([(beans, 20)]);

        let report = project_availability(
            &free,
            vec![
                tracked(vec![Requirement {
                    item_id: beans,
                    quantity: 18,
                }]),
                tracked(vec![Requirement {
                    item_id: beans,
                    quantity: 18,
                }]),
            ],
            Utc::now(),
        );

        assert!(!report.is_available);
        assert!(report.lines[0].available);
        assert!(!report.lines[1].available);
        // The second line sees what the first left behind.
        assert_eq!(report.lines[1].shortages[0].free, 2);
    }

    #[test]
    fn unavailable_lines_do_not_consume_projection() {
        let beans = InventoryItemId::new();
        let free = HashMap::from([(beans, 20)]);

        let report = project_availability(
            &free,
            vec![
                tracked(vec![Requirement {
                    item_id: beans,
                    quantity: 50,
                }]),
                tracked(vec![Requirement {
                    item_id: beans,
                    quantity: 18,
                }]),
            ],
            Utc::now(),
        );

        assert!(!report.lines[0].available);
        // The first line could not be fulfilled, so it holds nothing back.
        assert!(report.lines[1].available);
    }

    #[test]
    fn unknown_ingredient_counts_as_zero_free() {
        let report = project_availability(
            &HashMap::new(),
            vec![tracked(vec![Requirement {
                item_id: InventoryItemId::new(),
                quantity: 1,
            }])],
            Utc::now(),
        );

        assert!(!report.is_available);
        assert_eq!(report.lines[0].shortages[0].free, 0);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: a fully available request stays available with more
            /// stock, and the approved demand never exceeds free stock.
            ///
            /// Per-line verdicts are not monotone (more stock can approve an
            /// earlier line whose consumption starves a later one), so only
            /// the whole-request verdict is asserted.
            #[test]
            fn availability_is_monotone_in_free_stock(
                free in 0i64..10_000i64,
                extra in 0i64..10_000i64,
                demands in prop::collection::vec(1i64..2_000i64, 1..6)
            ) {
                let item = InventoryItemId::new();
                let lines: Vec<ResolvedLine> = demands
                    .iter()
                    .map(|q| tracked(vec![Requirement {
                        item_id: item,
                        quantity: *q,
                    }]))
                    .collect();

                let base = project_availability(
                    &HashMap::from([(item, free)]),
                    lines.clone(),
                    Utc::now(),
                );
                let more = project_availability(
                    &HashMap::from([(item, free + extra)]),
                    lines,
                    Utc::now(),
                );

                if base.is_available {
                    prop_assert!(more.is_available);
                }

                let approved: i64 = base
                    .lines
                    .iter()
                    .zip(demands.iter())
                    .filter(|(line, _)| line.available)
                    .map(|(_, quantity)| *quantity)
                    .sum();
                prop_assert!(approved <= free);
            }
        }
    }
}
