//! Technical Debt Ledger
//! =====================
//!
//! Debt accrues from low-quality merged work. Each item drags team
//! productivity down by `0.01 × severity`; the ledger caps the combined
//! drag at [`MAX_PRODUCTIVITY_IMPACT`].

use serde::{Deserialize, Serialize};
use simlab_env::{DebtId, PrId};

/// Upper bound on the combined productivity impact of unpaid debt.
pub const MAX_PRODUCTIVITY_IMPACT: f64 = 0.50;

/// Productivity impact per unit of severity.
const IMPACT_PER_SEVERITY: f64 = 0.01;

/// Hours of remediation per unit of severity.
const EFFORT_HOURS_PER_SEVERITY: f64 = 8.0;

/// A single unit of technical debt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalDebtItem {
    pub id: DebtId,
    pub created_at: u64,
    pub caused_by_pr: Option<PrId>,

    /// 0.5 = minor, 1.0 = moderate, 2.0 = severe
    pub severity: f64,
    pub productivity_impact: f64,

    /// Hours needed to pay the item off
    pub effort_to_fix: f64,

    pub is_paid_off: bool,
    pub paid_off_at: Option<u64>,
}

impl TechnicalDebtItem {
    pub fn new(id: DebtId, created_at: u64, caused_by_pr: Option<PrId>, severity: f64) -> Self {
        Self {
            id,
            created_at,
            caused_by_pr,
            severity,
            productivity_impact: IMPACT_PER_SEVERITY * severity,
            effort_to_fix: EFFORT_HOURS_PER_SEVERITY * severity,
            is_paid_off: false,
            paid_off_at: None,
        }
    }

    fn pay_off(&mut self, timestep: u64) {
        self.is_paid_off = true;
        self.paid_off_at = Some(timestep);
    }
}

/// Snapshot of the ledger for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtStats {
    pub total_debt_created: usize,
    pub total_debt_paid: usize,
    pub active_debt_count: usize,
    pub productivity_impact: f64,
    pub total_effort_to_fix: f64,
}

/// Append-only record of debt items with payoff tracking.
#[derive(Debug, Clone, Default)]
pub struct DebtLedger {
    items: Vec<TechnicalDebtItem>,
    total_created: usize,
    total_paid: usize,
}

impl DebtLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new debt item and returns its id.
    pub fn add_debt(
        &mut self,
        id: DebtId,
        created_at: u64,
        caused_by_pr: Option<PrId>,
        severity: f64,
    ) -> DebtId {
        self.items
            .push(TechnicalDebtItem::new(id, created_at, caused_by_pr, severity));
        self.total_created += 1;
        id
    }

    /// Marks an item paid. Returns false if the id is unknown or the item
    /// was already paid off.
    pub fn pay_off_debt(&mut self, id: DebtId, timestep: u64) -> bool {
        match self.items.iter_mut().find(|d| d.id == id) {
            Some(item) if !item.is_paid_off => {
                item.pay_off(timestep);
                self.total_paid += 1;
                true
            }
            _ => false,
        }
    }

    /// Unpaid items in creation order.
    pub fn active_debt(&self) -> impl Iterator<Item = &TechnicalDebtItem> {
        self.items.iter().filter(|d| !d.is_paid_off)
    }

    pub fn active_count(&self) -> usize {
        self.active_debt().count()
    }

    /// Combined productivity drag of unpaid debt, in `[0, 0.50]`.
    pub fn total_productivity_impact(&self) -> f64 {
        let total: f64 = self.active_debt().map(|d| d.productivity_impact).sum();
        total.clamp(0.0, MAX_PRODUCTIVITY_IMPACT)
    }

    pub fn items(&self) -> &[TechnicalDebtItem] {
        &self.items
    }

    pub fn get(&self, id: DebtId) -> Option<&TechnicalDebtItem> {
        self.items.iter().find(|d| d.id == id)
    }

    pub fn stats(&self) -> DebtStats {
        DebtStats {
            total_debt_created: self.total_created,
            total_debt_paid: self.total_paid,
            active_debt_count: self.active_count(),
            productivity_impact: self.total_productivity_impact(),
            total_effort_to_fix: self.active_debt().map(|d| d.effort_to_fix).sum(),
        }
    }
}
