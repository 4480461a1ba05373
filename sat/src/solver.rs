//! `SatSolver`: the interface every CNF encoder targets, plus `DpllSolver`, a
//! reference implementation with unit propagation and chronological
//! backtracking. Not competition-grade — the corpus carries no SAT solver
//! crate, so this plays the role a bundled `minisat`/`cadical` binding would
//! in a fuller build, favoring a readable, obviously-correct core over watch
//! lists and clause learning.

use crate::lit::{Lit, Var};
use hashbrown::HashMap;

/// Three-valued outcome of `SatSolver::solve`, matching spec.md §6's consumed
/// SAT interface (`{True, False, Unknown}`). `Unknown` is the only outcome a
/// resource-limited solver may report instead of a definite answer; the core
/// never retries internally (spec.md §7) and propagates it to the caller as
/// `DtpgStatus::Aborted`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SatResult {
    Sat(Model),
    Unsat,
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Model {
    values: Vec<Option<bool>>,
}

impl Model {
    pub fn value(&self, var: Var) -> Option<bool> {
        self.values.get(var.index()).copied().flatten()
    }

    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.value(lit.var()).map(|v| v == lit.is_positive())
    }
}

pub trait SatSolver {
    fn new_var(&mut self) -> Var;
    fn add_clause(&mut self, clause: &[Lit]);
    fn solve(&mut self, assumptions: &[Lit]) -> SatResult;
}

/// A plain backtracking DPLL solver over an explicit clause database.
#[derive(Default)]
pub struct DpllSolver {
    clauses: Vec<Vec<Lit>>,
    num_vars: u32,
    /// Search-node budget for `solve`; `None` means unbounded (the solver
    /// always terminates with a definite answer). `Some(n)` makes `solve`
    /// return `SatResult::Unknown` once more than `n` branch points have been
    /// explored, modelling spec.md §7's "resource limit hit inside solver".
    node_budget: Option<u64>,
}

impl DpllSolver {
    pub fn new() -> Self {
        DpllSolver::default()
    }

    /// A solver that gives up and reports `SatResult::Unknown` after
    /// exploring more than `budget` branch points, instead of searching to
    /// completion.
    pub fn with_node_budget(budget: u64) -> Self {
        DpllSolver { node_budget: Some(budget), ..Default::default() }
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn propagate(
        &self,
        assign: &mut Vec<Option<bool>>,
        trail: &mut Vec<Var>,
    ) -> bool {
        loop {
            let mut progressed = false;
            for clause in &self.clauses {
                let mut unassigned: Option<Lit> = None;
                let mut satisfied = false;
                let mut unassigned_count = 0;
                for &lit in clause {
                    match assign[lit.var().index()] {
                        Some(v) if v == lit.is_positive() => {
                            satisfied = true;
                            break;
                        }
                        Some(_) => {}
                        None => {
                            unassigned_count += 1;
                            unassigned = Some(lit);
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                if unassigned_count == 0 {
                    return false;
                }
                if unassigned_count == 1 {
                    let lit = unassigned.unwrap();
                    assign[lit.var().index()] = Some(lit.is_positive());
                    trail.push(lit.var());
                    progressed = true;
                }
            }
            if !progressed {
                return true;
            }
        }
    }

    fn is_satisfied(&self, assign: &[Option<bool>]) -> bool {
        self.clauses.iter().all(|clause| {
            clause.iter().any(|&lit| assign[lit.var().index()] == Some(lit.is_positive()))
        })
    }

    fn has_conflict(&self, assign: &[Option<bool>]) -> bool {
        self.clauses.iter().any(|clause| {
            clause.iter().all(|&lit| assign[lit.var().index()] == Some(!lit.is_positive()))
        })
    }

    /// `Some(true)`/`Some(false)` is a definite sat/unsat answer for this
    /// subtree; `None` means the node budget ran out before one was found.
    fn search(&self, assign: &mut Vec<Option<bool>>, budget: &mut Option<u64>) -> Option<bool> {
        if let Some(b) = budget {
            if *b == 0 {
                return None;
            }
            *b -= 1;
        }

        let mut trail = Vec::new();
        if !self.propagate(assign, &mut trail) {
            for v in trail {
                assign[v.index()] = None;
            }
            return Some(false);
        }
        if self.has_conflict(assign) {
            for v in trail {
                assign[v.index()] = None;
            }
            return Some(false);
        }
        if self.is_satisfied(assign) {
            return Some(true);
        }
        let next = (0..self.num_vars as usize).find(|&i| assign[i].is_none());
        let result = match next {
            None => Some(self.is_satisfied(assign)),
            Some(idx) => {
                assign[idx] = Some(true);
                match self.search(assign, budget) {
                    Some(true) => Some(true),
                    Some(false) => {
                        assign[idx] = Some(false);
                        match self.search(assign, budget) {
                            Some(true) => Some(true),
                            Some(false) => {
                                assign[idx] = None;
                                Some(false)
                            }
                            None => None,
                        }
                    }
                    None => None,
                }
            }
        };
        if result != Some(true) {
            for v in trail {
                assign[v.index()] = None;
            }
        }
        result
    }
}

impl SatSolver for DpllSolver {
    fn new_var(&mut self) -> Var {
        let v = Var(self.num_vars);
        self.num_vars += 1;
        v
    }

    fn add_clause(&mut self, clause: &[Lit]) {
        self.clauses.push(clause.to_vec());
    }

    fn solve(&mut self, assumptions: &[Lit]) -> SatResult {
        let mut assign: Vec<Option<bool>> = vec![None; self.num_vars as usize];
        for &lit in assumptions {
            assign[lit.var().index()] = Some(lit.is_positive());
        }
        if self.has_conflict(&assign) {
            return SatResult::Unsat;
        }
        let mut budget = self.node_budget;
        match self.search(&mut assign, &mut budget) {
            Some(true) => SatResult::Sat(Model { values: assign }),
            Some(false) => SatResult::Unsat,
            None => SatResult::Unknown,
        }
    }
}

/// Deduplicating wrapper used by encoders that emit the same clause twice
/// across overlapping cones (e.g. a shared fanin gate encoded once per fault).
#[derive(Default)]
pub struct ClauseDedup {
    seen: HashMap<Vec<Lit>, ()>,
}

impl ClauseDedup {
    pub fn new() -> Self {
        ClauseDedup::default()
    }

    pub fn add_once(&mut self, solver: &mut impl SatSolver, mut clause: Vec<Lit>) {
        clause.sort_by_key(|l| l.index());
        clause.dedup();
        if self.seen.insert(clause.clone(), ()).is_none() {
            solver.add_clause(&clause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_propagation_forces_chain() {
        let mut solver = DpllSolver::new();
        let a = solver.new_var();
        let b = solver.new_var();
        solver.add_clause(&[a.pos_lit()]);
        solver.add_clause(&[a.neg_lit(), b.pos_lit()]);
        match solver.solve(&[]) {
            SatResult::Sat(model) => {
                assert_eq!(model.value(a), Some(true));
                assert_eq!(model.value(b), Some(true));
            }
            other => panic!("expected sat: {:?}", other),
        }
    }

    #[test]
    fn conflicting_unit_clauses_are_unsat() {
        let mut solver = DpllSolver::new();
        let a = solver.new_var();
        solver.add_clause(&[a.pos_lit()]);
        solver.add_clause(&[a.neg_lit()]);
        assert_eq!(solver.solve(&[]), SatResult::Unsat);
    }

    #[test]
    fn assumptions_are_respected() {
        let mut solver = DpllSolver::new();
        let a = solver.new_var();
        let b = solver.new_var();
        solver.add_clause(&[a.pos_lit(), b.pos_lit()]);
        let result = solver.solve(&[a.neg_lit()]);
        match result {
            SatResult::Sat(model) => assert_eq!(model.value(b), Some(true)),
            other => panic!("expected sat: {:?}", other),
        }
    }

    #[test]
    fn zero_node_budget_reports_unknown_instead_of_searching() {
        let mut solver = DpllSolver::with_node_budget(0);
        let a = solver.new_var();
        let b = solver.new_var();
        // Needs at least one branch decision to resolve; budget is exhausted
        // before propagation/conflict-checking even gets a chance to decide.
        solver.add_clause(&[a.pos_lit(), b.pos_lit()]);
        solver.add_clause(&[a.neg_lit(), b.neg_lit()]);
        assert_eq!(solver.solve(&[]), SatResult::Unknown);
    }
}
