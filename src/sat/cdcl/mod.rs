use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::sat::{SolveRes, Stats};
use crate::sat::formula::Lit;
use crate::sat::formula::assignment::{self, Assignment, LitVal};
use crate::sat::formula::clause::{ClauseRef, ClauseStore};
use crate::util::ScopedMs;
use self::conflict::{AnalyzeContext, Conflict};

pub use self::heuristic::{BranchingRule, DecisionHeuristic};

pub mod conflict;
pub mod heuristic;
pub mod luby;
mod watches;


#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub heuristic: BranchingRule,
    pub seed: u64,
    pub var_decay: f64,
    pub clause_decay: f64,
    /// Luby multiplier: the i-th restart fires after
    /// `restart_base * luby(i)` conflicts.
    pub restart_base: f64,
    /// Run a reduction whenever the learnt-clause total hits a multiple of
    /// this; 0 disables reduction.
    pub reduce_interval: u64,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            heuristic: BranchingRule::Vsids,
            seed: 0,
            var_decay: 0.95,
            clause_decay: 0.999,
            restart_base: 2.0,
            reduce_interval: 200,
        }
    }
}


enum LoopRes {
    Restart,
    SAT,
    UnSAT,
    Interrupted,
}


/// Conflict-driven clause-learning solver over a fixed set of variables.
pub struct Solver {
    settings: Settings,
    store: ClauseStore,
    assigns: Assignment,
    watches: watches::Watches,
    heur: DecisionHeuristic,
    analyze: AnalyzeContext,
    stats: Stats,
    stop: Arc<AtomicBool>,
    /// Cleared once a root-level contradiction is known; the solver then
    /// answers UNSAT without searching.
    ok: bool,
}

impl Solver {
    pub fn new(n_vars: usize, settings: Settings) -> Solver {
        Solver {
            store: ClauseStore::new(settings.clause_decay),
            assigns: Assignment::with_vars(n_vars),
            watches: watches::Watches::with_vars(n_vars),
            heur: DecisionHeuristic::new(
                settings.heuristic,
                n_vars,
                settings.var_decay,
                settings.seed,
            ),
            analyze: AnalyzeContext::with_vars(n_vars),
            stats: Stats::default(),
            stop: Arc::new(AtomicBool::new(false)),
            ok: true,
            settings,
        }
    }

    pub fn n_vars(&self) -> usize {
        self.assigns.number_of_vars()
    }

    pub fn n_clauses(&self) -> usize {
        self.store.num_input()
    }

    pub fn n_learnts(&self) -> usize {
        self.store.num_learnt()
    }

    /// Handle for requesting an early stop; polled once per search
    /// iteration, answering with an indeterminate verdict.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn stats(&self) -> Stats {
        let mut stats = self.stats.clone();
        stats.propagations = self.watches.propagations;
        stats.clause_inspections = self.watches.inspections;
        stats.watch_moves = self.watches.moves;
        stats
    }

    /// Add an input clause. Returns `false` once the formula is known
    /// unsatisfiable at the root (empty clause or contradicting units).
    pub fn add_clause(&mut self, lits: &[Lit]) -> bool {
        if !self.ok {
            return false;
        }

        if lits.is_empty() {
            self.ok = false;
            return false;
        }

        let cr = self.attach_clause(lits.to_vec().into_boxed_slice(), false);
        if lits.len() == 1 && !self.enqueue(lits[0], Some(cr)) {
            self.ok = false;
        }
        self.ok
    }

    /// Allocate, enroll in the watch index and feed the static scores.
    /// The LBD is taken against the current trail.
    fn attach_clause(&mut self, lits: Box<[Lit]>, learnt: bool) -> ClauseRef {
        let lbd = assignment::clause_lbd(&self.assigns, &lits);
        debug_assert!(lbd <= lits.len());
        self.heur.on_new_clause(&lits);
        let cr = self.store.alloc(lits, learnt, lbd);
        self.watches.attach(self.store.view(cr), cr);
        cr
    }

    fn enqueue(&mut self, p: Lit, reason: Option<ClauseRef>) -> bool {
        match self.assigns.of_lit(p) {
            LitVal::True => true,
            LitVal::False => false,
            LitVal::Undef => {
                self.assigns.assign_lit(p, reason);
                true
            }
        }
    }

    fn cancel_until(&mut self, target_level: usize) {
        let heur = &mut self.heur;
        self.assigns
            .rewind_until_level(target_level, |lit| heur.on_unassign(lit.var()));
    }

    pub fn solve(&mut self) -> SolveRes {
        if !self.ok {
            return SolveRes::UnSAT;
        }

        let mut curr_restarts = 0;
        loop {
            let budget = (luby::luby(2.0, curr_restarts) * self.settings.restart_base) as u64;
            match self.search(budget) {
                LoopRes::Restart => {
                    curr_restarts += 1;
                    self.stats.restarts += 1;
                    debug!(
                        "restart {} after {} conflicts, {} learnt clauses",
                        curr_restarts, self.stats.conflicts, self.store.num_learnt()
                    );
                }

                LoopRes::SAT => {
                    let model = assignment::extract_model(&self.assigns);
                    self.cancel_until(0);
                    return SolveRes::SAT(model);
                }

                LoopRes::UnSAT => {
                    self.ok = false;
                    return SolveRes::UnSAT;
                }

                LoopRes::Interrupted => {
                    self.cancel_until(0);
                    return SolveRes::Interrupted;
                }
            }
        }
    }

    /// One restart period: propagate, learn from conflicts, branch, until
    /// a verdict or the conflict budget runs out.
    fn search(&mut self, nof_conflicts: u64) -> LoopRes {
        let mut conflicts = 0;

        loop {
            if self.stop.load(Ordering::Relaxed) {
                return LoopRes::Interrupted;
            }

            let confl = {
                let _t = ScopedMs::new(&mut self.stats.t_bcp_ms);
                self.watches.propagate(&mut self.store, &mut self.assigns)
            };

            match confl {
                Some(cr) => {
                    self.stats.conflicts += 1;
                    conflicts += 1;

                    if self.assigns.is_ground_level() {
                        return LoopRes::UnSAT;
                    }

                    let analyzed = {
                        let _t = ScopedMs::new(&mut self.stats.t_analyze_ms);
                        self.analyze
                            .analyze(&mut self.store, &self.assigns, &mut self.heur, cr)
                    };
                    let (level, lits) = match analyzed {
                        Conflict::Ground => unreachable!("analyzer entered at a decision level"),
                        Conflict::Learned { level, lits } => (level, lits),
                    };

                    self.cancel_until(level);

                    let asserting = lits[0];
                    let learnt_cr = self.attach_clause(lits.into_boxed_slice(), true);
                    self.store.bump(learnt_cr);
                    let enqueued = self.enqueue(asserting, Some(learnt_cr));
                    assert!(enqueued, "asserting literal rejected after backjump");

                    self.stats.learnts_added += 1;
                    self.heur.decay();
                    self.store.decay();

                    if self.settings.reduce_interval > 0
                        && self.stats.learnts_added % self.settings.reduce_interval == 0
                    {
                        self.reduce_db();
                    }
                }

                None => {
                    if conflicts >= nof_conflicts {
                        self.cancel_until(0);
                        return LoopRes::Restart;
                    }

                    if self.assigns.number_of_assigns() == self.assigns.number_of_vars() {
                        return LoopRes::SAT;
                    }

                    self.stats.decisions += 1;
                    let next = self
                        .heur
                        .pick(&self.assigns)
                        .expect("an unassigned variable must exist");
                    self.assigns.new_decision_level();
                    self.assigns.assign_lit(next, None);
                }
            }
        }
    }

    fn reduce_db(&mut self) {
        let watches = &mut self.watches;
        let removed = self
            .store
            .reduce(&self.assigns, |c, cr| watches.detach(c, cr));
        self.stats.reduces += 1;
        debug!("reduce: removed {} of {} learnt clauses", removed, removed + self.store.num_learnt());
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::formula::Var;

    fn lit(var: usize, neg: bool) -> Lit {
        Var::from_index(var).lit(neg)
    }

    fn solver_with(n_vars: usize, clauses: &[&[i32]]) -> Solver {
        let mut solver = Solver::new(n_vars, Settings::default());
        for clause in clauses {
            let lits: Vec<Lit> = clause
                .iter()
                .map(|&id| Var::from_index((id.abs() - 1) as usize).lit(id < 0))
                .collect();
            solver.add_clause(&lits);
        }
        solver
    }

    /// Watch-index consistency: every live clause sits in exactly the
    /// watcher lists of its watched literals, and nowhere else.
    fn check_watch_index(solver: &Solver) {
        let mut expected: Vec<(ClauseRef, Lit)> = Vec::new();
        for var in 0..solver.assigns.number_of_vars() {
            for &l in [lit(var, false), lit(var, true)].iter() {
                for &cr in solver.watches.watchers(l) {
                    expected.push((cr, l));
                }
            }
        }

        for &(cr, l) in expected.iter() {
            let c = solver.store.view(cr);
            let (s0, s1) = c.watch_slots();
            assert!(
                c.lit(s0) == l || c.lit(s1) == l,
                "clause {:?} enrolled under a literal it does not watch",
                c
            );
        }

        for &cr in solver.store.learnt_refs() {
            let c = solver.store.view(cr);
            let (s0, s1) = c.watch_slots();
            let mut seen = 0;
            for &(wr, l) in expected.iter() {
                if wr == cr && (c.lit(s0) == l || c.lit(s1) == l) {
                    seen += 1;
                }
            }
            let enrollments = if s0 == s1 { 1 } else { 2 };
            assert_eq!(seen, enrollments, "learnt clause enrollment count");
        }
    }

    /// At most one watched literal of a live clause is falsified unless the
    /// clause is satisfied.
    fn check_watch_invariant(solver: &Solver) {
        for var in 0..solver.assigns.number_of_vars() {
            for &l in [lit(var, false), lit(var, true)].iter() {
                for &cr in solver.watches.watchers(l) {
                    let c = solver.store.view(cr);
                    if c.len() < 2 {
                        continue;
                    }
                    let (s0, s1) = c.watch_slots();
                    assert_ne!(s0, s1);
                    let satisfied = c.lits().iter().any(|&q| solver.assigns.is_true(q));
                    if !satisfied {
                        assert!(
                            !(solver.assigns.is_false(c.lit(s0))
                                && solver.assigns.is_false(c.lit(s1))),
                            "both watches falsified in unsatisfied clause {:?}",
                            c
                        );
                    }
                }
            }
        }
    }

    /// Trail and assignment vector agree on what is assigned.
    fn check_trail_agreement(solver: &Solver) {
        let mut on_trail = vec![false; solver.assigns.number_of_vars()];
        for &l in solver.assigns.trail() {
            on_trail[l.var().index()] = true;
            assert!(solver.assigns.is_true(l));
        }
        for var in 0..solver.assigns.number_of_vars() {
            assert_eq!(
                !solver.assigns.is_undef(Var::from_index(var)),
                on_trail[var]
            );
        }
    }

    /// Every reason clause contains its trail literal, with all other
    /// literals falsified.
    fn check_reasons(solver: &Solver) {
        for &l in solver.assigns.trail() {
            if let Some(cr) = solver.assigns.reason_of(l.var()) {
                let c = solver.store.view(cr);
                assert!(c.lits().contains(&l));
                for &q in c.lits() {
                    if q != l {
                        assert!(solver.assigns.is_false(q));
                    }
                }
            }
        }
    }

    fn check_all(solver: &Solver) {
        check_watch_index(solver);
        check_watch_invariant(solver);
        check_trail_agreement(solver);
        check_reasons(solver);
    }

    #[test]
    fn invariants_hold_after_solving_sat() {
        let mut solver = solver_with(3, &[&[1, 2], &[-1, 3], &[-2, -3]]);
        match solver.solve() {
            SolveRes::SAT(_) => {}
            _ => panic!("expected SAT"),
        }
        check_all(&solver);
    }

    #[test]
    fn invariants_hold_after_propagation_fixpoint() {
        let mut solver = solver_with(4, &[&[1], &[-1, 2], &[-2, 3, 4]]);
        let confl = solver
            .watches
            .propagate(&mut solver.store, &mut solver.assigns);
        assert!(confl.is_none());
        assert!(solver.assigns.is_true(lit(0, false)));
        assert!(solver.assigns.is_true(lit(1, false)));
        assert!(solver.assigns.is_undef(Var::from_index(2)));
        check_all(&solver);
    }

    #[test]
    fn invariants_hold_after_backtrack() {
        let mut solver = solver_with(4, &[&[-1, 2], &[-2, 3]]);
        solver.assigns.new_decision_level();
        solver.assigns.assign_lit(lit(0, false), None);
        let confl = solver
            .watches
            .propagate(&mut solver.store, &mut solver.assigns);
        assert!(confl.is_none());
        assert_eq!(solver.assigns.number_of_assigns(), 3);

        solver.cancel_until(0);
        assert_eq!(solver.assigns.number_of_assigns(), 0);
        assert_eq!(solver.assigns.level_of(Var::from_index(0)), 0);
        assert_eq!(solver.assigns.saved_phase(Var::from_index(2)), Some(true));
        check_all(&solver);
    }

    #[test]
    fn learnt_lbd_never_exceeds_size() {
        let mut solver = solver_with(
            6,
            &[
                &[1, 2],
                &[1, -2],
                &[-1, 3, 4],
                &[-1, 3, -4],
                &[-3, 5, 6],
                &[-3, 5, -6],
                &[-3, -5, 6],
                &[-3, -5, -6],
            ],
        );
        match solver.solve() {
            SolveRes::SAT(_) | SolveRes::UnSAT => {}
            SolveRes::Interrupted => panic!("not interrupted"),
        }
        assert!(solver.n_learnts() > 0, "expected conflicts to be learned from");
        for &cr in solver.store.learnt_refs() {
            let c = solver.store.view(cr);
            assert!(c.lbd() <= c.len());
        }
    }

    #[test]
    fn reduce_never_deletes_reasons() {
        let mut settings = Settings::default();
        settings.reduce_interval = 2;
        let mut solver = Solver::new(6, settings);
        let clauses: &[&[i32]] = &[
            &[1, 2],
            &[1, -2, 3],
            &[1, -2, -3, 4],
            &[-1, 5, 6],
            &[-1, 5, -6],
            &[-1, -5, 6],
            &[-1, -5, -6],
            &[-4, -1],
        ];
        for clause in clauses {
            let lits: Vec<Lit> = clause
                .iter()
                .map(|&id| Var::from_index((id.abs() - 1) as usize).lit(id < 0))
                .collect();
            solver.add_clause(&lits);
        }
        match solver.solve() {
            SolveRes::SAT(_) | SolveRes::UnSAT => {}
            SolveRes::Interrupted => panic!("not interrupted"),
        }
        // Every ref surviving in the arena is still viewable, and the
        // watcher lists only name live clauses.
        check_watch_index(&solver);
    }
}
