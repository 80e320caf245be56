use crate::sat::formula::{Lit, VarVec};
use crate::sat::formula::assignment::Assignment;
use crate::sat::formula::clause::{ClauseRef, ClauseStore};
use super::heuristic::DecisionHeuristic;


pub enum Conflict {
    /// Conflict with no decision made: the formula is unsatisfiable.
    Ground,
    /// First-UIP learned clause. `lits[0]` is the asserting literal; for a
    /// clause of two or more literals `lits[1]` carries the backjump level.
    Learned { level: usize, lits: Vec<Lit> },
}


pub struct AnalyzeContext {
    seen: VarVec<bool>,
}

impl AnalyzeContext {
    pub fn with_vars(n: usize) -> AnalyzeContext {
        AnalyzeContext {
            seen: VarVec::filled(n),
        }
    }

    /// Resolve backwards from the conflicting clause along the trail of the
    /// current level until a single literal of that level remains — the
    /// first unique implication point. Every reason clause used is bumped,
    /// and every variable encountered is bumped once in the heuristic.
    ///
    /// Post-conditions mirror the clause layout expected by the caller:
    /// the asserting literal sits at index 0, and with two or more literals
    /// index 1 holds one of maximal remaining level, so default watches
    /// land on the asserting literal and a backjump-level literal.
    pub fn analyze(
        &mut self,
        store: &mut ClauseStore,
        assigns: &Assignment,
        heur: &mut DecisionHeuristic,
        confl0: ClauseRef,
    ) -> Conflict {
        if assigns.is_ground_level() {
            return Conflict::Ground;
        }

        let current_level = assigns.decision_level();
        let mut out_learnt: Vec<Lit> = Vec::new();
        let mut path_c: usize = 0;
        let mut confl = confl0;
        // Propagated literal of the reason under resolution; the conflict
        // clause itself contributes all of its literals.
        let mut skip: Option<Lit> = None;
        let mut index = assigns.number_of_assigns();

        let asserting = loop {
            store.bump(confl);

            for &q in store.view(confl).lits() {
                if Some(q) == skip {
                    continue;
                }
                let v = q.var();
                if !self.seen[v] && assigns.level_of(v) > 0 {
                    self.seen[v] = true;
                    heur.bump(v);
                    if assigns.level_of(v) >= current_level {
                        path_c += 1;
                    } else {
                        out_learnt.push(q);
                    }
                }
            }

            // Walk back to the most recent marked trail literal.
            let pl = loop {
                index -= 1;
                let l = assigns.assign_at(index);
                if self.seen[l.var()] {
                    break l;
                }
            };

            self.seen[pl.var()] = false;
            path_c -= 1;
            if path_c == 0 {
                break !pl;
            }

            confl = assigns
                .reason_of(pl.var())
                .expect("decision variable reached while a UIP was pending");
            skip = Some(pl);
        };

        for &l in out_learnt.iter() {
            self.seen[l.var()] = false;
        }

        if out_learnt.is_empty() {
            Conflict::Learned {
                level: 0,
                lits: vec![asserting],
            }
        } else {
            // Swap a literal of maximal level into slot 1; that level is
            // the backjump target.
            let mut max_i = 0;
            for i in 1..out_learnt.len() {
                if assigns.level_of(out_learnt[i].var())
                    > assigns.level_of(out_learnt[max_i].var())
                {
                    max_i = i;
                }
            }
            out_learnt.swap(0, max_i);
            out_learnt.insert(0, asserting);

            let level = assigns.level_of(out_learnt[1].var());
            Conflict::Learned {
                level,
                lits: out_learnt,
            }
        }
    }
}
