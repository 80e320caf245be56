use crate::sat::formula::LitVec;
use crate::sat::formula::assignment::{Assignment, LitVal};
use crate::sat::formula::clause::{Clause, ClauseRef, ClauseStore};


/// Two-watched-literal index. `occurs[l]` lists the clauses currently
/// watching literal `l`; propagation for a trail literal `p` therefore
/// walks `occurs[!p]`.
pub struct Watches {
    occurs: LitVec<Vec<ClauseRef>>,
    pub propagations: u64,
    pub inspections: u64,
    pub moves: u64,
}

impl Watches {
    pub fn with_vars(n: usize) -> Watches {
        Watches {
            occurs: LitVec::filled(2 * n),
            propagations: 0,
            inspections: 0,
            moves: 0,
        }
    }

    pub fn attach(&mut self, c: &Clause, cr: ClauseRef) {
        let (s0, s1) = c.watch_slots();
        self.occurs[c.lit(s0)].push(cr);
        if s1 != s0 {
            self.occurs[c.lit(s1)].push(cr);
        }
    }

    pub fn detach(&mut self, c: &Clause, cr: ClauseRef) {
        let (s0, s1) = c.watch_slots();
        self.occurs[c.lit(s0)].retain(|&w| w != cr);
        if s1 != s0 {
            self.occurs[c.lit(s1)].retain(|&w| w != cr);
        }
    }

    #[cfg(test)]
    pub fn watchers(&self, lit: crate::sat::formula::Lit) -> &[ClauseRef] {
        &self.occurs[lit]
    }

    /// Propagate every queued trail literal to fixpoint. On conflict the
    /// conflicting clause is returned at once and the trail cursor is left
    /// alone, so the analyzer sees the complete antecedent structure.
    pub fn propagate(
        &mut self,
        store: &mut ClauseStore,
        assigns: &mut Assignment,
    ) -> Option<ClauseRef> {
        while let Some(p) = assigns.dequeue() {
            self.propagations += 1;
            let false_lit = !p;

            let mut i = 0;
            while i < self.occurs[false_lit].len() {
                let cr = self.occurs[false_lit][i];
                self.inspections += 1;

                let c = store.edit(cr);
                let (s0, s1) = c.watch_slots();
                let watch = if c.lit(s0) == false_lit { 0 } else { 1 };
                debug_assert!(c.lit(if watch == 0 { s0 } else { s1 }) == false_lit);
                let other = c.lit(if watch == 0 { s1 } else { s0 });

                // The other watched literal is true: clause is satisfied.
                if assigns.of_lit(other) == LitVal::True {
                    i += 1;
                    continue;
                }

                // Look for a non-false literal outside the watched slots.
                let mut new_watch = None;
                for k in 0..c.len() {
                    if k == s0 || k == s1 {
                        continue;
                    }
                    let l = c.lit(k);
                    if assigns.of_lit(l) != LitVal::False {
                        c.set_watch(watch, k);
                        new_watch = Some(l);
                        break;
                    }
                }

                match new_watch {
                    Some(l) => {
                        // Swap-removal refills slot i; do not advance.
                        self.occurs[false_lit].swap_remove(i);
                        self.occurs[l].push(cr);
                        self.moves += 1;
                    }

                    // No replacement and the other watch is false too: a
                    // falsified unit clause also lands here, its single
                    // literal being its own "other" watch.
                    None if assigns.of_lit(other) == LitVal::False => {
                        return Some(cr);
                    }

                    // Clause is unit under the assignment.
                    None => {
                        assigns.assign_lit(other, Some(cr));
                        i += 1;
                    }
                }
            }
        }

        None
    }
}
