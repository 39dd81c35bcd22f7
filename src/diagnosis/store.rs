//! Constraint store — variables, translated constraints, and the two
//! nested baselines
//!
//! The store owns one solver variable per feature and the constraint set
//! derived from the model's relationships. Two baselines partition the
//! constraints:
//!
//! - `CF`: constraints derived from structural relationships and cross-tree
//!   constraints — the diagnosable candidates
//! - `AC`: `CF` plus the fixed assertion that the root feature is selected
//!
//! The *posted* set is the live solver state. It equals `AC` at the start
//! and end of every probe; probes perturb it with assumptions and the
//! redundancy probe swaps one constraint for its negation, then every path
//! restores the baseline through [`ProbeScope`].

use crate::error::{Error, Result};
use crate::model::{FeatureModel, Relationship, RelationshipType};
use crate::sat::{Clause, Lit, Solver, Var};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Identifier of a constraint within one store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(usize);

impl ConstraintId {
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(index: usize) -> Self {
        ConstraintId(index)
    }
}

/// An opaque unit of posted logic: one or more CNF clauses produced from
/// exactly one relationship
///
/// Keeps a back-reference to the rule string of the relationship that
/// produced it, which is what diagnosis explanations render. A single
/// relationship may yield several constraints (an alternative relationship
/// yields one per branch).
#[derive(Debug, Clone)]
pub struct Constraint {
    id: ConstraintId,
    clauses: Vec<Clause>,
    rule: String,
}

impl Constraint {
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// The rule identifier of the originating relationship
    pub fn rule(&self) -> &str {
        &self.rule
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Constraint {}

/// Constraint store for one feature model
#[derive(Debug)]
pub struct ConstraintStore {
    var_names: Vec<String>,
    var_index: HashMap<String, Var>,

    /// All constraints ever materialized; indices `0..fixed_len` are the
    /// permanent ones (CF then root), anything beyond is transient
    /// (assumptions, redundancy negations) and dropped on reset
    constraints: Vec<Constraint>,
    fixed_len: usize,

    cf: Vec<ConstraintId>,
    root: ConstraintId,

    /// Constraint groups per cross-tree constraint, in the model's
    /// cross-tree declaration order; used by the redundancy probe
    cross_groups: Vec<Vec<ConstraintId>>,

    /// The live posted set, in posting order
    posted: Vec<ConstraintId>,
}

impl ConstraintStore {
    /// Translate a feature model into variables and constraints.
    ///
    /// Creates one boolean variable per feature in declaration order, emits
    /// the constraint group of every relationship and cross-tree constraint,
    /// records each produced constraint back onto its relationship, fixes
    /// `CF`, appends the root assertion to form `AC`, and posts `AC`.
    ///
    /// Fails fast on structural errors: an empty model, a relationship
    /// referencing an unknown feature, or an or/alternative group with no
    /// branches.
    pub fn build(model: &mut FeatureModel) -> Result<Self> {
        let root_name = model.root()?.name().to_string();

        let mut store = Self {
            var_names: Vec::new(),
            var_index: HashMap::new(),
            constraints: Vec::new(),
            fixed_len: 0,
            cf: Vec::new(),
            root: ConstraintId(0),
            cross_groups: Vec::new(),
            posted: Vec::new(),
        };

        for feature in model.features() {
            let var = Var::new(store.var_names.len() as u32);
            store.var_names.push(feature.name().to_string());
            store.var_index.insert(feature.name().to_string(), var);
        }

        for rel in model.relationships_mut() {
            let ids = store.translate_relationship(rel)?;
            for id in ids {
                rel.attach_constraint(store.describe(id));
            }
        }

        for cstr in model.constraints_mut() {
            let ids = store.translate_cross(cstr)?;
            for &id in &ids {
                cstr.attach_constraint(store.describe(id));
            }
            store.cross_groups.push(ids);
        }

        store.cf = store.constraints.iter().map(|c| c.id()).collect();

        let root_var = store.var(&root_name)?;
        store.root = store.add_constraint(vec![vec![Lit::pos(root_var)]], format!("root({})", root_name));
        store.fixed_len = store.constraints.len();

        store.reset_to_baseline();
        Ok(store)
    }

    /// The solver variable of a feature.
    ///
    /// Failure means the model and the store are out of sync — a
    /// programmer/data-integrity error, never a runtime anomaly.
    pub fn var(&self, name: &str) -> Result<Var> {
        self.var_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownFeature(name.to_string()))
    }

    pub fn num_vars(&self) -> usize {
        self.var_names.len()
    }

    pub fn constraint(&self, id: ConstraintId) -> &Constraint {
        &self.constraints[id.0]
    }

    /// The rule identifier that produced a constraint
    pub fn rule_of(&self, id: ConstraintId) -> &str {
        self.constraints[id.0].rule()
    }

    /// The diagnosable candidates: relationship- and cross-tree-derived
    /// constraints, in declaration order
    pub fn cf(&self) -> &[ConstraintId] {
        &self.cf
    }

    /// All constraints: `CF` plus the root assertion
    pub fn ac(&self) -> Vec<ConstraintId> {
        let mut ac = self.cf.clone();
        ac.push(self.root);
        ac
    }

    /// The constraint group of the nth cross-tree constraint
    pub fn cross_group(&self, index: usize) -> &[ConstraintId] {
        &self.cross_groups[index]
    }

    /// The live posted set, in posting order
    pub fn posted(&self) -> &[ConstraintId] {
        &self.posted
    }

    pub fn is_posted(&self, id: ConstraintId) -> bool {
        self.posted.contains(&id)
    }

    /// Post a constraint. Idempotent: posting a posted constraint is a no-op.
    pub fn post(&mut self, id: ConstraintId) {
        if !self.posted.contains(&id) {
            self.posted.push(id);
        }
    }

    /// Unpost a constraint. Idempotent.
    pub fn unpost(&mut self, id: ConstraintId) {
        self.posted.retain(|&p| p != id);
    }

    /// Replace the posted set with exactly `ids` (deduplicated, in order).
    /// The consistency oracle uses this for its transactional post/restore.
    pub fn replace_posted(&mut self, ids: &[ConstraintId]) {
        self.posted.clear();
        for &id in ids {
            self.post(id);
        }
    }

    /// Unpost everything, drop transient constraints, repost exactly `AC`
    pub fn reset_to_baseline(&mut self) {
        self.constraints.truncate(self.fixed_len);
        self.posted.clear();
        self.posted.extend(self.cf.iter().copied());
        self.posted.push(self.root);
    }

    /// Whether the posted set is exactly the `AC` baseline
    pub fn at_baseline(&self) -> bool {
        self.constraints.len() == self.fixed_len && self.posted == self.ac()
    }

    /// Post a transient assumption fixing one feature's value
    pub fn assume(&mut self, name: &str, value: bool) -> Result<ConstraintId> {
        let var = self.var(name)?;
        let id = self.add_constraint(
            vec![vec![Lit::new(var, value)]],
            format!("assume({} = {})", name, value),
        );
        self.post(id);
        Ok(id)
    }

    /// Post the logical negation of a cross-tree constraint as a transient
    /// constraint group, for the redundancy probe:
    /// requires(L, R) → L ∧ ¬R; excludes(L, R) → L ∧ R.
    pub fn post_negation_of(&mut self, cstr: &Relationship) -> Result<ConstraintId> {
        let left = self.var(cstr.left())?;
        let right_name = cstr
            .right()
            .first()
            .ok_or_else(|| Error::EmptyGroup { rule: cstr.rule() })?;
        let right = self.var(right_name)?;

        let clauses = match cstr.rtype() {
            RelationshipType::Requires => vec![vec![Lit::pos(left)], vec![Lit::neg(right)]],
            RelationshipType::Excludes => vec![vec![Lit::pos(left)], vec![Lit::pos(right)]],
            other => {
                return Err(Error::Other(format!(
                    "negation is only defined for cross-tree constraints, got {}",
                    other
                )))
            }
        };

        let id = self.add_constraint(clauses, format!("not({})", cstr.rule()));
        self.post(id);
        Ok(id)
    }

    /// Open a probe scope: mutations made through the scope are rolled back
    /// to the `AC` baseline when the scope drops, on every exit path.
    pub fn scope(&mut self) -> ProbeScope<'_> {
        debug_assert!(self.at_baseline());
        ProbeScope { store: self }
    }

    /// Build a solver over the currently posted constraints
    pub fn solver(&self) -> Solver {
        let mut solver = Solver::new(self.num_vars());
        for &id in &self.posted {
            for clause in self.constraints[id.0].clauses() {
                solver.add_clause(clause.clone());
            }
        }
        solver
    }

    fn add_constraint(&mut self, clauses: Vec<Clause>, rule: String) -> ConstraintId {
        let id = ConstraintId(self.constraints.len());
        self.constraints.push(Constraint { id, clauses, rule });
        id
    }

    /// Render a constraint's clauses with feature names,
    /// e.g. `(!Root | A) & (!A | Root)`
    fn describe(&self, id: ConstraintId) -> String {
        let clauses: Vec<String> = self.constraints[id.0]
            .clauses()
            .iter()
            .map(|clause| {
                let lits: Vec<String> = clause
                    .iter()
                    .map(|lit| {
                        let name = &self.var_names[lit.var().index()];
                        if lit.is_pos() {
                            name.clone()
                        } else {
                            format!("!{}", name)
                        }
                    })
                    .collect();
                format!("({})", lits.join(" | "))
            })
            .collect();
        clauses.join(" & ")
    }

    fn translate_relationship(&mut self, rel: &Relationship) -> Result<Vec<ConstraintId>> {
        let rule = rel.rule();
        match rel.rtype() {
            RelationshipType::Mandatory => {
                // left <=> right
                let (left, right) = self.pair_vars(rel)?;
                let id = self.add_constraint(
                    vec![
                        vec![Lit::neg(left), Lit::pos(right)],
                        vec![Lit::neg(right), Lit::pos(left)],
                    ],
                    rule,
                );
                Ok(vec![id])
            }
            RelationshipType::Optional => {
                // left => right
                let (left, right) = self.pair_vars(rel)?;
                let id = self.add_constraint(vec![vec![Lit::neg(left), Lit::pos(right)]], rule);
                Ok(vec![id])
            }
            RelationshipType::Or => {
                // left <=> (r1 | r2 | ... | rn)
                let left = self.var(rel.left())?;
                let branches = self.branch_vars(rel)?;
                let mut clauses = Vec::with_capacity(branches.len() + 1);
                let mut forward: Clause = vec![Lit::neg(left)];
                forward.extend(branches.iter().map(|&b| Lit::pos(b)));
                clauses.push(forward);
                for &branch in &branches {
                    clauses.push(vec![Lit::neg(branch), Lit::pos(left)]);
                }
                let id = self.add_constraint(clauses, rule);
                Ok(vec![id])
            }
            RelationshipType::Alternative => {
                // one constraint per branch i:
                // ri <=> (left & !r1 & ... & !r_{i-1} & !r_{i+1} & ... & !rn)
                let left = self.var(rel.left())?;
                let branches = self.branch_vars(rel)?;
                let mut ids = Vec::with_capacity(branches.len());
                for (i, &branch) in branches.iter().enumerate() {
                    let mut clauses = Vec::with_capacity(branches.len() + 1);
                    clauses.push(vec![Lit::neg(branch), Lit::pos(left)]);
                    for (j, &other) in branches.iter().enumerate() {
                        if j != i {
                            clauses.push(vec![Lit::neg(branch), Lit::neg(other)]);
                        }
                    }
                    let mut reverse: Clause = vec![Lit::neg(left)];
                    reverse.extend(branches.iter().map(|&b| Lit::pos(b)));
                    clauses.push(reverse);
                    ids.push(self.add_constraint(clauses, rule.clone()));
                }
                Ok(ids)
            }
            other => Err(Error::Other(format!(
                "{} is a cross-tree constraint, not a structural relationship",
                other
            ))),
        }
    }

    fn translate_cross(&mut self, cstr: &Relationship) -> Result<Vec<ConstraintId>> {
        let rule = cstr.rule();
        let (left, right) = self.pair_vars(cstr)?;
        let id = match cstr.rtype() {
            RelationshipType::Requires => {
                self.add_constraint(vec![vec![Lit::neg(left), Lit::pos(right)]], rule)
            }
            RelationshipType::Excludes => {
                self.add_constraint(vec![vec![Lit::neg(left), Lit::neg(right)]], rule)
            }
            other => {
                return Err(Error::Other(format!(
                    "{} is a structural relationship, not a cross-tree constraint",
                    other
                )))
            }
        };
        Ok(vec![id])
    }

    fn pair_vars(&self, rel: &Relationship) -> Result<(Var, Var)> {
        let left = self.var(rel.left())?;
        let right_name = rel
            .right()
            .first()
            .ok_or_else(|| Error::EmptyGroup { rule: rel.rule() })?;
        let right = self.var(right_name)?;
        Ok((left, right))
    }

    fn branch_vars(&self, rel: &Relationship) -> Result<Vec<Var>> {
        if rel.right().is_empty() {
            return Err(Error::EmptyGroup { rule: rel.rule() });
        }
        rel.right().iter().map(|name| self.var(name)).collect()
    }
}

/// Scoped perturbation of the store
///
/// Dereferences to the store; dropping the scope resets the posted set to
/// the `AC` baseline and discards transient constraints, on normal return,
/// early return and unwind alike.
pub struct ProbeScope<'a> {
    store: &'a mut ConstraintStore,
}

impl Deref for ProbeScope<'_> {
    type Target = ConstraintStore;

    fn deref(&self) -> &ConstraintStore {
        self.store
    }
}

impl DerefMut for ProbeScope<'_> {
    fn deref_mut(&mut self) -> &mut ConstraintStore {
        self.store
    }
}

impl Drop for ProbeScope<'_> {
    fn drop(&mut self) {
        self.store.reset_to_baseline();
    }
}
