use serde::Serialize;
use std::fmt;

use crate::models::Person;

/// Value above which a solver's output counts as "selected"
pub const SELECTION_THRESHOLD: f64 = 0.5;

/// Unordered pair of participant indices with `first <= second`.
/// `first == second` means the participant stays unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CandidatePair {
    pub first: usize,
    pub second: usize,
}

impl CandidatePair {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            first: a.min(b),
            second: a.max(b),
        }
    }

    #[inline]
    pub fn is_self(&self) -> bool {
        self.first == self.second
    }

    #[inline]
    pub fn touches(&self, idx: usize) -> bool {
        self.first == idx || self.second == idx
    }
}

impl fmt::Display for CandidatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Index of a binary decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The candidate pair space: one binary variable per candidate pair
///
/// Variables are laid out with every `i < j` pair first, in lexicographic
/// order, followed by the `N` self-pairs. Per-participant buckets are built
/// up front so assignment rows cost O(N) each instead of a scan of all pairs.
#[derive(Debug, Clone)]
pub struct MatchVariableSpace {
    participant_count: usize,
    pairs: Vec<CandidatePair>,
    by_participant: Vec<Vec<VarId>>,
}

impl MatchVariableSpace {
    pub fn new(participant_count: usize) -> Self {
        let n = participant_count;
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2 + n);
        let mut by_participant = vec![Vec::with_capacity(n); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let var = VarId(pairs.len());
                pairs.push(CandidatePair::new(i, j));
                by_participant[i].push(var);
                by_participant[j].push(var);
            }
        }
        for (i, bucket) in by_participant.iter_mut().enumerate() {
            bucket.push(VarId(pairs.len()));
            pairs.push(CandidatePair::new(i, i));
        }

        Self {
            participant_count: n,
            pairs,
            by_participant,
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count
    }

    /// Number of decision variables, `C(N, 2) + N`
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pair(&self, var: VarId) -> CandidatePair {
        self.pairs[var.index()]
    }

    /// Variable of a candidate pair, computed from the layout without a lookup table
    pub fn var_of(&self, pair: CandidatePair) -> Option<VarId> {
        let n = self.participant_count;
        let CandidatePair { first: i, second: j } = pair;
        if j >= n {
            return None;
        }
        let real_pairs = n * (n - 1) / 2;
        let idx = if i == j {
            real_pairs + i
        } else {
            // Pairs preceding row i: (n-1) + (n-2) + ... + (n-i)
            i * (2 * n - i - 1) / 2 + (j - i - 1)
        };
        Some(VarId(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, CandidatePair)> + '_ {
        self.pairs
            .iter()
            .enumerate()
            .map(|(idx, pair)| (VarId(idx), *pair))
    }

    /// Every variable whose pair involves participant `idx` (including their self-pair)
    pub fn variables_for(&self, idx: usize) -> &[VarId] {
        &self.by_participant[idx]
    }

    /// `(variable, first person, second person)` for every candidate pair
    pub fn with_people<'a>(
        &'a self,
        persons: &'a [Person],
    ) -> impl Iterator<Item = (VarId, &'a Person, &'a Person)> + 'a {
        self.iter()
            .map(move |(var, pair)| (var, &persons[pair.first], &persons[pair.second]))
    }

    /// Pairs whose solved value exceeds the selection threshold
    pub fn selected(&self, values: &[f64]) -> Vec<CandidatePair> {
        self.iter()
            .filter(|(var, _)| values.get(var.index()).is_some_and(|v| *v > SELECTION_THRESHOLD))
            .map(|(_, pair)| pair)
            .collect()
    }

    /// Name used for the variable in textual model dumps
    pub fn variable_name(&self, var: VarId) -> String {
        let pair = self.pair(var);
        format!("match_{}_{}", pair.first, pair.second)
    }
}
