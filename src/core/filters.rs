use crate::models::Person;

/// A named pairwise predicate between two distinct participants
#[derive(Debug, Clone, Copy)]
pub struct PairRule {
    pub name: &'static str,
    pub check: fn(&Person, &Person) -> bool,
}

/// Hard constraints, cheapest first. A pair is selectable only if all hold.
pub const HARD_RULES: &[PairRule] = &[
    PairRule {
        name: "day_overlap",
        check: shares_day,
    },
    PairRule {
        name: "mutual_seeking",
        check: seeks_each_other,
    },
];

/// Soft constraints. They weight the objective and never exclude a pair.
pub const SOFT_RULES: &[PairRule] = &[PairRule {
    name: "year_preference",
    check: year_preferences_met,
}];

/// Short-circuiting "all must hold" over an ordered rule list
#[inline]
pub fn all_hold(rules: &[PairRule], a: &Person, b: &Person) -> bool {
    rules.iter().all(|rule| (rule.check)(a, b))
}

/// Name of the first rule that fails, if any
pub fn first_violation(rules: &[PairRule], a: &Person, b: &Person) -> Option<&'static str> {
    rules
        .iter()
        .find(|rule| !(rule.check)(a, b))
        .map(|rule| rule.name)
}

/// Check whether two participants may be paired at all
///
/// Pairing with oneself (staying unmatched) is always allowed so the
/// assignment can never become infeasible for lack of partners.
#[inline]
pub fn is_pairable(a: &Person, b: &Person) -> bool {
    a.is_same_participant(b) || all_hold(HARD_RULES, a, b)
}

/// Check whether a pairing satisfies every soft preference
#[inline]
pub fn is_pairing_preferred(a: &Person, b: &Person) -> bool {
    a.is_same_participant(b) || all_hold(SOFT_RULES, a, b)
}

/// Both sides accept the other's gender identity
#[inline]
pub fn seeks_each_other(a: &Person, b: &Person) -> bool {
    a.seeking.accepts(b.gender) && b.seeking.accepts(a.gender)
}

/// The two can meet on a common day
#[inline]
pub fn shares_day(a: &Person, b: &Person) -> bool {
    a.day.overlaps(&b.day)
}

/// Both sides' year-of-study preferences are satisfied
#[inline]
pub fn year_preferences_met(a: &Person, b: &Person) -> bool {
    let same_year = a.year.same_as(b.year);
    a.year_preference.is_satisfied(same_year) && b.year_preference.is_satisfied(same_year)
}
