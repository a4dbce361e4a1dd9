use std::collections::HashMap;
use std::hash::Hash;

pub mod monte_carlo;

// A trainable action-value function: Q(s, a) estimates bundled with the
// visit counters N(s) and N(s, a) that drive exploration decay and the
// time-varying step sizes.
#[derive(Debug, Clone)]
pub struct ActionValues<S: Copy + Eq + Hash, A: Copy + Eq + Hash> {
    // Exploration decay constant: epsilon(s) = n0 / (n0 + N(s)).
    n0: f64,
    // N(s): times a state was the current state when an action was chosen.
    state_visits: HashMap<S, u32>,
    // N(s, a): times an action was chosen from a state.
    pair_visits: HashMap<(S, A), u32>,
    // Q(s, a) estimates; zero for unseen pairs.
    values: HashMap<(S, A), f64>,
}

impl<S: Copy + Eq + Hash, A: Copy + Eq + Hash> ActionValues<S, A> {
    pub fn new(n0: f64) -> ActionValues<S, A> {
        ActionValues {
            n0: n0,
            state_visits: HashMap::new(),
            pair_visits: HashMap::new(),
            values: HashMap::new(),
        }
    }

    pub fn value(&self, state: &S, action: &A) -> f64 {
        *self.values.get(&(*state, *action)).unwrap_or(&0.0)
    }

    pub fn state_visits(&self, state: &S) -> u32 {
        *self.state_visits.get(state).unwrap_or(&0)
    }

    pub fn pair_visits(&self, state: &S, action: &A) -> u32 {
        *self.pair_visits.get(&(*state, *action)).unwrap_or(&0)
    }

    // Exploration probability for a state: 1 for a never-visited state,
    // decaying towards 0 as visits accumulate.
    pub fn epsilon(&self, state: &S) -> f64 {
        self.n0 / (self.n0 + self.state_visits(state) as f64)
    }

    // Counts one visit to the state and the state-action pair.
    // Returns the post-increment N(s, a); step sizes must be derived from
    // this count, never from the pre-increment one.
    pub fn record_visit(&mut self, state: &S, action: &A) -> u32 {
        *self.state_visits.entry(*state).or_insert(0) += 1;
        let pair_count = self.pair_visits.entry((*state, *action)).or_insert(0);
        *pair_count += 1;
        *pair_count
    }

    // Moves Q(s, a) towards the observed return with step size 1/visits,
    // where visits is the count recorded when the pair was visited.
    pub fn update(&mut self, state: &S, action: &A, visits: u32, returns: f64) {
        assert!(visits > 0);
        let value = self.values.entry((*state, *action)).or_insert(0.0);
        *value += (returns - *value) / visits as f64;
    }

    // The greedy action: argmax over Q(s, a), scanning `actions` in order.
    // Strict comparison keeps the earliest listed action on ties, so the
    // choice is deterministic for equal estimates.
    pub fn greedy_action(&self, state: &S, actions: &[A]) -> A {
        assert!(!actions.is_empty());
        let mut best = actions[0];
        let mut best_value = self.value(state, &best);
        for action in &actions[1..] {
            let value = self.value(state, action);
            if value > best_value {
                best = *action;
                best_value = value;
            }
        }
        best
    }

    // V*(s) = max over actions of Q(s, a).
    pub fn best_value(&self, state: &S, actions: &[A]) -> f64 {
        actions
            .iter()
            .map(|action| self.value(state, action))
            .fold(f64::NEG_INFINITY, |a, b| a.max(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
    enum TestAction {
        First,
        Second,
    }

    const TEST_ACTIONS: [TestAction; 2] = [TestAction::First, TestAction::Second];

    #[test]
    fn epsilon_starts_at_one_and_decays_test() {
        let mut values: ActionValues<i32, TestAction> = ActionValues::new(100.0);

        assert_eq!(values.epsilon(&0), 1.0);

        let mut prev = values.epsilon(&0);
        for _ in 0..1000 {
            values.record_visit(&0, &TestAction::First);
            let e = values.epsilon(&0);
            assert!(e < prev);
            assert!(e > 0.0);
            prev = e;
        }

        // N(s) = 1000, so epsilon = 100 / 1100.
        assert_eq!(values.epsilon(&0), 100.0 / 1100.0);
    }

    #[test]
    fn record_visit_counts_test() {
        let mut values: ActionValues<i32, TestAction> = ActionValues::new(100.0);

        assert_eq!(values.state_visits(&5), 0);
        assert_eq!(values.pair_visits(&5, &TestAction::First), 0);

        assert_eq!(values.record_visit(&5, &TestAction::First), 1);
        assert_eq!(values.record_visit(&5, &TestAction::Second), 1);
        assert_eq!(values.record_visit(&5, &TestAction::First), 2);

        // State visits accumulate across both actions.
        assert_eq!(values.state_visits(&5), 3);
        assert_eq!(values.pair_visits(&5, &TestAction::First), 2);
        assert_eq!(values.pair_visits(&5, &TestAction::Second), 1);
    }

    #[test]
    fn update_incremental_mean_test() {
        let mut values: ActionValues<i32, TestAction> = ActionValues::new(100.0);
        let a = TestAction::First;

        // Unseen pairs estimate to zero.
        assert_eq!(values.value(&0, &a), 0.0);

        // First visit moves all the way to the return.
        values.update(&0, &a, 1, 0.5);
        assert_eq!(values.value(&0, &a), 0.5);

        // Q <- (n-1)/n * Q + r/n with n = 2, r = -1: exactly -0.25.
        values.update(&0, &a, 2, -1.0);
        assert_eq!(values.value(&0, &a), -0.25);

        // And with n = 4, r = 1: 3/4 * -0.25 + 1/4 = 0.0625.
        values.update(&0, &a, 4, 1.0);
        assert_eq!(values.value(&0, &a), 0.0625);
    }

    #[test]
    fn greedy_action_prefers_first_on_ties_test() {
        let mut values: ActionValues<i32, TestAction> = ActionValues::new(100.0);

        // Both estimates are zero for a fresh state.
        assert_eq!(values.greedy_action(&0, &TEST_ACTIONS), TestAction::First);

        values.update(&0, &TestAction::Second, 1, 1.0);
        assert_eq!(values.greedy_action(&0, &TEST_ACTIONS), TestAction::Second);

        values.update(&0, &TestAction::First, 2, 2.0);
        assert_eq!(values.greedy_action(&0, &TEST_ACTIONS), TestAction::First);
    }

    #[test]
    fn best_value_test() {
        let mut values: ActionValues<i32, TestAction> = ActionValues::new(100.0);

        assert_eq!(values.best_value(&0, &TEST_ACTIONS), 0.0);

        values.update(&0, &TestAction::First, 1, -1.0);
        assert_eq!(values.best_value(&0, &TEST_ACTIONS), 0.0);

        values.update(&0, &TestAction::Second, 1, 1.0);
        assert_eq!(values.best_value(&0, &TEST_ACTIONS), 1.0);
    }
}
