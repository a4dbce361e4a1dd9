use std::hash::Hash;

use rand::Rng;

use crate::solver::ActionValues;

// One trajectory entry: the state, the action chosen from it, and N(s, a)
// as incremented at the time of that visit. The recorded count is what the
// update step divides by, so a pair recurring within one episode still gets
// one update per occurrence at its own count.
pub type EpisodeStep<S, A> = (S, A, u32);

// Samples the next action from the ε-greedy behavior policy over Q: with
// probability epsilon(s) a uniformly random action, otherwise the greedy
// one.
pub fn next_action<S, A, R>(
    values: &ActionValues<S, A>,
    state: &S,
    actions: &[A],
    rng: &mut R,
) -> A
where
    S: Copy + Eq + Hash,
    A: Copy + Eq + Hash,
    R: Rng,
{
    if rng.gen::<f64>() < values.epsilon(state) {
        actions[rng.gen_range(0..actions.len())]
    } else {
        values.greedy_action(state, actions)
    }
}

// Generates one episode under the ε-greedy policy, counting visits to each
// current state before transitioning out of it. Returns the trajectory and
// the episode return. Rewards are summed undiscounted; for a terminal-only
// reward model the sum is just the final transition's reward.
pub fn run_episode<S, A, R, StartState, NextState, IsTerminal>(
    values: &mut ActionValues<S, A>,
    actions: &[A],
    start_state: &StartState,
    next_state: &NextState,
    is_terminal: &IsTerminal,
    rng: &mut R,
) -> (Vec<EpisodeStep<S, A>>, f64)
where
    S: Copy + Eq + Hash,
    A: Copy + Eq + Hash,
    R: Rng,
    StartState: Fn(&mut R) -> S,
    NextState: Fn(&S, &A, &mut R) -> (S, f64),
    IsTerminal: Fn(&S) -> bool,
{
    let mut state = start_state(rng);
    let mut trajectory = Vec::new();
    let mut returns = 0.0;

    while !is_terminal(&state) {
        let action = next_action(values, &state, actions, rng);
        let visits = values.record_visit(&state, &action);
        trajectory.push((state, action, visits));

        let (new_state, reward) = next_state(&state, &action, rng);
        returns += reward;
        state = new_state;
    }

    (trajectory, returns)
}

// Every-visit Monte Carlo update: every pair in the trajectory moves
// towards the episode return by 1/n, with n the visit count recorded for
// that occurrence.
pub fn update<S, A>(
    values: &mut ActionValues<S, A>,
    trajectory: &[EpisodeStep<S, A>],
    returns: f64,
) where
    S: Copy + Eq + Hash,
    A: Copy + Eq + Hash,
{
    for (state, action, visits) in trajectory {
        values.update(state, action, *visits, returns);
    }
}

// Runs ε-greedy Monte Carlo control for a fixed number of episodes,
// updating `values` at the end of each one.
pub fn train<S, A, R, StartState, NextState, IsTerminal>(
    values: &mut ActionValues<S, A>,
    actions: &[A],
    start_state: &StartState,
    next_state: &NextState,
    is_terminal: &IsTerminal,
    rng: &mut R,
    episodes: u64,
) where
    S: Copy + Eq + Hash,
    A: Copy + Eq + Hash,
    R: Rng,
    StartState: Fn(&mut R) -> S,
    NextState: Fn(&S, &A, &mut R) -> (S, f64),
    IsTerminal: Fn(&S) -> bool,
{
    for _ in 0..episodes {
        let (trajectory, returns) =
            run_episode(values, actions, start_state, next_state, is_terminal, rng);
        update(values, &trajectory, returns);
    }
}
