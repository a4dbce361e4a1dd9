use plotlib::{
    page::Page,
    repr::Plot,
    style::{PointMarker, PointStyle},
    view::ContinuousView,
};
use prettytable::{Cell, Row, Table};
use rand::prelude::*;

use crate::solver::monte_carlo;
use crate::solver::ActionValues;

// Exploration decay constant for the ε-greedy behavior policy.
const N0: f64 = 100.0;
const TRAIN_EPISODES: u64 = 1_000_000;
const EVAL_EPISODES: u64 = 100_000;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Action {
    Hit,
    Stick,
}

// All actions, in the order used for greedy tie-breaking (ties prefer Hit).
pub const ACTIONS: [Action; 2] = [Action::Hit, Action::Stick];

// Running card totals for both sides. The sums leave 1..=21 only on the
// transition that terminates the episode; every non-terminal state keeps
// both within that range.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct State {
    pub player: i32,
    pub dealer: i32,
    pub terminated: bool,
}

// Source of card values. Every RNG is a deck via the blanket impl below;
// tests substitute a stacked deck to force exact card sequences.
pub trait Deck {
    fn draw(&mut self) -> i32;
}

// Cards are sampled with replacement: a value 1-10 uniformly, black
// (positive) with probability 2/3 and red (negative) with 1/3.
impl<R: Rng> Deck for R {
    fn draw(&mut self) -> i32 {
        let value = self.gen_range(1..=10);
        if self.gen_range(1..=3) == 1 {
            -value
        } else {
            value
        }
    }
}

impl State {
    // Deals one card to each side. First cards are always black.
    pub fn new(deck: &mut impl Deck) -> State {
        State {
            player: deck.draw().abs(),
            dealer: deck.draw().abs(),
            terminated: false,
        }
    }

    // The player takes one more card. Going outside 1..=21 is a bust and
    // terminates the episode. Terminal states are returned unchanged.
    pub fn hit(self, deck: &mut impl Deck) -> State {
        if self.terminated {
            return self;
        }
        let player = self.player + deck.draw();
        let bust = player < 1 || player > 21;
        State {
            player: player,
            dealer: self.dealer,
            terminated: bust,
        }
    }

    // The player sticks and the dealer plays out: draws while on 1..=16,
    // sticks on 17 or higher, stops immediately on going bust. The episode
    // always terminates. Terminal states are returned unchanged.
    pub fn stick(self, deck: &mut impl Deck) -> State {
        if self.terminated {
            return self;
        }
        let mut dealer = self.dealer;
        while dealer >= 1 && dealer < 17 {
            dealer += deck.draw();
        }
        State {
            player: self.player,
            dealer: dealer,
            terminated: true,
        }
    }

    // The outcome of a terminal state for the player: -1 if the player
    // went bust, +1 if the dealer did, otherwise the comparison of sums.
    // Non-terminal states have no realized reward yet.
    pub fn value(&self) -> f64 {
        if !self.terminated {
            return 0.0;
        }
        if self.player < 1 || self.player > 21 {
            return -1.0;
        }
        if self.dealer < 1 || self.dealer > 21 {
            return 1.0;
        }
        if self.player > self.dealer {
            1.0
        } else if self.player < self.dealer {
            -1.0
        } else {
            0.0
        }
    }
}

// The environment's single entry point: applies one action and returns the
// next state and the reward realized on that transition. Terminal states
// are absorbing with zero reward; otherwise the reward is non-zero only on
// the transition that terminates the episode.
pub fn step(state: State, action: Action, deck: &mut impl Deck) -> (State, f64) {
    if state.terminated {
        return (state, 0.0);
    }
    let next = match action {
        Action::Hit => state.hit(deck),
        Action::Stick => state.stick(deck),
    };
    let reward = next.value();
    (next, reward)
}

// A fixed baseline policy mirroring the dealer: stick on 17 or higher.
pub fn stick_at_17_policy(state: &State) -> Action {
    if state.player < 17 {
        Action::Hit
    } else {
        Action::Stick
    }
}

// Plays one episode under the given policy and returns its total reward.
pub fn run_simulation<R, P>(policy: &P, rng: &mut R) -> f64
where
    R: Rng,
    P: Fn(&State) -> Action,
{
    let mut state = State::new(rng);
    let mut returns = 0.0;
    while !state.terminated {
        let action = policy(&state);
        let (next, reward) = step(state, action, rng);
        returns += reward;
        state = next;
    }
    returns
}

// Prints the greedy policy over all non-terminal states, player sums as
// rows and dealer showings as columns.
pub fn print_policy(values: &ActionValues<State, Action>) {
    let mut table = Table::new();

    let mut header = Vec::new();
    header.push(Cell::new(""));
    for dealer in 1..=10 {
        header.push(Cell::new(&format!("{}", dealer)));
    }
    table.add_row(Row::new(header));

    for player in (1..=21).rev() {
        let mut cells = Vec::new();
        cells.push(Cell::new(&format!("{}", player)));
        for dealer in 1..=10 {
            let state = State {
                player: player,
                dealer: dealer,
                terminated: false,
            };
            match values.greedy_action(&state, &ACTIONS) {
                Action::Hit => cells.push(Cell::new("H")),
                Action::Stick => cells.push(Cell::new("S")),
            }
        }
        table.add_row(Row::new(cells));
    }
    table.printstd();
}

// Prints the optimal value function V*(s) = max over actions of Q(s, a)
// over the same grid.
pub fn print_values(values: &ActionValues<State, Action>) {
    let mut table = Table::new();

    let mut header = Vec::new();
    header.push(Cell::new(""));
    for dealer in 1..=10 {
        header.push(Cell::new(&format!("{}", dealer)));
    }
    table.add_row(Row::new(header));

    for player in (1..=21).rev() {
        let mut cells = Vec::new();
        cells.push(Cell::new(&format!("{}", player)));
        for dealer in 1..=10 {
            let state = State {
                player: player,
                dealer: dealer,
                terminated: false,
            };
            cells.push(Cell::new(&format!(
                "{:+.2}",
                values.best_value(&state, &ACTIONS)
            )));
        }
        table.add_row(Row::new(cells));
    }
    table.printstd();
}

// Plots V* against the player sum for a few dealer showings.
pub fn plot_values(values: &ActionValues<State, Action>) {
    let mut view = ContinuousView::new()
        .x_range(1.0, 21.0)
        .y_range(-1.0, 1.0)
        .x_label("Player sum")
        .y_label("V*");

    for dealer in &[1, 5, 10] {
        let points: Vec<(f64, f64)> = (1..=21)
            .map(|player| {
                let state = State {
                    player: player,
                    dealer: *dealer,
                    terminated: false,
                };
                (player as f64, values.best_value(&state, &ACTIONS))
            })
            .collect();
        view = view.add(Plot::new(points).point_style(PointStyle::new().marker(PointMarker::Circle)));
    }

    println!(
        "{}",
        Page::single(&view).dimensions(100, 50).to_text().unwrap()
    );
}

pub fn run() {
    let mut rng = StdRng::from_entropy();

    let start_state = |rng: &mut StdRng| State::new(rng);
    let next_state = |state: &State, action: &Action, rng: &mut StdRng| step(*state, *action, rng);
    let is_terminal = |state: &State| state.terminated;

    let mut values = ActionValues::new(N0);
    monte_carlo::train(
        &mut values,
        &ACTIONS,
        &start_state,
        &next_state,
        &is_terminal,
        &mut rng,
        TRAIN_EPISODES,
    );

    println!("Optimal value function V*(s) = max_a Q(s, a):");
    print_values(&values);
    plot_values(&values);
    println!("Greedy policy (H = hit, S = stick):");
    print_policy(&values);

    // Compare the learned greedy policy against the fixed baseline.
    let learned_policy = |state: &State| values.greedy_action(state, &ACTIONS);
    let mut total_learned = 0.0;
    let mut total_baseline = 0.0;
    for _ in 0..EVAL_EPISODES {
        total_learned += run_simulation(&learned_policy, &mut rng);
        total_baseline += run_simulation(&stick_at_17_policy, &mut rng);
    }
    println!(
        "Average returns, stick-at-17 baseline: {:.4}",
        total_baseline / EVAL_EPISODES as f64
    );
    println!(
        "Average returns, learned policy: {:.4}",
        total_learned / EVAL_EPISODES as f64
    );
}
