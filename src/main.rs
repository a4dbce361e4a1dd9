mod easy21;
mod solver;

fn main() {
    easy21::run();
}
