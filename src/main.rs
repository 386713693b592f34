fn main() {
    cqn::cli::run();
}
