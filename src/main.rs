fn main() {
    carbide::cli::run();
}
