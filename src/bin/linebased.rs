fn main() {
    linebased::cli::run();
}
