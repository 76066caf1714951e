fn main() -> std::process::ExitCode {
    diary_lib::run()
}
