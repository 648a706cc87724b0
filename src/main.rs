fn main() -> std::process::ExitCode {
    hubarchive::run()
}
