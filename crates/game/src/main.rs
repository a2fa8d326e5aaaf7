use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    app::loop_runner::run(app::bootstrap::build_app())
}
