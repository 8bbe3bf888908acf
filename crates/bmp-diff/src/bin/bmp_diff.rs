use std::process::ExitCode;

fn main() -> ExitCode {
    match bmp_diff::cli::run() {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}
