use std::process::ExitCode;

fn main() -> ExitCode {
    match bmp_invert::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
