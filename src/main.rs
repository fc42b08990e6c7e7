use std::process::ExitCode;

fn main() -> ExitCode {
    match grafana_plugin_rename::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
