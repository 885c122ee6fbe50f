use autosnap_core::init_logging;

mod app;
mod commands;
mod tools;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = app::build_cli();
    let matches = app.get_matches();

    let verbose = matches.get_flag("verbose");
    let quiet = !verbose;
    init_logging(quiet);

    commands::run_command(&matches)?;

    Ok(())
}
