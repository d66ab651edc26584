use colored::Colorize;
use linkback::commands::command_argument_builder;
use linkback::handlers::{handle_batch, handle_discover, handle_send, init_logging};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();

    let Some((name, sub_matches)) = chosen_command.subcommand() else {
        unreachable!("clap should ensure we don't get here")
    };

    init_logging(sub_matches);

    let result = match name {
        "send" => handle_send(sub_matches).await,
        "discover" => handle_discover(sub_matches).await,
        "batch" => handle_batch(sub_matches).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(2);
        }
    }
}
