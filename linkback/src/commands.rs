use clap::{arg, command};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkback")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkback")
        .about("Notify linked sites via the pingback protocol")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Only report errors")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" ... "Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"profile" <PROFILE>)
                .required(false)
                .help("Module identity to send as")
                .value_parser(["linkback", "vinculum"])
                .default_value("linkback")
                .global(true),
        )
        .arg(
            arg!(--"user-agent" <UA>)
                .required(false)
                .help("Override the User-Agent sent to remote sites")
                .global(true),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("10")
                .global(true),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Output format: text, json")
                .value_parser(["text", "json"])
                .default_value("text")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("send")
                .about("Send a single pingback from SOURCE to TARGET")
                .arg(
                    arg!(-s --"source" <URL>)
                        .required(true)
                        .help("The page that contains the link")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-t --"target" <URL>)
                        .required(true)
                        .help("The page being linked to")
                        .value_parser(clap::value_parser!(Url)),
                ),
        )
        .subcommand(
            command!("discover")
                .about("Look up the pingback endpoint advertised by a page")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page to inspect")
                        .value_parser(clap::value_parser!(Url)),
                ),
        )
        .subcommand(
            command!("batch")
                .about(
                    "Send pingbacks from one source page to many targets, read from a file or \
                scraped from the source itself.",
                )
                .arg(
                    arg!(-s --"source" <URL>)
                        .required(true)
                        .help("The page that contains the links")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-T --"targets-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of target URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("scan"),
                )
                .arg(
                    arg!(--"scan")
                        .required(false)
                        .help("Fetch the source page and ping every outbound link")
                        .action(clap::ArgAction::SetTrue)
                        .conflicts_with("targets-file"),
                )
                .group(
                    clap::ArgGroup::new("targets")
                        .args(["targets-file", "scan"])
                        .required(true),
                )
                .arg(
                    arg!(--"include-internal")
                        .required(false)
                        .help("With --scan, also ping links on the source's own domain")
                        .action(clap::ArgAction::SetTrue)
                        .requires("scan"),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM>)
                        .required(false)
                        .help("Maximum number of pingbacks in flight")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                ),
        )
}
