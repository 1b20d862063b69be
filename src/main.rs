use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use telemon::commands::{self, monitor::MonitorOptions};
use telemon::core::Config;

fn main() -> Result<()> {
    let matches = Command::new("telemon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Intel discrete GPU telemetry monitor")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .global(true)
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("list")
                .about("List Intel GPUs accepted by the control library")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print identities as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("monitor")
                .about("Poll GPU sensors until Ctrl-C")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Poll interval in milliseconds (default: from config)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON line per poll")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_name("N")
                        .help("Stop after N polls")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change persisted settings")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Show current settings"))
                .subcommand(
                    Command::new("set-interval")
                        .about("Set the default poll interval")
                        .arg(
                            Arg::new("ms")
                                .help("Interval in milliseconds")
                                .required(true)
                                .index(1)
                                .value_parser(clap::value_parser!(u64)),
                        ),
                )
                .subcommand(
                    Command::new("set-library")
                        .about("Set the control library path (omit to reset)")
                        .arg(Arg::new("path").help("Path to ControlLib").index(1)),
                ),
        )
        .get_matches();

    telemon::init_logging(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("list", sub_matches)) => {
            let config = Config::load()?;
            commands::list(&config, sub_matches.get_flag("json"))?;
        }
        Some(("monitor", sub_matches)) => {
            let config = Config::load()?;
            let options = MonitorOptions {
                interval_ms: sub_matches.get_one::<u64>("interval").copied(),
                json: sub_matches.get_flag("json"),
                count: sub_matches.get_one::<u64>("count").copied(),
            };
            commands::monitor(&config, &options)?;
        }
        Some(("config", sub_matches)) => {
            commands::handle_config(sub_matches)?;
        }
        _ => {
            println!("Use 'telemon --help' for more information.");
        }
    }

    Ok(())
}
