use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use envpromo_core::{PlanBackend, PromotionOptions, PromotionReport, Promoter, PruneConfirm};
use envpromo_diff::{diff_trees, DiffResult};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Asks on the terminal before pruning orphaned nodes
struct StdinConfirm;

impl PruneConfirm for StdinConfirm {
    fn confirm_prune(&self, node_ids: &[String]) -> bool {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "Orphaned nodes: {}", node_ids.join(", "));
        let _ = write!(stdout, "Prune {} orphaned node(s)? [y/N] ", node_ids.len());
        let _ = stdout.flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

fn cli() -> Command {
    let tree_args = [
        Arg::new("master")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Export tree holding the desired configuration"),
        Arg::new("export")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Export tree of the tenant's current configuration"),
    ];
    let flag = |name: &'static str, help: &'static str| Arg::new(name).long(name).action(ArgAction::SetTrue).help(help);

    Command::new("envpromo")
        .version(envpromo_core::VERSION)
        .about("Promote configuration exports between environments")
        .subcommand_required(true)
        .arg(flag("log-json", "Emit logs as JSON").global(true))
        .subcommand(
            Command::new("diff")
                .about("Show what a promotion would change")
                .args(tree_args.clone())
                .arg(flag("json", "Output as JSON")),
        )
        .subcommand(
            Command::new("promote")
                .about("Replay the difference onto the tenant")
                .args(tree_args)
                .arg(flag("what-if", "Report the diff without replaying it"))
                .arg(flag("effect-secrets", "Write variables and refresh the environment"))
                .arg(flag("wait", "Wait for the environment refresh to finish"))
                .arg(flag("prompt-prune", "Ask before pruning orphaned journey nodes"))
                .arg(flag("no-prune", "Never prune orphaned journey nodes"))
                .arg(flag("print-diff", "Write diff and log snapshots"))
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML options file; flags are added on top"),
                )
                .arg(
                    Arg::new("plan-out")
                        .long("plan-out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the planned backend calls as JSON"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn tree_path(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing <{name}> argument"))
}

fn promotion_options(args: &ArgMatches) -> Result<PromotionOptions> {
    let mut options = match args.get_one::<PathBuf>("config") {
        Some(path) => PromotionOptions::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => PromotionOptions::default(),
    };
    options.what_if |= args.get_flag("what-if");
    options.effect_secrets |= args.get_flag("effect-secrets");
    options.wait |= args.get_flag("wait");
    options.prompt_prune |= args.get_flag("prompt-prune");
    options.no_prune |= args.get_flag("no-prune");
    options.print_diff |= args.get_flag("print-diff");
    Ok(options)
}

fn print_diff(diff: &DiffResult) {
    for path in &diff.added {
        println!("+ {path}");
    }
    for path in &diff.changed {
        println!("~ {path}");
    }
    for path in &diff.deleted {
        println!("- {path}");
    }
    println!(
        "{} added, {} changed, {} deleted",
        diff.added.len(),
        diff.changed.len(),
        diff.deleted.len()
    );
}

fn print_report(report: &PromotionReport) {
    if report.what_if {
        print_diff(&report.diff);
        return;
    }
    for line in &report.log_messages {
        println!("{line}");
    }
    let failed = report.failed_paths();
    println!(
        "Promotion {}: {} step(s), {} failed, {} missed",
        report.run_id,
        report.steps.len(),
        failed.len(),
        report.missed_paths().len()
    );
    for path in failed {
        println!("  failed: {path}");
    }
}

async fn run(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("diff", args)) => {
            let master = tree_path(args, "master")?;
            let export = tree_path(args, "export")?;
            let diff = diff_trees(&export, &master)?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&diff)?);
            } else {
                print_diff(&diff);
            }
        }
        Some(("promote", args)) => {
            let master = tree_path(args, "master")?;
            let export = tree_path(args, "export")?;
            let options = promotion_options(args)?;

            let backend = Arc::new(PlanBackend::new());
            let promoter = Promoter::with_confirm(backend.clone(), Arc::new(StdinConfirm));
            let report = promoter.promote(&master, &export, &options).await?;
            print_report(&report);

            if let Some(out) = args.get_one::<PathBuf>("plan-out") {
                backend
                    .write_json(out)
                    .with_context(|| format!("writing plan {}", out.display()))?;
                println!("Plan written to {} ({} mutating call(s))", out.display(), backend.mutation_count());
            }
        }
        _ => anyhow::bail!("a subcommand is required"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn flags_are_added_to_file_options() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("promo.toml");
        std::fs::write(&config, "wait = true\n").unwrap();

        let matches = cli().get_matches_from([
            "envpromo",
            "promote",
            "master",
            "export",
            "--config",
            config.to_str().unwrap(),
            "--what-if",
        ]);
        let (_, args) = matches.subcommand().unwrap();
        let options = promotion_options(args).unwrap();

        assert!(options.wait);
        assert!(options.what_if);
        assert!(!options.effect_secrets);
    }
}
