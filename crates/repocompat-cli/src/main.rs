use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use repocompat_core::{
    Config, Diagnostic, DiagnosticCode, Location, RepoDescriptor, Report, Severity, Verdict, Version,
};
use repocompat_engine::{CompatMap, RepoCheck};

/// RepoCompat - check a tool version against repository compatibility maps
#[derive(Parser)]
#[command(name = "repocompat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: repocompat.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Version of the tool being checked
    #[arg(short, long, global = true, env = "REPOCOMPAT_TOOL_VERSION")]
    tool_version: Option<Version>,

    /// Fail on warnings as well as errors
    #[arg(long, global = true)]
    deny_warnings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check one repository descriptor
    Check {
        /// Path to the repository descriptor
        descriptor: PathBuf,

        /// Repository version to check (default: the descriptor's repo.version)
        #[arg(short, long)]
        repo_version: Option<Version>,
    },

    /// Check every repository descriptor under a directory
    Scan {
        /// Directory to search
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output file for the JSON report
        #[arg(short, long, default_value = "compat-report.json")]
        output: PathBuf,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,
    },

    /// Print the compatibility tables of a descriptor
    Show {
        /// Path to the repository descriptor
        descriptor: PathBuf,
    },

    /// Write a repocompat.toml with the current settings
    Init {
        /// Where to write the config file
        #[arg(default_value = "repocompat.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config if specified
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("repocompat.toml").exists() {
        Config::from_file(Path::new("repocompat.toml"))?
    } else {
        tracing::debug!("no config file found, using defaults");
        Config::default()
    };

    if cli.deny_warnings {
        config.check.deny_warnings = true;
    }

    match cli.command {
        Commands::Check { descriptor, repo_version } => {
            let tool_version = resolve_tool_version(cli.tool_version, &config)?;
            check_command(&config, &descriptor, repo_version, tool_version, cli.verbose)
        }
        Commands::Scan { dir, output, markdown } => {
            let tool_version = resolve_tool_version(cli.tool_version, &config)?;
            scan_command(&config, &dir, &output, markdown.as_deref(), tool_version, cli.verbose)
        }
        Commands::Show { descriptor } => show_command(&descriptor),
        Commands::Init { path, force } => {
            if let Some(version) = cli.tool_version {
                config.tool.version = Some(version);
            }
            init_command(&config, &path, force)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Command line wins over the config file
fn resolve_tool_version(cli_version: Option<Version>, config: &Config) -> Result<Version> {
    cli_version.or(config.tool.version).ok_or_else(|| {
        anyhow::anyhow!(
            "No tool version given. Pass --tool-version, set REPOCOMPAT_TOOL_VERSION, \
             or add `version` under [tool] in repocompat.toml"
        )
    })
}

/// Whether a verdict should fail the run under the configured policy
fn is_failure(verdict: Verdict, deny_warnings: bool) -> bool {
    match verdict {
        Verdict::Good => false,
        Verdict::Warn => deny_warnings,
        Verdict::Error => true,
    }
}

/// Check command - one descriptor, one repository version
fn check_command(
    config: &Config,
    descriptor_path: &Path,
    repo_version: Option<Version>,
    tool_version: Version,
    verbose: bool,
) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Loading descriptor from:".cyan(), descriptor_path.display());
    }

    let descriptor = RepoDescriptor::from_file(descriptor_path)?;

    if config.allowlist.is_repo_skipped(descriptor.name()) {
        println!("{} {} (allowlisted)", "Skipping".yellow(), descriptor.name());
        return Ok(());
    }

    let map = CompatMap::from_descriptor(&descriptor).with_context(|| {
        format!("Invalid compatibility map in {}", descriptor_path.display())
    })?;

    if map.is_empty() {
        println!(
            "{} {} (no compatibility data)",
            "✓ compatible".green().bold(),
            descriptor.name().bold()
        );
        return Ok(());
    }

    let repo_version = repo_version.or(descriptor.version()).ok_or_else(|| {
        anyhow::anyhow!(
            "No repository version given and {} has no repo.version. Pass --repo-version.",
            descriptor_path.display()
        )
    })?;

    let check = map.check(descriptor.name(), repo_version, &config.tool.name, tool_version);
    print_check(&check);

    if is_failure(check.verdict(), config.check.deny_warnings) {
        std::process::exit(1);
    }

    Ok(())
}

fn print_check(check: &RepoCheck) {
    let status = match check.verdict() {
        Verdict::Good => "✓ compatible".green().bold(),
        Verdict::Warn => "⚠ warning".yellow().bold(),
        Verdict::Error => "✗ incompatible".red().bold(),
    };

    println!(
        "{} {} {} ({} {})",
        status,
        check.repo.bold(),
        check.repo_version,
        check.tool_name,
        check.tool_version
    );

    let message = check.message();
    if !message.is_empty() {
        println!("  {}", message);
    }
}

/// Find descriptor files under a directory, in a stable order
fn find_descriptors(dir: &Path, file_name: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
        .collect();

    paths.sort();
    paths
}

/// Check every descriptor and collect the results into a report
fn scan_descriptors(
    config: &Config,
    root: &Path,
    paths: &[PathBuf],
    tool_version: Version,
    verbose: bool,
) -> Report {
    let mut report = Report::new(tool_version);

    for path in paths {
        let display_path = path.strip_prefix(root).unwrap_or(path).display().to_string();
        let location = Location::new(display_path.clone());

        if verbose {
            eprintln!("  {} {}...", "Checking".cyan(), display_path);
        }

        let descriptor = match RepoDescriptor::from_file(path) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                report.add_diagnostic(
                    Diagnostic::new(DiagnosticCode::DescriptorInvalid, Severity::Error, e.to_string())
                        .with_location(location),
                );
                continue;
            }
        };

        if config.allowlist.is_repo_skipped(descriptor.name()) {
            tracing::debug!(repo = descriptor.name(), "skipping allowlisted repository");
            report.record_skipped();
            continue;
        }

        let map = match CompatMap::from_descriptor(&descriptor) {
            Ok(map) => map,
            Err(e) => {
                report.add_diagnostic(
                    Diagnostic::new(DiagnosticCode::CompatMapInvalid, Severity::Error, e.to_string())
                        .with_repo(descriptor.name())
                        .with_location(location),
                );
                continue;
            }
        };

        if map.is_empty() {
            tracing::debug!(repo = descriptor.name(), "no compatibility data");
            report.record_checked();
            continue;
        }

        let Some(repo_version) = descriptor.version() else {
            report.add_diagnostic(
                Diagnostic::new(
                    DiagnosticCode::RepoVersionMissing,
                    Severity::Warn,
                    format!("Descriptor for {} does not declare repo.version", descriptor.name()),
                )
                .with_repo(descriptor.name())
                .with_location(location),
            );
            continue;
        };

        let check = map.check(descriptor.name(), repo_version, &config.tool.name, tool_version);
        report.record_checked();

        if verbose {
            eprintln!("    {} {}", "verdict:".cyan(), check.verdict());
        }

        if let Some(diag) = check.to_diagnostic() {
            report.add_diagnostic(diag.with_location(location));
        }
    }

    report
}

/// Scan command - check all descriptors under a directory
fn scan_command(
    config: &Config,
    dir: &Path,
    output: &Path,
    markdown: Option<&Path>,
    tool_version: Version,
    verbose: bool,
) -> Result<()> {
    if verbose {
        eprintln!(
            "{} {} for {}",
            "Scanning".cyan(),
            dir.display(),
            config.check.descriptor_file
        );
    }

    let paths = find_descriptors(dir, &config.check.descriptor_file);
    if paths.is_empty() {
        return Err(anyhow::anyhow!(
            "No {} files found under {}",
            config.check.descriptor_file,
            dir.display()
        ));
    }

    let report = scan_descriptors(config, dir, &paths, tool_version, verbose);

    report.save_to_file(output)?;

    if verbose {
        eprintln!("{} {}", "Report saved to:".green(), output.display());
    }

    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(&report))?;
        if verbose {
            eprintln!("{} {}", "Markdown report saved to:".green(), md_path.display());
        }
    }

    print_report_summary(&report);

    if report.has_errors() || (config.check.deny_warnings && report.has_warnings()) {
        std::process::exit(1);
    }

    Ok(())
}

/// Show command - print each table with its good ranges
fn show_command(descriptor_path: &Path) -> Result<()> {
    let descriptor = RepoDescriptor::from_file(descriptor_path)?;
    let map = CompatMap::from_descriptor(&descriptor).with_context(|| {
        format!("Invalid compatibility map in {}", descriptor_path.display())
    })?;

    println!("{} {}", "Repository:".bold(), descriptor.name().green());
    if let Some(version) = descriptor.version() {
        println!("{} {}", "Installed version:".bold(), version);
    }
    println!();

    if map.is_empty() {
        println!("{}", "No compatibility map declared; every tool version is accepted.".yellow());
        return Ok(());
    }

    for repo_version in map.repo_versions() {
        let Some(table) = map.table(repo_version) else {
            continue;
        };

        println!("{} {}", "Repo version".bold(), repo_version.to_string().bright_blue());
        for entry in table.entries() {
            println!("  >= {:<12} {}", entry.threshold.to_string(), colored_verdict(entry.verdict));
        }

        let ranges = table.good_ranges();
        for bounds in ranges.iter().filter_map(|range| table.range_bounds(range)) {
            let upper = if bounds.max == Version::MAX {
                "∞".to_string()
            } else {
                bounds.max.to_string()
            };
            println!(
                "  {} [{}, {}) recommend {}",
                "good range".green(),
                bounds.min,
                upper,
                bounds.target
            );
        }
        println!();
    }

    Ok(())
}

/// Init command - write the effective config to disk
fn init_command(config: &Config, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists. Pass --force to overwrite it.",
            path.display()
        ));
    }

    config.save_to_file(path)?;
    println!("{} {}", "Wrote".green(), path.display());

    Ok(())
}

fn colored_verdict(verdict: Verdict) -> colored::ColoredString {
    match verdict {
        Verdict::Good => verdict.as_str().green(),
        Verdict::Warn => verdict.as_str().yellow(),
        Verdict::Error => verdict.as_str().red().bold(),
    }
}

/// Print report summary to stdout
fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Repository Compatibility Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!("Tool version: {}", report.tool_version);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Repos checked: {}", report.summary.repos_checked);
    println!("  Repos skipped: {}", report.summary.repos_skipped);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ All repositories compatible!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

            if let Some(loc) = &diag.location {
                println!("    at {}", loc.file);
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Generate markdown report
fn generate_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Repository Compatibility Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));
    md.push_str(&format!("**Tool version:** {}\n\n", report.tool_version));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Repos checked: {}\n", report.summary.repos_checked));
    md.push_str(&format!("- Repos skipped: {}\n", report.summary.repos_skipped));
    md.push_str(&format!("- Errors: {}\n", report.summary.errors));
    md.push_str(&format!("- Warnings: {}\n", report.summary.warnings));
    md.push('\n');

    if report.diagnostics.is_empty() {
        md.push_str("✅ **All repositories compatible!**\n");
        return md;
    }

    md.push_str("## Diagnostics\n\n");

    for diag in &report.diagnostics {
        let severity_emoji = match diag.severity {
            Severity::Error => "❌",
            Severity::Warn => "⚠️",
            Severity::Info => "ℹ️",
        };

        md.push_str(&format!("### {} {} - {}\n\n", severity_emoji, diag.severity, diag.code));
        md.push_str(&format!("{}\n\n", diag.message));

        if let Some(repo) = &diag.repo {
            md.push_str(&format!("**Repository:** {}", repo));
            if let Some(version) = &diag.repo_version {
                md.push_str(&format!(" ({})", version));
            }
            md.push_str("\n\n");
        }

        if let Some(loc) = &diag.location {
            md.push_str(&format!("**Descriptor:** `{}`\n\n", loc.file));
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORE: &str = r#"
[repo]
name = "apache-mynewt-core"
version = "1.6.0"

[repo.newt_compatibility."1.6.0"]
"1.0.0" = "error"
"2.0.0" = "good"
"3.0.0" = "warn"
"#;

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn tool_version_precedence() {
        let mut config = Config::default();
        assert!(resolve_tool_version(None, &config).is_err());

        config.tool.version = Some(Version::new(1, 0, 0));
        assert_eq!(resolve_tool_version(None, &config).unwrap(), Version::new(1, 0, 0));
        assert_eq!(
            resolve_tool_version(Some(Version::new(2, 0, 0)), &config).unwrap(),
            Version::new(2, 0, 0)
        );
    }

    #[test]
    fn failure_policy() {
        assert!(!is_failure(Verdict::Good, true));
        assert!(!is_failure(Verdict::Warn, false));
        assert!(is_failure(Verdict::Warn, true));
        assert!(is_failure(Verdict::Error, false));
    }

    #[test]
    fn finds_descriptors_recursively() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "repos/core/repository.toml", CORE);
        write(dir.path(), "repos/bsp/repository.toml", CORE);
        write(dir.path(), "repos/bsp/README.md", "not a descriptor");

        let found = find_descriptors(dir.path(), "repository.toml");
        assert_eq!(found.len(), 2);
        assert!(found[0] < found[1]);
    }

    #[test]
    fn scan_collects_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "repos/core/repository.toml", CORE);
        write(dir.path(), "repos/broken/repository.toml", "[repo\nname =");
        write(
            dir.path(),
            "repos/bad-map/repository.toml",
            "[repo]\nname = \"bad-map\"\nversion = \"1.0.0\"\n\
             [repo.newt_compatibility.\"1.0.0\"]\n\"1.0.0\" = \"maybe\"\n",
        );
        write(
            dir.path(),
            "repos/vendor/repository.toml",
            "[repo]\nname = \"vendor-nordic\"\n",
        );
        write(
            dir.path(),
            "repos/unversioned/repository.toml",
            "[repo]\nname = \"unversioned\"\n\
             [repo.newt_compatibility.\"1.0.0\"]\n\"1.0.0\" = \"good\"\n",
        );
        write(
            dir.path(),
            "repos/blinky/repository.toml",
            "[repo]\nname = \"blinky\"\n",
        );

        let mut config = Config::default();
        config.allowlist.skip_repos = vec!["vendor-*".to_string()];

        let paths = find_descriptors(dir.path(), &config.check.descriptor_file);
        let report = scan_descriptors(&config, dir.path(), &paths, Version::new(0, 5, 0), false);

        assert_eq!(report.summary.repos_checked, 2);
        assert_eq!(report.summary.repos_skipped, 1);
        assert_eq!(report.summary.errors, 3);
        assert_eq!(report.summary.warnings, 1);

        let codes: Vec<_> = report.diagnostics.iter().map(|d| d.code).collect();
        assert!(codes.contains(&DiagnosticCode::DescriptorInvalid));
        assert!(codes.contains(&DiagnosticCode::CompatMapInvalid));
        assert!(codes.contains(&DiagnosticCode::CompatError));
        assert!(codes.contains(&DiagnosticCode::RepoVersionMissing));

        let compat = report
            .diagnostics
            .iter()
            .find(|d| d.code == DiagnosticCode::CompatError)
            .unwrap();
        assert!(compat.message.ends_with("Please upgrade your newt tool to version 2.0.0"));
        assert_eq!(
            compat.location.as_ref().map(|l| l.file.replace('\\', "/")),
            Some("repos/core/repository.toml".to_string())
        );
    }

    #[test]
    fn scan_without_compat_data_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "repository.toml", "[repo]\nname = \"blinky\"\n");

        let config = Config::default();
        let paths = find_descriptors(dir.path(), &config.check.descriptor_file);
        let report = scan_descriptors(&config, dir.path(), &paths, Version::new(0, 5, 0), false);

        assert_eq!(report.summary.repos_checked, 1);
        assert_eq!(report.summary.warnings, 0);
        assert_eq!(report.summary.errors, 0);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn check_without_compat_data_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "repository.toml", "[repo]\nname = \"blinky\"\n");

        let result = check_command(&Config::default(), &path, None, Version::new(0, 5, 0), false);
        assert!(result.is_ok());
    }

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repocompat.toml");

        let mut config = Config::default();
        config.tool.version = Some(Version::new(1, 9, 0));
        config.allowlist.skip_repos = vec!["vendor-*".to_string()];

        init_command(&config, &path, false).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);

        assert!(init_command(&Config::default(), &path, false).is_err());
        init_command(&Config::default(), &path, true).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn markdown_report_lists_diagnostics() {
        let mut report = Report::new("0.5.0");
        report.add_diagnostic(
            Diagnostic::new(DiagnosticCode::CompatError, Severity::Error, "too old")
                .with_repo("core")
                .with_versions("0.5.0", "1.6.0"),
        );

        let md = generate_markdown_report(&report);
        assert!(md.contains("# Repository Compatibility Report"));
        assert!(md.contains("COMPAT_ERROR"));
        assert!(md.contains("**Repository:** core (1.6.0)"));
    }

    #[test]
    fn markdown_report_all_clear() {
        let md = generate_markdown_report(&Report::new("2.0.0"));
        assert!(md.contains("All repositories compatible"));
    }
}
