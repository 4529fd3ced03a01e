// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
}

fn value(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).value_name(value_name).help(help)
}

// Mirrors src/cli.rs; the build script cannot depend on the crate itself
fn build_cli() -> Command {
    Command::new("cooker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Incremental content cooker for game assets")
        .arg(value("config", "PATH", "Path to cooker.toml (default: ./cooker.toml if present)"))
        .arg(value("platform", "PLATFORM", "Target platform: PC, IOS, Android or Linux").default_value("PC"))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("cook")
                .about("Cook all out of date content, or a single file")
                .arg(value("out-file", "FILE", "Cook only this file"))
                .arg(value("package-file", "PATH", "Package configuration handed to tasks"))
                .arg(flag("debug-only", "Keep debug information in cooked output"))
                .arg(flag("local", "Local cook: do not sync generated content first"))
                .arg(flag("force-gen-cdict", "Regenerate compression dictionaries even if they exist"))
                .arg(value("p4-change", "CHANGELIST", "Changelist for depot add/edit/delete (must exist)"))
                .arg(value("p4-client", "WORKSPACE", "Workspace name for depot operations"))
                .arg(value("p4-port", "SERVER:PORT", "Server for depot operations"))
                .arg(value("p4-user", "USER", "User for depot operations"))
                .arg(value("cooker-version", "VERSION", "Fail unless the built-in cooker version matches"))
                .arg(value("data-version", "VERSION", "Fail unless the single-cook data version matches")),
        )
        .subcommand(
            Command::new("status")
                .about("List content whose cooked output is out of date")
                .arg(value("type", "TYPE", "Only report this file type")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");
    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let mut buffer = Vec::new();
    if let Err(e) = Man::new(build_cli()).render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    if let Err(e) = fs::write(man_dir.join("cooker.1"), buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
