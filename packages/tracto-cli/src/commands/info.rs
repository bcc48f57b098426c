use serde::Serialize;

use tracto_rs::tools::{toolchain_status, Toolchain};

use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct ToolStatus {
    name: &'static str,
    path: Option<String>,
    found: bool,
}

#[derive(Serialize)]
struct ToolchainInfo {
    toolchain: Toolchain,
    label: &'static str,
    env_var: &'static str,
    tools: Vec<ToolStatus>,
}

#[derive(Serialize)]
struct InfoOutput {
    cli_version: String,
    platform: String,
    arch: String,
    toolchains: Vec<ToolchainInfo>,
}

const TOOLCHAINS: &[Toolchain] = &[
    Toolchain::Dtk,
    Toolchain::Mrtrix,
    Toolchain::Camino,
    Toolchain::Dtb,
    Toolchain::Mitk,
];

pub fn execute(args: InfoArgs) -> i32 {
    let toolchains = TOOLCHAINS
        .iter()
        .map(|&toolchain| ToolchainInfo {
            toolchain,
            label: toolchain.label(),
            env_var: toolchain.env_var(),
            tools: toolchain_status(toolchain)
                .into_iter()
                .map(|(name, path)| ToolStatus {
                    name,
                    found: path.is_some(),
                    path: path.map(|p| p.display().to_string()),
                })
                .collect(),
        })
        .collect();

    let info = InfoOutput {
        cli_version: env!("CARGO_PKG_VERSION").to_string(),
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        toolchains,
    };

    if args.json {
        match output::to_json(&info, false) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, None) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
    } else {
        println!("tracto CLI v{}", info.cli_version);
        println!("Platform: {} ({})", info.platform, info.arch);
        println!();
        for toolchain in &info.toolchains {
            let found = toolchain.tools.iter().filter(|t| t.found).count();
            println!(
                "{} ({} of {} tools found, ${} overrides lookup)",
                toolchain.label,
                found,
                toolchain.tools.len(),
                toolchain.env_var
            );
            for tool in &toolchain.tools {
                match &tool.path {
                    Some(path) => println!("  {}: {}", tool.name, path),
                    None => println!("  {}: not found", tool.name),
                }
            }
        }
    }

    exit_codes::SUCCESS
}
